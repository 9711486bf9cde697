use contracts::dashboards::d402_sales_report::{TopEntry, TopPayment};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::ops::AddAssign;

use super::error::ReportError;
use super::normalize::SalesRow;
use super::segments::Segment;

/// Label a row is grouped under for top-N selections.
///
/// Labels are raw cell text, so "2x Pen" and "Pen" are separate products.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKey {
    Product,
    Attribution,
    PaymentMethod,
}

impl GroupKey {
    pub fn label(self, row: &SalesRow) -> &str {
        match self {
            GroupKey::Product => &row.product_text,
            GroupKey::Attribution => &row.attribution,
            GroupKey::PaymentMethod => &row.payment_method_raw,
        }
    }
}

pub fn count_rows(segment: &Segment) -> usize {
    segment.len()
}

/// Distinct non-empty order ids; an order may span several rows
pub fn count_orders(segment: &Segment) -> usize {
    distinct_orders(segment.iter())
}

fn distinct_orders<'r>(rows: impl Iterator<Item = &'r SalesRow>) -> usize {
    rows.map(|r| r.order_id.as_str())
        .filter(|id| !id.is_empty())
        .collect::<HashSet<_>>()
        .len()
}

pub fn sum_quantity(segment: &Segment) -> u64 {
    segment.iter().map(|r| r.quantity).sum()
}

pub fn sum_net_sales(segment: &Segment) -> f64 {
    segment.iter().map(|r| r.net_sales).sum()
}

/// `part` as a percentage of `whole`, 0 when `whole` is not positive
pub fn ratio(part: f64, whole: f64) -> f64 {
    if whole > 0.0 {
        part / whole * 100.0
    } else {
        0.0
    }
}

pub fn average(total_value: f64, total_count: usize) -> f64 {
    if total_count > 0 {
        total_value / total_count as f64
    } else {
        0.0
    }
}

/// Sum `value` per label, labels in ascending order.
///
/// Rows with an empty label belong to no group.
pub fn group_by<'r, T, K, V>(
    rows: impl IntoIterator<Item = &'r SalesRow>,
    key: K,
    value: V,
) -> BTreeMap<String, T>
where
    T: AddAssign + Default,
    K: Fn(&'r SalesRow) -> &'r str,
    V: Fn(&'r SalesRow) -> T,
{
    let mut groups: BTreeMap<String, T> = BTreeMap::new();
    for row in rows {
        let label = key(row);
        if label.is_empty() {
            continue;
        }
        *groups.entry(label.to_string()).or_default() += value(row);
    }
    groups
}

/// Units per label, largest first.
///
/// The sort is stable over ascending labels, so ties go to the label
/// that sorts first.
pub fn ranked_by_quantity(segment: &Segment, key: GroupKey) -> Vec<(String, u64)> {
    let mut ranked: Vec<(String, u64)> = group_by(
        segment.iter(),
        |r| key.label(r),
        |r| r.quantity,
    )
    .into_iter()
    .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked
}

pub fn top_by_quantity(segment: &Segment, key: GroupKey) -> Result<TopEntry, ReportError> {
    if segment.is_empty() {
        return Err(ReportError::EmptySegment(segment.name()));
    }
    ranked_by_quantity(segment, key)
        .into_iter()
        .next()
        .map(|(label, quantity)| TopEntry { label, quantity })
        .ok_or(ReportError::EmptySegment(segment.name()))
}

/// Most used payment method by units, with its net sales and distinct orders.
///
/// Value and orders come from their own group-bys joined on the winning label.
pub fn top_payment_value(segment: &Segment) -> Result<TopPayment, ReportError> {
    let top = top_by_quantity(segment, GroupKey::PaymentMethod)?;

    let value_by_method = group_by(
        segment.iter(),
        |r| GroupKey::PaymentMethod.label(r),
        |r| r.net_sales,
    );
    let net_sales = value_by_method.get(&top.label).copied().unwrap_or_default();

    let orders = distinct_orders(
        segment
            .iter()
            .filter(|r| r.payment_method_raw == top.label),
    );

    Ok(TopPayment {
        method: top.label,
        quantity: top.quantity,
        net_sales,
        orders,
    })
}

/// Distinct values in first-seen order
pub fn distinct_in_order<'r>(values: impl IntoIterator<Item = &'r str>) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .into_iter()
        .filter(|v| seen.insert(*v))
        .map(str::to_string)
        .collect()
}

/// Occurrences per value, most frequent first, ties in first-seen order
pub fn value_counts<'r>(values: impl IntoIterator<Item = &'r str>) -> Vec<(String, usize)> {
    let mut order: Vec<&str> = Vec::new();
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for v in values {
        let count = counts.entry(v).or_insert_with(|| {
            order.push(v);
            0
        });
        *count += 1;
    }

    let mut result: Vec<(String, usize)> = order
        .into_iter()
        .map(|v| (v.to_string(), counts[v]))
        .collect();
    result.sort_by(|a, b| b.1.cmp(&a.1));
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboards::d402_sales_report::segments::tests::row;
    use crate::dashboards::d402_sales_report::segments::SegmentKind;

    fn with_product(mut r: SalesRow, product: &str, quantity: u64, net_sales: f64) -> SalesRow {
        r.product_text = product.to_string();
        r.quantity = quantity;
        r.net_sales = net_sales;
        r
    }

    #[test]
    fn test_ratio_and_average() {
        assert_eq!(ratio(25.0, 100.0), 25.0);
        assert_eq!(ratio(7.0, 0.0), 0.0);
        assert_eq!(ratio(-3.0, 0.0), 0.0);
        assert_eq!(average(30.0, 2), 15.0);
        assert_eq!(average(30.0, 0), 0.0);
    }

    #[test]
    fn test_counts_and_sums() {
        let rows = vec![
            with_product(row("A", "completed", "addi", "", ""), "2x Pen", 2, 20.0),
            with_product(row("A", "completed", "addi", "", ""), "Cup", 1, 5.5),
            with_product(row("B", "completed", "cash", "", ""), "Pen", 1, 10.0),
            with_product(row("", "completed", "cash", "", ""), "Pen", 1, 1.0),
        ];
        let completed = Segment::select(SegmentKind::Completed, &rows);

        assert_eq!(count_rows(&completed), 4);
        assert_eq!(count_orders(&completed), 2);
        assert!(count_orders(&completed) <= count_rows(&completed));
        assert_eq!(sum_quantity(&completed), 5);
        assert_eq!(sum_net_sales(&completed), 36.5);

        let refunded = Segment::select(SegmentKind::Refunded, &rows);
        assert_eq!(sum_quantity(&refunded), 0);
        assert_eq!(sum_net_sales(&refunded), 0.0);
        assert_eq!(count_orders(&refunded), 0);
    }

    #[test]
    fn test_one_row_per_order_counts_match() {
        let rows = vec![
            row("1", "completed", "cash", "", ""),
            row("2", "completed", "cash", "", ""),
            row("3", "completed", "cash", "", ""),
        ];
        let completed = Segment::select(SegmentKind::Completed, &rows);
        assert_eq!(count_orders(&completed), count_rows(&completed));
    }

    #[test]
    fn test_top_tie_goes_to_first_label() {
        let rows = vec![
            with_product(row("1", "completed", "cash", "", ""), "Pen", 2, 1.0),
            with_product(row("2", "completed", "cash", "", ""), "Cup", 1, 1.0),
            with_product(row("3", "completed", "cash", "", ""), "Cup", 1, 1.0),
            with_product(row("4", "completed", "cash", "", ""), "Ink", 1, 1.0),
        ];
        let completed = Segment::select(SegmentKind::Completed, &rows);

        let top = top_by_quantity(&completed, GroupKey::Product).unwrap();
        assert_eq!(top, TopEntry { label: "Cup".to_string(), quantity: 2 });

        let ranked = ranked_by_quantity(&completed, GroupKey::Product);
        let labels: Vec<&str> = ranked.iter().map(|(l, _)| l.as_str()).collect();
        assert_eq!(labels, vec!["Cup", "Pen", "Ink"]);

        for _ in 0..5 {
            assert_eq!(top_by_quantity(&completed, GroupKey::Product).unwrap(), top);
        }
    }

    #[test]
    fn test_product_groups_keep_quantity_prefix() {
        let rows = vec![
            with_product(row("1", "completed", "cash", "", ""), "2x Pen", 2, 1.0),
            with_product(row("2", "completed", "cash", "", ""), "Pen", 1, 1.0),
            with_product(row("3", "completed", "cash", "", ""), "Pen", 1, 1.0),
        ];
        let completed = Segment::select(SegmentKind::Completed, &rows);
        let ranked = ranked_by_quantity(&completed, GroupKey::Product);
        assert_eq!(ranked, vec![("2x Pen".to_string(), 2), ("Pen".to_string(), 2)]);
    }

    #[test]
    fn test_top_on_empty_segment_fails() {
        let rows = vec![row("1", "refunded", "cash", "", "")];
        let completed = Segment::select(SegmentKind::Completed, &rows);
        let err = top_by_quantity(&completed, GroupKey::Attribution).unwrap_err();
        assert!(matches!(err, ReportError::EmptySegment("completed")));
        assert!(top_payment_value(&completed).is_err());
    }

    #[test]
    fn test_empty_labels_are_not_a_group() {
        let rows = vec![row("1", "completed", "cash", "", "")];
        let completed = Segment::select(SegmentKind::Completed, &rows);
        assert!(top_by_quantity(&completed, GroupKey::Attribution).is_err());
    }

    #[test]
    fn test_top_payment_value_joins_separate_group_bys() {
        let rows = vec![
            with_product(row("A", "completed", "addi", "", ""), "3x Pen", 3, 30.0),
            with_product(row("A", "completed", "addi", "", ""), "Cup", 1, 12.0),
            with_product(row("B", "completed", "cash", "", ""), "Pen", 1, 500.0),
            with_product(row("C", "completed", "cash", "", ""), "Pen", 1, 500.0),
            with_product(row("D", "completed", "Addi", "", ""), "Pen", 1, 7.0),
        ];
        let completed = Segment::select(SegmentKind::Completed, &rows);
        let top = top_payment_value(&completed).unwrap();
        assert_eq!(top.method, "addi");
        assert_eq!(top.quantity, 4);
        assert_eq!(top.net_sales, 42.0);
        assert_eq!(top.orders, 1);
    }

    #[test]
    fn test_distinct_and_value_counts() {
        let values = ["new", "returning", "", "new", "returning", "vip"];
        assert_eq!(
            distinct_in_order(values.iter().copied()),
            vec!["new", "returning", "", "vip"]
        );
        let counts = value_counts(values.iter().copied());
        assert_eq!(
            counts,
            vec![
                ("new".to_string(), 2),
                ("returning".to_string(), 2),
                ("".to_string(), 1),
                ("vip".to_string(), 1),
            ]
        );
    }
}
