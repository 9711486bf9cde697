use anyhow::Result;
use contracts::dashboards::d402_sales_report::{
    AddiBreakdown, ChartSeries, ComparisonSeries, CustomerComparison, CustomerSegmentStats,
    HeadlineMetrics, RefundSummary, ReportDiagnostics, ReportWarning, SalesReport, SegmentTotals,
    SeriesPoint, TableRow, WarningCode,
};
use std::time::Duration;

use super::aggregate::{
    self, average, count_orders, count_rows, ratio, sum_net_sales, sum_quantity, GroupKey,
};
use super::columns::ColumnMap;
use super::error::ReportError;
use super::normalize::{normalize_rows, SalesRow};
use super::segments::{Segment, Segments};
use crate::shared::format::format_money;
use crate::usecases::u508_load_sales_export::{RawTable, SalesSource, SourceCache};

/// Returning share of completed orders above which repurchase is healthy
const HEALTHY_REPURCHASE_PCT: f64 = 25.0;

/// Fetch the export (through the cache) and build the report
pub async fn get_sales_report(
    source: &dyn SalesSource,
    cache: &SourceCache,
    ttl: Duration,
) -> Result<SalesReport> {
    let csv_text = cache.get_or_fetch(source, ttl).await?;
    let table = RawTable::from_csv(&csv_text)?;
    if table.is_empty() {
        tracing::warn!("D402 Report: export {} has no data rows", source.source_id());
    }
    let report = build_report(&table, source.source_id())?;

    tracing::info!(
        "D402 Report: {} completed rows, {} units, net sales {}, {} warnings",
        report.headline.completed_rows,
        report.headline.units_sold,
        format_money(report.headline.net_sales_total),
        report.warnings.len()
    );

    Ok(report)
}

/// Run the whole pipeline over a loaded export.
///
/// Only parse and required-column errors abort; everything else degrades
/// into a warning.
pub fn build_report(table: &RawTable, source_id: &str) -> Result<SalesReport, ReportError> {
    let columns = ColumnMap::resolve(&table.headers);
    let rows = normalize_rows(table, &columns)?;
    let segments = Segments::build(&rows);

    let mut warnings = Vec::new();
    for field in columns.missing_optional() {
        warn(
            &mut warnings,
            WarningCode::ColumnMissing,
            ReportError::ColumnMissing(field.name()).to_string(),
        );
    }

    let top_product = top_or_warn(
        aggregate::top_by_quantity(&segments.completed, GroupKey::Product),
        "top product",
        &mut warnings,
    )?;
    let top_attribution = top_or_warn(
        aggregate::top_by_quantity(&segments.completed, GroupKey::Attribution),
        "top attribution",
        &mut warnings,
    )?;
    let top_payment = top_or_warn(
        aggregate::top_payment_value(&segments.completed),
        "top payment method",
        &mut warnings,
    )?;

    Ok(SalesReport {
        generated_at: chrono::Utc::now(),
        source_id: source_id.to_string(),
        headline: HeadlineMetrics {
            completed_rows: count_rows(&segments.completed),
            refunded_rows: count_rows(&segments.refunded),
            units_sold: sum_quantity(&segments.completed),
            net_sales_total: sum_net_sales(&segments.completed),
        },
        top_product,
        top_attribution,
        top_payment,
        refunds: refund_summary(&segments.refunded),
        charts: chart_series(&segments.completed),
        customers: customer_comparison(&segments),
        addi: addi_breakdown(&segments),
        table: rows.iter().map(table_row).collect(),
        diagnostics: diagnostics(table, &columns, &rows, &segments.completed),
        warnings,
    })
}

fn warn(warnings: &mut Vec<ReportWarning>, code: WarningCode, message: String) {
    tracing::warn!("D402 Report: {}", message);
    warnings.push(ReportWarning::new(code, message));
}

/// Swap an empty-segment failure for "no data" plus a warning
fn top_or_warn<T>(
    result: Result<T, ReportError>,
    what: &str,
    warnings: &mut Vec<ReportWarning>,
) -> Result<Option<T>, ReportError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e @ ReportError::EmptySegment(_)) => {
            warn(warnings, WarningCode::EmptySegment, format!("{what}: {e}"));
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

fn refund_summary(refunded: &Segment) -> RefundSummary {
    RefundSummary {
        rows: count_rows(refunded),
        orders: count_orders(refunded),
        net_sales: sum_net_sales(refunded),
        order_ids: refunded.iter().map(|r| r.order_id.clone()).collect(),
    }
}

fn chart_series(completed: &Segment) -> ChartSeries {
    let quantity_by_product = aggregate::ranked_by_quantity(completed, GroupKey::Product)
        .into_iter()
        .map(|(label, quantity)| SeriesPoint {
            label,
            value: quantity as f64,
        })
        .collect();

    let quantity_by_payment_method = aggregate::group_by(
        completed.iter(),
        |r| GroupKey::PaymentMethod.label(r),
        |r| r.quantity,
    )
    .into_iter()
    .map(|(label, quantity)| SeriesPoint {
        label,
        value: quantity as f64,
    })
    .collect();

    ChartSeries {
        quantity_by_product,
        quantity_by_payment_method,
    }
}

fn customer_stats(
    segment: &Segment,
    completed_orders: usize,
    completed_net_sales: f64,
) -> CustomerSegmentStats {
    let orders = count_orders(segment);
    let net_sales = sum_net_sales(segment);
    CustomerSegmentStats {
        orders,
        net_sales,
        order_share_pct: ratio(orders as f64, completed_orders as f64),
        value_share_pct: ratio(net_sales, completed_net_sales),
        average_ticket: average(net_sales, orders),
    }
}

fn customer_comparison(segments: &Segments) -> CustomerComparison {
    let completed_orders = count_orders(&segments.completed);
    let completed_net_sales = sum_net_sales(&segments.completed);

    let returning = customer_stats(&segments.returning, completed_orders, completed_net_sales);
    let new = customer_stats(&segments.new, completed_orders, completed_net_sales);

    CustomerComparison {
        completed_orders,
        completed_net_sales,
        comparison: ComparisonSeries {
            categories: vec!["Returning".to_string(), "New".to_string()],
            orders: vec![returning.orders, new.orders],
            net_sales: vec![returning.net_sales, new.net_sales],
        },
        returning_ticket_higher: returning.average_ticket > new.average_ticket,
        healthy_repurchase_rate: returning.order_share_pct > HEALTHY_REPURCHASE_PCT,
        returning,
        new,
    }
}

fn segment_totals(segment: &Segment) -> SegmentTotals {
    SegmentTotals {
        orders: count_orders(segment),
        net_sales: sum_net_sales(segment),
    }
}

fn addi_breakdown(segments: &Segments) -> AddiBreakdown {
    let total = segment_totals(&segments.addi_total);
    let shop = segment_totals(&segments.addi_shop);
    let normal = segment_totals(&segments.addi_normal);

    AddiBreakdown {
        shop_order_share_pct: ratio(shop.orders as f64, total.orders as f64),
        shop_value_share_pct: ratio(shop.net_sales, total.net_sales),
        total,
        shop,
        normal,
    }
}

fn table_row(row: &SalesRow) -> TableRow {
    TableRow {
        order_id: row.order_id.clone(),
        date: row.date.clone(),
        product: row.product_text.clone(),
        quantity: row.quantity,
        net_sales_raw: row.net_sales_raw.clone(),
        status: row.status_raw.clone(),
        payment_method: row.payment_method_raw.clone(),
        attribution: row.attribution.clone(),
    }
}

fn diagnostics(
    table: &RawTable,
    columns: &ColumnMap,
    rows: &[SalesRow],
    completed: &Segment,
) -> ReportDiagnostics {
    let customer_type_distribution =
        aggregate::value_counts(completed.iter().map(|r| r.customer_type.as_str()))
            .into_iter()
            .map(|(label, count)| SeriesPoint {
                label,
                value: count as f64,
            })
            .collect();

    ReportDiagnostics {
        headers: table.headers.clone(),
        columns: columns.describe(),
        customer_type_values: aggregate::distinct_in_order(
            rows.iter().map(|r| r.customer_type.as_str()),
        ),
        customer_type_distribution,
        payment_subtype_values: aggregate::distinct_in_order(
            rows.iter().map(|r| r.payment_subtype_raw.as_str()),
        ),
    }
}
