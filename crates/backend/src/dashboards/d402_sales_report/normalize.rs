use once_cell::sync::Lazy;
use regex::Regex;

use super::columns::{ColumnMap, LogicalField};
use super::error::ReportError;
use crate::usecases::u508_load_sales_export::RawTable;

/// Leading "<N>x" / "<N>×" quantity prefix of a product description, ASCII digits only
static QUANTITY_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^([0-9]+)[x×]").expect("invalid quantity regex"));

/// One order line with its raw text and derived fields.
///
/// Built once by [`normalize_rows`] and never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct SalesRow {
    pub order_id: String,
    pub date: String,
    pub product_text: String,
    pub status_raw: String,
    pub payment_method_raw: String,
    pub payment_subtype_raw: String,
    pub attribution: String,
    pub net_sales_raw: String,
    pub customer_type_raw: String,

    /// Always >= 1
    pub quantity: u64,
    pub net_sales: f64,
    pub status: String,
    pub payment_method: String,
    pub payment_subtype: String,
    pub customer_type: String,
}

/// Quantity encoded as a leading "<N>x" prefix, 1 when absent.
///
/// A zero prefix counts as absent. A prefix too large for `u64` is logged
/// and counts as absent as well.
pub fn parse_quantity(product_text: &str) -> u64 {
    let Some(caps) = QUANTITY_PREFIX.captures(product_text.trim()) else {
        return 1;
    };

    match caps[1].parse::<u64>() {
        Ok(0) => 1,
        Ok(quantity) => quantity,
        Err(e) => {
            tracing::warn!(
                "Quantity prefix '{}' of '{}' not usable ({}), counting 1",
                &caps[1],
                product_text,
                e
            );
            1
        }
    }
}

/// Parse a currency cell such as "$1,234.50".
///
/// Every `$` and `,` is removed before parsing; an empty remainder is zero.
pub fn parse_net_sales(raw: &str, row: usize) -> Result<f64, ReportError> {
    let cleaned: String = raw.chars().filter(|c| *c != '$' && *c != ',').collect();
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return Ok(0.0);
    }

    cleaned
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ReportError::Parse {
            row,
            value: raw.to_string(),
        })
}

/// Lower-cased and trimmed copy; absent values become ""
pub fn normalize_category(raw: Option<&str>) -> String {
    raw.map(|s| s.trim().to_lowercase()).unwrap_or_default()
}

/// Derive typed rows from the raw export.
///
/// Fails on the first unparseable net sales cell. Unresolved optional
/// columns yield empty values for every row.
pub fn normalize_rows(table: &RawTable, columns: &ColumnMap) -> Result<Vec<SalesRow>, ReportError> {
    let order_id_col = columns.require(LogicalField::OrderId)?;
    let date_col = columns.require(LogicalField::Date)?;
    let product_col = columns.require(LogicalField::Product)?;
    let net_sales_col = columns.require(LogicalField::NetSales)?;
    let status_col = columns.require(LogicalField::Status)?;
    let payment_col = columns.require(LogicalField::PaymentMethod)?;
    let attribution_col = columns.require(LogicalField::Attribution)?;
    let customer_col = columns.index(LogicalField::CustomerType);
    let subtype_col = columns.index(LogicalField::PaymentSubtype);

    let mut rows = Vec::with_capacity(table.len());

    for idx in 0..table.len() {
        let cell = |col: usize| table.cell(idx, col);
        let optional = |col: Option<usize>| col.map(|c| table.cell(idx, c));

        let product_text = cell(product_col).to_string();
        let net_sales_raw = cell(net_sales_col).to_string();
        let net_sales = parse_net_sales(&net_sales_raw, idx + 1)?;

        rows.push(SalesRow {
            order_id: cell(order_id_col).to_string(),
            date: cell(date_col).to_string(),
            quantity: parse_quantity(&product_text),
            product_text,
            status_raw: cell(status_col).to_string(),
            payment_method_raw: cell(payment_col).to_string(),
            payment_subtype_raw: optional(subtype_col).unwrap_or_default().to_string(),
            attribution: cell(attribution_col).to_string(),
            net_sales,
            net_sales_raw,
            customer_type_raw: optional(customer_col).unwrap_or_default().to_string(),
            status: normalize_category(Some(cell(status_col))),
            payment_method: normalize_category(Some(cell(payment_col))),
            payment_subtype: normalize_category(optional(subtype_col)),
            customer_type: normalize_category(optional(customer_col)),
        });
    }

    Ok(rows)
}
