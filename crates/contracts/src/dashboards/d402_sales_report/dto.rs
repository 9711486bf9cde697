use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Full sales report handed to the renderer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalesReport {
    pub generated_at: DateTime<Utc>,
    /// Identifier of the export the report was built from (URL or file path)
    pub source_id: String,
    pub headline: HeadlineMetrics,
    pub top_product: Option<TopEntry>,
    pub top_attribution: Option<TopEntry>,
    pub top_payment: Option<TopPayment>,
    pub refunds: RefundSummary,
    pub charts: ChartSeries,
    pub customers: CustomerComparison,
    pub addi: AddiBreakdown,
    /// Pass-through rows for the interactive table, in load order
    pub table: Vec<TableRow>,
    pub diagnostics: ReportDiagnostics,
    pub warnings: Vec<ReportWarning>,
}

/// Totals over completed sales (refunded rows counted separately)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HeadlineMetrics {
    pub completed_rows: usize,
    pub refunded_rows: usize,
    pub units_sold: u64,
    pub net_sales_total: f64,
}

/// Winner of a top-by-quantity selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopEntry {
    pub label: String,
    pub quantity: u64,
}

/// Most used payment method with its value and distinct order count
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopPayment {
    pub method: String,
    pub quantity: u64,
    pub net_sales: f64,
    pub orders: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RefundSummary {
    pub rows: usize,
    pub orders: usize,
    pub net_sales: f64,
    /// Order ids of refunded rows, one per row
    pub order_ids: Vec<String>,
}

/// One bar of a chart series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub label: String,
    pub value: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
    /// Units per product text, largest first
    pub quantity_by_product: Vec<SeriesPoint>,
    /// Units per payment method, ordered by label
    pub quantity_by_payment_method: Vec<SeriesPoint>,
}

/// Returning vs. new customers among completed sales
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomerComparison {
    pub completed_orders: usize,
    pub completed_net_sales: f64,
    pub returning: CustomerSegmentStats,
    pub new: CustomerSegmentStats,
    pub comparison: ComparisonSeries,
    /// Returning average ticket is strictly greater than the new one
    pub returning_ticket_higher: bool,
    /// Returning share of completed orders is above the healthy threshold (25%)
    pub healthy_repurchase_rate: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomerSegmentStats {
    pub orders: usize,
    pub net_sales: f64,
    /// Percentage of completed orders
    pub order_share_pct: f64,
    /// Percentage of completed net sales
    pub value_share_pct: f64,
    pub average_ticket: f64,
}

/// Two-category series for the side-by-side comparison chart
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComparisonSeries {
    pub categories: Vec<String>,
    pub orders: Vec<usize>,
    pub net_sales: Vec<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SegmentTotals {
    pub orders: usize,
    pub net_sales: f64,
}

/// Addi payments split by sub-type.
///
/// `shop` and `normal` do not necessarily add up to `total`: rows with any
/// other non-empty sub-type belong to neither.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AddiBreakdown {
    pub total: SegmentTotals,
    pub shop: SegmentTotals,
    pub normal: SegmentTotals,
    pub shop_order_share_pct: f64,
    pub shop_value_share_pct: f64,
}

/// Row of the interactive table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableRow {
    pub order_id: String,
    pub date: String,
    pub product: String,
    pub quantity: u64,
    pub net_sales_raw: String,
    pub status: String,
    pub payment_method: String,
    pub attribution: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolutionMethod {
    Exact,
    Keywords,
    Positional,
}

/// How a logical field was mapped onto the export's headers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedColumnInfo {
    /// Logical field name (e.g. "payment_subtype")
    pub field: String,
    /// Actual header, None when the field could not be resolved
    pub column: Option<String>,
    pub method: Option<ResolutionMethod>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportDiagnostics {
    pub headers: Vec<String>,
    pub columns: Vec<ResolvedColumnInfo>,
    pub customer_type_values: Vec<String>,
    /// Rows per normalized customer type among completed sales
    pub customer_type_distribution: Vec<SeriesPoint>,
    pub payment_subtype_values: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningCode {
    ColumnMissing,
    EmptySegment,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportWarning {
    pub code: WarningCode,
    pub message: String,
}

impl ReportWarning {
    pub fn new(code: WarningCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warning_code_serializes_snake_case() {
        let warning = ReportWarning::new(WarningCode::ColumnMissing, "tipo pago not found");
        let json = serde_json::to_value(&warning).unwrap();
        assert_eq!(json["code"], "column_missing");
        assert_eq!(json["message"], "tipo pago not found");
    }

    #[test]
    fn test_missing_top_entry_serializes_as_null() {
        let value = serde_json::to_value(Option::<TopEntry>::None).unwrap();
        assert!(value.is_null());

        let method = serde_json::to_value(ResolutionMethod::Positional).unwrap();
        assert_eq!(method, "positional");
    }
}
