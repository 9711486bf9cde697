use contracts::dashboards::d402_sales_report::{ResolutionMethod, ResolvedColumnInfo};
use std::collections::HashMap;

use super::error::ReportError;

/// Semantic columns the report reads from an export
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalField {
    OrderId,
    Date,
    Product,
    NetSales,
    Status,
    PaymentMethod,
    Attribution,
    CustomerType,
    PaymentSubtype,
}

/// Ordered resolution rule for one logical field
struct ResolutionRule {
    /// Header spellings seen in real exports, compared verbatim
    literals: &'static [&'static str],
    /// Tokens that must all appear in the lower-cased header
    keywords: &'static [&'static str],
    /// Tokens that disqualify a keyword match
    excluded: &'static [&'static str],
    /// Take the column right after this field's column as a last resort
    follows: Option<LogicalField>,
}

const ORDER_ID_RULE: ResolutionRule = ResolutionRule {
    literals: &["Pedido #", "pedido #", "Pedido", "Order #", "Order ID"],
    keywords: &["pedido"],
    excluded: &[],
    follows: None,
};

const DATE_RULE: ResolutionRule = ResolutionRule {
    literals: &["Fecha", "fecha", "Date"],
    keywords: &["fecha"],
    excluded: &[],
    follows: None,
};

const PRODUCT_RULE: ResolutionRule = ResolutionRule {
    literals: &["Producto(s)", "producto(s)", "Productos", "Producto", "Product(s)"],
    keywords: &["producto"],
    excluded: &[],
    follows: None,
};

const NET_SALES_RULE: ResolutionRule = ResolutionRule {
    literals: &["Ventas netas", "ventas netas", "Ventas Netas", "Net sales"],
    keywords: &["ventas", "netas"],
    excluded: &[],
    follows: None,
};

const STATUS_RULE: ResolutionRule = ResolutionRule {
    literals: &["Estado", "estado", "Status"],
    keywords: &["estado"],
    excluded: &[],
    follows: None,
};

const PAYMENT_METHOD_RULE: ResolutionRule = ResolutionRule {
    literals: &["pago", "Pago", "PAGO", "Payment method"],
    keywords: &["pago"],
    excluded: &["tipo"],
    follows: None,
};

const ATTRIBUTION_RULE: ResolutionRule = ResolutionRule {
    literals: &["atribucion", "Atribucion", "atribución", "Atribución", "Attribution"],
    keywords: &["atribuci"],
    excluded: &[],
    follows: None,
};

const CUSTOMER_TYPE_RULE: ResolutionRule = ResolutionRule {
    literals: &["Tipo de cliente", "tipo de cliente", "tipo_cliente", "tipo cliente"],
    keywords: &["tipo", "cliente"],
    excluded: &[],
    follows: None,
};

const PAYMENT_SUBTYPE_RULE: ResolutionRule = ResolutionRule {
    literals: &["tipo pago", "tipo_pago", "tipopago", "Tipo pago", "Tipo Pago", "TIPO PAGO"],
    keywords: &["tipo", "pago"],
    excluded: &[],
    follows: Some(LogicalField::PaymentMethod),
};

impl LogicalField {
    /// Resolution order; a field with a positional fallback comes after its anchor
    pub const ALL: [LogicalField; 9] = [
        LogicalField::OrderId,
        LogicalField::Date,
        LogicalField::Product,
        LogicalField::NetSales,
        LogicalField::Status,
        LogicalField::PaymentMethod,
        LogicalField::Attribution,
        LogicalField::CustomerType,
        LogicalField::PaymentSubtype,
    ];

    pub fn name(self) -> &'static str {
        match self {
            LogicalField::OrderId => "order_id",
            LogicalField::Date => "date",
            LogicalField::Product => "product",
            LogicalField::NetSales => "net_sales",
            LogicalField::Status => "status",
            LogicalField::PaymentMethod => "payment_method",
            LogicalField::Attribution => "attribution",
            LogicalField::CustomerType => "customer_type",
            LogicalField::PaymentSubtype => "payment_subtype",
        }
    }

    /// Optional fields degrade to empty values; the rest abort the report
    pub fn is_required(self) -> bool {
        !matches!(self, LogicalField::CustomerType | LogicalField::PaymentSubtype)
    }

    fn rule(self) -> &'static ResolutionRule {
        match self {
            LogicalField::OrderId => &ORDER_ID_RULE,
            LogicalField::Date => &DATE_RULE,
            LogicalField::Product => &PRODUCT_RULE,
            LogicalField::NetSales => &NET_SALES_RULE,
            LogicalField::Status => &STATUS_RULE,
            LogicalField::PaymentMethod => &PAYMENT_METHOD_RULE,
            LogicalField::Attribution => &ATTRIBUTION_RULE,
            LogicalField::CustomerType => &CUSTOMER_TYPE_RULE,
            LogicalField::PaymentSubtype => &PAYMENT_SUBTYPE_RULE,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedColumn {
    pub name: String,
    pub index: usize,
    pub method: ResolutionMethod,
}

/// Find the header backing `field`, first match wins:
/// exact literal, then keywords, then the column after the anchor field.
pub fn resolve_column(
    headers: &[String],
    field: LogicalField,
    resolved: &ColumnMap,
) -> Option<ResolvedColumn> {
    let rule = field.rule();

    for literal in rule.literals {
        if let Some(index) = headers.iter().position(|h| h == literal) {
            return Some(ResolvedColumn {
                name: headers[index].clone(),
                index,
                method: ResolutionMethod::Exact,
            });
        }
    }

    let keyword_match = headers.iter().position(|h| {
        let lower = h.trim().to_lowercase();
        rule.keywords.iter().all(|k| lower.contains(k))
            && !rule.excluded.iter().any(|x| lower.contains(x))
    });
    if let Some(index) = keyword_match {
        return Some(ResolvedColumn {
            name: headers[index].clone(),
            index,
            method: ResolutionMethod::Keywords,
        });
    }

    let anchor = rule.follows.and_then(|f| resolved.index(f))?;
    let index = anchor + 1;
    headers.get(index).map(|name| ResolvedColumn {
        name: name.clone(),
        index,
        method: ResolutionMethod::Positional,
    })
}

/// Resolved columns of one export
#[derive(Debug, Clone, Default)]
pub struct ColumnMap {
    columns: HashMap<LogicalField, ResolvedColumn>,
}

impl ColumnMap {
    pub fn resolve(headers: &[String]) -> Self {
        let mut map = ColumnMap::default();
        for field in LogicalField::ALL {
            match resolve_column(headers, field, &map) {
                Some(column) => {
                    tracing::debug!(
                        "Column {} -> '{}' ({:?})",
                        field.name(),
                        column.name,
                        column.method
                    );
                    map.columns.insert(field, column);
                }
                None => tracing::debug!("Column {} not resolved", field.name()),
            }
        }
        map
    }

    pub fn get(&self, field: LogicalField) -> Option<&ResolvedColumn> {
        self.columns.get(&field)
    }

    pub fn index(&self, field: LogicalField) -> Option<usize> {
        self.columns.get(&field).map(|c| c.index)
    }

    /// Fail on an unresolved required field
    pub fn require(&self, field: LogicalField) -> Result<usize, ReportError> {
        self.index(field)
            .ok_or(ReportError::RequiredColumnMissing(field.name()))
    }

    pub fn missing_optional(&self) -> Vec<LogicalField> {
        LogicalField::ALL
            .into_iter()
            .filter(|f| !f.is_required() && !self.columns.contains_key(f))
            .collect()
    }

    pub fn describe(&self) -> Vec<ResolvedColumnInfo> {
        LogicalField::ALL
            .iter()
            .map(|field| {
                let column = self.get(*field);
                ResolvedColumnInfo {
                    field: field.name().to_string(),
                    column: column.map(|c| c.name.clone()),
                    method: column.map(|c| c.method),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_exact_literal_wins() {
        let h = headers(&["Pedido #", "Estado", "pago", "Tipo Pago"]);
        let map = ColumnMap::resolve(&h);
        let sub = map.get(LogicalField::PaymentSubtype).unwrap();
        assert_eq!(sub.name, "Tipo Pago");
        assert_eq!(sub.method, ResolutionMethod::Exact);
        assert_eq!(map.index(LogicalField::PaymentMethod), Some(2));
    }

    #[test]
    fn test_keyword_match_on_renamed_header() {
        let h = headers(&["pago", "Cliente", "  TIPO DE PAGO (addi) ", "Tipo Cliente Final"]);
        let map = ColumnMap::resolve(&h);

        let sub = map.get(LogicalField::PaymentSubtype).unwrap();
        assert_eq!(sub.index, 2);
        assert_eq!(sub.method, ResolutionMethod::Keywords);

        let customer = map.get(LogicalField::CustomerType).unwrap();
        assert_eq!(customer.name, "Tipo Cliente Final");
        assert_eq!(customer.method, ResolutionMethod::Keywords);
    }

    #[test]
    fn test_payment_method_keyword_skips_subtype_column() {
        let h = headers(&["Tipo de pago", "Medio de pago"]);
        let map = ColumnMap::resolve(&h);
        assert_eq!(map.index(LogicalField::PaymentMethod), Some(1));
        assert_eq!(map.index(LogicalField::PaymentSubtype), Some(0));
    }

    #[test]
    fn test_positional_fallback_after_payment_method() {
        let h = headers(&["Estado", "pago", "Unnamed: 7", "atribucion"]);
        let map = ColumnMap::resolve(&h);
        let sub = map.get(LogicalField::PaymentSubtype).unwrap();
        assert_eq!(sub.name, "Unnamed: 7");
        assert_eq!(sub.method, ResolutionMethod::Positional);
    }

    #[test]
    fn test_no_positional_fallback_when_payment_method_is_last() {
        let h = headers(&["Estado", "pago"]);
        let map = ColumnMap::resolve(&h);
        assert!(map.get(LogicalField::PaymentSubtype).is_none());
        assert_eq!(
            map.missing_optional(),
            vec![LogicalField::CustomerType, LogicalField::PaymentSubtype]
        );
    }

    #[test]
    fn test_required_column_missing() {
        let h = headers(&["Estado"]);
        let map = ColumnMap::resolve(&h);
        assert!(map.require(LogicalField::Status).is_ok());
        let err = map.require(LogicalField::NetSales).unwrap_err();
        assert!(matches!(err, ReportError::RequiredColumnMissing("net_sales")));
    }

    #[test]
    fn test_describe_lists_every_field() {
        let h = headers(&["Fecha"]);
        let info = ColumnMap::resolve(&h).describe();
        assert_eq!(info.len(), LogicalField::ALL.len());
        assert_eq!(info[1].column.as_deref(), Some("Fecha"));
        assert_eq!(info[0].column, None);
        assert_eq!(info[0].method, None);
    }
}
