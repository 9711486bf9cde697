use crate::dashboards::d402_sales_report::error::ReportError;

/// Export as read from CSV: trimmed headers plus untouched cell text
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub records: Vec<Vec<String>>,
}

impl RawTable {
    /// Parse CSV text with a header row.
    ///
    /// Records may be shorter or longer than the header row; missing cells
    /// read as empty strings through [`RawTable::cell`].
    pub fn from_csv(csv_text: &str) -> Result<Self, ReportError> {
        // Strip UTF-8 BOM if present
        let text = csv_text.trim_start_matches('\u{FEFF}');

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(text.as_bytes());

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let mut records = Vec::new();
        for result in reader.records() {
            let record = result?;
            records.push(record.iter().map(str::to_string).collect());
        }

        tracing::info!(
            "Loaded export: {} columns, {} rows",
            headers.len(),
            records.len()
        );
        tracing::debug!("Export headers: {:?}", headers);

        Ok(Self { headers, records })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Cell text, empty when the record is shorter than `column`
    pub fn cell(&self, row: usize, column: usize) -> &str {
        self.records
            .get(row)
            .and_then(|r| r.get(column))
            .map(String::as_str)
            .unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headers_are_trimmed() {
        let table = RawTable::from_csv(" Pedido # ,Estado \n1,completed\n").unwrap();
        assert_eq!(table.headers, vec!["Pedido #", "Estado"]);
        assert_eq!(table.len(), 1);
        assert_eq!(table.cell(0, 1), "completed");
    }

    #[test]
    fn test_bom_and_short_records() {
        let table = RawTable::from_csv("\u{FEFF}a,b,c\n1,2\n3,4,5\n").unwrap();
        assert_eq!(table.headers[0], "a");
        assert_eq!(table.cell(0, 2), "");
        assert_eq!(table.cell(1, 2), "5");
        assert_eq!(table.cell(7, 0), "");
    }

    #[test]
    fn test_quoted_currency_cells_keep_commas() {
        let table = RawTable::from_csv("Ventas netas\n\"$1,234.50\"\n").unwrap();
        assert_eq!(table.cell(0, 0), "$1,234.50");
    }

    #[test]
    fn test_header_only_export_is_empty() {
        let table = RawTable::from_csv("a,b\n").unwrap();
        assert!(table.is_empty());
    }
}
