use thiserror::Error;

/// Errors of the sales report pipeline
#[derive(Debug, Error)]
pub enum ReportError {
    /// Net sales cell that is not a number once `$` and `,` are removed
    #[error("row {row}: cannot parse net sales value '{value}'")]
    Parse { row: usize, value: String },

    #[error("required column '{0}' not found in export")]
    RequiredColumnMissing(&'static str),

    /// Optional column that could not be resolved; the field is treated as empty
    #[error("column '{0}' not found, values treated as empty")]
    ColumnMissing(&'static str),

    #[error("segment '{0}' has no rows")]
    EmptySegment(&'static str),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("source responded with status {status}: {body}")]
    SourceStatus { status: u16, body: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ReportError {
    /// Errors caused by the export content rather than by fetching it
    pub fn is_data_error(&self) -> bool {
        matches!(
            self,
            ReportError::Parse { .. } | ReportError::RequiredColumnMissing(_) | ReportError::Csv(_)
        )
    }

    pub fn is_upstream_error(&self) -> bool {
        matches!(self, ReportError::Http(_) | ReportError::SourceStatus { .. })
    }
}
