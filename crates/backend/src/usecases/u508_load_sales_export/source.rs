use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;

use crate::dashboards::d402_sales_report::error::ReportError;
use crate::shared::config::SourceConfig;

/// Where a sales export comes from
#[async_trait]
pub trait SalesSource: Send + Sync {
    /// Stable identity of the export, used as the cache key
    fn source_id(&self) -> &str;

    /// Fetch the export as CSV text
    async fn fetch_csv(&self) -> Result<String, ReportError>;
}

/// HTTP client for a published spreadsheet CSV export
pub struct SheetClient {
    client: reqwest::Client,
    url: String,
}

impl SheetClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, ReportError> {
        Ok(Self {
            client: reqwest::Client::builder().timeout(timeout).build()?,
            url: url.into(),
        })
    }

    /// CSV export URL of one sheet tab
    pub fn export_url(sheet_id: &str, gid: u64) -> String {
        format!(
            "https://docs.google.com/spreadsheets/d/{}/export?format=csv&gid={}",
            sheet_id, gid
        )
    }
}

#[async_trait]
impl SalesSource for SheetClient {
    fn source_id(&self) -> &str {
        &self.url
    }

    async fn fetch_csv(&self) -> Result<String, ReportError> {
        tracing::info!("Fetching sales export: GET {}", self.url);

        let response = self.client.get(&self.url).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let preview: String = body.chars().take(500).collect();
            tracing::error!("Sales export request failed: {} {}", status, preview);
            return Err(ReportError::SourceStatus {
                status: status.as_u16(),
                body: preview,
            });
        }

        let body = response.text().await?;
        tracing::info!("Sales export fetched: {} bytes", body.len());
        Ok(body)
    }
}

/// Export saved on disk
pub struct LocalFileSource {
    path: PathBuf,
    id: String,
}

impl LocalFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let id = path.display().to_string();
        Self { path, id }
    }
}

#[async_trait]
impl SalesSource for LocalFileSource {
    fn source_id(&self) -> &str {
        &self.id
    }

    async fn fetch_csv(&self) -> Result<String, ReportError> {
        tracing::info!("Reading sales export from {}", self.path.display());
        Ok(tokio::fs::read_to_string(&self.path).await?)
    }
}

/// Pick the source described by configuration.
///
/// `csv_path` wins over `csv_url`, which wins over `sheet_id` + `gid`.
pub fn source_from_config(config: &SourceConfig) -> Result<Box<dyn SalesSource>, ReportError> {
    if let Some(path) = &config.csv_path {
        return Ok(Box::new(LocalFileSource::new(path)));
    }

    let url = match &config.csv_url {
        Some(url) => url.clone(),
        None => SheetClient::export_url(&config.sheet_id, config.gid),
    };
    let timeout = Duration::from_secs(config.request_timeout_secs);
    Ok(Box::new(SheetClient::new(url, timeout)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SourceConfig {
        SourceConfig {
            sheet_id: "abc123".to_string(),
            gid: 0,
            csv_url: None,
            csv_path: None,
            cache_ttl_secs: 300,
            request_timeout_secs: 30,
        }
    }

    #[test]
    fn test_export_url() {
        assert_eq!(
            SheetClient::export_url("abc123", 7),
            "https://docs.google.com/spreadsheets/d/abc123/export?format=csv&gid=7"
        );
    }

    #[test]
    fn test_source_selection() {
        let source = source_from_config(&config()).unwrap();
        assert!(source.source_id().ends_with("/d/abc123/export?format=csv&gid=0"));

        let mut cfg = config();
        cfg.csv_url = Some("http://localhost:8080/export.csv".to_string());
        let source = source_from_config(&cfg).unwrap();
        assert_eq!(source.source_id(), "http://localhost:8080/export.csv");

        cfg.csv_path = Some("exports/october.csv".to_string());
        let source = source_from_config(&cfg).unwrap();
        assert!(source.source_id().ends_with("october.csv"));
    }

    #[tokio::test]
    async fn test_local_file_source_missing_file() {
        let source = LocalFileSource::new("does/not/exist.csv");
        let err = source.fetch_csv().await.unwrap_err();
        assert!(matches!(err, ReportError::Io(_)));
    }
}
