use axum::{http::StatusCode, Json};
use contracts::dashboards::d402_sales_report::SalesReport;

use crate::dashboards::d402_sales_report::{error::ReportError, service};
use crate::shared::config::get_config;
use crate::usecases::u508_load_sales_export::{source_from_config, SOURCE_CACHE};

/// GET /api/d402/sales_report
pub async fn get_sales_report() -> Result<Json<SalesReport>, StatusCode> {
    tracing::info!("D402 Dashboard: Getting sales report");
    build_report(false).await
}

/// POST /api/d402/sales_report/refresh
pub async fn refresh_sales_report() -> Result<Json<SalesReport>, StatusCode> {
    tracing::info!("D402 Dashboard: Refreshing sales report");
    build_report(true).await
}

async fn build_report(refresh: bool) -> Result<Json<SalesReport>, StatusCode> {
    let config = get_config().map_err(|e| {
        tracing::error!("D402 Dashboard: Failed to load config: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    let source = source_from_config(&config.source).map_err(|e| {
        tracing::error!("D402 Dashboard: Failed to create source: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    if refresh {
        SOURCE_CACHE.invalidate(source.source_id()).await;
    }

    match service::get_sales_report(source.as_ref(), &SOURCE_CACHE, config.source.cache_ttl()).await
    {
        Ok(report) => {
            tracing::info!(
                "D402 Dashboard: Returning report with {} rows and {} warnings",
                report.table.len(),
                report.warnings.len()
            );
            Ok(Json(report))
        }
        Err(e) => {
            tracing::error!("D402 Dashboard: Failed to build sales report: {:#}", e);
            Err(status_for(&e))
        }
    }
}

fn status_for(error: &anyhow::Error) -> StatusCode {
    match error.downcast_ref::<ReportError>() {
        Some(e) if e.is_data_error() => StatusCode::UNPROCESSABLE_ENTITY,
        Some(e) if e.is_upstream_error() => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_for_report_errors() {
        let parse = anyhow::Error::new(ReportError::Parse {
            row: 3,
            value: "abc".to_string(),
        });
        assert_eq!(status_for(&parse), StatusCode::UNPROCESSABLE_ENTITY);

        let missing = anyhow::Error::new(ReportError::RequiredColumnMissing("status"));
        assert_eq!(status_for(&missing), StatusCode::UNPROCESSABLE_ENTITY);

        let upstream = anyhow::Error::new(ReportError::SourceStatus {
            status: 404,
            body: String::new(),
        });
        assert_eq!(status_for(&upstream), StatusCode::BAD_GATEWAY);

        let other = anyhow::anyhow!("boom");
        assert_eq!(status_for(&other), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
