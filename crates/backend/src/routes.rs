use axum::{
    routing::{get, post},
    Router,
};

use crate::api::handlers;

/// All application routes
pub fn configure_routes() -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        // D402 Sales report
        .route(
            "/api/d402/sales_report",
            get(handlers::d402_sales_report::get_sales_report),
        )
        .route(
            "/api/d402/sales_report/refresh",
            post(handlers::d402_sales_report::refresh_sales_report),
        )
}
