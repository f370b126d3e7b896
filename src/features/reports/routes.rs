use axum::{
    extract::DefaultBodyLimit,
    routing::{get, patch, post},
    Router,
};

use crate::features::reports::handlers::{self, ReportState};

/// Public routes for the reports feature
///
/// `photo_limit` bounds the multipart body; a megabyte is added for the
/// text fields and multipart overhead.
pub fn routes(state: ReportState, photo_limit: usize) -> Router {
    Router::new()
        .route(
            "/api/reports",
            post(handlers::submit_report).layer(DefaultBodyLimit::max(photo_limit + 1024 * 1024)),
        )
        .route("/api/reports/form-token", get(handlers::issue_form_token))
        .route("/api/reports/{id}", get(handlers::get_report))
        .with_state(state)
}

/// Operator routes (basic auth middleware is applied by the caller)
pub fn operator_routes(state: ReportState) -> Router {
    Router::new()
        .route("/api/admin/reports", get(handlers::list_reports))
        .route(
            "/api/admin/reports/{id}/status",
            patch(handlers::update_report_status),
        )
        .route(
            "/api/admin/reports/{id}/geocode",
            post(handlers::geocode_report),
        )
        .with_state(state)
}
