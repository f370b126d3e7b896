use std::sync::Arc;

use axum::{routing::get, Router};

use crate::features::geocoding::handlers::{self, GeocodingState};
use crate::features::geocoding::services::GeocodeResolver;

/// Create routes for the geocoding feature (public)
pub fn routes(resolver: Arc<GeocodeResolver>) -> Router {
    let state = GeocodingState { resolver };

    Router::new()
        .route("/api/geocode", get(handlers::resolve_address))
        .route("/api/geocode/status", get(handlers::geocode_status))
        .with_state(state)
}
