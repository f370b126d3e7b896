use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::features::geocoding::dtos::{GeocodeQuery, GeocodeResponseDto, GeocodeStatusDto};
use crate::features::geocoding::services::GeocodeResolver;
use crate::shared::types::ApiResponse;

/// State for geocoding handlers
#[derive(Clone)]
pub struct GeocodingState {
    pub resolver: Arc<GeocodeResolver>,
}

/// Resolve a free-text address to coordinates
#[utoipa::path(
    get,
    path = "/api/geocode",
    params(GeocodeQuery),
    responses(
        (status = 200, description = "Location found", body = ApiResponse<GeocodeResponseDto>),
        (status = 400, description = "Address too short or too long"),
        (status = 404, description = "No matching location"),
        (status = 422, description = "Location outside Indonesia"),
        (status = 502, description = "Place search provider unavailable")
    ),
    tag = "geocoding"
)]
pub async fn resolve_address(
    State(state): State<GeocodingState>,
    Query(query): Query<GeocodeQuery>,
) -> Result<Json<ApiResponse<GeocodeResponseDto>>> {
    query
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let location = state.resolver.resolve(&query.address).await?;
    Ok(Json(ApiResponse::success(Some(location.into()), None, None)))
}

/// Check whether the place search provider is reachable
#[utoipa::path(
    get,
    path = "/api/geocode/status",
    responses(
        (status = 200, description = "Provider status", body = ApiResponse<GeocodeStatusDto>)
    ),
    tag = "geocoding"
)]
pub async fn geocode_status(
    State(state): State<GeocodingState>,
) -> Result<Json<ApiResponse<GeocodeStatusDto>>> {
    let reachable = state.resolver.test_connection().await;
    Ok(Json(ApiResponse::success(
        Some(GeocodeStatusDto { reachable }),
        None,
        None,
    )))
}
