use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::features::geocoding::models::{GeocodeConfidence, ResolvedLocation};

/// Query parameters for resolving an address
#[derive(Debug, Deserialize, IntoParams, Validate)]
pub struct GeocodeQuery {
    /// Free-text address, at least 5 characters
    #[validate(length(max = 500, message = "Address must not exceed 500 characters"))]
    pub address: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GeocodeResponseDto {
    pub latitude: f64,
    pub longitude: f64,
    pub confidence: GeocodeConfidence,
}

impl From<ResolvedLocation> for GeocodeResponseDto {
    fn from(location: ResolvedLocation) -> Self {
        Self {
            latitude: location.latitude,
            longitude: location.longitude,
            confidence: location.confidence,
        }
    }
}

/// Reachability of the place search provider
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GeocodeStatusDto {
    pub reachable: bool,
}
