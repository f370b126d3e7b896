use async_trait::async_trait;
use lazy_static::lazy_static;
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::core::config::GeocodingConfig;
use crate::features::geocoding::models::{AddressTags, GeocodeCandidate, GeocodeError};
use crate::shared::constants::MIN_GEOCODE_QUERY_LENGTH;

/// Provider usage policy: at most one request per 1.1 seconds
pub const MIN_REQUEST_INTERVAL: Duration = Duration::from_millis(1100);
pub const SEARCH_TIMEOUT: Duration = Duration::from_secs(15);
pub const STATUS_TIMEOUT: Duration = Duration::from_secs(5);

lazy_static! {
    /// Shared by every client in the process, the provider limit is global
    static ref PROVIDER_SPACER: RequestSpacer = RequestSpacer::new(MIN_REQUEST_INTERVAL);
}

/// Keeps a minimum gap between successive outbound requests
pub struct RequestSpacer {
    last_request: Mutex<Option<Instant>>,
    min_interval: Duration,
}

impl RequestSpacer {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            last_request: Mutex::new(None),
            min_interval,
        }
    }

    /// Wait until a request may be sent and claim the slot.
    ///
    /// The lock is held across the sleep so concurrent callers queue up
    /// behind each other instead of all waking at the same instant.
    pub async fn wait_turn(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.min_interval {
                let wait = self.min_interval - elapsed;
                tracing::debug!("Place search throttled for {:?}", wait);
                tokio::time::sleep(wait).await;
            }
        }
        *last = Some(Instant::now());
    }
}

/// Source of geocoding candidates for a free-text query
#[async_trait]
pub trait PlaceSearch: Send + Sync {
    async fn search(
        &self,
        query: &str,
        country_code: &str,
        limit: u8,
    ) -> Result<Vec<GeocodeCandidate>, GeocodeError>;

    /// Lightweight reachability check of the provider
    async fn test_connection(&self) -> bool;
}

/// Nominatim search result
#[derive(Debug, Deserialize)]
pub struct NominatimPlace {
    pub lat: String,
    pub lon: String,
    pub display_name: String,
    pub importance: Option<f64>,
    pub address: Option<AddressTags>,
}

impl NominatimPlace {
    fn into_candidate(self) -> Option<GeocodeCandidate> {
        let latitude = self.lat.parse::<f64>().ok()?;
        let longitude = self.lon.parse::<f64>().ok()?;

        Some(GeocodeCandidate {
            display_name: self.display_name,
            latitude,
            longitude,
            importance: self.importance.unwrap_or(0.0),
            address: self.address.unwrap_or_default(),
        })
    }
}

/// Convert raw provider results, skipping entries with unparseable coordinates
pub fn into_candidates(places: Vec<NominatimPlace>) -> Vec<GeocodeCandidate> {
    places
        .into_iter()
        .filter_map(|place| {
            let name = place.display_name.clone();
            let candidate = place.into_candidate();
            if candidate.is_none() {
                tracing::warn!("Skipping place with invalid coordinates: {}", name);
            }
            candidate
        })
        .collect()
}

/// Place search client for the OpenStreetMap Nominatim API
pub struct NominatimClient {
    client: reqwest::Client,
    base_url: String,
}

impl NominatimClient {
    pub fn new(config: &GeocodingConfig) -> Result<Self, GeocodeError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| GeocodeError::Provider(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl PlaceSearch for NominatimClient {
    async fn search(
        &self,
        query: &str,
        country_code: &str,
        limit: u8,
    ) -> Result<Vec<GeocodeCandidate>, GeocodeError> {
        let query = query.trim();
        if query.chars().count() < MIN_GEOCODE_QUERY_LENGTH {
            return Err(GeocodeError::TooShort);
        }

        let url = format!(
            "{}/search?q={}&format=json&limit={}&countrycodes={}&addressdetails=1",
            self.base_url,
            urlencoding::encode(query),
            limit,
            country_code
        );

        PROVIDER_SPACER.wait_turn().await;
        tracing::debug!("Place search: {}", url);

        let response = self
            .client
            .get(&url)
            .timeout(SEARCH_TIMEOUT)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Nominatim request failed: {:?}", e);
                GeocodeError::from(e)
            })?;

        if !response.status().is_success() {
            tracing::warn!("Nominatim returned status: {}", response.status());
            return Err(GeocodeError::HttpStatus(response.status().as_u16()));
        }

        let places: Vec<NominatimPlace> = response.json().await.map_err(|e| {
            tracing::error!("Failed to parse Nominatim response: {:?}", e);
            if e.is_timeout() {
                GeocodeError::Timeout
            } else {
                GeocodeError::Provider(format!("Failed to parse Nominatim response: {}", e))
            }
        })?;

        Ok(into_candidates(places))
    }

    async fn test_connection(&self) -> bool {
        let url = format!("{}/status.php", self.base_url);

        PROVIDER_SPACER.wait_turn().await;

        match self.client.get(&url).timeout(STATUS_TIMEOUT).send().await {
            Ok(response) if response.status().is_success() => true,
            Ok(response) => {
                tracing::warn!("Nominatim status check returned {}", response.status());
                false
            }
            Err(e) => {
                tracing::warn!("Nominatim status check failed: {}", e);
                false
            }
        }
    }
}
