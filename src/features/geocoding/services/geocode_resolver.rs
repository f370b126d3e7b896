use std::sync::Arc;
use std::time::Duration;

use crate::features::geocoding::models::{GeocodeError, ResolvedLocation};
use crate::shared::constants::{
    GEOCODE_CANDIDATE_LIMIT, GEOCODE_COUNTRY_CODE, MIN_GEOCODE_QUERY_LENGTH,
};

use super::{address_normalizer, bounds_validator, candidate_ranker, PlaceSearch};

/// Turns a free-text address into coordinates with a confidence label
pub struct GeocodeResolver {
    search: Arc<dyn PlaceSearch>,
}

impl GeocodeResolver {
    pub fn new(search: Arc<dyn PlaceSearch>) -> Self {
        Self { search }
    }

    pub async fn resolve(&self, address: &str) -> Result<ResolvedLocation, GeocodeError> {
        if address.trim().chars().count() < MIN_GEOCODE_QUERY_LENGTH {
            return Err(GeocodeError::TooShort);
        }

        let query = address_normalizer::normalize(address);
        let candidates = self
            .search
            .search(&query, GEOCODE_COUNTRY_CODE, GEOCODE_CANDIDATE_LIMIT)
            .await?;

        if candidates.is_empty() {
            tracing::info!("No geocode candidates for '{}'", query);
            return Err(GeocodeError::NotFound);
        }

        let best = candidate_ranker::select(candidates, address).ok_or(GeocodeError::NotFound)?;

        if !bounds_validator::is_valid(best.latitude, best.longitude) {
            tracing::warn!(
                "Geocode result for '{}' outside bounds: ({}, {})",
                address,
                best.latitude,
                best.longitude
            );
            return Err(GeocodeError::OutOfBounds {
                lat: best.latitude,
                lon: best.longitude,
            });
        }

        Ok(ResolvedLocation {
            latitude: best.latitude,
            longitude: best.longitude,
            confidence: best.address.confidence(),
        })
    }

    /// Resolve, and on a retryable failure wait `delay` and try exactly once more
    pub async fn resolve_with_retry(
        &self,
        address: &str,
        delay: Duration,
    ) -> Result<ResolvedLocation, GeocodeError> {
        match self.resolve(address).await {
            Err(e) if e.is_retryable() => {
                tracing::warn!("Geocoding failed ({}), retrying in {:?}", e, delay);
                tokio::time::sleep(delay).await;
                self.resolve(address).await
            }
            result => result,
        }
    }

    pub async fn test_connection(&self) -> bool {
        self.search.test_connection().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::geocoding::models::{AddressTags, GeocodeCandidate, GeocodeConfidence};
    use crate::shared::test_helpers::StubPlaceSearch;

    fn wonogiri_candidate() -> GeocodeCandidate {
        GeocodeCandidate {
            display_name: "Ngadipiro, Sidoharjo, Wonogiri, Jawa Tengah, Indonesia".to_string(),
            latitude: -7.8120,
            longitude: 110.9270,
            importance: 0.4,
            address: AddressTags {
                village: Some("Ngadipiro".to_string()),
                county: Some("Wonogiri".to_string()),
                state: Some("Jawa Tengah".to_string()),
                ..Default::default()
            },
        }
    }

    #[tokio::test]
    async fn test_short_address_makes_no_call() {
        let stub = Arc::new(StubPlaceSearch::returning(vec![wonogiri_candidate()]));
        let resolver = GeocodeResolver::new(stub.clone());

        assert_eq!(resolver.resolve("ab").await, Err(GeocodeError::TooShort));
        assert_eq!(resolver.resolve("  abc   ").await, Err(GeocodeError::TooShort));
        assert_eq!(stub.calls(), 0);
    }

    #[tokio::test]
    async fn test_resolves_best_candidate() {
        let stub = Arc::new(StubPlaceSearch::returning(vec![wonogiri_candidate()]));
        let resolver = GeocodeResolver::new(stub.clone());

        let location = resolver
            .resolve("Desa Ngadipiro, Kecamatan Sidoharjo, Wonogiri")
            .await
            .unwrap();

        assert_eq!(location.latitude, -7.8120);
        assert_eq!(location.longitude, 110.9270);
        assert_eq!(location.confidence, GeocodeConfidence::Medium);
        assert_eq!(
            stub.last_query().as_deref(),
            Some("ngadipiro, sidoharjo, wonogiri, Indonesia")
        );
    }

    #[tokio::test]
    async fn test_empty_results_is_not_found() {
        let stub = Arc::new(StubPlaceSearch::returning(Vec::new()));
        let resolver = GeocodeResolver::new(stub);

        assert_eq!(
            resolver.resolve("Jalan Tidak Ada").await,
            Err(GeocodeError::NotFound)
        );
    }

    #[tokio::test]
    async fn test_winner_outside_bounds_fails() {
        let mut outside = wonogiri_candidate();
        outside.latitude = 48.85;
        outside.longitude = 2.35;
        outside.importance = 1.0;

        let mut inside = wonogiri_candidate();
        inside.display_name = "Somewhere".to_string();
        inside.address = AddressTags::default();
        inside.importance = 0.0;

        let stub = Arc::new(StubPlaceSearch::returning(vec![inside, outside]));
        let resolver = GeocodeResolver::new(stub);

        assert_eq!(
            resolver
                .resolve("Desa Ngadipiro, Kecamatan Sidoharjo, Wonogiri")
                .await,
            Err(GeocodeError::OutOfBounds {
                lat: 48.85,
                lon: 2.35
            })
        );
    }

    #[tokio::test]
    async fn test_provider_errors_propagate() {
        let stub = Arc::new(StubPlaceSearch::failing(GeocodeError::Timeout));
        let resolver = GeocodeResolver::new(stub);

        assert_eq!(
            resolver.resolve("Jalan Merdeka, Bandung").await,
            Err(GeocodeError::Timeout)
        );
    }

    #[tokio::test]
    async fn test_retry_once_on_transient_failure() {
        let stub = Arc::new(StubPlaceSearch::sequence(vec![
            Err(GeocodeError::Connection("reset".to_string())),
            Ok(vec![wonogiri_candidate()]),
        ]));
        let resolver = GeocodeResolver::new(stub.clone());

        let location = resolver
            .resolve_with_retry("Ngadipiro, Wonogiri", Duration::ZERO)
            .await;
        assert!(location.is_ok());
        assert_eq!(stub.calls(), 2);
    }

    #[tokio::test]
    async fn test_retry_gives_up_after_second_failure() {
        let stub = Arc::new(StubPlaceSearch::failing(GeocodeError::Timeout));
        let resolver = GeocodeResolver::new(stub.clone());

        let result = resolver
            .resolve_with_retry("Ngadipiro, Wonogiri", Duration::ZERO)
            .await;
        assert_eq!(result, Err(GeocodeError::Timeout));
        assert_eq!(stub.calls(), 2);
    }

    #[tokio::test]
    async fn test_no_retry_for_out_of_bounds() {
        let mut outside = wonogiri_candidate();
        outside.latitude = 40.0;
        let stub = Arc::new(StubPlaceSearch::returning(vec![outside]));
        let resolver = GeocodeResolver::new(stub.clone());

        let result = resolver
            .resolve_with_retry("Ngadipiro, Wonogiri", Duration::ZERO)
            .await;
        assert!(matches!(result, Err(GeocodeError::OutOfBounds { .. })));
        assert_eq!(stub.calls(), 1);
    }
}
