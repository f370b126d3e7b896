use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;

use crate::core::error::Result;
use crate::features::geocoding::models::GeocodeFailureReason;
use crate::features::geocoding::services::GeocodeResolver;
use crate::features::reports::services::ReportService;
use crate::shared::time::now_wib;

/// Counts of one backfill pass
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BackfillSummary {
    pub succeeded: usize,
    pub not_found: usize,
    pub out_of_bounds: usize,
    pub other_failures: usize,
}

impl BackfillSummary {
    pub fn total(&self) -> usize {
        self.succeeded + self.not_found + self.out_of_bounds + self.other_failures
    }
}

/// Background worker that geocodes reports stored without coordinates
pub struct GeocodeBackfill {
    reports: Arc<ReportService>,
    resolver: Arc<GeocodeResolver>,
    interval: Duration,
    batch_size: i64,
    max_attempts: i64,
}

impl GeocodeBackfill {
    pub fn new(
        reports: Arc<ReportService>,
        resolver: Arc<GeocodeResolver>,
        interval: Duration,
        batch_size: i64,
        max_attempts: i64,
    ) -> Self {
        Self {
            reports,
            resolver,
            interval,
            batch_size,
            max_attempts,
        }
    }

    /// Run the backfill in a background loop
    pub async fn run(&self) {
        tracing::info!(
            "Starting geocode backfill worker (every {:?}, batch {})",
            self.interval,
            self.batch_size
        );

        let mut interval = interval(self.interval);

        loop {
            interval.tick().await;

            if let Err(e) = self.process_batch().await {
                tracing::error!("Error processing geocode backfill batch: {:?}", e);
            }
        }
    }

    /// Geocode one batch of pending reports
    pub async fn process_batch(&self) -> Result<BackfillSummary> {
        let pending = self
            .reports
            .list_pending_geocode(self.max_attempts, self.batch_size)
            .await?;

        let mut summary = BackfillSummary::default();
        if pending.is_empty() {
            return Ok(summary);
        }

        tracing::info!("Geocoding {} pending reports", pending.len());

        for report in pending {
            match self.resolver.resolve(&report.address).await {
                Ok(location) => {
                    self.reports
                        .record_geocode_success(report.id, &location, now_wib())
                        .await?;
                    summary.succeeded += 1;
                }
                Err(e) => {
                    tracing::debug!("Backfill geocoding failed for report {}: {}", report.id, e);
                    self.reports.record_geocode_failure(report.id).await?;
                    match e.reason() {
                        GeocodeFailureReason::NotFound => summary.not_found += 1,
                        GeocodeFailureReason::OutOfBounds => summary.out_of_bounds += 1,
                        _ => summary.other_failures += 1,
                    }
                }
            }
        }

        tracing::info!(
            "Geocode backfill done: {} succeeded, {} not found, {} out of bounds, {} other failures",
            summary.succeeded,
            summary.not_found,
            summary.out_of_bounds,
            summary.other_failures
        );

        Ok(summary)
    }
}
