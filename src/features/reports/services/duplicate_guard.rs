use chrono::NaiveDateTime;
use std::sync::Arc;
use std::time::Duration;

use super::ReportService;

/// Detects a resubmission of the same report within a short window
pub struct DuplicateGuard {
    reports: Arc<ReportService>,
    window: chrono::Duration,
}

impl DuplicateGuard {
    pub fn new(reports: Arc<ReportService>, window: Duration) -> Self {
        Self {
            reports,
            window: chrono::Duration::from_std(window).unwrap_or_else(|_| chrono::Duration::days(365)),
        }
    }

    /// True when an identical report was stored within the window before `now`.
    ///
    /// Store errors count as "not a duplicate".
    pub async fn is_duplicate(
        &self,
        address: &str,
        reporter_name: &str,
        flood_height: &str,
        now: NaiveDateTime,
    ) -> bool {
        let since = now
            .checked_sub_signed(self.window)
            .unwrap_or(NaiveDateTime::MIN);

        match self
            .reports
            .count_recent_duplicates(address, reporter_name, flood_height, since)
            .await
        {
            Ok(count) => count > 0,
            Err(e) => {
                tracing::warn!("Duplicate check failed, allowing submission: {}", e);
                false
            }
        }
    }
}
