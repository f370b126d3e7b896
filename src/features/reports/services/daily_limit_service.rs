use chrono::NaiveDate;
use std::sync::Arc;

use super::ReportService;

/// Caps the number of reports one client IP may submit per WIB day
pub struct DailyLimitService {
    reports: Arc<ReportService>,
    max_per_day: i64,
}

impl DailyLimitService {
    pub fn new(reports: Arc<ReportService>, max_per_day: i64) -> Self {
        Self {
            reports,
            max_per_day,
        }
    }

    pub fn max_per_day(&self) -> i64 {
        self.max_per_day
    }

    /// True when the IP already submitted the daily maximum.
    ///
    /// Store errors never block a submission.
    pub async fn is_limit_reached(&self, client_ip: &str, day: NaiveDate) -> bool {
        match self.reports.count_by_ip_on(client_ip, day).await {
            Ok(count) => {
                if count >= self.max_per_day {
                    tracing::warn!(
                        "Daily report limit reached for {}: {}/{}",
                        client_ip,
                        count,
                        self.max_per_day
                    );
                    true
                } else {
                    false
                }
            }
            Err(e) => {
                tracing::warn!("Daily limit check failed, allowing submission: {}", e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_helpers::{report_at, test_pool};

    #[tokio::test]
    async fn test_limit_counts_only_same_ip_and_day() {
        let reports = Arc::new(ReportService::new(test_pool().await));
        for minute in 0..3 {
            let data = report_at(&format!("2026-02-01 08:0{}:00", minute));
            reports.create(&data).await.unwrap();
        }

        let limits = DailyLimitService::new(reports.clone(), 3);
        let day = NaiveDate::from_ymd_opt(2026, 2, 1).unwrap();
        let next_day = NaiveDate::from_ymd_opt(2026, 2, 2).unwrap();

        assert!(limits.is_limit_reached("10.0.0.1", day).await);
        assert!(!limits.is_limit_reached("10.0.0.2", day).await);
        assert!(!limits.is_limit_reached("10.0.0.1", next_day).await);

        let roomier = DailyLimitService::new(reports, 4);
        assert!(!roomier.is_limit_reached("10.0.0.1", day).await);
    }

    #[tokio::test]
    async fn test_store_error_fails_open() {
        let pool = test_pool().await;
        let reports = Arc::new(ReportService::new(pool.clone()));
        pool.close().await;

        let limits = DailyLimitService::new(reports, 0);
        let day = NaiveDate::from_ymd_opt(2026, 2, 1).unwrap();
        assert!(!limits.is_limit_reached("10.0.0.1", day).await);
    }
}
