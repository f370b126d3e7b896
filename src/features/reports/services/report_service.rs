use chrono::{NaiveDate, NaiveDateTime};
use sqlx::SqlitePool;

use crate::core::error::{AppError, Result};
use crate::features::geocoding::models::ResolvedLocation;
use crate::features::reports::models::{CreateFloodReport, FloodReport, ReportStatus};
use crate::shared::types::PaginationQuery;

const REPORT_COLUMNS: &str = r#"
    id, submitted_at, report_date, address, flood_height, reporter_name,
    reporter_phone, client_ip, photo_path, status, latitude, longitude,
    geocode_state, geocode_confidence, geocode_attempts, geocoded_at, created_at
"#;

/// Service for flood report persistence
pub struct ReportService {
    pool: SqlitePool,
}

impl ReportService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a report and return the id assigned by the store
    pub async fn create(&self, data: &CreateFloodReport) -> Result<i64> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO flood_reports (
                submitted_at, report_date, address, flood_height, reporter_name,
                reporter_phone, client_ip, photo_path, status
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, 'pending')
            RETURNING id
            "#,
        )
        .bind(data.submitted_at)
        .bind(data.submitted_at.date())
        .bind(&data.address)
        .bind(&data.flood_height)
        .bind(&data.reporter_name)
        .bind(&data.reporter_phone)
        .bind(&data.client_ip)
        .bind(&data.photo_path)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create flood report: {:?}", e);
            AppError::Database(e)
        })?;

        tracing::info!("Created flood report: {}", id);
        Ok(id)
    }

    pub async fn get_by_id(&self, id: i64) -> Result<FloodReport> {
        let query = format!("SELECT {} FROM flood_reports WHERE id = ?", REPORT_COLUMNS);
        sqlx::query_as::<_, FloodReport>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Report {} not found", id)))
    }

    /// Reports with identical address, reporter and height submitted at or after `since`
    pub async fn count_recent_duplicates(
        &self,
        address: &str,
        reporter_name: &str,
        flood_height: &str,
        since: NaiveDateTime,
    ) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM flood_reports
            WHERE address = ? AND reporter_name = ? AND flood_height = ?
              AND submitted_at >= ?
            "#,
        )
        .bind(address)
        .bind(reporter_name)
        .bind(flood_height)
        .bind(since)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    /// Reports submitted from one client IP on a WIB calendar day
    pub async fn count_by_ip_on(&self, client_ip: &str, report_date: NaiveDate) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM flood_reports WHERE client_ip = ? AND report_date = ?",
        )
        .bind(client_ip)
        .bind(report_date)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    /// Store coordinates unless the report already has some.
    ///
    /// Returns false when nothing was written.
    pub async fn record_geocode_success(
        &self,
        id: i64,
        location: &ResolvedLocation,
        geocoded_at: NaiveDateTime,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE flood_reports
            SET latitude = ?, longitude = ?, geocode_confidence = ?,
                geocode_state = 'succeeded', geocode_attempts = geocode_attempts + 1,
                geocoded_at = ?
            WHERE id = ? AND latitude IS NULL AND longitude IS NULL
            "#,
        )
        .bind(location.latitude)
        .bind(location.longitude)
        .bind(location.confidence)
        .bind(geocoded_at)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to store coordinates for report {}: {:?}", id, e);
            AppError::Database(e)
        })?;

        Ok(result.rows_affected() > 0)
    }

    /// Mark a geocoding attempt as failed; reports with coordinates are left alone
    pub async fn record_geocode_failure(&self, id: i64) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE flood_reports
            SET geocode_state = 'failed', geocode_attempts = geocode_attempts + 1
            WHERE id = ? AND latitude IS NULL
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to record geocode failure for report {}: {:?}", id, e);
            AppError::Database(e)
        })?;

        Ok(())
    }

    pub async fn update_status(&self, id: i64, status: ReportStatus) -> Result<FloodReport> {
        let result = sqlx::query("UPDATE flood_reports SET status = ? WHERE id = ?")
            .bind(status)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Report {} not found", id)));
        }

        tracing::info!("Report {} status changed to {}", id, status);
        self.get_by_id(id).await
    }

    /// Newest first, with the total row count
    pub async fn list(&self, pagination: &PaginationQuery) -> Result<(Vec<FloodReport>, i64)> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM flood_reports")
            .fetch_one(&self.pool)
            .await?;

        let query = format!(
            "SELECT {} FROM flood_reports ORDER BY id DESC LIMIT ? OFFSET ?",
            REPORT_COLUMNS
        );
        let reports = sqlx::query_as::<_, FloodReport>(&query)
            .bind(pagination.limit())
            .bind(pagination.offset())
            .fetch_all(&self.pool)
            .await?;

        Ok((reports, total))
    }

    /// Reports without coordinates that still have geocoding attempts left
    pub async fn list_pending_geocode(
        &self,
        max_attempts: i64,
        limit: i64,
    ) -> Result<Vec<FloodReport>> {
        let query = format!(
            r#"
            SELECT {} FROM flood_reports
            WHERE latitude IS NULL
              AND geocode_state IN ('not_attempted', 'failed')
              AND geocode_attempts < ?
            ORDER BY id ASC
            LIMIT ?
            "#,
            REPORT_COLUMNS
        );

        let reports = sqlx::query_as::<_, FloodReport>(&query)
            .bind(max_attempts)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(reports)
    }
}
