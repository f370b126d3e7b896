use std::sync::Arc;
use tokio::sync::Mutex;

use crate::core::config::SubmissionConfig;
use crate::features::geocoding::services::GeocodeResolver;
use crate::features::reports::models::{
    CreateFloodReport, PhotoUpload, ReportStatus, SubmissionContext, SubmissionForm,
    SubmissionReceipt, SubmissionRejection,
};
use crate::modules::sheets::{MirrorOutcome, MirrorRecord, ReportMirror};
use crate::modules::storage::PhotoStorage;
use crate::shared::constants::{
    ALLOWED_PHOTO_EXTENSIONS, FLOOD_HEIGHT_PLACEHOLDER, MAX_ADDRESS_LENGTH,
};
use crate::shared::time::{format_timestamp, now_wib};

use super::{DailyLimitService, DuplicateGuard, ReportService, SubmissionGate};

const MSG_GEOCODED: &str = "Report submitted successfully. The location has been placed on the map.";
const MSG_NOT_GEOCODED: &str =
    "Report submitted successfully. The location could not be determined automatically.";

/// Validates, stores, geocodes and mirrors a citizen flood report
pub struct ReportSubmissionPipeline {
    gate: Arc<SubmissionGate>,
    duplicates: Arc<DuplicateGuard>,
    daily_limit: Arc<DailyLimitService>,
    reports: Arc<ReportService>,
    photos: Arc<dyn PhotoStorage>,
    resolver: Option<Arc<GeocodeResolver>>,
    mirror: Option<Arc<dyn ReportMirror>>,
    config: SubmissionConfig,
    /// Serializes the duplicate re-check with the insert
    insert_lock: Mutex<()>,
}

impl ReportSubmissionPipeline {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        gate: Arc<SubmissionGate>,
        duplicates: Arc<DuplicateGuard>,
        daily_limit: Arc<DailyLimitService>,
        reports: Arc<ReportService>,
        photos: Arc<dyn PhotoStorage>,
        resolver: Option<Arc<GeocodeResolver>>,
        mirror: Option<Arc<dyn ReportMirror>>,
        config: SubmissionConfig,
    ) -> Self {
        Self {
            gate,
            duplicates,
            daily_limit,
            reports,
            photos,
            resolver,
            mirror,
            config,
            insert_lock: Mutex::new(()),
        }
    }

    /// Runs the submission on its own task so a dropped request cannot
    /// interrupt it between the photo write and the insert
    pub async fn submit_detached(
        self: &Arc<Self>,
        form: SubmissionForm,
        photo: Option<PhotoUpload>,
        context: SubmissionContext,
    ) -> Result<SubmissionReceipt, SubmissionRejection> {
        let pipeline = Arc::clone(self);
        let task = tokio::spawn(async move { pipeline.submit(form, photo, &context).await });

        task.await.map_err(|e| {
            tracing::error!("Submission task failed: {}", e);
            SubmissionRejection::PersistenceFailed
        })?
    }

    pub async fn submit(
        &self,
        form: SubmissionForm,
        photo: Option<PhotoUpload>,
        context: &SubmissionContext,
    ) -> Result<SubmissionReceipt, SubmissionRejection> {
        if !self
            .gate
            .consume_if_valid(&context.session, form.form_token.trim())
            .await
        {
            tracing::warn!("Rejected submission with invalid form token from {}", context.client_ip);
            return Err(SubmissionRejection::InvalidToken);
        }

        let form = normalize_form(form);
        let photo = validate_fields(&form, photo)?;
        self.validate_photo(&photo)?;

        if self
            .duplicates
            .is_duplicate(&form.address, &form.reporter_name, &form.flood_height, now_wib())
            .await
        {
            tracing::warn!("Rejected duplicate report from {}", context.client_ip);
            return Err(SubmissionRejection::Duplicate);
        }

        let photo_path = self
            .photos
            .save(&photo.filename, &photo.bytes)
            .await
            .map_err(|e| {
                tracing::error!("Failed to store photo '{}': {}", photo.filename, e);
                SubmissionRejection::PhotoStorageFailed
            })?;

        if self
            .daily_limit
            .is_limit_reached(&context.client_ip, now_wib().date())
            .await
        {
            self.photos.delete(&photo_path).await;
            return Err(SubmissionRejection::DailyLimitReached(
                self.daily_limit.max_per_day(),
            ));
        }

        let (report_id, stored) = match self.insert(&form, context, &photo_path).await {
            Ok(inserted) => inserted,
            Err(rejection) => {
                self.photos.delete(&photo_path).await;
                return Err(rejection);
            }
        };

        let geocoded = self.geocode(report_id, &form.address).await;
        let mirrored = self.mirror(&stored).await;

        Ok(SubmissionReceipt {
            report_id,
            geocoded,
            mirrored,
            message: if geocoded { MSG_GEOCODED } else { MSG_NOT_GEOCODED }.to_string(),
        })
    }

    fn validate_photo(&self, photo: &PhotoUpload) -> Result<(), SubmissionRejection> {
        if photo.bytes.len() > self.config.max_photo_bytes {
            return Err(SubmissionRejection::InvalidPhoto(format!(
                "Photo is too large (maximum {} MB)",
                self.config.max_photo_bytes / (1024 * 1024)
            )));
        }

        let allowed = photo
            .extension()
            .is_some_and(|ext| ALLOWED_PHOTO_EXTENSIONS.contains(&ext.as_str()));
        if !allowed {
            return Err(SubmissionRejection::InvalidPhoto(format!(
                "Unsupported photo format (allowed: {})",
                ALLOWED_PHOTO_EXTENSIONS.join(", ")
            )));
        }

        Ok(())
    }

    /// Re-check for a duplicate and insert, under the insert lock
    async fn insert(
        &self,
        form: &SubmissionForm,
        context: &SubmissionContext,
        photo_path: &str,
    ) -> Result<(i64, CreateFloodReport), SubmissionRejection> {
        let _guard = self.insert_lock.lock().await;
        let submitted_at = now_wib();

        if self
            .duplicates
            .is_duplicate(&form.address, &form.reporter_name, &form.flood_height, submitted_at)
            .await
        {
            tracing::warn!("Rejected duplicate report from {} on re-check", context.client_ip);
            return Err(SubmissionRejection::Duplicate);
        }

        let data = CreateFloodReport {
            submitted_at,
            address: form.address.clone(),
            flood_height: form.flood_height.clone(),
            reporter_name: form.reporter_name.clone(),
            reporter_phone: form.reporter_phone.clone(),
            client_ip: context.client_ip.clone(),
            photo_path: photo_path.to_string(),
        };

        match self.reports.create(&data).await {
            Ok(id) if id >= 1 => Ok((id, data)),
            Ok(id) => {
                tracing::error!("Store returned invalid report id {}", id);
                Err(SubmissionRejection::PersistenceFailed)
            }
            Err(e) => {
                tracing::error!("Failed to save flood report: {}", e);
                Err(SubmissionRejection::PersistenceFailed)
            }
        }
    }

    /// Best effort; the outcome only decides the user message
    async fn geocode(&self, report_id: i64, address: &str) -> bool {
        let Some(resolver) = &self.resolver else {
            return false;
        };

        match resolver
            .resolve_with_retry(address, self.config.geocode_retry_delay)
            .await
        {
            Ok(location) => {
                match self
                    .reports
                    .record_geocode_success(report_id, &location, now_wib())
                    .await
                {
                    Ok(stored) => {
                        tracing::info!(
                            "Report {} geocoded to ({}, {}) with {} confidence",
                            report_id,
                            location.latitude,
                            location.longitude,
                            location.confidence
                        );
                        stored
                    }
                    Err(e) => {
                        tracing::warn!("Could not store coordinates for report {}: {}", report_id, e);
                        false
                    }
                }
            }
            Err(e) => {
                tracing::warn!("Geocoding failed for report {}: {}", report_id, e);
                if let Err(e) = self.reports.record_geocode_failure(report_id).await {
                    tracing::warn!("Could not record geocode failure for report {}: {}", report_id, e);
                }
                false
            }
        }
    }

    async fn mirror(&self, data: &CreateFloodReport) -> bool {
        let Some(mirror) = &self.mirror else {
            return false;
        };

        let record = MirrorRecord {
            timestamp: format_timestamp(&data.submitted_at),
            address: data.address.clone(),
            flood_height: data.flood_height.clone(),
            reporter_name: data.reporter_name.clone(),
            reporter_phone: data.reporter_phone.clone().unwrap_or_default(),
            client_ip: data.client_ip.clone(),
            photo_path: data.photo_path.clone(),
            status: ReportStatus::Pending.to_string(),
        };

        match mirror.append(&record).await {
            Ok(MirrorOutcome::Appended) => {
                tracing::info!("Report {} mirrored to spreadsheet", record.timestamp);
                true
            }
            Ok(MirrorOutcome::AlreadyPresent) => {
                tracing::info!("Report {} already present in spreadsheet", record.timestamp);
                true
            }
            Err(e) => {
                tracing::error!("Spreadsheet mirror failed: {}", e);
                false
            }
        }
    }
}

fn normalize_form(form: SubmissionForm) -> SubmissionForm {
    SubmissionForm {
        form_token: form.form_token,
        address: form.address.trim().to_string(),
        flood_height: form.flood_height.trim().to_string(),
        reporter_name: form.reporter_name.trim().to_string(),
        reporter_phone: form
            .reporter_phone
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty()),
    }
}

/// Every missing or malformed field contributes its own message
fn validate_fields(
    form: &SubmissionForm,
    photo: Option<PhotoUpload>,
) -> Result<PhotoUpload, SubmissionRejection> {
    let mut errors = Vec::new();

    if form.address.is_empty() {
        errors.push("Address is required".to_string());
    } else if form.address.chars().count() > MAX_ADDRESS_LENGTH {
        errors.push(format!(
            "Address must be at most {} characters",
            MAX_ADDRESS_LENGTH
        ));
    }

    if form.flood_height.is_empty() || form.flood_height == FLOOD_HEIGHT_PLACEHOLDER {
        errors.push("Flood height must be selected".to_string());
    }

    if form.reporter_name.is_empty() {
        errors.push("Reporter name is required".to_string());
    }

    let photo = photo.filter(|p| !p.filename.trim().is_empty());
    if photo.is_none() {
        errors.push("Photo is required".to_string());
    }

    match photo {
        Some(photo) if errors.is_empty() => Ok(photo),
        _ => Err(SubmissionRejection::InvalidFields(errors)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::geocoding::models::{AddressTags, GeocodeCandidate, GeocodeError};
    use crate::features::reports::models::GeocodeState;
    use crate::modules::storage::LocalPhotoStorage;
    use crate::shared::test_helpers::{test_pool, StubMirror, StubPlaceSearch};
    use std::time::Duration;
    use tempfile::TempDir;

    struct Harness {
        pipeline: Arc<ReportSubmissionPipeline>,
        gate: Arc<SubmissionGate>,
        reports: Arc<ReportService>,
        pool: sqlx::SqlitePool,
        uploads: TempDir,
        search: Arc<StubPlaceSearch>,
        mirror: Arc<StubMirror>,
    }

    impl Harness {
        async fn new(search: StubPlaceSearch) -> Self {
            Self::with_config(search, StubMirror::accepting(), test_config()).await
        }

        async fn with_config(
            search: StubPlaceSearch,
            mirror: StubMirror,
            config: SubmissionConfig,
        ) -> Self {
            let pool = test_pool().await;
            let uploads = tempfile::tempdir().unwrap();
            let reports = Arc::new(ReportService::new(pool.clone()));
            let gate = Arc::new(SubmissionGate::new(config.session_ttl));
            let search = Arc::new(search);
            let mirror = Arc::new(mirror);

            let pipeline = Arc::new(ReportSubmissionPipeline::new(
                gate.clone(),
                Arc::new(DuplicateGuard::new(reports.clone(), config.duplicate_window)),
                Arc::new(DailyLimitService::new(
                    reports.clone(),
                    config.max_reports_per_day,
                )),
                reports.clone(),
                Arc::new(LocalPhotoStorage::new(uploads.path())),
                Some(Arc::new(GeocodeResolver::new(search.clone()))),
                Some(mirror.clone()),
                config,
            ));

            Self {
                pipeline,
                gate,
                reports,
                pool,
                uploads,
                search,
                mirror,
            }
        }

        async fn form(&self, session: &str) -> SubmissionForm {
            SubmissionForm {
                form_token: self.gate.issue(session).await,
                address: "Desa Ngadipiro, Kecamatan Sidoharjo, Wonogiri".to_string(),
                flood_height: "50 cm".to_string(),
                reporter_name: "Budi".to_string(),
                reporter_phone: Some("081234567890".to_string()),
            }
        }

        fn stored_files(&self) -> usize {
            std::fs::read_dir(self.uploads.path()).unwrap().count()
        }
    }

    fn test_config() -> SubmissionConfig {
        SubmissionConfig {
            geocode_retry_delay: Duration::ZERO,
            ..SubmissionConfig::default()
        }
    }

    fn context(session: &str) -> SubmissionContext {
        SubmissionContext {
            session: session.to_string(),
            client_ip: "10.0.0.1".to_string(),
        }
    }

    fn jpeg(size: usize) -> Option<PhotoUpload> {
        Some(PhotoUpload {
            filename: "banjir.jpg".to_string(),
            bytes: vec![0xFF; size],
        })
    }

    fn wonogiri() -> GeocodeCandidate {
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
    async fn test_end_to_end_submission() {
        let h = Harness::new(StubPlaceSearch::returning(vec![wonogiri()])).await;
        let form = h.form("s1").await;

        let receipt = h
            .pipeline
            .submit(form, jpeg(1024 * 1024), &context("s1"))
            .await
            .unwrap();

        assert!(receipt.report_id >= 1);
        assert!(receipt.geocoded);
        assert!(receipt.mirrored);
        assert_eq!(receipt.message, MSG_GEOCODED);

        let report = h.reports.get_by_id(receipt.report_id).await.unwrap();
        assert_eq!(report.status, ReportStatus::Pending);
        assert_eq!(report.geocode_state, GeocodeState::Succeeded);
        let lat = report.latitude.unwrap();
        let lon = report.longitude.unwrap();
        assert!((-11.0..=6.0).contains(&lat));
        assert!((95.0..=141.0).contains(&lon));
        assert!(report.geocode_confidence.is_some());
        assert_eq!(report.reporter_phone.as_deref(), Some("081234567890"));
        assert_eq!(h.stored_files(), 1);

        let mirrored = h.mirror.records().await;
        assert_eq!(mirrored.len(), 1);
        assert_eq!(mirrored[0].reporter_name, "Budi");
        assert_eq!(mirrored[0].timestamp, format_timestamp(&report.submitted_at));
    }

    #[tokio::test]
    async fn test_geocode_failure_does_not_block_persistence() {
        let h = Harness::new(StubPlaceSearch::failing(GeocodeError::Timeout)).await;
        let form = h.form("s1").await;

        let receipt = h
            .pipeline
            .submit(form, jpeg(2048), &context("s1"))
            .await
            .unwrap();

        assert!(!receipt.geocoded);
        assert_eq!(receipt.message, MSG_NOT_GEOCODED);
        // One attempt plus exactly one retry
        assert_eq!(h.search.calls(), 2);

        let report = h.reports.get_by_id(receipt.report_id).await.unwrap();
        assert_eq!(report.geocode_state, GeocodeState::Failed);
        assert!(report.latitude.is_none());
        assert!(report.geocode_confidence.is_none());
    }

    #[tokio::test]
    async fn test_invalid_token_is_rejected() {
        let h = Harness::new(StubPlaceSearch::returning(vec![wonogiri()])).await;
        let mut form = h.form("s1").await;
        form.form_token = "forged".to_string();

        let result = h.pipeline.submit(form, jpeg(10), &context("s1")).await;
        assert_eq!(result, Err(SubmissionRejection::InvalidToken));
        assert_eq!(h.stored_files(), 0);
    }

    #[tokio::test]
    async fn test_token_replay_is_rejected() {
        let h = Harness::new(StubPlaceSearch::returning(vec![wonogiri()])).await;
        let form = h.form("s1").await;

        h.pipeline
            .submit(form.clone(), jpeg(10), &context("s1"))
            .await
            .unwrap();

        let mut replay = form;
        replay.flood_height = "1 m".to_string();
        let result = h.pipeline.submit(replay, jpeg(10), &context("s1")).await;
        assert_eq!(result, Err(SubmissionRejection::InvalidToken));
    }

    #[tokio::test]
    async fn test_all_missing_fields_are_reported() {
        let h = Harness::new(StubPlaceSearch::returning(Vec::new())).await;
        let form = SubmissionForm {
            form_token: h.gate.issue("s1").await,
            address: "   ".to_string(),
            flood_height: FLOOD_HEIGHT_PLACEHOLDER.to_string(),
            reporter_name: String::new(),
            reporter_phone: None,
        };

        let result = h.pipeline.submit(form, None, &context("s1")).await;
        match result {
            Err(SubmissionRejection::InvalidFields(errors)) => assert_eq!(errors.len(), 4),
            other => panic!("expected field errors, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_photo_constraints() {
        let h = Harness::new(StubPlaceSearch::returning(Vec::new())).await;

        let form = h.form("s1").await;
        let too_large = jpeg(5 * 1024 * 1024 + 1);
        assert!(matches!(
            h.pipeline.submit(form, too_large, &context("s1")).await,
            Err(SubmissionRejection::InvalidPhoto(_))
        ));

        let form = h.form("s1").await;
        let wrong_type = Some(PhotoUpload {
            filename: "laporan.pdf".to_string(),
            bytes: vec![1, 2, 3],
        });
        assert!(matches!(
            h.pipeline.submit(form, wrong_type, &context("s1")).await,
            Err(SubmissionRejection::InvalidPhoto(_))
        ));

        let form = h.form("s1").await;
        let exactly_max = jpeg(5 * 1024 * 1024);
        assert!(h.pipeline.submit(form, exactly_max, &context("s1")).await.is_ok());
    }

    #[tokio::test]
    async fn test_duplicate_within_window_is_rejected() {
        let h = Harness::new(StubPlaceSearch::returning(Vec::new())).await;

        let form = h.form("s1").await;
        h.pipeline.submit(form, jpeg(10), &context("s1")).await.unwrap();

        let form = h.form("s2").await;
        let result = h.pipeline.submit(form, jpeg(10), &context("s2")).await;
        assert_eq!(result, Err(SubmissionRejection::Duplicate));
        assert_eq!(h.stored_files(), 1);
    }

    #[tokio::test]
    async fn test_daily_limit_cleans_up_photo() {
        let config = SubmissionConfig {
            max_reports_per_day: 1,
            ..test_config()
        };
        let h = Harness::with_config(
            StubPlaceSearch::returning(Vec::new()),
            StubMirror::accepting(),
            config,
        )
        .await;

        let form = h.form("s1").await;
        h.pipeline.submit(form, jpeg(10), &context("s1")).await.unwrap();

        let mut form = h.form("s1").await;
        form.address = "Jalan Slamet Riyadi 10, Surakarta".to_string();
        let result = h.pipeline.submit(form, jpeg(10), &context("s1")).await;
        assert_eq!(result, Err(SubmissionRejection::DailyLimitReached(1)));
        assert_eq!(h.stored_files(), 1);
    }

    #[tokio::test]
    async fn test_insert_failure_cleans_up_photo() {
        let h = Harness::new(StubPlaceSearch::returning(Vec::new())).await;
        let form = h.form("s1").await;
        h.pool.close().await;

        let result = h.pipeline.submit(form, jpeg(10), &context("s1")).await;
        assert_eq!(result, Err(SubmissionRejection::PersistenceFailed));
        assert_eq!(h.stored_files(), 0);
    }

    #[tokio::test]
    async fn test_mirror_failure_is_swallowed() {
        let h = Harness::with_config(
            StubPlaceSearch::returning(Vec::new()),
            StubMirror::failing(),
            test_config(),
        )
        .await;
        let form = h.form("s1").await;

        let receipt = h
            .pipeline
            .submit(form, jpeg(10), &context("s1"))
            .await
            .unwrap();
        assert!(!receipt.mirrored);
        assert!(h.reports.get_by_id(receipt.report_id).await.is_ok());
    }

    #[tokio::test]
    async fn test_concurrent_identical_submissions_store_one_row() {
        let h = Harness::new(StubPlaceSearch::returning(Vec::new())).await;
        let form_a = h.form("s1").await;
        let form_b = h.form("s2").await;

        let ctx_a = context("s1");
        let ctx_b = context("s2");
        let (a, b) = tokio::join!(
            h.pipeline.submit(form_a, jpeg(10), &ctx_a),
            h.pipeline.submit(form_b, jpeg(10), &ctx_b),
        );

        let successes = [a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count();
        assert_eq!(successes, 1);
        assert!(matches!(a, Err(SubmissionRejection::Duplicate)) || matches!(b, Err(SubmissionRejection::Duplicate)));

        let (_, total) = h
            .reports
            .list(&crate::shared::types::PaginationQuery::default())
            .await
            .unwrap();
        assert_eq!(total, 1);
        assert_eq!(h.stored_files(), 1);
    }

    #[tokio::test]
    async fn test_dropped_detached_submission_still_stores_report() {
        let h = Harness::new(StubPlaceSearch::returning(Vec::new())).await;
        let form = h.form("s1").await;

        // Hold the insert so the caller gives up after the photo is written
        let guard = h.pipeline.insert_lock.lock().await;
        let pending = tokio::time::timeout(
            Duration::from_millis(200),
            h.pipeline.submit_detached(form, jpeg(10), context("s1")),
        )
        .await;
        assert!(pending.is_err());
        assert_eq!(h.stored_files(), 1);
        drop(guard);

        let mut total = 0;
        for _ in 0..100 {
            let (_, count) = h
                .reports
                .list(&crate::shared::types::PaginationQuery::default())
                .await
                .unwrap();
            total = count;
            if total == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }

        assert_eq!(total, 1);
        assert_eq!(h.stored_files(), 1);
    }

    #[tokio::test]
    async fn test_detached_submission_returns_receipt() {
        let h = Harness::new(StubPlaceSearch::returning(vec![wonogiri()])).await;
        let form = h.form("s1").await;

        let receipt = h
            .pipeline
            .submit_detached(form, jpeg(10), context("s1"))
            .await
            .unwrap();

        assert!(receipt.geocoded);
        assert!(h.reports.get_by_id(receipt.report_id).await.is_ok());
    }

    #[test]
    fn test_normalize_form_drops_blank_phone() {
        let form = normalize_form(SubmissionForm {
            form_token: "t".to_string(),
            address: "  Jalan Merdeka  ".to_string(),
            flood_height: " 50 cm ".to_string(),
            reporter_name: " Budi ".to_string(),
            reporter_phone: Some("   ".to_string()),
        });
        assert_eq!(form.address, "Jalan Merdeka");
        assert_eq!(form.flood_height, "50 cm");
        assert_eq!(form.reporter_name, "Budi");
        assert!(form.reporter_phone.is_none());
    }
}
