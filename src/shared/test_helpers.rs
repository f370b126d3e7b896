use async_trait::async_trait;
use chrono::NaiveDateTime;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::collections::VecDeque;
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Mutex;

use crate::core::database;
use crate::features::geocoding::models::{GeocodeCandidate, GeocodeError};
use crate::features::geocoding::services::PlaceSearch;
use crate::features::reports::models::CreateFloodReport;
use crate::modules::sheets::{MirrorError, MirrorOutcome, MirrorRecord, ReportMirror};

/// In-memory SQLite pool with migrations applied.
///
/// A single connection that never expires, so every query sees the same database.
pub async fn test_pool() -> SqlitePool {
    let options = SqliteConnectOptions::from_str("sqlite::memory:").unwrap();
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .unwrap();
    database::run_migrations(&pool).await.unwrap();
    pool
}

/// Report from 10.0.0.1 submitted at the given WIB time (`YYYY-MM-DD HH:MM:SS`)
pub fn report_at(submitted_at: &str) -> CreateFloodReport {
    CreateFloodReport {
        submitted_at: NaiveDateTime::parse_from_str(submitted_at, "%Y-%m-%d %H:%M:%S").unwrap(),
        address: "Desa Ngadipiro, Kecamatan Sidoharjo, Wonogiri".to_string(),
        flood_height: "50 cm".to_string(),
        reporter_name: "Budi".to_string(),
        reporter_phone: None,
        client_ip: "10.0.0.1".to_string(),
        photo_path: "deadbeef_banjir.jpg".to_string(),
    }
}

type SearchResult = Result<Vec<GeocodeCandidate>, GeocodeError>;

/// Place search stub with call counting.
///
/// Replays queued results in order, then repeats the fallback.
pub struct StubPlaceSearch {
    queued: Mutex<VecDeque<SearchResult>>,
    fallback: SearchResult,
    calls: AtomicUsize,
    last_query: std::sync::Mutex<Option<String>>,
    reachable: bool,
}

impl StubPlaceSearch {
    fn new(queued: Vec<SearchResult>, fallback: SearchResult) -> Self {
        Self {
            queued: Mutex::new(queued.into()),
            fallback,
            calls: AtomicUsize::new(0),
            last_query: std::sync::Mutex::new(None),
            reachable: true,
        }
    }

    pub fn returning(candidates: Vec<GeocodeCandidate>) -> Self {
        Self::new(Vec::new(), Ok(candidates))
    }

    pub fn failing(error: GeocodeError) -> Self {
        let mut stub = Self::new(Vec::new(), Err(error));
        stub.reachable = false;
        stub
    }

    pub fn sequence(results: Vec<SearchResult>) -> Self {
        Self::new(results, Err(GeocodeError::NotFound))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_query(&self) -> Option<String> {
        self.last_query.lock().unwrap().clone()
    }
}

#[async_trait]
impl PlaceSearch for StubPlaceSearch {
    async fn search(&self, query: &str, _country_code: &str, _limit: u8) -> SearchResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_query.lock().unwrap() = Some(query.to_string());

        match self.queued.lock().await.pop_front() {
            Some(result) => result,
            None => self.fallback.clone(),
        }
    }

    async fn test_connection(&self) -> bool {
        self.reachable
    }
}

/// Spreadsheet mirror stub that records appended rows
pub struct StubMirror {
    records: Mutex<Vec<MirrorRecord>>,
    fail: bool,
}

impl StubMirror {
    pub fn accepting() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub async fn records(&self) -> Vec<MirrorRecord> {
        self.records.lock().await.clone()
    }
}

#[async_trait]
impl ReportMirror for StubMirror {
    async fn append(&self, record: &MirrorRecord) -> Result<MirrorOutcome, MirrorError> {
        if self.fail {
            return Err(MirrorError::Request("sheet unavailable".to_string()));
        }
        let mut records = self.records.lock().await;
        if records.iter().any(|r| r.timestamp == record.timestamp) {
            return Ok(MirrorOutcome::AlreadyPresent);
        }
        records.push(record.clone());
        Ok(MirrorOutcome::Appended)
    }
}
