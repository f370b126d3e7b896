use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;

use super::token_manager::{AccessTokenProvider, TokenError};

const SHEETS_API_BASE_URL: &str = "https://sheets.googleapis.com/v4";

/// Column headers written to an empty worksheet
pub const HEADER_ROW: [&str; 8] = [
    "Timestamp",
    "Alamat",
    "Tinggi Banjir",
    "Nama Pelapor",
    "No HP",
    "IP Address",
    "Photo URL",
    "Status",
];

#[derive(Debug, Error)]
pub enum MirrorError {
    #[error(transparent)]
    Token(#[from] TokenError),

    #[error("Sheets request failed: {0}")]
    Request(String),

    #[error("Sheets API returned HTTP {status}: {body}")]
    Api { status: u16, body: String },
}

/// One report as written to the spreadsheet
#[derive(Debug, Clone, PartialEq)]
pub struct MirrorRecord {
    /// Idempotency key, matched against column A
    pub timestamp: String,
    pub address: String,
    pub flood_height: String,
    pub reporter_name: String,
    pub reporter_phone: String,
    pub client_ip: String,
    pub photo_path: String,
    pub status: String,
}

impl MirrorRecord {
    pub fn to_row(&self) -> Vec<String> {
        vec![
            self.timestamp.clone(),
            self.address.clone(),
            self.flood_height.clone(),
            self.reporter_name.clone(),
            self.reporter_phone.clone(),
            self.client_ip.clone(),
            self.photo_path.clone(),
            self.status.clone(),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MirrorOutcome {
    Appended,
    /// A row with the same timestamp was already in the sheet
    AlreadyPresent,
}

/// Best-effort secondary copy of stored reports
#[async_trait]
pub trait ReportMirror: Send + Sync {
    async fn append(&self, record: &MirrorRecord) -> Result<MirrorOutcome, MirrorError>;
}

#[derive(Debug, Default, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<String>>,
}

/// Appends report rows to a Google Sheets worksheet
pub struct SheetsMirror {
    tokens: Arc<dyn AccessTokenProvider>,
    client: reqwest::Client,
    base_url: String,
    spreadsheet_id: String,
    worksheet_name: String,
}

impl SheetsMirror {
    pub fn new(
        tokens: Arc<dyn AccessTokenProvider>,
        spreadsheet_id: String,
        worksheet_name: String,
    ) -> Self {
        Self::with_base_url(tokens, SHEETS_API_BASE_URL, spreadsheet_id, worksheet_name)
    }

    pub fn with_base_url(
        tokens: Arc<dyn AccessTokenProvider>,
        base_url: &str,
        spreadsheet_id: String,
        worksheet_name: String,
    ) -> Self {
        Self {
            tokens,
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            spreadsheet_id,
            worksheet_name,
        }
    }

    fn values_url(&self, range: &str) -> String {
        format!(
            "{}/spreadsheets/{}/values/{}",
            self.base_url,
            self.spreadsheet_id,
            urlencoding::encode(range)
        )
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, MirrorError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Err(MirrorError::Api { status, body })
    }

    /// First column of the worksheet, one entry per non-empty row
    async fn timestamps(&self, token: &str) -> Result<Vec<String>, MirrorError> {
        let range = format!("{}!A:A", self.worksheet_name);
        let response = self
            .client
            .get(self.values_url(&range))
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| MirrorError::Request(e.to_string()))?;

        let values: ValueRange = Self::check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| MirrorError::Request(e.to_string()))?;

        Ok(values
            .values
            .into_iter()
            .filter_map(|row| row.into_iter().next())
            .collect())
    }

    async fn append_row(&self, token: &str, row: Vec<String>) -> Result<(), MirrorError> {
        let range = format!("{}!A1", self.worksheet_name);
        let url = format!(
            "{}:append?valueInputOption=USER_ENTERED&insertDataOption=INSERT_ROWS",
            self.values_url(&range)
        );

        let response = self
            .client
            .post(url)
            .bearer_auth(token)
            .json(&serde_json::json!({ "values": [row] }))
            .send()
            .await
            .map_err(|e| MirrorError::Request(e.to_string()))?;

        Self::check_status(response).await?;
        Ok(())
    }
}

#[async_trait]
impl ReportMirror for SheetsMirror {
    async fn append(&self, record: &MirrorRecord) -> Result<MirrorOutcome, MirrorError> {
        let token = self.tokens.access_token().await?;
        let timestamps = self.timestamps(&token).await?;

        if timestamps.is_empty() {
            tracing::info!("Worksheet '{}' is empty, writing header row", self.worksheet_name);
            let header = HEADER_ROW.iter().map(|h| h.to_string()).collect();
            self.append_row(&token, header).await?;
        } else if timestamps.iter().any(|ts| ts == &record.timestamp) {
            tracing::info!("Report {} already mirrored, skipping", record.timestamp);
            return Ok(MirrorOutcome::AlreadyPresent);
        }

        self.append_row(&token, record.to_row()).await?;
        Ok(MirrorOutcome::Appended)
    }
}
