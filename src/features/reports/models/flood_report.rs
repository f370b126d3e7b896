use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use utoipa::ToSchema;

use crate::features::geocoding::models::GeocodeConfidence;

/// Report status, changed only by operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type, ToSchema)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    Pending,
    Terverifikasi,
    Selesai,
}

impl std::fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportStatus::Pending => write!(f, "pending"),
            ReportStatus::Terverifikasi => write!(f, "terverifikasi"),
            ReportStatus::Selesai => write!(f, "selesai"),
        }
    }
}

/// Outcome of geocoding the report address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type, ToSchema)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum GeocodeState {
    NotAttempted,
    Succeeded,
    Failed,
}

/// Database model for a flood report
#[derive(Debug, Clone, FromRow)]
pub struct FloodReport {
    pub id: i64,
    pub submitted_at: NaiveDateTime,
    pub report_date: NaiveDate,
    pub address: String,
    pub flood_height: String,
    pub reporter_name: String,
    pub reporter_phone: Option<String>,
    pub client_ip: String,
    pub photo_path: String,
    pub status: ReportStatus,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub geocode_state: GeocodeState,
    pub geocode_confidence: Option<GeocodeConfidence>,
    pub geocode_attempts: i64,
    pub geocoded_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
}

impl FloodReport {
    pub fn has_coordinates(&self) -> bool {
        self.latitude.is_some() && self.longitude.is_some()
    }
}

/// Data for inserting a new flood report
#[derive(Debug, Clone)]
pub struct CreateFloodReport {
    /// WIB civil time; the report date is derived from it
    pub submitted_at: NaiveDateTime,
    pub address: String,
    pub flood_height: String,
    pub reporter_name: String,
    pub reporter_phone: Option<String>,
    pub client_ip: String,
    pub photo_path: String,
}
