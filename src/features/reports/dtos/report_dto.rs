use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::features::geocoding::models::GeocodeConfidence;
use crate::features::reports::models::{FloodReport, GeocodeState, ReportStatus, SubmissionReceipt};

/// One-time token to embed in the next report form
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FormTokenResponseDto {
    pub form_token: String,
}

/// Multipart body of `POST /api/reports`
///
/// Note: This struct is for Swagger UI documentation only.
/// The handler reads the fields with axum's Multipart extractor.
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct SubmitReportDto {
    /// Token from `GET /api/reports/form-token` or the last `x-form-token` header
    pub form_token: String,
    /// Free-text location of the flood, at most 500 characters
    pub address: String,
    /// One of the flood height options offered by the form
    #[schema(example = "50 cm")]
    pub flood_height: String,
    pub reporter_name: String,
    pub reporter_phone: Option<String>,
    /// jpg, jpeg, png or gif, at most 5 MB
    #[schema(format = Binary, content_media_type = "application/octet-stream")]
    pub photo: String,
}

/// Result of a stored submission
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SubmissionResponseDto {
    pub report_id: i64,
    /// Coordinates were found and stored
    pub geocoded: bool,
    /// A row was written to the spreadsheet mirror
    pub mirrored: bool,
}

impl From<&SubmissionReceipt> for SubmissionResponseDto {
    fn from(receipt: &SubmissionReceipt) -> Self {
        Self {
            report_id: receipt.report_id,
            geocoded: receipt.geocoded,
            mirrored: receipt.mirrored,
        }
    }
}

/// Public view of a report, without reporter contact details
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PublicReportDto {
    pub id: i64,
    pub submitted_at: NaiveDateTime,
    pub address: String,
    pub flood_height: String,
    pub reporter_name: String,
    pub photo_path: String,
    pub status: ReportStatus,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub geocode_confidence: Option<GeocodeConfidence>,
}

impl From<FloodReport> for PublicReportDto {
    fn from(r: FloodReport) -> Self {
        Self {
            id: r.id,
            submitted_at: r.submitted_at,
            address: r.address,
            flood_height: r.flood_height,
            reporter_name: r.reporter_name,
            photo_path: r.photo_path,
            status: r.status,
            latitude: r.latitude,
            longitude: r.longitude,
            geocode_confidence: r.geocode_confidence,
        }
    }
}

/// Full report row for operators
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AdminReportDto {
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

impl From<FloodReport> for AdminReportDto {
    fn from(r: FloodReport) -> Self {
        Self {
            id: r.id,
            submitted_at: r.submitted_at,
            report_date: r.report_date,
            address: r.address,
            flood_height: r.flood_height,
            reporter_name: r.reporter_name,
            reporter_phone: r.reporter_phone,
            client_ip: r.client_ip,
            photo_path: r.photo_path,
            status: r.status,
            latitude: r.latitude,
            longitude: r.longitude,
            geocode_state: r.geocode_state,
            geocode_confidence: r.geocode_confidence,
            geocode_attempts: r.geocode_attempts,
            geocoded_at: r.geocoded_at,
            created_at: r.created_at,
        }
    }
}

/// Request DTO for changing a report's status
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UpdateReportStatusDto {
    pub status: ReportStatus,
}
