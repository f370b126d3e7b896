use thiserror::Error;

use crate::core::error::AppError;

/// Text fields of the report form, as received
#[derive(Debug, Clone, Default)]
pub struct SubmissionForm {
    pub form_token: String,
    pub address: String,
    pub flood_height: String,
    pub reporter_name: String,
    pub reporter_phone: Option<String>,
}

/// Uploaded photo file
#[derive(Debug, Clone)]
pub struct PhotoUpload {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl PhotoUpload {
    /// Lower-cased extension after the last dot, if any
    pub fn extension(&self) -> Option<String> {
        let (stem, ext) = self.filename.rsplit_once('.')?;
        if stem.is_empty() && ext.is_empty() {
            return None;
        }
        Some(ext.to_lowercase())
    }
}

/// Who is submitting: browser session and client address
#[derive(Debug, Clone)]
pub struct SubmissionContext {
    pub session: String,
    pub client_ip: String,
}

/// A stored report
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionReceipt {
    pub report_id: i64,
    pub geocoded: bool,
    pub mirrored: bool,
    pub message: String,
}

/// Why a submission was not stored
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SubmissionRejection {
    #[error("Report already submitted or token invalid. Please submit the form again.")]
    InvalidToken,

    #[error("Please correct the highlighted fields")]
    InvalidFields(Vec<String>),

    #[error("{0}")]
    InvalidPhoto(String),

    #[error("An identical report was submitted moments ago. Please wait before reporting again.")]
    Duplicate,

    #[error("Upload failed: unsupported format or file too large")]
    PhotoStorageFailed,

    #[error("Daily report limit reached (maximum {0} reports per day)")]
    DailyLimitReached(i64),

    #[error("Failed to save the report. Please try again.")]
    PersistenceFailed,
}

impl From<SubmissionRejection> for AppError {
    fn from(rejection: SubmissionRejection) -> Self {
        let message = rejection.to_string();
        match rejection {
            SubmissionRejection::InvalidToken | SubmissionRejection::Duplicate => {
                AppError::Conflict(message)
            }
            SubmissionRejection::InvalidFields(errors) => AppError::ValidationErrors(errors),
            SubmissionRejection::InvalidPhoto(_) => AppError::Validation(message),
            SubmissionRejection::PhotoStorageFailed => AppError::BadRequest(message),
            SubmissionRejection::DailyLimitReached(_) => AppError::RateLimitExceeded(message),
            SubmissionRejection::PersistenceFailed => AppError::SaveFailed(message),
        }
    }
}
