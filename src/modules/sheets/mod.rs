//! Google Sheets mirror of submitted reports
//!
//! Authenticates with a service account (JWT bearer grant) and appends one
//! row per report, using the timestamp column as an idempotency key.

mod sheets_mirror;
mod token_manager;

pub use sheets_mirror::{MirrorError, MirrorOutcome, MirrorRecord, ReportMirror, SheetsMirror};
pub use token_manager::{ServiceAccountKey, ServiceAccountTokenManager};
