mod flood_report;
mod submission;

pub use flood_report::{CreateFloodReport, FloodReport, GeocodeState, ReportStatus};
pub use submission::{
    PhotoUpload, SubmissionContext, SubmissionForm, SubmissionReceipt, SubmissionRejection,
};
