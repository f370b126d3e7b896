mod daily_limit_service;
mod duplicate_guard;
mod report_service;
mod submission_gate;
mod submission_pipeline;

pub use daily_limit_service::DailyLimitService;
pub use duplicate_guard::DuplicateGuard;
pub use report_service::ReportService;
pub use submission_gate::SubmissionGate;
pub use submission_pipeline::ReportSubmissionPipeline;
