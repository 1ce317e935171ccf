//! Business logic services.

#![allow(missing_docs)]

pub mod announcement;
pub mod auth;
pub mod dashboard;
pub mod donation;
pub mod email;
pub mod feedback;
pub mod moderation_log;
pub mod profile;
pub mod report;
pub mod reservation;
pub mod resident;
pub mod user_report;

pub use announcement::{
    AnnouncementInput, AnnouncementService, CommentPage, CommentView, PostDetails, PostView,
};
pub use auth::{AuthService, SigninInput, OFFICER_REQUIRED};
pub use dashboard::{Dashboard, DashboardService, DonationAnalytics, UserAnalytics};
pub use donation::{DonationListQuery, DonationService, DonationView};
pub use email::{EmailConfig, EmailDeliveryResult, EmailNotificationType, EmailService};
pub use feedback::{FeedbackInput, FeedbackListQuery, FeedbackPage, FeedbackService, FeedbackView};
pub use moderation_log::{
    ClientInfo, LogEntry, ModerationLogPage, ModerationLogQuery, ModerationLogService,
};
pub use profile::{ChangePasswordInput, ProfilePage, ProfileService, UpdateProfileInput};
pub use report::{GeneratedReport, ReportExport, ReportPage, ReportRequest, ReportService};
pub use reservation::{RequestListQuery, RequestView, ReservationService};
pub use resident::{
    AddressDiagnostics, AssignmentCandidates, ResidentDirectory, ResidentListQuery,
    ResidentService, ADDRESS_NOT_SET,
};
pub use user_report::{
    ReportAction, UserReportListQuery, UserReportPage, UserReportService, UserReportView,
};

use foodify_common::{AppError, AppResult};

/// Parse an optional form field, falling back to the default when blank.
pub(crate) fn parse_or_default<T: Default>(
    value: Option<&str>,
    parse: fn(&str) -> Option<T>,
    field: &str,
) -> AppResult<T> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(T::default()),
        Some(v) => parse(v).ok_or_else(|| AppError::BadRequest(format!("Invalid {field}: {v}"))),
    }
}
