//! Repositories.

#![allow(missing_docs)]

pub mod announcement;
pub mod community_feedback;
pub mod engagement;
pub mod food_donation;
pub mod food_reservation;
pub mod moderation_log;
pub mod report;
pub mod stats;
pub mod user_account;
pub mod user_report;

pub use announcement::{AnnouncementFeedFilter, AnnouncementRepository};
pub use community_feedback::{
    CommunityFeedbackRepository, FeedbackFilter, FeedbackStats, FeedbackTrend, FeedbackTypeCount,
    RatingCount,
};
pub use engagement::EngagementRepository;
pub use food_donation::{
    AssignedReservation, DonationFilter, DonationReview, FoodDonationRepository,
};
pub use food_reservation::{FoodReservationRepository, ReservationFilter, ReservationStats};
pub use moderation_log::{ModerationLogFilter, ModerationLogRepository};
pub use report::{RecentActivity, ReportRange, ReportRepository, ReportType};
pub use stats::StatsRepository;
pub use user_account::{AddressCount, UserAccountRepository};
pub use user_report::{
    DailyReportCount, ReportBreakdown, ReportedUserCount, UserReportFilter, UserReportRepository,
    UserReportStats,
};

use sea_orm::{
    sea_query::{Expr, Func, IntoColumnRef, SimpleExpr},
    DatabaseBackend, Statement,
};

/// Case-insensitive `LIKE '%needle%'` on a column.
pub(crate) fn contains_ci<C: IntoColumnRef>(column: C, needle: &str) -> SimpleExpr {
    let escaped = needle
        .trim()
        .to_lowercase()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    Expr::expr(Func::lower(Expr::col(column))).like(format!("%{escaped}%"))
}

/// `LOWER(TRIM(column)) = LOWER(TRIM(value))`.
pub(crate) fn same_address(qualified_column: &str, address: &str) -> SimpleExpr {
    Expr::cust_with_values(
        format!("LOWER(TRIM({qualified_column})) = LOWER(TRIM($1))"),
        [address.to_string()],
    )
}

/// A raw Postgres statement without parameters.
pub(crate) fn sql(query: &str) -> Statement {
    Statement::from_string(DatabaseBackend::Postgres, query)
}
