//! API endpoints.
//!
//! Listings are `GET` with query-string filters. Mutations are `POST` form
//! submissions dispatched on an `action` field.

mod announcements;
mod auth;
mod dashboard;
mod donations;
mod feedback;
mod moderation_log;
mod profile;
mod reports;
mod requests;
mod residents;
mod user_reports;

use axum::Router;
use foodify_common::{AppError, AppResult};

use crate::middleware::AppState;

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(auth::router())
        .nest("/donations", donations::router())
        .nest("/requests", requests::router())
        .nest("/residents", residents::router())
        .nest("/reports", reports::router())
        .merge(announcements::router())
        .merge(dashboard::router())
        .merge(profile::router())
        .nest("/moderation-log", moderation_log::router())
        .nest("/feedback", feedback::router())
        .nest("/user-reports", user_reports::router())
}

/// A form field that must be present and non-blank.
fn required<'a>(value: Option<&'a str>, label: &str) -> AppResult<&'a str> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::BadRequest(format!("{label} is required.")))
}

fn invalid_action() -> AppError {
    AppError::BadRequest("Invalid action.".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_trims_and_rejects_blank() {
        assert_eq!(required(Some(" d1 "), "Donation ID").ok(), Some("d1"));
        let err = required(Some("  "), "Donation ID").err();
        assert_eq!(
            err.map(|e| e.message()).as_deref(),
            Some("Donation ID is required.")
        );
        assert!(required(None, "Request ID").is_err());
    }
}
