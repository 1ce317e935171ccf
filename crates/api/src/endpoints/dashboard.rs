//! Dashboard and analytics endpoints.

use axum::{Router, extract::State, routing::get};
use foodify_common::AppResult;
use foodify_core::{Dashboard, DonationAnalytics, UserAnalytics};

use crate::{extractors::OfficerUser, middleware::AppState, response::ApiResponse};

/// Create dashboard router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(dashboard))
        .route("/analytics/donations", get(donation_analytics))
        .route("/analytics/users", get(user_analytics))
}

async fn dashboard(
    OfficerUser(_): OfficerUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Dashboard>> {
    Ok(ApiResponse::ok(state.dashboard_service.dashboard().await?))
}

async fn donation_analytics(
    OfficerUser(_): OfficerUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<DonationAnalytics>> {
    Ok(ApiResponse::ok(
        state.dashboard_service.donation_analytics().await?,
    ))
}

async fn user_analytics(
    OfficerUser(_): OfficerUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<UserAnalytics>> {
    Ok(ApiResponse::ok(state.dashboard_service.user_analytics().await?))
}
