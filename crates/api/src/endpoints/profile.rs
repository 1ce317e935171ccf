//! Officer profile and settings endpoints.

use axum::{
    Form, Router,
    extract::State,
    routing::{get, post},
};
use foodify_common::AppResult;
use foodify_core::{ChangePasswordInput, ProfilePage, UpdateProfileInput};
use foodify_db::entities::user_account;

use crate::{
    extractors::{OfficerUser, RequestMeta},
    middleware::AppState,
    response::ApiResponse,
};

/// Create profile router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/profile", get(profile))
        .route("/settings/profile", post(update_profile))
        .route("/settings/password", post(change_password))
}

async fn profile(
    OfficerUser(officer): OfficerUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<ProfilePage>> {
    let page = state.profile_service.profile(&officer).await?;
    Ok(ApiResponse::ok(page))
}

async fn update_profile(
    OfficerUser(officer): OfficerUser,
    State(state): State<AppState>,
    RequestMeta(client): RequestMeta,
    Form(input): Form<UpdateProfileInput>,
) -> AppResult<ApiResponse<user_account::Model>> {
    let user = state
        .profile_service
        .update_profile(&officer, input, &client)
        .await?;
    Ok(ApiResponse::with_message("Profile updated successfully!", user))
}

async fn change_password(
    OfficerUser(officer): OfficerUser,
    State(state): State<AppState>,
    RequestMeta(client): RequestMeta,
    Form(input): Form<ChangePasswordInput>,
) -> AppResult<ApiResponse<()>> {
    state
        .profile_service
        .change_password(&officer, input, &client)
        .await?;
    Ok(ApiResponse::message("Password updated successfully!"))
}
