//! Moderation log endpoint.

use axum::{
    Router,
    extract::{Query, State},
    routing::get,
};
use foodify_common::AppResult;
use foodify_core::{ModerationLogPage, ModerationLogQuery};

use crate::{extractors::OfficerUser, middleware::AppState, response::ApiResponse};

/// Create moderation log router.
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(list_entries))
}

/// Newest entries first, with actor names and the total count.
async fn list_entries(
    OfficerUser(_): OfficerUser,
    State(state): State<AppState>,
    Query(query): Query<ModerationLogQuery>,
) -> AppResult<ApiResponse<ModerationLogPage>> {
    let page = state.moderation_log_service.list(&query).await?;
    Ok(ApiResponse::ok(page))
}
