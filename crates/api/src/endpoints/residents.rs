//! Resident directory endpoints.

use axum::{
    Router,
    extract::{Query, State},
    routing::get,
};
use foodify_common::AppResult;
use foodify_core::{AddressDiagnostics, ResidentDirectory, ResidentListQuery};

use crate::{extractors::OfficerUser, middleware::AppState, response::ApiResponse};

/// Create resident router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(directory))
        .route("/diagnostics", get(diagnostics))
}

/// Residents sharing the officer's address.
async fn directory(
    OfficerUser(officer): OfficerUser,
    State(state): State<AppState>,
    Query(query): Query<ResidentListQuery>,
) -> AppResult<ApiResponse<ResidentDirectory>> {
    let directory = state.resident_service.directory(&officer, &query).await?;
    let message = directory.message.clone();
    Ok(ApiResponse::ok(directory).message_opt(message))
}

/// How the officer's address matches the resident table.
async fn diagnostics(
    OfficerUser(officer): OfficerUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<AddressDiagnostics>> {
    let diagnostics = state.resident_service.diagnostics(&officer).await?;
    Ok(ApiResponse::ok(diagnostics))
}
