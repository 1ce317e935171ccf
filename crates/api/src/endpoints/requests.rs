//! Reservation request endpoints.

use axum::{
    Form, Router,
    extract::{Query, State},
    routing::get,
};
use foodify_common::AppResult;
use foodify_core::{RequestListQuery, RequestView};
use foodify_db::repositories::ReservationStats;
use serde::Deserialize;

use super::{invalid_action, required};
use crate::{
    extractors::{OfficerUser, RequestMeta},
    middleware::AppState,
    response::ApiResponse,
};

/// Create request router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_requests).post(request_action))
        .route("/statistics", get(statistics))
}

/// Request action form.
#[derive(Debug, Deserialize)]
pub struct RequestActionForm {
    pub action: Option<String>,
    pub request_id: Option<String>,
    pub status: Option<String>,
    pub admin_notes: Option<String>,
    pub bulk_action: Option<String>,
    /// Comma separated
    pub request_ids: Option<String>,
}

async fn list_requests(
    OfficerUser(_): OfficerUser,
    State(state): State<AppState>,
    Query(query): Query<RequestListQuery>,
) -> AppResult<ApiResponse<Vec<RequestView>>> {
    let requests = state.reservation_service.list(&query).await?;
    Ok(ApiResponse::ok(requests))
}

async fn statistics(
    OfficerUser(_): OfficerUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<ReservationStats>> {
    let stats = state.reservation_service.statistics().await?;
    Ok(ApiResponse::ok(stats))
}

async fn request_action(
    OfficerUser(officer): OfficerUser,
    State(state): State<AppState>,
    RequestMeta(client): RequestMeta,
    Form(form): Form<RequestActionForm>,
) -> AppResult<ApiResponse<()>> {
    let service = &state.reservation_service;

    let message = match form.action.as_deref().unwrap_or_default() {
        "update_request_status" => {
            let request_id = required(form.request_id.as_deref(), "Request ID")?;
            service
                .update_status(
                    &officer,
                    request_id,
                    form.status.as_deref(),
                    form.admin_notes.as_deref(),
                    &client,
                )
                .await?
        }
        "bulk_action" => {
            service
                .bulk_action(
                    &officer,
                    form.bulk_action.as_deref(),
                    form.request_ids.as_deref(),
                    &client,
                )
                .await?
        }
        _ => return Err(invalid_action()),
    };

    Ok(ApiResponse::message(message))
}
