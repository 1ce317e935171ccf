//! Donation moderation endpoints.

use axum::{
    Form, Router,
    extract::{Query, State},
    response::{IntoResponse, Response},
    routing::get,
};
use foodify_common::AppResult;
use foodify_core::{DonationListQuery, DonationView};
use serde::Deserialize;

use super::{invalid_action, required};
use crate::{
    extractors::{OfficerUser, RequestMeta},
    middleware::AppState,
    response::ApiResponse,
};

/// Create donation router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_donations).post(donation_action))
        .route("/pending", get(list_pending))
        .route("/expired", get(list_expired))
}

/// Donation action form.
#[derive(Debug, Deserialize)]
pub struct DonationActionForm {
    pub action: Option<String>,
    pub donation_id: Option<String>,
    pub rejection_reason: Option<String>,
    pub reason: Option<String>,
    pub new_expiry: Option<String>,
    pub resident_id: Option<String>,
    pub notes: Option<String>,
}

/// Donations waiting for review.
async fn list_pending(
    OfficerUser(_): OfficerUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<DonationView>>> {
    let donations = state.donation_service.list_pending().await?;
    Ok(ApiResponse::ok(donations))
}

/// Management listing.
async fn list_donations(
    OfficerUser(_): OfficerUser,
    State(state): State<AppState>,
    Query(query): Query<DonationListQuery>,
) -> AppResult<ApiResponse<Vec<DonationView>>> {
    let donations = state.donation_service.list(&query).await?;
    Ok(ApiResponse::ok(donations))
}

/// Expired and cancelled donations.
async fn list_expired(
    OfficerUser(_): OfficerUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<DonationView>>> {
    let donations = state.donation_service.list_expired().await?;
    Ok(ApiResponse::ok(donations))
}

async fn donation_action(
    OfficerUser(officer): OfficerUser,
    State(state): State<AppState>,
    RequestMeta(client): RequestMeta,
    Form(form): Form<DonationActionForm>,
) -> AppResult<Response> {
    let service = &state.donation_service;
    let action = form.action.as_deref().unwrap_or_default();
    let donation_id = || required(form.donation_id.as_deref(), "Donation ID");

    let response = match action {
        "approve" => {
            let message = service.approve(&officer, donation_id()?, &client).await?;
            ApiResponse::message(message).into_response()
        }
        "reject" => {
            let message = service
                .reject(
                    &officer,
                    donation_id()?,
                    form.rejection_reason.as_deref(),
                    &client,
                )
                .await?;
            ApiResponse::message(message).into_response()
        }
        "get_details" => {
            let details = service.get_details(donation_id()?).await?;
            ApiResponse::ok(details).into_response()
        }
        "delete" => {
            let message = service
                .delete(&officer, donation_id()?, form.reason.as_deref(), &client)
                .await?;
            ApiResponse::message(message).into_response()
        }
        "extend" => {
            let message = service
                .extend(&officer, donation_id()?, form.new_expiry.as_deref(), &client)
                .await?;
            ApiResponse::message(message).into_response()
        }
        "get_residents" => {
            let candidates = state
                .resident_service
                .assignment_candidates(&officer, donation_id()?)
                .await?;
            let message = candidates.message.clone();
            ApiResponse::with_message(message, candidates).into_response()
        }
        "assign_donation" => {
            let resident_id = required(form.resident_id.as_deref(), "Resident")?;
            let message = service
                .assign(
                    &officer,
                    donation_id()?,
                    resident_id,
                    form.notes.as_deref(),
                    &client,
                )
                .await?;
            ApiResponse::message(message).into_response()
        }
        _ => return Err(invalid_action()),
    };

    Ok(response)
}
