//! Community feedback endpoints.

use axum::{
    Form, Router,
    extract::{Query, State},
    response::{IntoResponse, Response},
    routing::get,
};
use foodify_common::AppResult;
use foodify_core::{FeedbackInput, FeedbackListQuery, FeedbackPage};
use serde::Deserialize;
use serde_json::json;

use super::{invalid_action, required};
use crate::{
    extractors::{OfficerUser, RequestMeta},
    middleware::AppState,
    response::ApiResponse,
};

/// Create feedback router.
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(feedback_page).post(feedback_action))
}

/// Feedback action form.
#[derive(Debug, Deserialize)]
pub struct FeedbackActionForm {
    pub action: Option<String>,
    pub feedback_id: Option<String>,
    pub feedback_type: Option<String>,
    pub rating: Option<String>,
    pub subject: Option<String>,
    pub message: Option<String>,
    pub priority: Option<String>,
    pub response: Option<String>,
    pub status: Option<String>,
}

impl FeedbackActionForm {
    fn input(&self) -> FeedbackInput {
        FeedbackInput {
            feedback_type: self.feedback_type.clone(),
            rating: self.rating.clone(),
            subject: self.subject.clone(),
            message: self.message.clone(),
            priority: self.priority.clone(),
        }
    }
}

async fn feedback_page(
    OfficerUser(_): OfficerUser,
    State(state): State<AppState>,
    Query(query): Query<FeedbackListQuery>,
) -> AppResult<ApiResponse<FeedbackPage>> {
    let page = state.feedback_service.page(&query).await?;
    Ok(ApiResponse::ok(page))
}

async fn feedback_action(
    OfficerUser(officer): OfficerUser,
    State(state): State<AppState>,
    RequestMeta(client): RequestMeta,
    Form(form): Form<FeedbackActionForm>,
) -> AppResult<Response> {
    let service = &state.feedback_service;
    let feedback_id = || required(form.feedback_id.as_deref(), "Feedback ID");

    let response = match form.action.as_deref().unwrap_or_default() {
        "create_feedback" => {
            let feedback = service.create(&officer, &form.input(), &client).await?;
            let data = json!({"id": feedback.id});
            ApiResponse::with_message("Feedback submitted successfully", data).into_response()
        }
        "update_feedback" => {
            service
                .update(&officer, feedback_id()?, &form.input(), &client)
                .await?;
            ApiResponse::message("Feedback updated successfully").into_response()
        }
        "delete_feedback" => {
            service.delete(&officer, feedback_id()?, &client).await?;
            ApiResponse::message("Feedback deleted successfully").into_response()
        }
        "respond_feedback" => {
            service
                .respond(
                    &officer,
                    feedback_id()?,
                    form.response.as_deref(),
                    form.status.as_deref(),
                    &client,
                )
                .await?;
            ApiResponse::message("Response added successfully").into_response()
        }
        "update_status" => {
            service
                .update_status(&officer, feedback_id()?, form.status.as_deref(), &client)
                .await?;
            ApiResponse::message("Status updated successfully").into_response()
        }
        _ => return Err(invalid_action()),
    };

    Ok(response)
}
