//! User report endpoints.

use axum::{
    Form, Router,
    extract::{Query, State},
    routing::get,
};
use foodify_common::AppResult;
use foodify_core::{UserReportListQuery, UserReportPage};
use serde::Deserialize;

use super::{invalid_action, required};
use crate::{
    extractors::{OfficerUser, RequestMeta},
    middleware::AppState,
    response::ApiResponse,
};

/// Create user report router.
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(reports_page).post(report_action))
}

/// Report action form. Actions always target the user named on the report.
#[derive(Debug, Deserialize)]
pub struct ReportActionForm {
    pub action: Option<String>,
    pub report_id: Option<String>,
    pub status: Option<String>,
    pub resolution_note: Option<String>,
    pub priority: Option<String>,
    pub action_type: Option<String>,
}

async fn reports_page(
    OfficerUser(_): OfficerUser,
    State(state): State<AppState>,
    Query(query): Query<UserReportListQuery>,
) -> AppResult<ApiResponse<UserReportPage>> {
    let page = state.user_report_service.page(&query).await?;
    Ok(ApiResponse::ok(page))
}

async fn report_action(
    OfficerUser(officer): OfficerUser,
    State(state): State<AppState>,
    RequestMeta(client): RequestMeta,
    Form(form): Form<ReportActionForm>,
) -> AppResult<ApiResponse<()>> {
    let service = &state.user_report_service;
    let report_id = || required(form.report_id.as_deref(), "Report ID");

    let message = match form.action.as_deref().unwrap_or_default() {
        "update_status" => {
            service
                .update_status(
                    &officer,
                    report_id()?,
                    form.status.as_deref(),
                    form.resolution_note.as_deref(),
                    &client,
                )
                .await?;
            "Report status updated successfully"
        }
        "update_priority" => {
            service
                .update_priority(&officer, report_id()?, form.priority.as_deref(), &client)
                .await?;
            "Priority updated successfully"
        }
        "delete_report" => {
            service.delete(&officer, report_id()?, &client).await?;
            "Report deleted successfully"
        }
        "take_action" => {
            service
                .take_action(&officer, report_id()?, form.action_type.as_deref(), &client)
                .await?
        }
        _ => return Err(invalid_action()),
    };

    Ok(ApiResponse::message(message))
}
