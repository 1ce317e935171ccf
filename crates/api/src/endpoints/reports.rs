//! Report endpoints.

use axum::{
    Form, Router,
    extract::{Query, State},
    http::{HeaderMap, HeaderValue, header},
    response::{IntoResponse, Response},
    routing::get,
};
use foodify_common::{AppError, AppResult};
use foodify_core::{GeneratedReport, ReportPage, ReportRequest};
use serde::Deserialize;

use super::invalid_action;
use crate::{extractors::OfficerUser, middleware::AppState, response::ApiResponse};

/// Set on exports produced in a different format than requested.
const EXPORT_NOTICE: &str = "x-export-notice";

/// Create report router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(report_page).post(report_action))
        .route("/export", get(export_report))
}

/// Report action form.
#[derive(Debug, Deserialize)]
pub struct ReportActionForm {
    pub action: Option<String>,
    pub report_type: Option<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    pub format: Option<String>,
}

async fn report_page(
    OfficerUser(_): OfficerUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<ReportPage>> {
    Ok(ApiResponse::ok(state.report_service.page().await?))
}

async fn report_action(
    OfficerUser(_): OfficerUser,
    State(state): State<AppState>,
    Form(form): Form<ReportActionForm>,
) -> AppResult<ApiResponse<GeneratedReport>> {
    if form.action.as_deref() != Some("generate_report") {
        return Err(invalid_action());
    }

    let request = ReportRequest {
        report_type: form.report_type,
        date_from: form.date_from,
        date_to: form.date_to,
        format: form.format,
    };
    let report = state.report_service.generate(&request).await?;
    Ok(ApiResponse::ok(report))
}

/// The report as a file download.
async fn export_report(
    OfficerUser(_): OfficerUser,
    State(state): State<AppState>,
    Query(request): Query<ReportRequest>,
) -> AppResult<Response> {
    let export = state.report_service.export(&request).await?;

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(export.content_type),
    );
    let disposition = HeaderValue::from_str(&format!(
        "attachment; filename=\"{}\"",
        export.filename
    ))
    .map_err(|e| AppError::Internal(format!("Invalid export filename: {e}")))?;
    headers.insert(header::CONTENT_DISPOSITION, disposition);
    if let Some(notice) = export.notice {
        headers.insert(EXPORT_NOTICE, HeaderValue::from_static(notice));
    }

    Ok((headers, export.body).into_response())
}
