//! Announcement, guideline and reminder endpoints.

use axum::{
    Form, Router,
    extract::{Query, State},
    response::{IntoResponse, Response},
    routing::get,
};
use foodify_common::AppResult;
use foodify_core::{AnnouncementInput, PostView};
use foodify_db::entities::announcement::AnnouncementType;
use serde::Deserialize;
use serde_json::json;

use super::{invalid_action, required};
use crate::{
    extractors::{OfficerUser, RequestMeta},
    middleware::AppState,
    response::ApiResponse,
};

/// Create content router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/announcements", get(list_posts).post(post_action))
        .route("/guidelines", get(list_guidelines))
        .route("/reminders", get(list_reminders))
}

/// Feed query.
#[derive(Debug, Deserialize)]
pub struct FeedQuery {
    pub filter_type: Option<String>,
    pub page: Option<u64>,
}

/// Content action form.
#[derive(Debug, Deserialize)]
pub struct PostActionForm {
    pub action: Option<String>,
    pub id: Option<String>,
    pub title: Option<String>,
    pub content: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub priority: Option<String>,
    pub status: Option<String>,
    pub is_pinned: Option<String>,
    pub post_id: Option<String>,
    pub post_type: Option<String>,
    pub comment: Option<String>,
    pub share_message: Option<String>,
    pub filter_type: Option<String>,
    pub page: Option<String>,
}

impl PostActionForm {
    fn input(&self) -> AnnouncementInput {
        AnnouncementInput {
            title: self.title.clone(),
            content: self.content.clone(),
            kind: self.kind.clone(),
            priority: self.priority.clone(),
            status: self.status.clone(),
            is_pinned: self.is_pinned.clone(),
        }
    }

    fn page(&self) -> Option<u64> {
        self.page.as_deref().and_then(|p| p.trim().parse().ok())
    }
}

/// Non-archived posts, pinned first.
async fn list_posts(
    OfficerUser(viewer): OfficerUser,
    State(state): State<AppState>,
    Query(query): Query<FeedQuery>,
) -> AppResult<ApiResponse<Vec<PostView>>> {
    let posts = state
        .announcement_service
        .feed(&viewer, query.filter_type.as_deref(), query.page)
        .await?;
    Ok(ApiResponse::ok(posts))
}

async fn list_guidelines(
    OfficerUser(viewer): OfficerUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<PostView>>> {
    let posts = state
        .announcement_service
        .list_kind(&viewer, AnnouncementType::Guideline)
        .await?;
    Ok(ApiResponse::ok(posts))
}

async fn list_reminders(
    OfficerUser(viewer): OfficerUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<PostView>>> {
    let posts = state
        .announcement_service
        .list_kind(&viewer, AnnouncementType::Reminder)
        .await?;
    Ok(ApiResponse::ok(posts))
}

async fn post_action(
    OfficerUser(officer): OfficerUser,
    State(state): State<AppState>,
    RequestMeta(client): RequestMeta,
    Form(form): Form<PostActionForm>,
) -> AppResult<Response> {
    let service = &state.announcement_service;
    let post_id = || required(form.post_id.as_deref(), "Post ID");
    let post_type = form.post_type.as_deref();

    let response = match form.action.as_deref().unwrap_or_default() {
        "create_announcement" => {
            let post = service.create(&officer, &form.input(), &client).await?;
            let data = json!({"id": post.id});
            ApiResponse::with_message("Announcement created successfully!", data).into_response()
        }
        "update_announcement" => {
            let id = required(form.id.as_deref(), "Announcement ID")?;
            service.update(&officer, id, &form.input(), &client).await?;
            ApiResponse::message("Announcement updated successfully!").into_response()
        }
        "delete_announcement" => {
            let id = required(form.id.as_deref(), "Announcement ID")?;
            service.delete(&officer, id, &client).await?;
            ApiResponse::message("Announcement deleted successfully!").into_response()
        }
        "toggle_like" => {
            let liked = service.toggle_like(&officer, post_id()?, post_type).await?;
            let message = if liked { "Post liked!" } else { "Post unliked" };
            ApiResponse::with_message(message, json!({"liked": liked})).into_response()
        }
        "add_comment" => {
            let comment = service
                .add_comment(&officer, post_id()?, post_type, form.comment.as_deref())
                .await?;
            ApiResponse::with_message("Comment added successfully!", comment).into_response()
        }
        "get_comments" => {
            let page = service
                .comments(&officer, post_id()?, post_type, form.page())
                .await?;
            ApiResponse::ok(page).into_response()
        }
        "share_post" => {
            let share = service
                .share(&officer, post_id()?, post_type, form.share_message.as_deref())
                .await?;
            ApiResponse::with_message("Post shared successfully!", share).into_response()
        }
        "save_post" => {
            let saved = service.toggle_save(&officer, post_id()?, post_type).await?;
            let message = if saved {
                "Post saved successfully!"
            } else {
                "Post removed from saved"
            };
            ApiResponse::with_message(message, json!({"saved": saved})).into_response()
        }
        "get_post_details" => {
            let id = required(form.id.as_deref(), "Announcement ID")?;
            ApiResponse::ok(service.details(id).await?).into_response()
        }
        "load_posts" => {
            let posts = service
                .feed(&officer, form.filter_type.as_deref(), form.page())
                .await?;
            ApiResponse::ok(posts).into_response()
        }
        _ => return Err(invalid_action()),
    };

    Ok(response)
}
