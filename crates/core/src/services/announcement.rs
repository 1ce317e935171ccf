//! Announcements, guidelines and reminders, and engagement on posts.

use std::collections::{HashMap, HashSet};

use chrono::Utc;
use foodify_common::{AppError, AppResult, IdGenerator};
use foodify_db::{
    entities::{
        announcement::{self, AnnouncementType, Priority, PublishStatus},
        post_comment,
        post_like::PostType,
        post_share, user_account,
    },
    repositories::{AnnouncementFeedFilter, AnnouncementRepository, EngagementRepository, UserAccountRepository},
};
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::moderation_log::{ClientInfo, LogEntry, ModerationLogService};
use super::parse_or_default;

const MODULE: &str = "announcements";
/// Posts per feed page.
pub const FEED_PAGE_SIZE: u64 = 50;
/// Comments per page.
pub const COMMENTS_PAGE_SIZE: u64 = 10;

/// Form fields of create and update.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnnouncementInput {
    pub title: Option<String>,
    pub content: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub priority: Option<String>,
    pub status: Option<String>,
    pub is_pinned: Option<String>,
}

struct ValidatedInput {
    title: String,
    content: String,
    kind: AnnouncementType,
    priority: Priority,
    status: PublishStatus,
    is_pinned: bool,
}

impl AnnouncementInput {
    fn validate(&self) -> AppResult<ValidatedInput> {
        let title = self.title.as_deref().map(str::trim).unwrap_or_default();
        let content = self.content.as_deref().map(str::trim).unwrap_or_default();
        if title.is_empty() || content.is_empty() {
            return Err(AppError::BadRequest("Title and content are required.".to_string()));
        }

        Ok(ValidatedInput {
            title: title.to_string(),
            content: content.to_string(),
            kind: parse_or_default(self.kind.as_deref(), AnnouncementType::parse, "type")?,
            priority: parse_or_default(self.priority.as_deref(), Priority::parse, "priority")?,
            status: parse_or_default(self.status.as_deref(), PublishStatus::parse, "status")?,
            is_pinned: matches!(
                self.is_pinned.as_deref().map(str::trim),
                Some("1" | "true" | "on" | "yes")
            ),
        })
    }
}

/// A post in a listing, with the caller's engagement.
#[derive(Debug, Serialize)]
pub struct PostView {
    #[serde(flatten)]
    pub post: announcement::Model,
    pub author_name: Option<String>,
    pub author_profile_img: Option<String>,
    pub is_liked: bool,
    pub is_saved: bool,
}

/// A post with its author's contact details.
#[derive(Debug, Serialize)]
pub struct PostDetails {
    #[serde(flatten)]
    pub post: announcement::Model,
    pub author_name: Option<String>,
    pub author_email: Option<String>,
    pub author_profile_img: Option<String>,
}

/// A comment as shown under a post.
#[derive(Debug, Serialize)]
pub struct CommentView {
    pub id: String,
    pub comment: String,
    pub user_name: Option<String>,
    pub profile_img: Option<String>,
    pub created_at: String,
    pub is_own_comment: bool,
}

/// One page of comments.
#[derive(Debug, Serialize)]
pub struct CommentPage {
    pub comments: Vec<CommentView>,
    pub total_count: u64,
    pub current_page: u64,
    pub has_more: bool,
}

/// Service for posts and their engagement.
#[derive(Clone)]
pub struct AnnouncementService {
    announcement_repo: AnnouncementRepository,
    engagement_repo: EngagementRepository,
    user_repo: UserAccountRepository,
    audit: ModerationLogService,
    id_gen: IdGenerator,
}

impl AnnouncementService {
    /// Create a new announcement service.
    #[must_use]
    pub const fn new(
        announcement_repo: AnnouncementRepository,
        engagement_repo: EngagementRepository,
        user_repo: UserAccountRepository,
        audit: ModerationLogService,
    ) -> Self {
        Self {
            announcement_repo,
            engagement_repo,
            user_repo,
            audit,
            id_gen: IdGenerator::new(),
        }
    }

    /// Non-archived posts, pinned first. `filter_type` of `all` or nothing
    /// lists every kind.
    pub async fn feed(
        &self,
        viewer: &user_account::Model,
        filter_type: Option<&str>,
        page: Option<u64>,
    ) -> AppResult<Vec<PostView>> {
        let kind = match filter_type.map(str::trim).filter(|f| !f.is_empty() && *f != "all") {
            Some(f) => Some(
                AnnouncementType::parse(f)
                    .ok_or_else(|| AppError::BadRequest("Invalid post type.".to_string()))?,
            ),
            None => None,
        };
        let offset = page_offset(page, FEED_PAGE_SIZE)?;

        let posts = self
            .announcement_repo
            .find_feed(AnnouncementFeedFilter { kind }, FEED_PAGE_SIZE, offset)
            .await?;
        self.with_engagement(viewer, posts).await
    }

    /// Every post of one kind, newest first.
    pub async fn list_kind(
        &self,
        viewer: &user_account::Model,
        kind: AnnouncementType,
    ) -> AppResult<Vec<PostView>> {
        let posts = self.announcement_repo.find_by_kind(kind).await?;
        self.with_engagement(viewer, posts).await
    }

    /// Create a post.
    pub async fn create(
        &self,
        officer: &user_account::Model,
        input: &AnnouncementInput,
        client: &ClientInfo,
    ) -> AppResult<announcement::Model> {
        let input = input.validate()?;
        let now = Utc::now();

        let model = announcement::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(officer.id.clone()),
            title: Set(input.title),
            content: Set(input.content),
            kind: Set(input.kind),
            priority: Set(input.priority),
            status: Set(input.status),
            is_pinned: Set(input.is_pinned),
            images: Set(Some(json!([]))),
            attachments: Set(Some(json!([]))),
            likes_count: Set(0),
            shares_count: Set(0),
            comments_count: Set(0),
            created_at: Set(now.into()),
            updated_at: Set(Some(now.into())),
        };
        let post = self.announcement_repo.create(model).await?;

        tracing::info!(announcement_id = %post.id, officer_id = %officer.id, "Announcement created");

        self.audit
            .record(
                LogEntry::new(&officer.id, MODULE, "create_announcement", format!("Created \"{}\"", post.title))
                    .related("announcement", &post.id),
                client,
            )
            .await;

        Ok(post)
    }

    /// Update a post.
    pub async fn update(
        &self,
        officer: &user_account::Model,
        id: &str,
        input: &AnnouncementInput,
        client: &ClientInfo,
    ) -> AppResult<announcement::Model> {
        let input = input.validate()?;
        let existing = self.announcement_repo.get_by_id(id).await?;

        let mut active: announcement::ActiveModel = existing.into();
        active.title = Set(input.title);
        active.content = Set(input.content);
        active.kind = Set(input.kind);
        active.priority = Set(input.priority);
        active.status = Set(input.status);
        active.is_pinned = Set(input.is_pinned);
        active.updated_at = Set(Some(Utc::now().into()));
        let post = self.announcement_repo.update(active).await?;

        tracing::info!(announcement_id = %post.id, officer_id = %officer.id, "Announcement updated");

        self.audit
            .record(
                LogEntry::new(&officer.id, MODULE, "update_announcement", format!("Updated \"{}\"", post.title))
                    .related("announcement", &post.id),
                client,
            )
            .await;

        Ok(post)
    }

    /// Delete a post with all its engagement.
    pub async fn delete(
        &self,
        officer: &user_account::Model,
        id: &str,
        client: &ClientInfo,
    ) -> AppResult<()> {
        if !self.announcement_repo.delete_with_engagement(id).await? {
            return Err(AppError::NotFound("Announcement not found.".to_string()));
        }

        tracing::info!(announcement_id = %id, officer_id = %officer.id, "Announcement deleted");

        self.audit
            .record(
                LogEntry::new(&officer.id, MODULE, "delete_announcement", "Deleted announcement")
                    .related("announcement", id),
                client,
            )
            .await;

        Ok(())
    }

    /// A post with its author.
    pub async fn details(&self, id: &str) -> AppResult<PostDetails> {
        let post = self.announcement_repo.get_by_id(id).await?;
        let author = self.user_repo.find_by_id(&post.user_id).await?;

        Ok(PostDetails {
            author_name: author.as_ref().map(|a| a.full_name.clone()),
            author_email: author.as_ref().map(|a| a.email.clone()),
            author_profile_img: author.and_then(|a| a.profile_img),
            post,
        })
    }

    /// Like or unlike. Returns whether the post is liked afterwards.
    pub async fn toggle_like(
        &self,
        user: &user_account::Model,
        post_id: &str,
        post_type: Option<&str>,
    ) -> AppResult<bool> {
        let post_type = parse_post_type(post_type)?;
        self.engagement_repo
            .toggle_like(self.id_gen.generate(), post_id, post_type, &user.id, Utc::now())
            .await
    }

    /// Save or unsave. Returns whether the post is saved afterwards.
    pub async fn toggle_save(
        &self,
        user: &user_account::Model,
        post_id: &str,
        post_type: Option<&str>,
    ) -> AppResult<bool> {
        let post_type = parse_post_type(post_type)?;
        self.engagement_repo
            .toggle_save(self.id_gen.generate(), post_id, post_type, &user.id, Utc::now())
            .await
    }

    /// Comment on a post.
    pub async fn add_comment(
        &self,
        user: &user_account::Model,
        post_id: &str,
        post_type: Option<&str>,
        comment: Option<&str>,
    ) -> AppResult<post_comment::Model> {
        let post_type = parse_post_type(post_type)?;
        let comment = comment
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .ok_or_else(|| AppError::BadRequest("Comment cannot be empty.".to_string()))?;

        self.engagement_repo
            .add_comment(post_comment::ActiveModel {
                id: Set(self.id_gen.generate()),
                post_id: Set(post_id.to_string()),
                post_type: Set(post_type),
                user_id: Set(user.id.clone()),
                comment: Set(comment.to_string()),
                created_at: Set(Utc::now().into()),
            })
            .await
    }

    /// Share a post.
    pub async fn share(
        &self,
        user: &user_account::Model,
        post_id: &str,
        post_type: Option<&str>,
        share_message: Option<&str>,
    ) -> AppResult<post_share::Model> {
        let post_type = parse_post_type(post_type)?;

        self.engagement_repo
            .add_share(post_share::ActiveModel {
                id: Set(self.id_gen.generate()),
                post_id: Set(post_id.to_string()),
                post_type: Set(post_type),
                user_id: Set(user.id.clone()),
                share_message: Set(share_message
                    .map(str::trim)
                    .filter(|m| !m.is_empty())
                    .map(String::from)),
                created_at: Set(Utc::now().into()),
            })
            .await
    }

    /// One page of comments, newest first.
    pub async fn comments(
        &self,
        viewer: &user_account::Model,
        post_id: &str,
        post_type: Option<&str>,
        page: Option<u64>,
    ) -> AppResult<CommentPage> {
        let post_type = parse_post_type(post_type)?;
        let offset = page_offset(page, COMMENTS_PAGE_SIZE)?;

        let comments = self
            .engagement_repo
            .find_comments(post_id, post_type, COMMENTS_PAGE_SIZE, offset)
            .await?;
        let total_count = self.engagement_repo.count_comments(post_id, post_type).await?;

        let mut author_ids: Vec<String> = comments.iter().map(|c| c.user_id.clone()).collect();
        author_ids.sort();
        author_ids.dedup();
        let authors: HashMap<String, user_account::Model> = self
            .user_repo
            .find_by_ids(&author_ids)
            .await?
            .into_iter()
            .map(|u| (u.id.clone(), u))
            .collect();

        let has_more = offset.saturating_add(comments.len() as u64) < total_count;
        let comments = comments
            .into_iter()
            .map(|c| {
                let author = authors.get(&c.user_id);
                CommentView {
                    is_own_comment: c.user_id == viewer.id,
                    user_name: author.map(|a| a.full_name.clone()),
                    profile_img: author.and_then(|a| a.profile_img.clone()),
                    created_at: c.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
                    id: c.id,
                    comment: c.comment,
                }
            })
            .collect();

        Ok(CommentPage {
            comments,
            total_count,
            current_page: page.unwrap_or(1).max(1),
            has_more,
        })
    }

    async fn with_engagement(
        &self,
        viewer: &user_account::Model,
        posts: Vec<announcement::Model>,
    ) -> AppResult<Vec<PostView>> {
        let post_ids: Vec<String> = posts.iter().map(|p| p.id.clone()).collect();
        let liked: HashSet<String> = self
            .engagement_repo
            .liked_post_ids(&viewer.id, PostType::Announcement, &post_ids)
            .await?
            .into_iter()
            .collect();
        let saved: HashSet<String> = self
            .engagement_repo
            .saved_post_ids(&viewer.id, PostType::Announcement, &post_ids)
            .await?
            .into_iter()
            .collect();

        let mut author_ids: Vec<String> = posts.iter().map(|p| p.user_id.clone()).collect();
        author_ids.sort();
        author_ids.dedup();
        let authors: HashMap<String, user_account::Model> = self
            .user_repo
            .find_by_ids(&author_ids)
            .await?
            .into_iter()
            .map(|u| (u.id.clone(), u))
            .collect();

        Ok(posts
            .into_iter()
            .map(|post| {
                let author = authors.get(&post.user_id);
                PostView {
                    author_name: author.map(|a| a.full_name.clone()),
                    author_profile_img: author.and_then(|a| a.profile_img.clone()),
                    is_liked: liked.contains(&post.id),
                    is_saved: saved.contains(&post.id),
                    post,
                }
            })
            .collect())
    }
}

/// Row offset of a 1-based page. Pages whose offset would not fit a
/// Postgres `bigint` are rejected.
fn page_offset(page: Option<u64>, page_size: u64) -> AppResult<u64> {
    let page = page.unwrap_or(1).max(1);
    (page - 1)
        .checked_mul(page_size)
        .filter(|offset| i64::try_from(*offset).is_ok())
        .ok_or_else(|| AppError::BadRequest("Invalid page.".to_string()))
}

fn parse_post_type(value: Option<&str>) -> AppResult<PostType> {
    PostType::parse_or_default(value)
        .ok_or_else(|| AppError::BadRequest("Invalid post type.".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use foodify_db::{
        entities::{
            post_like,
            user_account::{AccountStatus, UserRole},
        },
        repositories::ModerationLogRepository,
    };
    use maplit::btreemap;
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, MockExecResult, Value};

    fn service(db: Arc<DatabaseConnection>) -> AnnouncementService {
        let user_repo = UserAccountRepository::new(Arc::clone(&db));
        AnnouncementService::new(
            AnnouncementRepository::new(Arc::clone(&db)),
            EngagementRepository::new(Arc::clone(&db)),
            user_repo.clone(),
            ModerationLogService::new(ModerationLogRepository::new(db), user_repo),
        )
    }

    fn officer() -> user_account::Model {
        user_account::Model {
            id: "off1".to_string(),
            full_name: "Olive Officer".to_string(),
            email: "olive@example.org".to_string(),
            phone_number: None,
            address: None,
            role: UserRole::TeamOfficer,
            status: AccountStatus::Approved,
            profile_img: Some("avatars/olive.png".to_string()),
            password_hash: None,
            token: None,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn post(id: &str, pinned: bool) -> announcement::Model {
        announcement::Model {
            id: id.to_string(),
            user_id: "off1".to_string(),
            title: "Food drive".to_string(),
            content: "Saturday at the hall".to_string(),
            kind: AnnouncementType::Announcement,
            priority: Priority::Medium,
            status: PublishStatus::Published,
            is_pinned: pinned,
            images: None,
            attachments: None,
            likes_count: 0,
            shares_count: 0,
            comments_count: 0,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn comment(id: &str, user_id: &str) -> post_comment::Model {
        post_comment::Model {
            id: id.to_string(),
            post_id: "a1".to_string(),
            post_type: PostType::Announcement,
            user_id: user_id.to_string(),
            comment: "Count me in".to_string(),
            created_at: Utc::now().into(),
        }
    }

    #[test]
    fn test_input_requires_title_and_content() {
        let input = AnnouncementInput {
            title: Some("  ".to_string()),
            content: Some("Body".to_string()),
            ..Default::default()
        };
        let err = input.validate().err().unwrap();
        assert_eq!(err.message(), "Title and content are required.");
    }

    #[test]
    fn test_input_defaults() {
        let input = AnnouncementInput {
            title: Some(" Drive ".to_string()),
            content: Some("Body".to_string()),
            is_pinned: Some("1".to_string()),
            ..Default::default()
        };
        let valid = input.validate().unwrap();

        assert_eq!(valid.title, "Drive");
        assert_eq!(valid.kind, AnnouncementType::Announcement);
        assert_eq!(valid.priority, Priority::Medium);
        assert_eq!(valid.status, PublishStatus::Published);
        assert!(valid.is_pinned);
    }

    #[test]
    fn test_input_rejects_unknown_priority() {
        let input = AnnouncementInput {
            title: Some("Drive".to_string()),
            content: Some("Body".to_string()),
            priority: Some("urgent".to_string()),
            ..Default::default()
        };
        assert!(input.validate().is_err());
    }

    #[tokio::test]
    async fn test_feed_marks_liked_and_saved() {
        let like = post_like::Model {
            id: "l1".to_string(),
            post_id: "a2".to_string(),
            post_type: PostType::Announcement,
            user_id: "off1".to_string(),
            created_at: Utc::now().into(),
        };

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[post("a1", true), post("a2", false)]])
                .append_query_results([[like]])
                .append_query_results([Vec::<foodify_db::entities::post_save::Model>::new()])
                .append_query_results([[officer()]])
                .into_connection(),
        );

        let feed = service(db).feed(&officer(), Some("all"), None).await.unwrap();

        assert_eq!(feed.len(), 2);
        assert!(!feed[0].is_liked);
        assert!(feed[1].is_liked);
        assert!(!feed[1].is_saved);
        assert_eq!(feed[0].author_name.as_deref(), Some("Olive Officer"));
    }

    #[tokio::test]
    async fn test_delete_missing_announcement() {
        let done = || MockExecResult {
            last_insert_id: 0,
            rows_affected: 0,
        };
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([done(), done(), done(), done(), done()])
                .into_connection(),
        );

        let err = service(db)
            .delete(&officer(), "missing", &ClientInfo::default())
            .await
            .unwrap_err();

        assert_eq!(err.message(), "Announcement not found.");
    }

    #[tokio::test]
    async fn test_empty_comment_rejected() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let err = service(db)
            .add_comment(&officer(), "a1", None, Some("  \n"))
            .await
            .unwrap_err();

        assert_eq!(err.message(), "Comment cannot be empty.");
    }

    #[tokio::test]
    async fn test_invalid_post_type_rejected() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let err = service(db)
            .toggle_like(&officer(), "a1", Some("poll"))
            .await
            .unwrap_err();

        assert_eq!(err.message(), "Invalid post type.");
    }

    #[tokio::test]
    async fn test_comments_page() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[comment("c1", "off1"), comment("c2", "res1")]])
                .append_query_results([[btreemap! {
                    "num_items" => Into::<Value>::into(12i64),
                }]])
                .append_query_results([[officer()]])
                .into_connection(),
        );

        let page = service(db)
            .comments(&officer(), "a1", Some("announcement"), Some(1))
            .await
            .unwrap();

        assert_eq!(page.total_count, 12);
        assert!(page.has_more);
        assert!(page.comments[0].is_own_comment);
        assert!(!page.comments[1].is_own_comment);
        assert_eq!(page.comments[0].profile_img.as_deref(), Some("avatars/olive.png"));
        assert!(page.comments[1].user_name.is_none());
    }

    #[test]
    fn test_page_offset() {
        assert_eq!(page_offset(None, FEED_PAGE_SIZE).unwrap(), 0);
        assert_eq!(page_offset(Some(0), FEED_PAGE_SIZE).unwrap(), 0);
        assert_eq!(page_offset(Some(3), COMMENTS_PAGE_SIZE).unwrap(), 20);
        assert_eq!(
            page_offset(Some(u64::MAX), FEED_PAGE_SIZE).unwrap_err().message(),
            "Invalid page."
        );
    }

    #[tokio::test]
    async fn test_feed_rejects_out_of_range_page() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let err = service(db)
            .feed(&officer(), None, Some(u64::MAX))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::BadRequest(_)));
        assert_eq!(err.message(), "Invalid page.");
    }

    #[tokio::test]
    async fn test_comments_rejects_out_of_range_page() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let err = service(db)
            .comments(&officer(), "a1", None, Some(u64::MAX))
            .await
            .unwrap_err();

        assert_eq!(err.message(), "Invalid page.");
    }

    #[tokio::test]
    async fn test_feed_rejects_unknown_filter() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let err = service(db)
            .feed(&officer(), Some("poll"), None)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::BadRequest(_)));
        assert_eq!(err.message(), "Invalid post type.");
    }
}
