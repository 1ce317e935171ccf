//! Announcement repository.
//!
//! Guidelines, reminders and alerts live in the same table.

use std::sync::Arc;

use foodify_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, TransactionTrait,
};

use crate::entities::{
    announcement::{self, AnnouncementType, PublishStatus},
    post_comment, post_like, post_save, post_share,
    post_like::PostType,
    Announcement, PostComment, PostLike, PostSave, PostShare,
};

/// Feed filter: all kinds, or one kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnnouncementFeedFilter {
    pub kind: Option<AnnouncementType>,
}

/// Repository for announcement operations.
#[derive(Clone)]
pub struct AnnouncementRepository {
    db: Arc<DatabaseConnection>,
}

impl AnnouncementRepository {
    /// Create a new announcement repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find announcement by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<announcement::Model>> {
        Announcement::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get announcement by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<announcement::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Announcement not found.".to_string()))
    }

    /// Create an announcement.
    pub async fn create(&self, model: announcement::ActiveModel) -> AppResult<announcement::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update an announcement.
    pub async fn update(&self, model: announcement::ActiveModel) -> AppResult<announcement::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Non-archived posts, pinned first, then newest.
    pub async fn find_feed(
        &self,
        filter: AnnouncementFeedFilter,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<announcement::Model>> {
        let mut query =
            Announcement::find().filter(announcement::Column::Status.ne(PublishStatus::Archived));

        if let Some(kind) = filter.kind {
            query = query.filter(announcement::Column::Kind.eq(kind));
        }

        query
            .order_by_desc(announcement::Column::IsPinned)
            .order_by_desc(announcement::Column::CreatedAt)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Every post of one kind, newest first.
    pub async fn find_by_kind(&self, kind: AnnouncementType) -> AppResult<Vec<announcement::Model>> {
        Announcement::find()
            .filter(announcement::Column::Kind.eq(kind))
            .order_by_desc(announcement::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Most recent posts of one author.
    pub async fn find_recent_by_author(
        &self,
        user_id: &str,
        limit: u64,
    ) -> AppResult<Vec<announcement::Model>> {
        Announcement::find()
            .filter(announcement::Column::UserId.eq(user_id))
            .order_by_desc(announcement::Column::CreatedAt)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count announcements with a status.
    pub async fn count_by_status(&self, status: PublishStatus) -> AppResult<u64> {
        Announcement::find()
            .filter(announcement::Column::Status.eq(status))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete an announcement together with its likes, comments, shares and saves.
    ///
    /// Returns whether the announcement existed.
    pub async fn delete_with_engagement(&self, id: &str) -> AppResult<bool> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        PostLike::delete_many()
            .filter(post_like::Column::PostId.eq(id))
            .filter(post_like::Column::PostType.eq(PostType::Announcement))
            .exec(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        PostComment::delete_many()
            .filter(post_comment::Column::PostId.eq(id))
            .filter(post_comment::Column::PostType.eq(PostType::Announcement))
            .exec(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        PostShare::delete_many()
            .filter(post_share::Column::PostId.eq(id))
            .filter(post_share::Column::PostType.eq(PostType::Announcement))
            .exec(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        PostSave::delete_many()
            .filter(post_save::Column::PostId.eq(id))
            .filter(post_save::Column::PostType.eq(PostType::Announcement))
            .exec(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let deleted = Announcement::delete_by_id(id)
            .exec(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(deleted.rows_affected > 0)
    }
}
