//! Post engagement repository: likes, saves, comments and shares.
//!
//! Announcement counters move with the side tables inside one transaction.
//! Donations have no counters.

use std::sync::Arc;

use foodify_common::{AppError, AppResult};
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
};

use crate::entities::{
    announcement, post_comment, post_like, post_like::PostType, post_save, post_share,
    Announcement, PostComment, PostLike, PostSave, PostShare,
};

/// Announcement counter touched by an engagement change.
#[derive(Debug, Clone, Copy)]
enum Counter {
    Likes,
    Comments,
    Shares,
}

impl Counter {
    const fn column(self) -> announcement::Column {
        match self {
            Self::Likes => announcement::Column::LikesCount,
            Self::Comments => announcement::Column::CommentsCount,
            Self::Shares => announcement::Column::SharesCount,
        }
    }

    const fn sql_name(self) -> &'static str {
        match self {
            Self::Likes => "likes_count",
            Self::Comments => "comments_count",
            Self::Shares => "shares_count",
        }
    }
}

async fn bump_counter<C: ConnectionTrait>(
    conn: &C,
    post_id: &str,
    post_type: PostType,
    counter: Counter,
    delta: i32,
) -> AppResult<()> {
    if post_type != PostType::Announcement {
        return Ok(());
    }

    // Never below zero
    let expr = Expr::cust_with_values(
        format!("GREATEST({} + $1, 0)", counter.sql_name()),
        [delta],
    );

    Announcement::update_many()
        .col_expr(counter.column(), expr)
        .filter(announcement::Column::Id.eq(post_id))
        .exec(conn)
        .await
        .map(|_| ())
        .map_err(|e| AppError::Database(e.to_string()))
}

/// Repository for post engagement.
#[derive(Clone)]
pub struct EngagementRepository {
    db: Arc<DatabaseConnection>,
}

impl EngagementRepository {
    /// Create a new engagement repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Like or unlike. Returns whether the post is liked afterwards.
    pub async fn toggle_like(
        &self,
        id: String,
        post_id: &str,
        post_type: PostType,
        user_id: &str,
        now: chrono::DateTime<chrono::Utc>,
    ) -> AppResult<bool> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let existing = PostLike::find()
            .filter(post_like::Column::PostId.eq(post_id))
            .filter(post_like::Column::PostType.eq(post_type))
            .filter(post_like::Column::UserId.eq(user_id))
            .one(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let liked = if let Some(like) = existing {
            PostLike::delete_by_id(like.id)
                .exec(&txn)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
            bump_counter(&txn, post_id, post_type, Counter::Likes, -1).await?;
            false
        } else {
            post_like::ActiveModel {
                id: sea_orm::Set(id),
                post_id: sea_orm::Set(post_id.to_string()),
                post_type: sea_orm::Set(post_type),
                user_id: sea_orm::Set(user_id.to_string()),
                created_at: sea_orm::Set(now.into()),
            }
            .insert(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
            bump_counter(&txn, post_id, post_type, Counter::Likes, 1).await?;
            true
        };

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(liked)
    }

    /// Save or unsave. Returns whether the post is saved afterwards.
    pub async fn toggle_save(
        &self,
        id: String,
        post_id: &str,
        post_type: PostType,
        user_id: &str,
        now: chrono::DateTime<chrono::Utc>,
    ) -> AppResult<bool> {
        let existing = PostSave::find()
            .filter(post_save::Column::PostId.eq(post_id))
            .filter(post_save::Column::PostType.eq(post_type))
            .filter(post_save::Column::UserId.eq(user_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if let Some(save) = existing {
            PostSave::delete_by_id(save.id)
                .exec(self.db.as_ref())
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
            return Ok(false);
        }

        post_save::ActiveModel {
            id: sea_orm::Set(id),
            post_id: sea_orm::Set(post_id.to_string()),
            post_type: sea_orm::Set(post_type),
            user_id: sea_orm::Set(user_id.to_string()),
            created_at: sea_orm::Set(now.into()),
        }
        .insert(self.db.as_ref())
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(true)
    }

    /// Add a comment and bump the comment counter.
    pub async fn add_comment(&self, model: post_comment::ActiveModel) -> AppResult<post_comment::Model> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let comment = model
            .insert(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        bump_counter(&txn, &comment.post_id, comment.post_type, Counter::Comments, 1).await?;

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(comment)
    }

    /// Record a share and bump the share counter.
    pub async fn add_share(&self, model: post_share::ActiveModel) -> AppResult<post_share::Model> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let share = model
            .insert(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        bump_counter(&txn, &share.post_id, share.post_type, Counter::Shares, 1).await?;

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(share)
    }

    /// One page of comments, newest first.
    pub async fn find_comments(
        &self,
        post_id: &str,
        post_type: PostType,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<post_comment::Model>> {
        PostComment::find()
            .filter(post_comment::Column::PostId.eq(post_id))
            .filter(post_comment::Column::PostType.eq(post_type))
            .order_by_desc(post_comment::Column::CreatedAt)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count comments on a post.
    pub async fn count_comments(&self, post_id: &str, post_type: PostType) -> AppResult<u64> {
        PostComment::find()
            .filter(post_comment::Column::PostId.eq(post_id))
            .filter(post_comment::Column::PostType.eq(post_type))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Most recent comments written by a user.
    pub async fn find_recent_comments_by_user(
        &self,
        user_id: &str,
        limit: u64,
    ) -> AppResult<Vec<post_comment::Model>> {
        PostComment::find()
            .filter(post_comment::Column::UserId.eq(user_id))
            .order_by_desc(post_comment::Column::CreatedAt)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Which of `post_ids` the user has liked.
    pub async fn liked_post_ids(
        &self,
        user_id: &str,
        post_type: PostType,
        post_ids: &[String],
    ) -> AppResult<Vec<String>> {
        if post_ids.is_empty() {
            return Ok(vec![]);
        }

        PostLike::find()
            .filter(post_like::Column::UserId.eq(user_id))
            .filter(post_like::Column::PostType.eq(post_type))
            .filter(post_like::Column::PostId.is_in(post_ids.iter().cloned()))
            .all(self.db.as_ref())
            .await
            .map(|rows| rows.into_iter().map(|r| r.post_id).collect())
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Which of `post_ids` the user has saved.
    pub async fn saved_post_ids(
        &self,
        user_id: &str,
        post_type: PostType,
        post_ids: &[String],
    ) -> AppResult<Vec<String>> {
        if post_ids.is_empty() {
            return Ok(vec![]);
        }

        PostSave::find()
            .filter(post_save::Column::UserId.eq(user_id))
            .filter(post_save::Column::PostType.eq(post_type))
            .filter(post_save::Column::PostId.is_in(post_ids.iter().cloned()))
            .all(self.db.as_ref())
            .await
            .map(|rows| rows.into_iter().map(|r| r.post_id).collect())
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
