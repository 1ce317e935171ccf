//! Community feedback repository.

use std::sync::Arc;

use foodify_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, FromQueryResult,
    QueryFilter, QueryOrder,
};
use serde::Serialize;

use super::sql;

use crate::entities::{
    community_feedback::{self, FeedbackStatus, FeedbackType},
    CommunityFeedback,
};

/// Filters for the feedback listing.
#[derive(Debug, Clone, Default)]
pub struct FeedbackFilter {
    pub status: Option<FeedbackStatus>,
    pub rating: Option<i32>,
    pub feedback_type: Option<FeedbackType>,
}

/// Feedback counters.
#[derive(Debug, Clone, Default, PartialEq, FromQueryResult, Serialize)]
pub struct FeedbackStats {
    pub total: i64,
    pub new_feedback: i64,
    pub reviewed: i64,
    pub responded: i64,
    pub resolved: i64,
    /// Mean rating with one decimal, 0 without feedback
    pub avg_rating: f64,
    /// Rated 4 or 5
    pub positive: i64,
    /// Rated 1 or 2
    pub negative: i64,
    pub urgent: i64,
}

#[derive(Debug, Clone, PartialEq, FromQueryResult, Serialize)]
pub struct FeedbackTypeCount {
    pub feedback_type: String,
    pub count: i64,
    pub avg_rating: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, FromQueryResult, Serialize)]
pub struct RatingCount {
    pub rating: i32,
    pub count: i64,
}

/// Feedback received on one day of the last 30.
#[derive(Debug, Clone, PartialEq, FromQueryResult, Serialize)]
pub struct FeedbackTrend {
    /// `YYYY-MM-DD`
    pub date: String,
    pub count: i64,
    pub avg_rating: f64,
}

/// Repository for community feedback.
#[derive(Clone)]
pub struct CommunityFeedbackRepository {
    db: Arc<DatabaseConnection>,
}

impl CommunityFeedbackRepository {
    /// Create a new community feedback repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Get feedback by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<community_feedback::Model> {
        CommunityFeedback::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
            .ok_or_else(|| AppError::NotFound("Feedback not found.".to_string()))
    }

    pub async fn create(
        &self,
        model: community_feedback::ActiveModel,
    ) -> AppResult<community_feedback::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    pub async fn update(
        &self,
        model: community_feedback::ActiveModel,
    ) -> AppResult<community_feedback::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete feedback. Returns the number of rows removed.
    pub async fn delete(&self, id: &str) -> AppResult<u64> {
        CommunityFeedback::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map(|r| r.rows_affected)
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Filtered listing, newest first.
    pub async fn find_filtered(
        &self,
        filter: &FeedbackFilter,
    ) -> AppResult<Vec<community_feedback::Model>> {
        let mut query = CommunityFeedback::find();

        if let Some(status) = filter.status {
            query = query.filter(community_feedback::Column::Status.eq(status));
        }
        if let Some(rating) = filter.rating {
            query = query.filter(community_feedback::Column::Rating.eq(rating));
        }
        if let Some(kind) = filter.feedback_type {
            query = query.filter(community_feedback::Column::FeedbackType.eq(kind));
        }

        query
            .order_by_desc(community_feedback::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    pub async fn statistics(&self) -> AppResult<FeedbackStats> {
        let stats = FeedbackStats::find_by_statement(sql(
            r"
            SELECT
                COUNT(*) AS total,
                COUNT(*) FILTER (WHERE status = 'new') AS new_feedback,
                COUNT(*) FILTER (WHERE status = 'reviewed') AS reviewed,
                COUNT(*) FILTER (WHERE status = 'responded') AS responded,
                COUNT(*) FILTER (WHERE status = 'resolved') AS resolved,
                COALESCE(ROUND(AVG(rating)::numeric, 1), 0)::float8 AS avg_rating,
                COUNT(*) FILTER (WHERE rating >= 4) AS positive,
                COUNT(*) FILTER (WHERE rating <= 2) AS negative,
                COUNT(*) FILTER (WHERE priority = 'urgent') AS urgent
            FROM community_feedback
            ",
        ))
        .one(self.db.as_ref())
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(stats.unwrap_or_default())
    }

    /// Count and mean rating per feedback type, largest first.
    pub async fn by_type(&self) -> AppResult<Vec<FeedbackTypeCount>> {
        FeedbackTypeCount::find_by_statement(sql(
            r"
            SELECT
                feedback_type,
                COUNT(*) AS count,
                ROUND(AVG(rating)::numeric, 1)::float8 AS avg_rating
            FROM community_feedback
            GROUP BY feedback_type
            ORDER BY count DESC, feedback_type
            ",
        ))
        .all(self.db.as_ref())
        .await
        .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count per rating, 5 first.
    pub async fn rating_distribution(&self) -> AppResult<Vec<RatingCount>> {
        RatingCount::find_by_statement(sql(
            r"
            SELECT rating, COUNT(*) AS count
            FROM community_feedback
            GROUP BY rating
            ORDER BY rating DESC
            ",
        ))
        .all(self.db.as_ref())
        .await
        .map_err(|e| AppError::Database(e.to_string()))
    }

    pub async fn daily_trends(&self) -> AppResult<Vec<FeedbackTrend>> {
        FeedbackTrend::find_by_statement(sql(
            r"
            SELECT
                to_char(created_at::date, 'YYYY-MM-DD') AS date,
                COUNT(*) AS count,
                ROUND(AVG(rating)::numeric, 1)::float8 AS avg_rating
            FROM community_feedback
            WHERE created_at >= NOW() - INTERVAL '30 days'
            GROUP BY 1
            ORDER BY 1
            ",
        ))
        .all(self.db.as_ref())
        .await
        .map_err(|e| AppError::Database(e.to_string()))
    }
}
