//! User report repository.

use std::sync::Arc;

use foodify_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseBackend, DatabaseConnection, EntityTrait,
    FromQueryResult, QueryFilter, QueryOrder, Statement,
};
use serde::Serialize;

use super::sql;

use crate::entities::{
    user_report::{self, ReportCategory, ReportPriority, UserReportStatus},
    UserReport,
};

/// Filters for the report listing.
#[derive(Debug, Clone, Default)]
pub struct UserReportFilter {
    pub status: Option<UserReportStatus>,
    pub category: Option<ReportCategory>,
    pub priority: Option<ReportPriority>,
}

/// Report counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, FromQueryResult, Serialize)]
pub struct UserReportStats {
    pub total: i64,
    pub pending: i64,
    pub reviewing: i64,
    pub resolved: i64,
    pub dismissed: i64,
    pub critical: i64,
    pub today: i64,
}

/// Reports sharing one category or one report type.
#[derive(Debug, Clone, PartialEq, Eq, FromQueryResult, Serialize)]
pub struct ReportBreakdown {
    pub label: String,
    pub count: i64,
}

/// A user with the number of reports they filed or received.
#[derive(Debug, Clone, PartialEq, Eq, FromQueryResult, Serialize)]
pub struct ReportedUserCount {
    pub user_id: String,
    pub full_name: String,
    pub email: String,
    pub profile_img: Option<String>,
    pub report_count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, FromQueryResult, Serialize)]
pub struct DailyReportCount {
    /// `YYYY-MM-DD`
    pub date: String,
    pub count: i64,
}

/// Repository for user reports.
#[derive(Clone)]
pub struct UserReportRepository {
    db: Arc<DatabaseConnection>,
}

impl UserReportRepository {
    /// Create a new user report repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Get a report by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<user_report::Model> {
        UserReport::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
            .ok_or_else(|| AppError::NotFound("Report not found.".to_string()))
    }

    pub async fn update(&self, model: user_report::ActiveModel) -> AppResult<user_report::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a report. Returns the number of rows removed.
    pub async fn delete(&self, id: &str) -> AppResult<u64> {
        UserReport::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map(|r| r.rows_affected)
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Filtered listing, newest first.
    pub async fn find_filtered(
        &self,
        filter: &UserReportFilter,
    ) -> AppResult<Vec<user_report::Model>> {
        let mut query = UserReport::find();

        if let Some(status) = filter.status {
            query = query.filter(user_report::Column::Status.eq(status));
        }
        if let Some(category) = filter.category {
            query = query.filter(user_report::Column::Category.eq(category));
        }
        if let Some(priority) = filter.priority {
            query = query.filter(user_report::Column::Priority.eq(priority));
        }

        query
            .order_by_desc(user_report::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    pub async fn statistics(&self) -> AppResult<UserReportStats> {
        let stats = UserReportStats::find_by_statement(sql(
            r"
            SELECT
                COUNT(*) AS total,
                COUNT(*) FILTER (WHERE status = 'pending') AS pending,
                COUNT(*) FILTER (WHERE status = 'reviewing') AS reviewing,
                COUNT(*) FILTER (WHERE status = 'resolved') AS resolved,
                COUNT(*) FILTER (WHERE status = 'dismissed') AS dismissed,
                COUNT(*) FILTER (WHERE priority = 'critical') AS critical,
                COUNT(*) FILTER (WHERE created_at::date = CURRENT_DATE) AS today
            FROM user_report
            ",
        ))
        .one(self.db.as_ref())
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(stats.unwrap_or_default())
    }

    /// Count per category, largest first.
    pub async fn by_category(&self) -> AppResult<Vec<ReportBreakdown>> {
        self.breakdown(
            r"
            SELECT category AS label, COUNT(*) AS count
            FROM user_report
            GROUP BY category
            ORDER BY count DESC, category
            ",
        )
        .await
    }

    /// Count per report type, largest first.
    pub async fn by_type(&self) -> AppResult<Vec<ReportBreakdown>> {
        self.breakdown(
            r"
            SELECT report_type AS label, COUNT(*) AS count
            FROM user_report
            GROUP BY report_type
            ORDER BY count DESC, report_type
            ",
        )
        .await
    }

    async fn breakdown(&self, query: &str) -> AppResult<Vec<ReportBreakdown>> {
        ReportBreakdown::find_by_statement(sql(query))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Users who filed the most reports.
    pub async fn top_reporters(&self, limit: u64) -> AppResult<Vec<ReportedUserCount>> {
        self.ranked_users("reporter_id", limit).await
    }

    /// Users reported most often.
    pub async fn most_reported(&self, limit: u64) -> AppResult<Vec<ReportedUserCount>> {
        self.ranked_users("reported_user_id", limit).await
    }

    /// `column` is one of the two user columns above, never caller input.
    async fn ranked_users(
        &self,
        column: &'static str,
        limit: u64,
    ) -> AppResult<Vec<ReportedUserCount>> {
        ReportedUserCount::find_by_statement(Statement::from_sql_and_values(
            DatabaseBackend::Postgres,
            format!(
                r"
                SELECT
                    u.id AS user_id,
                    u.full_name,
                    u.email,
                    u.profile_img,
                    COUNT(ur.id) AS report_count
                FROM user_report ur
                JOIN user_account u ON u.id = ur.{column}
                GROUP BY u.id, u.full_name, u.email, u.profile_img
                ORDER BY report_count DESC, u.full_name
                LIMIT $1
                "
            ),
            [(limit as i64).into()],
        ))
        .all(self.db.as_ref())
        .await
        .map_err(|e| AppError::Database(e.to_string()))
    }

    pub async fn daily_trends(&self) -> AppResult<Vec<DailyReportCount>> {
        DailyReportCount::find_by_statement(sql(
            r"
            SELECT
                to_char(created_at::date, 'YYYY-MM-DD') AS date,
                COUNT(*) AS count
            FROM user_report
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

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{MockDatabase, MockExecResult, Value};

    fn big(n: i64) -> Value {
        Value::BigInt(Some(n))
    }

    fn text(s: &str) -> Value {
        Value::String(Some(Box::new(s.to_string())))
    }

    #[tokio::test]
    async fn test_get_by_id_not_found_message() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<user_report::Model>::new()])
                .into_connection(),
        );

        let repo = UserReportRepository::new(db);
        let err = repo.get_by_id("nope").await.unwrap_err();

        assert_eq!(err.message(), "Report not found.");
    }

    #[tokio::test]
    async fn test_find_filtered_applies_filters() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<user_report::Model>::new()])
                .into_connection(),
        );

        let repo = UserReportRepository::new(Arc::clone(&db));
        let filter = UserReportFilter {
            status: Some(UserReportStatus::Reviewing),
            category: Some(ReportCategory::Harassment),
            priority: None,
        };
        assert!(repo.find_filtered(&filter).await.unwrap().is_empty());
        drop(repo);

        let log = Arc::try_unwrap(db).ok().unwrap().into_transaction_log();
        let sql = format!("{:?}", log[0]);
        assert!(sql.contains("reviewing"));
        assert!(sql.contains("harassment"));
        assert!(!sql.contains("\"priority\" ="));
    }

    #[tokio::test]
    async fn test_most_reported_joins_reported_user() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! {
                    "user_id" => text("u9"),
                    "full_name" => text("Rex Reported"),
                    "email" => text("rex@example.org"),
                    "profile_img" => Value::String(None),
                    "report_count" => big(4),
                }]])
                .into_connection(),
        );

        let repo = UserReportRepository::new(Arc::clone(&db));
        let ranked = repo.most_reported(5).await.unwrap();
        assert_eq!(ranked[0].report_count, 4);
        assert!(ranked[0].profile_img.is_none());
        drop(repo);

        let log = Arc::try_unwrap(db).ok().unwrap().into_transaction_log();
        assert!(format!("{:?}", log[0]).contains("ur.reported_user_id"));
    }

    #[tokio::test]
    async fn test_delete_returns_rows_affected() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let repo = UserReportRepository::new(db);
        assert_eq!(repo.delete("r1").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_statistics_defaults_to_zero() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<std::collections::BTreeMap<&str, Value>>::new()])
                .into_connection(),
        );

        let repo = UserReportRepository::new(db);
        assert_eq!(repo.statistics().await.unwrap(), UserReportStats::default());
    }
}
