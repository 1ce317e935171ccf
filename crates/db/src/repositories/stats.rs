//! Aggregate counters for the dashboard, analytics, profile and report pages.

use std::sync::Arc;

use foodify_common::{AppError, AppResult};
use sea_orm::{DatabaseBackend, DatabaseConnection, FromQueryResult, Statement};
use serde::Serialize;

use super::sql;

#[derive(Debug, Clone, Default, PartialEq, Eq, FromQueryResult, Serialize)]
pub struct DonationCounts {
    pub total: i64,
    pub pending: i64,
    pub approved: i64,
    pub rejected: i64,
    pub available: i64,
    pub claimed: i64,
    pub today: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, FromQueryResult, Serialize)]
pub struct UserCounts {
    pub total: i64,
    pub residents: i64,
    pub officers: i64,
    pub pending_approval: i64,
    pub new_this_week: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, FromQueryResult, Serialize)]
pub struct AnnouncementCounts {
    pub total: i64,
    pub published: i64,
    pub drafts: i64,
    pub likes: i64,
    pub comments: i64,
    pub shares: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, FromQueryResult, Serialize)]
pub struct RequestCounts {
    pub total: i64,
    pub pending: i64,
    pub approved: i64,
    pub completed: i64,
    pub today: i64,
}

#[derive(Debug, Clone, Default, PartialEq, FromQueryResult, Serialize)]
pub struct DonationOverview {
    pub total: i64,
    pub available: i64,
    pub reserved: i64,
    pub claimed: i64,
    pub expired: i64,
    pub cancelled: i64,
    pub total_views: i64,
    pub avg_views: f64,
}

#[derive(Debug, Clone, PartialEq, FromQueryResult, Serialize)]
pub struct FoodTypeShare {
    pub food_type: String,
    pub count: i64,
    /// Share of all donations, 0-100 with one decimal
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, FromQueryResult, Serialize)]
pub struct TopDonor {
    pub user_id: String,
    pub full_name: String,
    pub donations: i64,
    pub approved: i64,
    /// Approved share of the donor's donations, 0-100 with one decimal
    pub success_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, FromQueryResult, Serialize)]
pub struct MonthlyTrend {
    /// `YYYY-MM`
    pub month: String,
    pub donations: i64,
    pub approved: i64,
}

#[derive(Debug, Clone, Default, PartialEq, FromQueryResult, Serialize)]
pub struct RequestAnalytics {
    pub total: i64,
    pub approved: i64,
    pub rejected: i64,
    pub completed: i64,
    /// Mean hours from `reserved_at` to `responded_at`
    pub avg_response_hours: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, FromQueryResult, Serialize)]
pub struct UserOverview {
    pub total: i64,
    pub residents: i64,
    pub officers: i64,
    pub active: i64,
    pub pending: i64,
    pub new_last_30_days: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, FromQueryResult, Serialize)]
pub struct ActiveUser {
    pub id: String,
    pub full_name: String,
    pub email: String,
    pub role: String,
    pub announcements: i64,
    pub donations: i64,
    pub likes: i64,
    pub comments: i64,
    pub last_activity: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, FromQueryResult, Serialize)]
pub struct ProfileStats {
    pub announcements: i64,
    pub donations: i64,
    pub likes_given: i64,
    pub comments: i64,
    pub shares: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, FromQueryResult, Serialize)]
pub struct ReportPageStats {
    pub users: i64,
    pub donations: i64,
    pub announcements: i64,
    pub requests: i64,
}

/// Repository for aggregate queries.
#[derive(Clone)]
pub struct StatsRepository {
    db: Arc<DatabaseConnection>,
}

impl StatsRepository {
    /// Create a new stats repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    async fn one<T: FromQueryResult + Default>(&self, stmt: Statement) -> AppResult<T> {
        T::find_by_statement(stmt)
            .one(self.db.as_ref())
            .await
            .map(Option::unwrap_or_default)
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn all<T: FromQueryResult>(&self, stmt: Statement) -> AppResult<Vec<T>> {
        T::find_by_statement(stmt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    pub async fn donation_counts(&self) -> AppResult<DonationCounts> {
        self.one(sql(
            r"
            SELECT
                COUNT(*) AS total,
                COUNT(*) FILTER (WHERE approval_status = 'pending') AS pending,
                COUNT(*) FILTER (WHERE approval_status = 'approved') AS approved,
                COUNT(*) FILTER (WHERE approval_status = 'rejected') AS rejected,
                COUNT(*) FILTER (WHERE status = 'available') AS available,
                COUNT(*) FILTER (WHERE status = 'claimed') AS claimed,
                COUNT(*) FILTER (WHERE created_at::date = CURRENT_DATE) AS today
            FROM food_donation
            ",
        ))
        .await
    }

    pub async fn user_counts(&self) -> AppResult<UserCounts> {
        self.one(sql(
            r"
            SELECT
                COUNT(*) AS total,
                COUNT(*) FILTER (WHERE role = 'resident') AS residents,
                COUNT(*) FILTER (WHERE role = 'team officer') AS officers,
                COUNT(*) FILTER (WHERE status = 'pending') AS pending_approval,
                COUNT(*) FILTER (WHERE created_at >= NOW() - INTERVAL '7 days') AS new_this_week
            FROM user_account
            ",
        ))
        .await
    }

    pub async fn announcement_counts(&self) -> AppResult<AnnouncementCounts> {
        self.one(sql(
            r"
            SELECT
                COUNT(*) AS total,
                COUNT(*) FILTER (WHERE status = 'published') AS published,
                COUNT(*) FILTER (WHERE status = 'draft') AS drafts,
                COALESCE(SUM(likes_count), 0)::int8 AS likes,
                COALESCE(SUM(comments_count), 0)::int8 AS comments,
                COALESCE(SUM(shares_count), 0)::int8 AS shares
            FROM announcement
            ",
        ))
        .await
    }

    pub async fn request_counts(&self) -> AppResult<RequestCounts> {
        self.one(sql(
            r"
            SELECT
                COUNT(*) AS total,
                COUNT(*) FILTER (WHERE status = 'pending') AS pending,
                COUNT(*) FILTER (WHERE status = 'approved') AS approved,
                COUNT(*) FILTER (WHERE status = 'completed') AS completed,
                COUNT(*) FILTER (WHERE reserved_at::date = CURRENT_DATE) AS today
            FROM food_reservation
            ",
        ))
        .await
    }

    pub async fn donation_overview(&self) -> AppResult<DonationOverview> {
        self.one(sql(
            r"
            SELECT
                COUNT(*) AS total,
                COUNT(*) FILTER (WHERE status = 'available') AS available,
                COUNT(*) FILTER (WHERE status = 'reserved') AS reserved,
                COUNT(*) FILTER (WHERE status = 'claimed') AS claimed,
                COUNT(*) FILTER (WHERE status = 'expired') AS expired,
                COUNT(*) FILTER (WHERE status = 'cancelled') AS cancelled,
                COALESCE(SUM(views_count), 0)::int8 AS total_views,
                COALESCE(ROUND(AVG(views_count)::numeric, 1), 0)::float8 AS avg_views
            FROM food_donation
            ",
        ))
        .await
    }

    pub async fn food_type_distribution(&self) -> AppResult<Vec<FoodTypeShare>> {
        self.all(sql(
            r"
            SELECT
                food_type,
                COUNT(*) AS count,
                ROUND(COUNT(*) * 100.0 / SUM(COUNT(*)) OVER (), 1)::float8 AS percentage
            FROM food_donation
            GROUP BY food_type
            ORDER BY count DESC, food_type
            ",
        ))
        .await
    }

    pub async fn top_donors(&self, limit: u64) -> AppResult<Vec<TopDonor>> {
        self.all(Statement::from_sql_and_values(
            DatabaseBackend::Postgres,
            r"
            SELECT
                u.id AS user_id,
                u.full_name,
                COUNT(fd.id) AS donations,
                COUNT(fd.id) FILTER (WHERE fd.approval_status = 'approved') AS approved,
                ROUND(COUNT(fd.id) FILTER (WHERE fd.approval_status = 'approved') * 100.0
                      / COUNT(fd.id), 1)::float8 AS success_rate
            FROM user_account u
            JOIN food_donation fd ON fd.user_id = u.id
            GROUP BY u.id, u.full_name
            ORDER BY donations DESC, u.full_name
            LIMIT $1
            ",
            [(limit as i64).into()],
        ))
        .await
    }

    pub async fn monthly_trends(&self) -> AppResult<Vec<MonthlyTrend>> {
        self.all(sql(
            r"
            SELECT
                to_char(date_trunc('month', created_at), 'YYYY-MM') AS month,
                COUNT(*) AS donations,
                COUNT(*) FILTER (WHERE approval_status = 'approved') AS approved
            FROM food_donation
            WHERE created_at >= date_trunc('month', NOW()) - INTERVAL '11 months'
            GROUP BY 1
            ORDER BY 1
            ",
        ))
        .await
    }

    pub async fn request_analytics(&self) -> AppResult<RequestAnalytics> {
        self.one(sql(
            r"
            SELECT
                COUNT(*) AS total,
                COUNT(*) FILTER (WHERE status = 'approved') AS approved,
                COUNT(*) FILTER (WHERE status = 'rejected') AS rejected,
                COUNT(*) FILTER (WHERE status = 'completed') AS completed,
                COALESCE(ROUND((AVG(EXTRACT(EPOCH FROM (responded_at - reserved_at)))
                    FILTER (WHERE responded_at IS NOT NULL) / 3600)::numeric, 1), 0)::float8
                    AS avg_response_hours
            FROM food_reservation
            ",
        ))
        .await
    }

    pub async fn user_overview(&self) -> AppResult<UserOverview> {
        self.one(sql(
            r"
            SELECT
                COUNT(*) AS total,
                COUNT(*) FILTER (WHERE role = 'resident') AS residents,
                COUNT(*) FILTER (WHERE role = 'team officer') AS officers,
                COUNT(*) FILTER (WHERE status = 'approved') AS active,
                COUNT(*) FILTER (WHERE status = 'pending') AS pending,
                COUNT(*) FILTER (WHERE created_at >= NOW() - INTERVAL '30 days') AS new_last_30_days
            FROM user_account
            ",
        ))
        .await
    }

    pub async fn most_active_users(&self, limit: u64) -> AppResult<Vec<ActiveUser>> {
        self.all(Statement::from_sql_and_values(
            DatabaseBackend::Postgres,
            r"
            SELECT * FROM (
                SELECT
                    u.id, u.full_name, u.email, u.role,
                    (SELECT COUNT(*) FROM announcement a WHERE a.user_id = u.id) AS announcements,
                    (SELECT COUNT(*) FROM food_donation fd WHERE fd.user_id = u.id) AS donations,
                    (SELECT COUNT(*) FROM post_like pl WHERE pl.user_id = u.id) AS likes,
                    (SELECT COUNT(*) FROM post_comment pc WHERE pc.user_id = u.id) AS comments,
                    to_char(GREATEST(
                        (SELECT MAX(created_at) FROM announcement a WHERE a.user_id = u.id),
                        (SELECT MAX(created_at) FROM food_donation fd WHERE fd.user_id = u.id),
                        (SELECT MAX(created_at) FROM post_like pl WHERE pl.user_id = u.id),
                        (SELECT MAX(created_at) FROM post_comment pc WHERE pc.user_id = u.id)
                    ), 'YYYY-MM-DD HH24:MI:SS') AS last_activity
                FROM user_account u
                WHERE u.status = 'approved'
            ) activity
            WHERE last_activity IS NOT NULL
            ORDER BY last_activity DESC
            LIMIT $1
            ",
            [(limit as i64).into()],
        ))
        .await
    }

    pub async fn profile_stats(&self, user_id: &str) -> AppResult<ProfileStats> {
        self.one(Statement::from_sql_and_values(
            DatabaseBackend::Postgres,
            r"
            SELECT
                (SELECT COUNT(*) FROM announcement WHERE user_id = $1 AND status = 'published') AS announcements,
                (SELECT COUNT(*) FROM food_donation WHERE user_id = $1) AS donations,
                (SELECT COUNT(*) FROM post_like WHERE user_id = $1) AS likes_given,
                (SELECT COUNT(*) FROM post_comment WHERE user_id = $1) AS comments,
                (SELECT COUNT(*) FROM post_share WHERE user_id = $1) AS shares
            ",
            [user_id.into()],
        ))
        .await
    }

    pub async fn report_page_stats(&self) -> AppResult<ReportPageStats> {
        self.one(sql(
            r"
            SELECT
                (SELECT COUNT(*) FROM user_account) AS users,
                (SELECT COUNT(*) FROM food_donation) AS donations,
                (SELECT COUNT(*) FROM announcement WHERE status = 'published') AS announcements,
                (SELECT COUNT(*) FROM food_reservation) AS requests
            ",
        ))
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{MockDatabase, Value};

    fn big(n: i64) -> Value {
        Value::BigInt(Some(n))
    }

    fn text(s: &str) -> Value {
        Value::String(Some(Box::new(s.to_string())))
    }

    #[tokio::test]
    async fn test_donation_counts() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! {
                    "total" => big(9),
                    "pending" => big(2),
                    "approved" => big(6),
                    "rejected" => big(1),
                    "available" => big(5),
                    "claimed" => big(1),
                    "today" => big(0),
                }]])
                .into_connection(),
        );

        let repo = StatsRepository::new(db);
        let counts = repo.donation_counts().await.unwrap();

        assert_eq!(counts.total, 9);
        assert_eq!(counts.approved, 6);
    }

    #[tokio::test]
    async fn test_empty_result_defaults_to_zero() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<std::collections::BTreeMap<&str, Value>>::new()])
                .into_connection(),
        );

        let repo = StatsRepository::new(db);
        assert_eq!(repo.request_counts().await.unwrap(), RequestCounts::default());
    }

    #[tokio::test]
    async fn test_food_type_distribution() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[
                    maplit::btreemap! {
                        "food_type" => text("produce"),
                        "count" => big(3),
                        "percentage" => Value::Double(Some(75.0)),
                    },
                    maplit::btreemap! {
                        "food_type" => text("bakery"),
                        "count" => big(1),
                        "percentage" => Value::Double(Some(25.0)),
                    },
                ]])
                .into_connection(),
        );

        let repo = StatsRepository::new(db);
        let shares = repo.food_type_distribution().await.unwrap();

        assert_eq!(shares.len(), 2);
        assert!((shares[0].percentage - 75.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_most_active_users_optional_last_activity() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! {
                    "id" => text("u1"),
                    "full_name" => text("Ana"),
                    "email" => text("ana@example.org"),
                    "role" => text("resident"),
                    "announcements" => big(0),
                    "donations" => big(2),
                    "likes" => big(5),
                    "comments" => big(1),
                    "last_activity" => text("2025-03-01 09:30:00"),
                }]])
                .into_connection(),
        );

        let repo = StatsRepository::new(db);
        let users = repo.most_active_users(20).await.unwrap();

        assert_eq!(users[0].likes, 5);
        assert_eq!(users[0].last_activity.as_deref(), Some("2025-03-01 09:30:00"));
    }

    #[tokio::test]
    async fn test_profile_stats() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! {
                    "announcements" => big(3),
                    "donations" => big(0),
                    "likes_given" => big(8),
                    "comments" => big(2),
                    "shares" => big(1),
                }]])
                .into_connection(),
        );

        let repo = StatsRepository::new(db);
        let stats = repo.profile_stats("o1").await.unwrap();

        assert_eq!(stats.likes_given, 8);
    }
}
