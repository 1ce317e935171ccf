//! Report queries.
//!
//! Each report is a fixed SQL listing whose column order is the export
//! column order. Rows come back as JSON objects.

use std::{fmt, str::FromStr, sync::Arc};

use chrono::NaiveDate;
use foodify_common::{AppError, AppResult, Row};
use sea_orm::{
    DatabaseBackend, DatabaseConnection, FromQueryResult, JsonValue, Statement, Value,
};
use serde::Serialize;

/// Available reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportType {
    Donations,
    Users,
    Announcements,
    Requests,
    Engagement,
    Summary,
}

impl ReportType {
    /// Wire name, also used in download filenames.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Donations => "donations",
            Self::Users => "users",
            Self::Announcements => "announcements",
            Self::Requests => "requests",
            Self::Engagement => "engagement",
            Self::Summary => "summary",
        }
    }

    /// Query head, the timestamp column the date range applies to, and the tail.
    const fn query(self) -> (&'static str, Option<&'static str>, &'static str) {
        match self {
            Self::Donations => (
                r"
                SELECT fd.id, fd.title, fd.food_type, fd.status, fd.approval_status,
                       fd.views_count, fd.location_address,
                       to_char(fd.created_at, 'YYYY-MM-DD HH24:MI:SS') AS created_at,
                       u.full_name AS donor_name, u.email AS donor_email
                FROM food_donation fd
                JOIN user_account u ON fd.user_id = u.id
                WHERE 1=1",
                Some("fd.created_at"),
                "ORDER BY fd.created_at DESC",
            ),
            Self::Users => (
                r"
                SELECT id AS user_id, full_name, email, role, status,
                       to_char(created_at, 'YYYY-MM-DD HH24:MI:SS') AS created_at
                FROM user_account
                WHERE 1=1",
                Some("created_at"),
                "ORDER BY user_account.created_at DESC",
            ),
            Self::Announcements => (
                r#"
                SELECT a.id, a.title, a."type", a.priority, a.status,
                       a.likes_count, a.comments_count, a.shares_count,
                       to_char(a.created_at, 'YYYY-MM-DD HH24:MI:SS') AS created_at,
                       u.full_name AS author_name
                FROM announcement a
                JOIN user_account u ON a.user_id = u.id
                WHERE 1=1"#,
                Some("a.created_at"),
                "ORDER BY a.created_at DESC",
            ),
            Self::Requests => (
                r"
                SELECT fr.id, fr.status,
                       to_char(fr.reserved_at, 'YYYY-MM-DD HH24:MI:SS') AS reserved_at,
                       to_char(fr.responded_at, 'YYYY-MM-DD HH24:MI:SS') AS responded_at,
                       fd.title AS donation_title,
                       u.full_name AS requester_name, u.email AS requester_email
                FROM food_reservation fr
                JOIN food_donation fd ON fr.donation_id = fd.id
                JOIN user_account u ON fr.requester_id = u.id
                WHERE 1=1",
                Some("fr.reserved_at"),
                "ORDER BY fr.reserved_at DESC",
            ),
            Self::Engagement => (
                r"
                SELECT * FROM (
                SELECT u.id AS user_id, u.full_name, u.email, u.role,
                       (SELECT COUNT(*) FROM announcement a WHERE a.user_id = u.id) AS announcements,
                       (SELECT COUNT(*) FROM food_donation fd WHERE fd.user_id = u.id) AS donations,
                       (SELECT COUNT(*) FROM post_like pl WHERE pl.user_id = u.id) AS likes,
                       (SELECT COUNT(*) FROM post_comment pc WHERE pc.user_id = u.id) AS comments
                FROM user_account u
                WHERE u.status = 'approved'",
                Some("u.created_at"),
                ") engagement ORDER BY (announcements + donations + likes + comments) DESC, full_name",
            ),
            Self::Summary => (
                r"
                SELECT
                    (SELECT COUNT(*) FROM user_account WHERE status = 'approved') AS total_users,
                    (SELECT COUNT(*) FROM food_donation) AS total_donations,
                    (SELECT COUNT(*) FROM announcement WHERE status = 'published') AS total_announcements,
                    (SELECT COUNT(*) FROM food_reservation) AS total_requests
                WHERE 1=1",
                None,
                "",
            ),
        }
    }
}

impl fmt::Display for ReportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "donations" => Ok(Self::Donations),
            "users" => Ok(Self::Users),
            "announcements" => Ok(Self::Announcements),
            "requests" => Ok(Self::Requests),
            "engagement" => Ok(Self::Engagement),
            "summary" => Ok(Self::Summary),
            _ => Err(AppError::BadRequest("Invalid report type.".to_string())),
        }
    }
}

/// Inclusive date range on the report's timestamp column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

/// One entry of the recent activity feed.
#[derive(Debug, Clone, PartialEq, Eq, FromQueryResult, Serialize)]
pub struct RecentActivity {
    /// `Donation` or `Announcement`
    #[serde(rename = "type")]
    pub kind: String,
    pub id: String,
    pub description: String,
    pub created_at: String,
}

/// Build the statement for a report.
#[must_use]
pub fn report_statement(report: ReportType, range: ReportRange) -> Statement {
    let (select, date_column, order) = report.query();
    let mut sql = select.to_string();
    let mut values: Vec<Value> = Vec::new();

    if let Some(column) = date_column {
        if let Some(from) = range.from {
            values.push(from.into());
            sql.push_str(&format!(" AND {column}::date >= ${}", values.len()));
        }
        if let Some(to) = range.to {
            values.push(to.into());
            sql.push_str(&format!(" AND {column}::date <= ${}", values.len()));
        }
    }

    if !order.is_empty() {
        sql.push(' ');
        sql.push_str(order);
    }

    Statement::from_sql_and_values(DatabaseBackend::Postgres, sql, values)
}

/// Repository for report queries.
#[derive(Clone)]
pub struct ReportRepository {
    db: Arc<DatabaseConnection>,
}

impl ReportRepository {
    /// Create a new report repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Run a report.
    pub async fn rows(&self, report: ReportType, range: ReportRange) -> AppResult<Vec<Row>> {
        let rows = JsonValue::find_by_statement(report_statement(report, range))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(rows
            .into_iter()
            .filter_map(|row| match row {
                JsonValue::Object(map) => Some(map),
                _ => None,
            })
            .collect())
    }

    /// Newest donations and announcements, merged.
    pub async fn recent_activity(&self, limit: u64) -> AppResult<Vec<RecentActivity>> {
        RecentActivity::find_by_statement(Statement::from_sql_and_values(
            DatabaseBackend::Postgres,
            r"
            SELECT kind, id, description, to_char(created_at, 'YYYY-MM-DD HH24:MI:SS') AS created_at
            FROM (
                SELECT 'Donation' AS kind, id, title AS description, created_at FROM food_donation
                UNION ALL
                SELECT 'Announcement' AS kind, id, title AS description, created_at FROM announcement
            ) activity
            ORDER BY activity.created_at DESC
            LIMIT $1
            ",
            [(limit as i64).into()],
        ))
        .all(self.db.as_ref())
        .await
        .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::MockDatabase;

    #[test]
    fn test_parse_report_type() {
        assert_eq!("donations".parse::<ReportType>().unwrap(), ReportType::Donations);
        assert_eq!(" summary ".parse::<ReportType>().unwrap(), ReportType::Summary);

        let err = "inventory".parse::<ReportType>().unwrap_err();
        assert_eq!(err.message(), "Invalid report type.");
    }

    #[test]
    fn test_statement_numbers_date_placeholders() {
        let range = ReportRange {
            from: NaiveDate::from_ymd_opt(2025, 1, 1),
            to: NaiveDate::from_ymd_opt(2025, 1, 31),
        };

        let stmt = report_statement(ReportType::Donations, range);
        assert!(stmt.sql.contains("fd.created_at::date >= $1"));
        assert!(stmt.sql.contains("fd.created_at::date <= $2"));
        assert!(stmt.sql.trim_end().ends_with("ORDER BY fd.created_at DESC"));
        assert_eq!(stmt.values.map(|v| v.0.len()), Some(2));
    }

    #[test]
    fn test_statement_only_upper_bound() {
        let range = ReportRange {
            from: None,
            to: NaiveDate::from_ymd_opt(2025, 1, 31),
        };

        let stmt = report_statement(ReportType::Requests, range);
        assert!(stmt.sql.contains("fr.reserved_at::date <= $1"));
    }

    #[test]
    fn test_summary_ignores_range() {
        let range = ReportRange {
            from: NaiveDate::from_ymd_opt(2025, 1, 1),
            to: None,
        };

        let stmt = report_statement(ReportType::Summary, range);
        assert!(!stmt.sql.contains("$1"));
        assert!(stmt.sql.contains("total_requests"));
    }

    #[test]
    fn test_engagement_orders_by_activity_sum() {
        let stmt = report_statement(ReportType::Engagement, ReportRange::default());
        assert!(stmt.sql.contains("FROM post_comment pc"));
        assert!(stmt.sql.trim_end().ends_with("likes + comments) DESC, full_name"));
    }

    #[tokio::test]
    async fn test_rows_returns_objects() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! {
                    "user_id" => Value::String(Some(Box::new("u1".to_string()))),
                    "full_name" => Value::String(Some(Box::new("Ana".to_string()))),
                }]])
                .into_connection(),
        );

        let repo = ReportRepository::new(db);
        let rows = repo.rows(ReportType::Users, ReportRange::default()).await.unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["full_name"], "Ana");
    }

    #[tokio::test]
    async fn test_recent_activity() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! {
                    "kind" => Value::String(Some(Box::new("Donation".to_string()))),
                    "id" => Value::String(Some(Box::new("d1".to_string()))),
                    "description" => Value::String(Some(Box::new("Rice".to_string()))),
                    "created_at" => Value::String(Some(Box::new("2025-03-01 10:00:00".to_string()))),
                }]])
                .into_connection(),
        );

        let repo = ReportRepository::new(db);
        let recent = repo.recent_activity(10).await.unwrap();

        assert_eq!(recent[0].kind, "Donation");
    }
}
