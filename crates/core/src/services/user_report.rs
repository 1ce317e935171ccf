//! User report triage: status, priority, deletion and actions against the
//! reported account.

use std::{cmp::Reverse, collections::HashMap};

use chrono::Utc;
use foodify_common::{AppError, AppResult};
use foodify_db::{
    entities::{
        user_account::{self, AccountStatus, UserRole},
        user_report::{self, ReportCategory, ReportPriority, UserReportStatus},
    },
    repositories::{
        DailyReportCount, ReportBreakdown, ReportedUserCount, UserAccountRepository,
        UserReportFilter, UserReportRepository, UserReportStats,
    },
};
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::moderation_log::{ClientInfo, LogEntry, ModerationLogService};

const MODULE: &str = "user_reports";
/// Rows in the top reporters and most reported tables.
const RANKING_LIMIT: u64 = 10;

/// Query string of the report listing. Unknown values are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserReportListQuery {
    pub status: Option<String>,
    pub category: Option<String>,
    pub priority: Option<String>,
}

impl UserReportListQuery {
    fn filter(&self) -> UserReportFilter {
        UserReportFilter {
            status: self
                .status
                .as_deref()
                .and_then(|s| UserReportStatus::parse(s.trim())),
            category: self
                .category
                .as_deref()
                .and_then(|c| ReportCategory::parse(c.trim())),
            priority: self
                .priority
                .as_deref()
                .and_then(|p| ReportPriority::parse(p.trim())),
        }
    }
}

/// A report with the names of the accounts involved.
#[derive(Debug, Serialize)]
pub struct UserReportView {
    #[serde(flatten)]
    pub report: user_report::Model,
    pub reporter_name: Option<String>,
    pub reporter_email: Option<String>,
    pub reported_user_name: Option<String>,
    pub reported_user_email: Option<String>,
    pub resolver_name: Option<String>,
}

/// Everything the reports page shows.
#[derive(Debug, Serialize)]
pub struct UserReportPage {
    pub stats: UserReportStats,
    pub by_category: Vec<ReportBreakdown>,
    pub by_type: Vec<ReportBreakdown>,
    pub reports: Vec<UserReportView>,
    pub top_reporters: Vec<ReportedUserCount>,
    pub most_reported: Vec<ReportedUserCount>,
    pub daily_trends: Vec<DailyReportCount>,
}

/// What an officer does about a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportAction {
    WarnUser,
    SuspendUser,
    DeleteContent,
}

impl ReportAction {
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "warn_user" => Some(Self::WarnUser),
            "suspend_user" => Some(Self::SuspendUser),
            "delete_content" => Some(Self::DeleteContent),
            _ => None,
        }
    }
}

/// Service for user reports.
#[derive(Clone)]
pub struct UserReportService {
    report_repo: UserReportRepository,
    user_repo: UserAccountRepository,
    audit: ModerationLogService,
}

impl UserReportService {
    /// Create a new user report service.
    #[must_use]
    pub const fn new(
        report_repo: UserReportRepository,
        user_repo: UserAccountRepository,
        audit: ModerationLogService,
    ) -> Self {
        Self {
            report_repo,
            user_repo,
            audit,
        }
    }

    pub async fn page(&self, query: &UserReportListQuery) -> AppResult<UserReportPage> {
        Ok(UserReportPage {
            stats: self.report_repo.statistics().await?,
            by_category: self.report_repo.by_category().await?,
            by_type: self.report_repo.by_type().await?,
            reports: self.list(query).await?,
            top_reporters: self.report_repo.top_reporters(RANKING_LIMIT).await?,
            most_reported: self.report_repo.most_reported(RANKING_LIMIT).await?,
            daily_trends: self.report_repo.daily_trends().await?,
        })
    }

    /// Most critical first, then by triage state, then newest.
    pub async fn list(&self, query: &UserReportListQuery) -> AppResult<Vec<UserReportView>> {
        let mut reports = self.report_repo.find_filtered(&query.filter()).await?;
        reports.sort_by_key(|r| (Reverse(r.priority), status_rank(r.status)));

        let mut user_ids: Vec<String> = reports
            .iter()
            .flat_map(|r| {
                std::iter::once(r.reporter_id.clone())
                    .chain(r.reported_user_id.clone())
                    .chain(r.resolved_by.clone())
            })
            .collect();
        user_ids.sort();
        user_ids.dedup();
        let users: HashMap<String, user_account::Model> = self
            .user_repo
            .find_by_ids(&user_ids)
            .await?
            .into_iter()
            .map(|u| (u.id.clone(), u))
            .collect();

        Ok(reports
            .into_iter()
            .map(|report| {
                let reporter = users.get(&report.reporter_id);
                let reported = report.reported_user_id.as_ref().and_then(|id| users.get(id));
                let resolver = report.resolved_by.as_ref().and_then(|id| users.get(id));
                UserReportView {
                    reporter_name: reporter.map(|u| u.full_name.clone()),
                    reporter_email: reporter.map(|u| u.email.clone()),
                    reported_user_name: reported.map(|u| u.full_name.clone()),
                    reported_user_email: reported.map(|u| u.email.clone()),
                    resolver_name: resolver.map(|u| u.full_name.clone()),
                    report,
                }
            })
            .collect())
    }

    /// Move a report to another triage state. The officer becomes its resolver.
    pub async fn update_status(
        &self,
        officer: &user_account::Model,
        report_id: &str,
        status: Option<&str>,
        resolution_note: Option<&str>,
        client: &ClientInfo,
    ) -> AppResult<user_report::Model> {
        let status = status
            .map(str::trim)
            .and_then(UserReportStatus::parse)
            .ok_or_else(|| AppError::BadRequest("Invalid status.".to_string()))?;
        let note = resolution_note
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(ToString::to_string);

        let report = self.report_repo.get_by_id(report_id).await?;
        let previous = report.status;
        let mut active: user_report::ActiveModel = report.into();
        active.status = Set(status);
        active.resolution_note = Set(note);
        active.resolved_by = Set(Some(officer.id.clone()));
        active.updated_at = Set(Some(Utc::now().into()));
        let report = self.report_repo.update(active).await?;

        tracing::info!(report_id = %report.id, officer_id = %officer.id, status = status.as_str(), "Report status changed");

        self.audit
            .record(
                LogEntry::new(
                    &officer.id,
                    MODULE,
                    "update_status",
                    format!(
                        "Changed report status from {} to {}",
                        previous.as_str(),
                        status.as_str()
                    ),
                )
                .related("user_report", &report.id),
                client,
            )
            .await;

        Ok(report)
    }

    pub async fn update_priority(
        &self,
        officer: &user_account::Model,
        report_id: &str,
        priority: Option<&str>,
        client: &ClientInfo,
    ) -> AppResult<user_report::Model> {
        let priority = priority
            .map(str::trim)
            .and_then(ReportPriority::parse)
            .ok_or_else(|| AppError::BadRequest("Invalid priority.".to_string()))?;

        let report = self.report_repo.get_by_id(report_id).await?;
        let previous = report.priority;
        let mut active: user_report::ActiveModel = report.into();
        active.priority = Set(priority);
        active.updated_at = Set(Some(Utc::now().into()));
        let report = self.report_repo.update(active).await?;

        self.audit
            .record(
                LogEntry::new(
                    &officer.id,
                    MODULE,
                    "update_priority",
                    format!(
                        "Changed report priority from {} to {}",
                        previous.as_str(),
                        priority.as_str()
                    ),
                )
                .related("user_report", &report.id),
                client,
            )
            .await;

        Ok(report)
    }

    pub async fn delete(
        &self,
        officer: &user_account::Model,
        report_id: &str,
        client: &ClientInfo,
    ) -> AppResult<()> {
        if self.report_repo.delete(report_id).await? == 0 {
            return Err(AppError::NotFound("Report not found.".to_string()));
        }

        tracing::info!(report_id = %report_id, officer_id = %officer.id, "Report deleted");

        self.audit
            .record(
                LogEntry::new(&officer.id, MODULE, "delete_report", "Deleted user report")
                    .related("user_report", report_id),
                client,
            )
            .await;

        Ok(())
    }

    /// Act on a report. The target is always the report's own reported user.
    /// Returns the confirmation message.
    pub async fn take_action(
        &self,
        officer: &user_account::Model,
        report_id: &str,
        action: Option<&str>,
        client: &ClientInfo,
    ) -> AppResult<&'static str> {
        let action = action
            .map(str::trim)
            .and_then(ReportAction::parse)
            .ok_or_else(|| AppError::BadRequest("Invalid action type.".to_string()))?;

        let report = self.report_repo.get_by_id(report_id).await?;

        match action {
            ReportAction::WarnUser => {
                let target = self.reported_user(&report).await?;
                self.audit
                    .record(
                        LogEntry::new(
                            &officer.id,
                            MODULE,
                            "warn_user",
                            format!("Warned {} over a user report", target.full_name),
                        )
                        .related("user_report", &report.id)
                        .metadata(json!({ "user_id": target.id })),
                        client,
                    )
                    .await;
                Ok("Warning sent to user")
            }
            ReportAction::SuspendUser => {
                let target = self.reported_user(&report).await?;
                if target.id == officer.id {
                    return Err(AppError::BadRequest("Cannot suspend yourself.".to_string()));
                }
                if target.role == UserRole::Admin {
                    return Err(AppError::Forbidden("Cannot suspend an admin.".to_string()));
                }
                if target.status == AccountStatus::Suspended {
                    return Err(AppError::BadRequest("User is already suspended.".to_string()));
                }

                let target_id = target.id.clone();
                let name = target.full_name.clone();
                let mut active: user_account::ActiveModel = target.into();
                active.status = Set(AccountStatus::Suspended);
                active.token = Set(None);
                active.updated_at = Set(Some(Utc::now().into()));
                self.user_repo.update(active).await?;

                tracing::info!(user_id = %target_id, report_id = %report.id, officer_id = %officer.id, "User suspended");

                self.audit
                    .record(
                        LogEntry::new(
                            &officer.id,
                            MODULE,
                            "suspend_user",
                            format!("Suspended {name} over a user report"),
                        )
                        .related("user_report", &report.id)
                        .metadata(json!({ "user_id": target_id })),
                        client,
                    )
                    .await;
                Ok("User suspended successfully")
            }
            ReportAction::DeleteContent => {
                let mut active: user_report::ActiveModel = report.into();
                active.status = Set(UserReportStatus::Resolved);
                active.resolved_by = Set(Some(officer.id.clone()));
                active.updated_at = Set(Some(Utc::now().into()));
                let report = self.report_repo.update(active).await?;

                self.audit
                    .record(
                        LogEntry::new(
                            &officer.id,
                            MODULE,
                            "delete_content",
                            "Resolved a report by removing the content",
                        )
                        .related("user_report", &report.id)
                        .metadata(json!({ "reported_post_id": report.reported_post_id })),
                        client,
                    )
                    .await;
                Ok("Content action taken")
            }
        }
    }

    async fn reported_user(&self, report: &user_report::Model) -> AppResult<user_account::Model> {
        let user_id = report
            .reported_user_id
            .as_deref()
            .ok_or_else(|| AppError::BadRequest("Report has no reported user.".to_string()))?;
        self.user_repo.get_by_id(user_id).await
    }
}

const fn status_rank(status: UserReportStatus) -> u8 {
    match status {
        UserReportStatus::Pending => 0,
        UserReportStatus::Reviewing => 1,
        UserReportStatus::Resolved => 2,
        UserReportStatus::Dismissed => 3,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use foodify_db::{
        entities::{moderation_log, user_report::ReportTarget},
        repositories::ModerationLogRepository,
    };
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, MockExecResult};

    fn service(db: Arc<DatabaseConnection>) -> UserReportService {
        let user_repo = UserAccountRepository::new(Arc::clone(&db));
        UserReportService::new(
            UserReportRepository::new(Arc::clone(&db)),
            user_repo.clone(),
            ModerationLogService::new(ModerationLogRepository::new(db), user_repo),
        )
    }

    fn user(id: &str, role: UserRole) -> user_account::Model {
        user_account::Model {
            id: id.to_string(),
            full_name: format!("User {id}"),
            email: format!("{id}@example.org"),
            phone_number: None,
            address: None,
            role,
            status: AccountStatus::Approved,
            profile_img: None,
            password_hash: None,
            token: Some("session".to_string()),
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn report(
        id: &str,
        reported_user_id: Option<&str>,
        priority: ReportPriority,
        status: UserReportStatus,
    ) -> user_report::Model {
        user_report::Model {
            id: id.to_string(),
            reporter_id: "res1".to_string(),
            reported_user_id: reported_user_id.map(ToString::to_string),
            reported_post_id: None,
            report_type: ReportTarget::User,
            category: ReportCategory::Spam,
            description: "Posts the same listing every hour".to_string(),
            status,
            priority,
            resolved_by: None,
            resolution_note: None,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn log_row() -> moderation_log::Model {
        moderation_log::Model {
            id: "l1".to_string(),
            actor_id: "off1".to_string(),
            action_type: "update_status".to_string(),
            module: MODULE.to_string(),
            description: String::new(),
            related_id: None,
            related_type: None,
            metadata: None,
            ip_address: None,
            user_agent: None,
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_update_status_sets_resolver_and_logs() {
        let pending = report("r1", Some("res2"), ReportPriority::High, UserReportStatus::Pending);
        let mut resolved = pending.clone();
        resolved.status = UserReportStatus::Resolved;
        resolved.resolved_by = Some("off1".to_string());

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[pending]])
                .append_query_results([[resolved]])
                .append_query_results([[log_row()]])
                .into_connection(),
        );

        let service = service(Arc::clone(&db));
        let result = service
            .update_status(
                &user("off1", UserRole::TeamOfficer),
                "r1",
                Some("resolved"),
                Some("Listing removed"),
                &ClientInfo::default(),
            )
            .await
            .unwrap();
        assert_eq!(result.status, UserReportStatus::Resolved);
        drop(service);

        let log = Arc::try_unwrap(db).ok().unwrap().into_transaction_log();
        assert_eq!(log.len(), 3);
        let update = format!("{:?}", log[1]);
        assert!(update.contains("Listing removed"));
        assert!(update.contains("off1"));
        assert!(format!("{:?}", log[2]).contains("moderation_log"));
    }

    #[tokio::test]
    async fn test_update_priority_rejects_unknown_value() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let err = service(db)
            .update_priority(
                &user("off1", UserRole::TeamOfficer),
                "r1",
                Some("blocker"),
                &ClientInfo::default(),
            )
            .await
            .unwrap_err();

        assert_eq!(err.message(), "Invalid priority.");
    }

    #[tokio::test]
    async fn test_delete_missing_report() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );

        let err = service(db)
            .delete(&user("off1", UserRole::TeamOfficer), "r9", &ClientInfo::default())
            .await
            .unwrap_err();

        assert_eq!(err.message(), "Report not found.");
    }

    #[tokio::test]
    async fn test_unknown_action_type() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let err = service(db)
            .take_action(
                &user("off1", UserRole::TeamOfficer),
                "r1",
                Some("ban_forever"),
                &ClientInfo::default(),
            )
            .await
            .unwrap_err();

        assert_eq!(err.message(), "Invalid action type.");
    }

    #[tokio::test]
    async fn test_suspend_user_clears_session() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[report(
                    "r1",
                    Some("res2"),
                    ReportPriority::Critical,
                    UserReportStatus::Reviewing,
                )]])
                .append_query_results([[user("res2", UserRole::Resident)]])
                .append_query_results([[user("res2", UserRole::Resident)]])
                .append_query_results([[log_row()]])
                .into_connection(),
        );

        let service = service(Arc::clone(&db));
        let message = service
            .take_action(
                &user("off1", UserRole::TeamOfficer),
                "r1",
                Some("suspend_user"),
                &ClientInfo::default(),
            )
            .await
            .unwrap();
        assert_eq!(message, "User suspended successfully");
        drop(service);

        let log = Arc::try_unwrap(db).ok().unwrap().into_transaction_log();
        let update = format!("{:?}", log[2]);
        assert!(update.contains("UPDATE"));
        assert!(update.contains("suspended"));
        assert!(format!("{:?}", log[3]).contains("suspend_user"));
    }

    #[tokio::test]
    async fn test_cannot_suspend_admin() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[report(
                    "r1",
                    Some("adm1"),
                    ReportPriority::Low,
                    UserReportStatus::Pending,
                )]])
                .append_query_results([[user("adm1", UserRole::Admin)]])
                .into_connection(),
        );

        let err = service(db)
            .take_action(
                &user("off1", UserRole::TeamOfficer),
                "r1",
                Some("suspend_user"),
                &ClientInfo::default(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_cannot_suspend_self() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[report(
                    "r1",
                    Some("off1"),
                    ReportPriority::Low,
                    UserReportStatus::Pending,
                )]])
                .append_query_results([[user("off1", UserRole::TeamOfficer)]])
                .into_connection(),
        );

        let err = service(db)
            .take_action(
                &user("off1", UserRole::TeamOfficer),
                "r1",
                Some("suspend_user"),
                &ClientInfo::default(),
            )
            .await
            .unwrap_err();

        assert_eq!(err.message(), "Cannot suspend yourself.");
    }

    #[tokio::test]
    async fn test_warn_requires_reported_user() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[report("r1", None, ReportPriority::Low, UserReportStatus::Pending)]])
                .into_connection(),
        );

        let err = service(db)
            .take_action(
                &user("off1", UserRole::TeamOfficer),
                "r1",
                Some("warn_user"),
                &ClientInfo::default(),
            )
            .await
            .unwrap_err();

        assert_eq!(err.message(), "Report has no reported user.");
    }

    #[tokio::test]
    async fn test_delete_content_resolves_report() {
        let open = report("r1", None, ReportPriority::Medium, UserReportStatus::Reviewing);
        let mut resolved = open.clone();
        resolved.status = UserReportStatus::Resolved;

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[open]])
                .append_query_results([[resolved]])
                .append_query_results([[log_row()]])
                .into_connection(),
        );

        let service = service(Arc::clone(&db));
        let message = service
            .take_action(
                &user("off1", UserRole::TeamOfficer),
                "r1",
                Some("delete_content"),
                &ClientInfo::default(),
            )
            .await
            .unwrap();
        assert_eq!(message, "Content action taken");
        drop(service);

        let log = Arc::try_unwrap(db).ok().unwrap().into_transaction_log();
        assert!(format!("{:?}", log[1]).contains("resolved"));
    }

    #[tokio::test]
    async fn test_list_puts_critical_and_pending_first() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[
                    report("r1", None, ReportPriority::Low, UserReportStatus::Pending),
                    report("r2", Some("res2"), ReportPriority::Critical, UserReportStatus::Resolved),
                    report("r3", None, ReportPriority::Critical, UserReportStatus::Pending),
                ]])
                .append_query_results([[
                    user("res1", UserRole::Resident),
                    user("res2", UserRole::Resident),
                ]])
                .into_connection(),
        );

        let list = service(db).list(&UserReportListQuery::default()).await.unwrap();

        let ids: Vec<&str> = list.iter().map(|v| v.report.id.as_str()).collect();
        assert_eq!(ids, ["r3", "r2", "r1"]);
        assert_eq!(list[1].reported_user_name.as_deref(), Some("User res2"));
        assert_eq!(list[2].reporter_name.as_deref(), Some("User res1"));
    }
}
