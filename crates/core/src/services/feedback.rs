//! Community feedback: officers file, edit and answer feedback about the
//! platform.

use std::{cmp::Reverse, collections::HashMap};

use chrono::Utc;
use foodify_common::{AppError, AppResult, IdGenerator};
use foodify_db::{
    entities::{
        community_feedback::{self, FeedbackPriority, FeedbackStatus, FeedbackType},
        user_account,
    },
    repositories::{
        CommunityFeedbackRepository, FeedbackFilter, FeedbackStats, FeedbackTrend,
        FeedbackTypeCount, RatingCount, UserAccountRepository,
    },
};
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::moderation_log::{ClientInfo, LogEntry, ModerationLogService};
use super::parse_or_default;

const MODULE: &str = "feedback";

/// Form fields of create and update.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeedbackInput {
    pub feedback_type: Option<String>,
    pub rating: Option<String>,
    pub subject: Option<String>,
    pub message: Option<String>,
    pub priority: Option<String>,
}

struct ValidatedFeedback {
    feedback_type: FeedbackType,
    rating: i32,
    subject: String,
    message: String,
    priority: FeedbackPriority,
}

impl FeedbackInput {
    fn validate(&self) -> AppResult<ValidatedFeedback> {
        let rating = self
            .rating
            .as_deref()
            .and_then(|r| r.trim().parse::<i32>().ok())
            .filter(|r| (1..=5).contains(r))
            .ok_or_else(|| AppError::BadRequest("Invalid rating value".to_string()))?;

        let subject = self.subject.as_deref().map(str::trim).unwrap_or_default();
        let message = self.message.as_deref().map(str::trim).unwrap_or_default();
        if subject.is_empty() || message.is_empty() {
            return Err(AppError::BadRequest(
                "Subject and message are required".to_string(),
            ));
        }

        Ok(ValidatedFeedback {
            feedback_type: parse_or_default(
                self.feedback_type.as_deref(),
                FeedbackType::parse,
                "feedback type",
            )?,
            rating,
            subject: subject.to_string(),
            message: message.to_string(),
            priority: parse_or_default(self.priority.as_deref(), FeedbackPriority::parse, "priority")?,
        })
    }
}

/// Query string of the feedback listing. Unknown values are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeedbackListQuery {
    pub status: Option<String>,
    pub rating: Option<String>,
    pub feedback_type: Option<String>,
}

impl FeedbackListQuery {
    fn filter(&self) -> FeedbackFilter {
        FeedbackFilter {
            status: self
                .status
                .as_deref()
                .and_then(|s| FeedbackStatus::parse(s.trim())),
            rating: self
                .rating
                .as_deref()
                .and_then(|r| r.trim().parse().ok())
                .filter(|r| (1..=5).contains(r)),
            feedback_type: self
                .feedback_type
                .as_deref()
                .and_then(|t| FeedbackType::parse(t.trim())),
        }
    }
}

/// Feedback with its author and responder.
#[derive(Debug, Serialize)]
pub struct FeedbackView {
    #[serde(flatten)]
    pub feedback: community_feedback::Model,
    pub user_name: Option<String>,
    pub user_email: Option<String>,
    pub profile_img: Option<String>,
    pub responder_name: Option<String>,
}

/// Everything the feedback page shows.
#[derive(Debug, Serialize)]
pub struct FeedbackPage {
    pub stats: FeedbackStats,
    pub by_type: Vec<FeedbackTypeCount>,
    pub rating_distribution: Vec<RatingCount>,
    pub feedback: Vec<FeedbackView>,
    pub daily_trends: Vec<FeedbackTrend>,
}

/// Service for community feedback.
#[derive(Clone)]
pub struct FeedbackService {
    feedback_repo: CommunityFeedbackRepository,
    user_repo: UserAccountRepository,
    audit: ModerationLogService,
    id_gen: IdGenerator,
}

impl FeedbackService {
    /// Create a new feedback service.
    #[must_use]
    pub const fn new(
        feedback_repo: CommunityFeedbackRepository,
        user_repo: UserAccountRepository,
        audit: ModerationLogService,
    ) -> Self {
        Self {
            feedback_repo,
            user_repo,
            audit,
            id_gen: IdGenerator::new(),
        }
    }

    /// Counters, breakdowns and the filtered listing.
    pub async fn page(&self, query: &FeedbackListQuery) -> AppResult<FeedbackPage> {
        Ok(FeedbackPage {
            stats: self.feedback_repo.statistics().await?,
            by_type: self.feedback_repo.by_type().await?,
            rating_distribution: self.feedback_repo.rating_distribution().await?,
            feedback: self.list(query).await?,
            daily_trends: self.feedback_repo.daily_trends().await?,
        })
    }

    /// Most urgent first, then by handling state, then newest.
    pub async fn list(&self, query: &FeedbackListQuery) -> AppResult<Vec<FeedbackView>> {
        let mut feedback = self.feedback_repo.find_filtered(&query.filter()).await?;
        feedback.sort_by_key(|f| (Reverse(f.priority), status_rank(f.status)));

        let mut user_ids: Vec<String> = feedback
            .iter()
            .flat_map(|f| std::iter::once(f.user_id.clone()).chain(f.responded_by.clone()))
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

        Ok(feedback
            .into_iter()
            .map(|feedback| {
                let author = users.get(&feedback.user_id);
                let responder = feedback.responded_by.as_ref().and_then(|id| users.get(id));
                FeedbackView {
                    user_name: author.map(|u| u.full_name.clone()),
                    user_email: author.map(|u| u.email.clone()),
                    profile_img: author.and_then(|u| u.profile_img.clone()),
                    responder_name: responder.map(|u| u.full_name.clone()),
                    feedback,
                }
            })
            .collect())
    }

    /// File feedback as the signed-in officer.
    pub async fn create(
        &self,
        officer: &user_account::Model,
        input: &FeedbackInput,
        client: &ClientInfo,
    ) -> AppResult<community_feedback::Model> {
        let input = input.validate()?;

        let feedback = self
            .feedback_repo
            .create(community_feedback::ActiveModel {
                id: Set(self.id_gen.generate()),
                user_id: Set(officer.id.clone()),
                feedback_type: Set(input.feedback_type),
                rating: Set(input.rating),
                subject: Set(input.subject),
                message: Set(input.message),
                status: Set(FeedbackStatus::New),
                priority: Set(input.priority),
                response: Set(None),
                responded_by: Set(None),
                responded_at: Set(None),
                created_at: Set(Utc::now().into()),
                updated_at: Set(None),
            })
            .await?;

        tracing::info!(feedback_id = %feedback.id, officer_id = %officer.id, "Feedback submitted");

        self.audit
            .record(
                LogEntry::new(
                    &officer.id,
                    MODULE,
                    "create_feedback",
                    format!("Submitted feedback \"{}\"", feedback.subject),
                )
                .related("community_feedback", &feedback.id)
                .metadata(json!({ "rating": feedback.rating })),
                client,
            )
            .await;

        Ok(feedback)
    }

    /// Edit feedback the officer filed.
    pub async fn update(
        &self,
        officer: &user_account::Model,
        feedback_id: &str,
        input: &FeedbackInput,
        client: &ClientInfo,
    ) -> AppResult<community_feedback::Model> {
        let input = input.validate()?;
        let feedback = self.own_feedback(officer, feedback_id).await?;

        let mut active: community_feedback::ActiveModel = feedback.into();
        active.feedback_type = Set(input.feedback_type);
        active.rating = Set(input.rating);
        active.subject = Set(input.subject);
        active.message = Set(input.message);
        active.priority = Set(input.priority);
        active.updated_at = Set(Some(Utc::now().into()));
        let feedback = self.feedback_repo.update(active).await?;

        self.audit
            .record(
                LogEntry::new(
                    &officer.id,
                    MODULE,
                    "update_feedback",
                    format!("Updated feedback \"{}\"", feedback.subject),
                )
                .related("community_feedback", &feedback.id),
                client,
            )
            .await;

        Ok(feedback)
    }

    /// Delete feedback the officer filed.
    pub async fn delete(
        &self,
        officer: &user_account::Model,
        feedback_id: &str,
        client: &ClientInfo,
    ) -> AppResult<()> {
        let feedback = self.own_feedback(officer, feedback_id).await?;
        self.feedback_repo.delete(&feedback.id).await?;

        tracing::info!(feedback_id = %feedback.id, officer_id = %officer.id, "Feedback deleted");

        self.audit
            .record(
                LogEntry::new(
                    &officer.id,
                    MODULE,
                    "delete_feedback",
                    format!("Deleted feedback \"{}\"", feedback.subject),
                )
                .related("community_feedback", &feedback.id),
                client,
            )
            .await;

        Ok(())
    }

    /// Answer feedback. The status defaults to `responded`.
    pub async fn respond(
        &self,
        officer: &user_account::Model,
        feedback_id: &str,
        response: Option<&str>,
        status: Option<&str>,
        client: &ClientInfo,
    ) -> AppResult<community_feedback::Model> {
        let response = response
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .ok_or_else(|| AppError::BadRequest("Response is required.".to_string()))?;
        let status = match status.map(str::trim).filter(|s| !s.is_empty()) {
            None => FeedbackStatus::Responded,
            Some(s) => parse_status(Some(s))?,
        };

        let feedback = self.feedback_repo.get_by_id(feedback_id).await?;
        let now = Utc::now();
        let mut active: community_feedback::ActiveModel = feedback.into();
        active.response = Set(Some(response.to_string()));
        active.status = Set(status);
        active.responded_by = Set(Some(officer.id.clone()));
        active.responded_at = Set(Some(now.into()));
        active.updated_at = Set(Some(now.into()));
        let feedback = self.feedback_repo.update(active).await?;

        self.audit
            .record(
                LogEntry::new(
                    &officer.id,
                    MODULE,
                    "respond_feedback",
                    format!("Responded to feedback \"{}\"", feedback.subject),
                )
                .related("community_feedback", &feedback.id)
                .metadata(json!({ "status": status.as_str() })),
                client,
            )
            .await;

        Ok(feedback)
    }

    /// Move feedback to another handling state.
    pub async fn update_status(
        &self,
        officer: &user_account::Model,
        feedback_id: &str,
        status: Option<&str>,
        client: &ClientInfo,
    ) -> AppResult<community_feedback::Model> {
        let status = parse_status(status)?;

        let feedback = self.feedback_repo.get_by_id(feedback_id).await?;
        let previous = feedback.status;
        let mut active: community_feedback::ActiveModel = feedback.into();
        active.status = Set(status);
        active.updated_at = Set(Some(Utc::now().into()));
        let feedback = self.feedback_repo.update(active).await?;

        self.audit
            .record(
                LogEntry::new(
                    &officer.id,
                    MODULE,
                    "update_status",
                    format!(
                        "Changed feedback status from {} to {}",
                        previous.as_str(),
                        status.as_str()
                    ),
                )
                .related("community_feedback", &feedback.id),
                client,
            )
            .await;

        Ok(feedback)
    }

    async fn own_feedback(
        &self,
        officer: &user_account::Model,
        feedback_id: &str,
    ) -> AppResult<community_feedback::Model> {
        let feedback = self.feedback_repo.get_by_id(feedback_id).await?;
        if feedback.user_id != officer.id {
            return Err(AppError::Forbidden(
                "You can only change feedback you submitted.".to_string(),
            ));
        }
        Ok(feedback)
    }
}

fn parse_status(status: Option<&str>) -> AppResult<FeedbackStatus> {
    status
        .map(str::trim)
        .and_then(FeedbackStatus::parse)
        .ok_or_else(|| AppError::BadRequest("Invalid status.".to_string()))
}

const fn status_rank(status: FeedbackStatus) -> u8 {
    match status {
        FeedbackStatus::New => 0,
        FeedbackStatus::Reviewed => 1,
        FeedbackStatus::Responded => 2,
        FeedbackStatus::Resolved => 3,
        FeedbackStatus::Archived => 4,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use foodify_db::{
        entities::{
            moderation_log,
            user_account::{AccountStatus, UserRole},
        },
        repositories::ModerationLogRepository,
    };
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase};

    fn service(db: Arc<DatabaseConnection>) -> FeedbackService {
        let user_repo = UserAccountRepository::new(Arc::clone(&db));
        FeedbackService::new(
            CommunityFeedbackRepository::new(Arc::clone(&db)),
            user_repo.clone(),
            ModerationLogService::new(ModerationLogRepository::new(db), user_repo),
        )
    }

    fn officer(id: &str) -> user_account::Model {
        user_account::Model {
            id: id.to_string(),
            full_name: format!("Officer {id}"),
            email: format!("{id}@example.org"),
            phone_number: None,
            address: None,
            role: UserRole::TeamOfficer,
            status: AccountStatus::Approved,
            profile_img: None,
            password_hash: None,
            token: None,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn feedback(
        id: &str,
        priority: FeedbackPriority,
        status: FeedbackStatus,
    ) -> community_feedback::Model {
        community_feedback::Model {
            id: id.to_string(),
            user_id: "off1".to_string(),
            feedback_type: FeedbackType::Platform,
            rating: 4,
            subject: "Map view".to_string(),
            message: "Would help plan pickups".to_string(),
            status,
            priority,
            response: None,
            responded_by: None,
            responded_at: None,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn log_row() -> moderation_log::Model {
        moderation_log::Model {
            id: "l1".to_string(),
            actor_id: "off1".to_string(),
            action_type: "create_feedback".to_string(),
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

    fn input(rating: &str, subject: &str) -> FeedbackInput {
        FeedbackInput {
            feedback_type: Some("feature".to_string()),
            rating: Some(rating.to_string()),
            subject: Some(subject.to_string()),
            message: Some("Details".to_string()),
            priority: None,
        }
    }

    #[test]
    fn test_rating_must_be_one_to_five() {
        for rating in ["0", "6", "four", ""] {
            let err = input(rating, "Subject").validate().err().unwrap();
            assert_eq!(err.message(), "Invalid rating value");
        }
        assert_eq!(input("5", "Subject").validate().unwrap().rating, 5);
    }

    #[test]
    fn test_subject_and_message_required() {
        let err = input("3", "   ").validate().err().unwrap();
        assert_eq!(err.message(), "Subject and message are required");
    }

    #[test]
    fn test_defaults_and_unknown_type() {
        let validated = FeedbackInput {
            feedback_type: None,
            ..input("3", "Subject")
        }
        .validate()
        .unwrap();
        assert_eq!(validated.feedback_type, FeedbackType::Platform);
        assert_eq!(validated.priority, FeedbackPriority::Medium);

        let err = FeedbackInput {
            feedback_type: Some("weather".to_string()),
            ..input("3", "Subject")
        }
        .validate()
        .err()
        .unwrap();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_create_records_log_entry() {
        let created = feedback("f1", FeedbackPriority::Medium, FeedbackStatus::New);
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[created]])
                .append_query_results([[log_row()]])
                .into_connection(),
        );

        let service = service(Arc::clone(&db));
        let result = service
            .create(&officer("off1"), &input("4", "Map view"), &ClientInfo::default())
            .await
            .unwrap();
        assert_eq!(result.id, "f1");
        drop(service);

        let log = Arc::try_unwrap(db).ok().unwrap().into_transaction_log();
        assert_eq!(log.len(), 2);
        let entry = format!("{:?}", log[1]);
        assert!(entry.contains("moderation_log"));
        assert!(entry.contains("create_feedback"));
    }

    #[tokio::test]
    async fn test_update_someone_elses_feedback_is_forbidden() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[feedback("f1", FeedbackPriority::Low, FeedbackStatus::New)]])
                .into_connection(),
        );

        let err = service(db)
            .update(&officer("off2"), "f1", &input("2", "Edited"), &ClientInfo::default())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_respond_defaults_to_responded() {
        let existing = feedback("f1", FeedbackPriority::High, FeedbackStatus::New);
        let mut answered = existing.clone();
        answered.status = FeedbackStatus::Responded;
        answered.response = Some("Thanks, on the roadmap".to_string());

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[existing]])
                .append_query_results([[answered]])
                .append_query_results([[log_row()]])
                .into_connection(),
        );

        let service = service(Arc::clone(&db));
        let result = service
            .respond(
                &officer("off2"),
                "f1",
                Some(" Thanks, on the roadmap "),
                None,
                &ClientInfo::default(),
            )
            .await
            .unwrap();
        assert_eq!(result.status, FeedbackStatus::Responded);
        drop(service);

        let log = Arc::try_unwrap(db).ok().unwrap().into_transaction_log();
        let update = format!("{:?}", log[1]);
        assert!(update.contains("responded"));
        assert!(update.contains("off2"));
    }

    #[tokio::test]
    async fn test_respond_requires_text() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let err = service(db)
            .respond(&officer("off1"), "f1", Some("  "), None, &ClientInfo::default())
            .await
            .unwrap_err();

        assert_eq!(err.message(), "Response is required.");
    }

    #[tokio::test]
    async fn test_update_status_rejects_unknown_status() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let err = service(db)
            .update_status(&officer("off1"), "f1", Some("closed"), &ClientInfo::default())
            .await
            .unwrap_err();

        assert_eq!(err.message(), "Invalid status.");
    }

    #[tokio::test]
    async fn test_list_puts_urgent_and_new_first() {
        let mut answered = feedback("f3", FeedbackPriority::Urgent, FeedbackStatus::Responded);
        answered.responded_by = Some("off2".to_string());

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[
                    feedback("f1", FeedbackPriority::Low, FeedbackStatus::New),
                    answered,
                    feedback("f2", FeedbackPriority::Urgent, FeedbackStatus::New),
                ]])
                .append_query_results([[officer("off1"), officer("off2")]])
                .into_connection(),
        );

        let list = service(db).list(&FeedbackListQuery::default()).await.unwrap();

        let ids: Vec<&str> = list.iter().map(|v| v.feedback.id.as_str()).collect();
        assert_eq!(ids, ["f2", "f3", "f1"]);
        assert_eq!(list[1].responder_name.as_deref(), Some("Officer off2"));
        assert_eq!(list[0].user_name.as_deref(), Some("Officer off1"));
    }
}
