//! Officer profile and account settings.

use chrono::Utc;
use foodify_common::{AppError, AppResult};
use foodify_db::{
    entities::{announcement, food_donation, post_comment, user_account},
    repositories::{
        stats::ProfileStats, AnnouncementRepository, EngagementRepository, FoodDonationRepository,
        StatsRepository, UserAccountRepository,
    },
};
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use serde_json::json;
use validator::Validate;

use super::auth::{hash_password, verify_password};
use super::moderation_log::{ClientInfo, LogEntry, ModerationLogService};

const MODULE: &str = "settings";
const RECENT_ITEMS: u64 = 5;

/// The officer's profile page.
#[derive(Debug, Serialize)]
pub struct ProfilePage {
    pub user: user_account::Model,
    pub stats: ProfileStats,
    pub recent_announcements: Vec<announcement::Model>,
    pub recent_donations: Vec<food_donation::Model>,
    pub recent_comments: Vec<post_comment::Model>,
}

/// Profile form.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileInput {
    #[validate(length(min = 1, max = 128, message = "Full name is required."))]
    pub full_name: String,

    #[validate(email(message = "A valid email address is required."))]
    pub email: String,

    #[validate(length(max = 32))]
    pub phone_number: Option<String>,

    #[validate(length(max = 512))]
    pub address: Option<String>,
}

/// Password form.
#[derive(Debug, Deserialize, Validate)]
pub struct ChangePasswordInput {
    pub current_password: String,

    #[validate(length(min = 8, max = 128, message = "New password must be at least 8 characters."))]
    pub new_password: String,

    pub confirm_password: String,
}

/// Profile and settings service.
#[derive(Clone)]
pub struct ProfileService {
    user_repo: UserAccountRepository,
    stats_repo: StatsRepository,
    announcement_repo: AnnouncementRepository,
    donation_repo: FoodDonationRepository,
    engagement_repo: EngagementRepository,
    audit: ModerationLogService,
}

impl ProfileService {
    /// Create a new profile service.
    #[must_use]
    pub const fn new(
        user_repo: UserAccountRepository,
        stats_repo: StatsRepository,
        announcement_repo: AnnouncementRepository,
        donation_repo: FoodDonationRepository,
        engagement_repo: EngagementRepository,
        audit: ModerationLogService,
    ) -> Self {
        Self {
            user_repo,
            stats_repo,
            announcement_repo,
            donation_repo,
            engagement_repo,
            audit,
        }
    }

    /// Profile with activity stats and recent items.
    pub async fn profile(&self, officer: &user_account::Model) -> AppResult<ProfilePage> {
        Ok(ProfilePage {
            user: officer.clone(),
            stats: self.stats_repo.profile_stats(&officer.id).await?,
            recent_announcements: self
                .announcement_repo
                .find_recent_by_author(&officer.id, RECENT_ITEMS)
                .await?,
            recent_donations: self
                .donation_repo
                .find_recent_by_donor(&officer.id, RECENT_ITEMS)
                .await?,
            recent_comments: self
                .engagement_repo
                .find_recent_comments_by_user(&officer.id, RECENT_ITEMS)
                .await?,
        })
    }

    /// Update name, email, phone and address.
    pub async fn update_profile(
        &self,
        officer: &user_account::Model,
        mut input: UpdateProfileInput,
        client: &ClientInfo,
    ) -> AppResult<user_account::Model> {
        input.full_name = input.full_name.trim().to_string();
        input.email = input.email.trim().to_string();
        input.validate()?;

        if !input.email.eq_ignore_ascii_case(&officer.email) {
            let taken = self
                .user_repo
                .find_by_email(&input.email)
                .await?
                .is_some_and(|u| u.id != officer.id);
            if taken {
                return Err(AppError::Conflict(
                    "Email address is already in use.".to_string(),
                ));
            }
        }

        let address_changed = officer.address.as_deref().map(str::trim)
            != input.address.as_deref().map(str::trim);

        let mut active: user_account::ActiveModel = officer.clone().into();
        active.full_name = Set(input.full_name);
        active.email = Set(input.email);
        active.phone_number = Set(non_empty(input.phone_number));
        active.address = Set(non_empty(input.address));
        active.updated_at = Set(Some(Utc::now().into()));
        let user = self.user_repo.update(active).await?;

        tracing::info!(user_id = %user.id, address_changed, "Profile updated");

        self.audit
            .record(
                LogEntry::new(&user.id, MODULE, "update_profile", "Updated profile")
                    .related("user_account", &user.id)
                    .metadata(json!({ "address_changed": address_changed })),
                client,
            )
            .await;

        Ok(user)
    }

    /// Replace the password after checking the current one.
    pub async fn change_password(
        &self,
        officer: &user_account::Model,
        input: ChangePasswordInput,
        client: &ClientInfo,
    ) -> AppResult<()> {
        if input.new_password != input.confirm_password {
            return Err(AppError::BadRequest("New passwords do not match!".to_string()));
        }

        let current_ok = match officer.password_hash.as_deref() {
            Some(hash) => verify_password(&input.current_password, hash)?,
            None => false,
        };
        if !current_ok {
            return Err(AppError::BadRequest("Current password is incorrect!".to_string()));
        }

        input.validate()?;

        let mut active: user_account::ActiveModel = officer.clone().into();
        active.password_hash = Set(Some(hash_password(&input.new_password)?));
        active.updated_at = Set(Some(Utc::now().into()));
        self.user_repo.update(active).await?;

        tracing::info!(user_id = %officer.id, "Password changed");

        self.audit
            .record(
                LogEntry::new(&officer.id, MODULE, "change_password", "Changed password")
                    .related("user_account", &officer.id),
                client,
            )
            .await;

        Ok(())
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
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

    fn service(db: Arc<DatabaseConnection>) -> ProfileService {
        let user_repo = UserAccountRepository::new(Arc::clone(&db));
        ProfileService::new(
            user_repo.clone(),
            StatsRepository::new(Arc::clone(&db)),
            AnnouncementRepository::new(Arc::clone(&db)),
            FoodDonationRepository::new(Arc::clone(&db)),
            EngagementRepository::new(Arc::clone(&db)),
            ModerationLogService::new(ModerationLogRepository::new(db), user_repo),
        )
    }

    fn officer(password: &str) -> user_account::Model {
        user_account::Model {
            id: "off1".to_string(),
            full_name: "Olive Officer".to_string(),
            email: "olive@example.org".to_string(),
            phone_number: None,
            address: Some("12 Main St".to_string()),
            role: UserRole::TeamOfficer,
            status: AccountStatus::Approved,
            profile_img: None,
            password_hash: Some(hash_password(password).unwrap()),
            token: None,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn log_row() -> moderation_log::Model {
        moderation_log::Model {
            id: "l1".to_string(),
            actor_id: "off1".to_string(),
            action_type: "change_password".to_string(),
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

    fn password_input(current: &str, new: &str, confirm: &str) -> ChangePasswordInput {
        ChangePasswordInput {
            current_password: current.to_string(),
            new_password: new.to_string(),
            confirm_password: confirm.to_string(),
        }
    }

    #[tokio::test]
    async fn test_change_password_mismatch() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let err = service(db)
            .change_password(
                &officer("old-secret"),
                password_input("old-secret", "new-secret-1", "new-secret-2"),
                &ClientInfo::default(),
            )
            .await
            .unwrap_err();

        assert_eq!(err.message(), "New passwords do not match!");
    }

    #[tokio::test]
    async fn test_change_password_wrong_current() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let err = service(db)
            .change_password(
                &officer("old-secret"),
                password_input("guess", "new-secret-1", "new-secret-1"),
                &ClientInfo::default(),
            )
            .await
            .unwrap_err();

        assert_eq!(err.message(), "Current password is incorrect!");
    }

    #[tokio::test]
    async fn test_change_password_success() {
        let officer = officer("old-secret");
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[officer.clone()]])
                .append_query_results([[log_row()]])
                .into_connection(),
        );

        service(db)
            .change_password(
                &officer,
                password_input("old-secret", "new-secret-1", "new-secret-1"),
                &ClientInfo::default(),
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_update_profile_rejects_bad_email() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let err = service(db)
            .update_profile(
                &officer("old-secret"),
                UpdateProfileInput {
                    full_name: "Olive".to_string(),
                    email: "not-an-email".to_string(),
                    phone_number: None,
                    address: None,
                },
                &ClientInfo::default(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_update_profile_rejects_taken_email() {
        let mut other = officer("x");
        other.id = "off2".to_string();
        other.email = "taken@example.org".to_string();

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[other]])
                .into_connection(),
        );

        let err = service(db)
            .update_profile(
                &officer("old-secret"),
                UpdateProfileInput {
                    full_name: "Olive".to_string(),
                    email: "taken@example.org".to_string(),
                    phone_number: None,
                    address: Some("12 Main St".to_string()),
                },
                &ClientInfo::default(),
            )
            .await
            .unwrap_err();

        assert_eq!(err.message(), "Email address is already in use.");
    }
}
