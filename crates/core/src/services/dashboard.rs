//! Dashboard counters and analytics.

use foodify_common::AppResult;
use foodify_db::repositories::{
    stats::{
        ActiveUser, AnnouncementCounts, DonationCounts, DonationOverview, FoodTypeShare,
        MonthlyTrend, RequestAnalytics, RequestCounts, TopDonor, UserCounts, UserOverview,
    },
    StatsRepository,
};
use serde::Serialize;

use super::donation::{DonationService, DonationView};

const RECENT_DONATIONS: u64 = 5;
const TOP_DONORS: u64 = 10;
const ACTIVE_USERS: u64 = 20;

/// Headline numbers of the dashboard.
#[derive(Debug, Serialize)]
pub struct Dashboard {
    pub donations: DonationCounts,
    pub users: UserCounts,
    pub announcements: AnnouncementCounts,
    pub requests: RequestCounts,
    pub recent_donations: Vec<DonationView>,
}

#[derive(Debug, Serialize)]
pub struct DonationAnalytics {
    pub overview: DonationOverview,
    pub food_types: Vec<FoodTypeShare>,
    pub top_donors: Vec<TopDonor>,
    /// Last 12 months, oldest first
    pub monthly_trends: Vec<MonthlyTrend>,
    pub requests: RequestAnalytics,
}

#[derive(Debug, Serialize)]
pub struct UserAnalytics {
    pub overview: UserOverview,
    pub most_active: Vec<ActiveUser>,
}

/// Dashboard and analytics service.
#[derive(Clone)]
pub struct DashboardService {
    stats_repo: StatsRepository,
    donations: DonationService,
}

impl DashboardService {
    /// Create a new dashboard service.
    #[must_use]
    pub const fn new(stats_repo: StatsRepository, donations: DonationService) -> Self {
        Self {
            stats_repo,
            donations,
        }
    }

    /// Dashboard counters and the latest donations.
    pub async fn dashboard(&self) -> AppResult<Dashboard> {
        Ok(Dashboard {
            donations: self.stats_repo.donation_counts().await?,
            users: self.stats_repo.user_counts().await?,
            announcements: self.stats_repo.announcement_counts().await?,
            requests: self.stats_repo.request_counts().await?,
            recent_donations: self.donations.list_recent(RECENT_DONATIONS).await?,
        })
    }

    /// Donation analytics.
    pub async fn donation_analytics(&self) -> AppResult<DonationAnalytics> {
        Ok(DonationAnalytics {
            overview: self.stats_repo.donation_overview().await?,
            food_types: self.stats_repo.food_type_distribution().await?,
            top_donors: self.stats_repo.top_donors(TOP_DONORS).await?,
            monthly_trends: self.stats_repo.monthly_trends().await?,
            requests: self.stats_repo.request_analytics().await?,
        })
    }

    /// User activity analytics.
    pub async fn user_analytics(&self) -> AppResult<UserAnalytics> {
        Ok(UserAnalytics {
            overview: self.stats_repo.user_overview().await?,
            most_active: self.stats_repo.most_active_users(ACTIVE_USERS).await?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use foodify_common::LocalStorage;
    use foodify_db::repositories::{
        FoodDonationRepository, ModerationLogRepository, UserAccountRepository,
    };
    use maplit::btreemap;
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, Value};

    use crate::services::{email::EmailService, moderation_log::ModerationLogService};

    fn service(db: Arc<DatabaseConnection>) -> DashboardService {
        let user_repo = UserAccountRepository::new(Arc::clone(&db));
        let donations = DonationService::new(
            FoodDonationRepository::new(Arc::clone(&db)),
            user_repo.clone(),
            EmailService::new(None),
            Arc::new(LocalStorage::new(std::env::temp_dir(), "/uploads".to_string())),
            ModerationLogService::new(ModerationLogRepository::new(Arc::clone(&db)), user_repo),
        );
        DashboardService::new(StatsRepository::new(db), donations)
    }

    #[tokio::test]
    async fn test_user_analytics() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[btreemap! {
                    "total" => Into::<Value>::into(10i64),
                    "residents" => Into::<Value>::into(8i64),
                    "officers" => Into::<Value>::into(2i64),
                    "active" => Into::<Value>::into(9i64),
                    "pending" => Into::<Value>::into(1i64),
                    "new_last_30_days" => Into::<Value>::into(3i64),
                }]])
                .append_query_results([[btreemap! {
                    "id" => Into::<Value>::into("u1"),
                    "full_name" => Into::<Value>::into("Amy"),
                    "email" => Into::<Value>::into("amy@example.org"),
                    "role" => Into::<Value>::into("resident"),
                    "announcements" => Into::<Value>::into(0i64),
                    "donations" => Into::<Value>::into(4i64),
                    "likes" => Into::<Value>::into(2i64),
                    "comments" => Into::<Value>::into(1i64),
                    "last_activity" => Value::String(None),
                }]])
                .into_connection(),
        );

        let analytics = service(db).user_analytics().await.unwrap();

        assert_eq!(analytics.overview.total, 10);
        assert_eq!(analytics.most_active.len(), 1);
        assert_eq!(analytics.most_active[0].donations, 4);
        assert!(analytics.most_active[0].last_activity.is_none());
    }
}
