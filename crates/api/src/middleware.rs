//! API middleware.

#![allow(missing_docs)]

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{Request, header},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;
use foodify_common::{StorageBackend, config::AuthConfig};
use foodify_core::{
    AnnouncementService, AuthService, DashboardService, DonationService, EmailService,
    FeedbackService, ModerationLogService, ProfileService, ReportService, ReservationService,
    ResidentService, UserReportService,
};
use foodify_db::repositories::{
    AnnouncementRepository, CommunityFeedbackRepository, EngagementRepository,
    FoodDonationRepository, FoodReservationRepository, ModerationLogRepository,
    ReportRepository, StatsRepository, UserAccountRepository, UserReportRepository,
};
use sea_orm::DatabaseConnection;

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub auth_service: AuthService,
    pub donation_service: DonationService,
    pub reservation_service: ReservationService,
    pub resident_service: ResidentService,
    pub report_service: ReportService,
    pub announcement_service: AnnouncementService,
    pub dashboard_service: DashboardService,
    pub profile_service: ProfileService,
    pub moderation_log_service: ModerationLogService,
    pub feedback_service: FeedbackService,
    pub user_report_service: UserReportService,
    pub auth_config: AuthConfig,
}

impl AppState {
    /// Wire repositories and services over one connection pool.
    #[must_use]
    pub fn new(
        db: Arc<DatabaseConnection>,
        auth_config: AuthConfig,
        storage: Arc<dyn StorageBackend>,
        email: EmailService,
    ) -> Self {
        let user_repo = UserAccountRepository::new(Arc::clone(&db));
        let donation_repo = FoodDonationRepository::new(Arc::clone(&db));
        let reservation_repo = FoodReservationRepository::new(Arc::clone(&db));
        let announcement_repo = AnnouncementRepository::new(Arc::clone(&db));
        let engagement_repo = EngagementRepository::new(Arc::clone(&db));
        let log_repo = ModerationLogRepository::new(Arc::clone(&db));
        let report_repo = ReportRepository::new(Arc::clone(&db));
        let feedback_repo = CommunityFeedbackRepository::new(Arc::clone(&db));
        let user_report_repo = UserReportRepository::new(Arc::clone(&db));
        let stats_repo = StatsRepository::new(db);

        let moderation_log_service = ModerationLogService::new(log_repo, user_repo.clone());
        let donation_service = DonationService::new(
            donation_repo.clone(),
            user_repo.clone(),
            email.clone(),
            storage,
            moderation_log_service.clone(),
        );
        let reservation_service = ReservationService::new(
            reservation_repo,
            donation_repo.clone(),
            user_repo.clone(),
            email,
            moderation_log_service.clone(),
        );
        let resident_service = ResidentService::new(user_repo.clone(), donation_repo.clone());
        let report_service = ReportService::new(report_repo, stats_repo.clone());
        let announcement_service = AnnouncementService::new(
            announcement_repo.clone(),
            engagement_repo.clone(),
            user_repo.clone(),
            moderation_log_service.clone(),
        );
        let dashboard_service = DashboardService::new(stats_repo.clone(), donation_service.clone());
        let profile_service = ProfileService::new(
            user_repo.clone(),
            stats_repo,
            announcement_repo,
            donation_repo,
            engagement_repo,
            moderation_log_service.clone(),
        );
        let feedback_service = FeedbackService::new(
            feedback_repo,
            user_repo.clone(),
            moderation_log_service.clone(),
        );
        let user_report_service = UserReportService::new(
            user_report_repo,
            user_repo.clone(),
            moderation_log_service.clone(),
        );

        Self {
            auth_service: AuthService::new(user_repo),
            donation_service,
            reservation_service,
            resident_service,
            report_service,
            announcement_service,
            dashboard_service,
            profile_service,
            moderation_log_service,
            feedback_service,
            user_report_service,
            auth_config,
        }
    }
}

/// Authentication middleware.
///
/// Resolves the session from `Authorization: Bearer` or the session cookie
/// and stores the user in request extensions. Requests without a valid
/// session pass through; the extractors decide.
pub async fn auth_middleware(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let bearer = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string);

    let token = bearer.or_else(|| {
        jar.get(&state.auth_config.cookie_name)
            .map(|c| c.value().to_string())
    });

    if let Some(token) = token {
        match state.auth_service.authenticate_by_token(&token).await {
            Ok(Some(user)) => {
                req.extensions_mut().insert(user);
            }
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %e, "Failed to resolve session token"),
        }
    }

    next.run(req).await
}
