//! Reservation request moderation.

use std::collections::HashMap;

use chrono::{NaiveDate, Utc};
use foodify_common::{AppError, AppResult};
use foodify_db::{
    entities::{
        food_donation,
        food_reservation::{self, ReservationStatus},
        user_account,
    },
    repositories::{
        FoodDonationRepository, FoodReservationRepository, ReservationFilter, ReservationStats,
        UserAccountRepository,
    },
};
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::email::{email_suffix, EmailNotificationType, EmailService, EmailTemplateVars};
use super::moderation_log::{ClientInfo, LogEntry, ModerationLogService};

const MODULE: &str = "requests";

/// Query string of the request listing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RequestListQuery {
    pub status: Option<String>,
    pub search: Option<String>,
    /// `YYYY-MM-DD`, inclusive
    pub date_from: Option<String>,
    /// `YYYY-MM-DD`, inclusive
    pub date_to: Option<String>,
}

/// A request with donation, requester and donor summaries.
#[derive(Debug, Serialize)]
pub struct RequestView {
    #[serde(flatten)]
    pub request: food_reservation::Model,
    pub donation_title: Option<String>,
    pub donation_food_type: Option<String>,
    pub donation_quantity: Option<String>,
    pub donation_status: Option<String>,
    pub requester_name: Option<String>,
    pub requester_email: Option<String>,
    pub requester_phone: Option<String>,
    pub donor_id: Option<String>,
    pub donor_name: Option<String>,
    pub donor_email: Option<String>,
}

/// Service for moderating reservation requests.
#[derive(Clone)]
pub struct ReservationService {
    reservation_repo: FoodReservationRepository,
    donation_repo: FoodDonationRepository,
    user_repo: UserAccountRepository,
    email: EmailService,
    audit: ModerationLogService,
}

impl ReservationService {
    /// Create a new reservation service.
    #[must_use]
    pub const fn new(
        reservation_repo: FoodReservationRepository,
        donation_repo: FoodDonationRepository,
        user_repo: UserAccountRepository,
        email: EmailService,
        audit: ModerationLogService,
    ) -> Self {
        Self {
            reservation_repo,
            donation_repo,
            user_repo,
            email,
            audit,
        }
    }

    /// Filtered request listing, newest first.
    pub async fn list(&self, query: &RequestListQuery) -> AppResult<Vec<RequestView>> {
        let filter = ReservationFilter {
            status: query
                .status
                .as_deref()
                .and_then(|s| ReservationStatus::parse(s.trim())),
            search: query.search.clone(),
            date_from: parse_date_filter(query.date_from.as_deref())?,
            date_to: parse_date_filter(query.date_to.as_deref())?,
        };

        let requests = self.reservation_repo.find_filtered(&filter).await?;
        self.with_summaries(requests).await
    }

    /// Request counters.
    pub async fn statistics(&self) -> AppResult<ReservationStats> {
        self.reservation_repo.statistics().await
    }

    /// Change one request's status, emailing the requester for approvals,
    /// rejections and completions.
    pub async fn update_status(
        &self,
        officer: &user_account::Model,
        request_id: &str,
        status: Option<&str>,
        admin_notes: Option<&str>,
        client: &ClientInfo,
    ) -> AppResult<String> {
        let status = status
            .map(str::trim)
            .and_then(ReservationStatus::parse)
            .filter(|s| *s != ReservationStatus::Pending)
            .ok_or_else(|| AppError::BadRequest("Invalid status.".to_string()))?;

        let request = self
            .reservation_repo
            .find_by_id(request_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Request not found.".to_string()))?;

        let admin_notes = admin_notes.map(str::trim).filter(|n| !n.is_empty());
        let previous = request.status;
        let now = Utc::now();
        let responded_at = request.responded_at.unwrap_or_else(|| now.into());

        let mut active: food_reservation::ActiveModel = request.into();
        active.status = Set(status);
        active.admin_notes = Set(admin_notes.map(String::from));
        active.updated_at = Set(Some(now.into()));
        active.updated_by = Set(Some(officer.id.clone()));
        active.responded_at = Set(Some(responded_at));
        let request = self.reservation_repo.update(active).await?;

        tracing::info!(
            request_id = %request.id,
            officer_id = %officer.id,
            status = status.as_str(),
            "Request status updated"
        );

        let kind = match status {
            ReservationStatus::Approved => Some(EmailNotificationType::RequestApproved),
            ReservationStatus::Rejected => Some(EmailNotificationType::RequestRejected),
            ReservationStatus::Completed => Some(EmailNotificationType::RequestCompleted),
            ReservationStatus::Pending | ReservationStatus::Cancelled => None,
        };
        let sent = match kind {
            Some(kind) => Some(self.notify_requester(kind, &request, admin_notes).await),
            None => None,
        };

        self.audit
            .record(
                LogEntry::new(
                    &officer.id,
                    MODULE,
                    "update_request_status",
                    format!(
                        "Changed request status from {} to {}",
                        previous.as_str(),
                        status.as_str()
                    ),
                )
                .related("food_reservation", &request.id)
                .metadata(json!({ "admin_notes": admin_notes, "email_sent": sent })),
                client,
            )
            .await;

        let suffix = sent.map(|sent| email_suffix(sent, "requester")).unwrap_or_default();
        Ok(format!("Request status updated successfully!{suffix}"))
    }

    /// Apply one verb to many requests in a single statement.
    pub async fn bulk_action(
        &self,
        officer: &user_account::Model,
        verb: Option<&str>,
        request_ids: Option<&str>,
        client: &ClientInfo,
    ) -> AppResult<String> {
        let ids: Vec<String> = request_ids
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(String::from)
            .collect();
        if ids.is_empty() {
            return Err(AppError::BadRequest("No requests selected.".to_string()));
        }

        let status = verb
            .map(str::trim)
            .and_then(bulk_status)
            .ok_or_else(|| AppError::BadRequest("Invalid action.".to_string()))?;

        let count = self
            .reservation_repo
            .bulk_update_status(&ids, status, &officer.id, Utc::now())
            .await?;

        tracing::info!(
            officer_id = %officer.id,
            status = status.as_str(),
            count,
            "Bulk request update"
        );

        self.audit
            .record(
                LogEntry::new(
                    &officer.id,
                    MODULE,
                    "bulk_action",
                    format!("Bulk {} of {count} request(s)", verb.unwrap_or_default().trim()),
                )
                .metadata(json!({ "request_ids": ids, "updated": count })),
                client,
            )
            .await;

        Ok(format!("Successfully updated {count} request(s)."))
    }

    async fn notify_requester(
        &self,
        kind: EmailNotificationType,
        request: &food_reservation::Model,
        admin_notes: Option<&str>,
    ) -> bool {
        let loaded = async {
            let requester = self.user_repo.find_by_id(&request.requester_id).await?;
            let donation = self.donation_repo.find_by_id(&request.donation_id).await?;
            let donor = match &donation {
                Some(d) => self.user_repo.find_by_id(&d.user_id).await?,
                None => None,
            };
            AppResult::Ok((requester, donation, donor))
        }
        .await;

        let (requester, donation, donor) = match loaded {
            Ok((Some(requester), donation, donor)) => (requester, donation, donor),
            Ok((None, ..)) => return false,
            Err(e) => {
                tracing::warn!(request_id = %request.id, error = %e, "Could not load request for email");
                return false;
            }
        };

        let vars = EmailTemplateVars {
            recipient_name: requester.full_name.clone(),
            title: donation.as_ref().map(|d| d.title.clone()).unwrap_or_default(),
            reason: admin_notes.map(String::from),
            donor_name: donor.as_ref().map(|d| d.full_name.clone()),
            donor_email: donor.as_ref().map(|d| d.email.clone()),
            donor_phone: donor.and_then(|d| d.phone_number),
            ..Default::default()
        };

        self.email
            .send_notification(kind, &requester.email, &vars)
            .await
            .success
    }

    async fn with_summaries(
        &self,
        requests: Vec<food_reservation::Model>,
    ) -> AppResult<Vec<RequestView>> {
        let mut donation_ids: Vec<String> = requests.iter().map(|r| r.donation_id.clone()).collect();
        donation_ids.sort();
        donation_ids.dedup();
        let donations: HashMap<String, food_donation::Model> = self
            .donation_repo
            .find_by_ids(&donation_ids)
            .await?
            .into_iter()
            .map(|d| (d.id.clone(), d))
            .collect();

        let mut user_ids: Vec<String> = requests
            .iter()
            .map(|r| r.requester_id.clone())
            .chain(donations.values().map(|d| d.user_id.clone()))
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

        Ok(requests
            .into_iter()
            .map(|request| {
                let donation = donations.get(&request.donation_id);
                let requester = users.get(&request.requester_id);
                let donor = donation.and_then(|d| users.get(&d.user_id));
                RequestView {
                    donation_title: donation.map(|d| d.title.clone()),
                    donation_food_type: donation.map(|d| d.food_type.clone()),
                    donation_quantity: donation.map(|d| d.quantity.clone()),
                    donation_status: donation.map(|d| d.status.as_str().to_string()),
                    requester_name: requester.map(|u| u.full_name.clone()),
                    requester_email: requester.map(|u| u.email.clone()),
                    requester_phone: requester.and_then(|u| u.phone_number.clone()),
                    donor_id: donation.map(|d| d.user_id.clone()),
                    donor_name: donor.map(|u| u.full_name.clone()),
                    donor_email: donor.map(|u| u.email.clone()),
                    request,
                }
            })
            .collect())
    }
}

/// Map a bulk verb to the status it sets.
#[must_use]
pub fn bulk_status(verb: &str) -> Option<ReservationStatus> {
    match verb {
        "approve" => Some(ReservationStatus::Approved),
        "reject" => Some(ReservationStatus::Rejected),
        "complete" => Some(ReservationStatus::Completed),
        "cancel" => Some(ReservationStatus::Cancelled),
        _ => None,
    }
}

fn parse_date_filter(value: Option<&str>) -> AppResult<Option<NaiveDate>> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(v) => NaiveDate::parse_from_str(v, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| AppError::BadRequest(format!("Invalid date: {v}"))),
    }
}
