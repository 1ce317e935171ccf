//! Donation moderation: review, expiry management and assignment.

use std::{collections::HashMap, sync::Arc};

use chrono::{NaiveDate, Utc};
use foodify_common::{AppError, AppResult, IdGenerator, StorageBackend};
use foodify_db::{
    entities::{
        food_donation::{self, ApprovalStatus, DonationStatus},
        user_account::{self, UserRole},
    },
    repositories::{
        AssignedReservation, DonationFilter, DonationReview, FoodDonationRepository,
        UserAccountRepository,
    },
};
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::email::{email_suffix, EmailNotificationType, EmailService, EmailTemplateVars};
use super::moderation_log::{ClientInfo, LogEntry, ModerationLogService};

const MODULE: &str = "donations";
const DEFAULT_DELETE_REASON: &str = "Removed by team officer";

/// Query string of the management listing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DonationListQuery {
    pub approval_status: Option<String>,
    pub search: Option<String>,
    pub food_type: Option<String>,
    /// `yes` or `no`
    pub expired: Option<String>,
}

/// A donation with the names the panel shows next to it.
#[derive(Debug, Serialize)]
pub struct DonationView {
    #[serde(flatten)]
    pub donation: food_donation::Model,
    pub image_urls: Vec<String>,
    pub donor_name: Option<String>,
    pub donor_email: Option<String>,
    pub donor_phone: Option<String>,
    pub approved_by_name: Option<String>,
    pub assigned_to_name: Option<String>,
}

/// Donation moderation service.
#[derive(Clone)]
pub struct DonationService {
    donation_repo: FoodDonationRepository,
    user_repo: UserAccountRepository,
    email: EmailService,
    storage: Arc<dyn StorageBackend>,
    audit: ModerationLogService,
    id_gen: IdGenerator,
}

impl DonationService {
    /// Create a new donation service.
    #[must_use]
    pub const fn new(
        donation_repo: FoodDonationRepository,
        user_repo: UserAccountRepository,
        email: EmailService,
        storage: Arc<dyn StorageBackend>,
        audit: ModerationLogService,
    ) -> Self {
        Self {
            donation_repo,
            user_repo,
            email,
            storage,
            audit,
            id_gen: IdGenerator::new(),
        }
    }

    /// Donations awaiting review.
    pub async fn list_pending(&self) -> AppResult<Vec<DonationView>> {
        let donations = self.donation_repo.find_pending().await?;
        self.with_names(donations).await
    }

    /// Management listing.
    pub async fn list(&self, query: &DonationListQuery) -> AppResult<Vec<DonationView>> {
        let filter = DonationFilter {
            approval_status: query
                .approval_status
                .as_deref()
                .and_then(|s| ApprovalStatus::parse(s.trim())),
            search: query.search.clone(),
            food_type: query.food_type.clone(),
            expired: match query.expired.as_deref().map(str::trim) {
                Some("yes") => Some(true),
                Some("no") => Some(false),
                _ => None,
            },
            today: Utc::now().date_naive(),
        };

        let donations = self.donation_repo.find_filtered(&filter).await?;
        self.with_names(donations).await
    }

    /// Expired or withdrawn donations.
    pub async fn list_expired(&self) -> AppResult<Vec<DonationView>> {
        let donations = self.donation_repo.find_expired(Utc::now().date_naive()).await?;
        self.with_names(donations).await
    }

    /// The most recent donations.
    pub async fn list_recent(&self, limit: u64) -> AppResult<Vec<DonationView>> {
        let donations = self.donation_repo.find_recent(limit).await?;
        self.with_names(donations).await
    }

    /// One donation with donor, approver and assignee names.
    pub async fn get_details(&self, donation_id: &str) -> AppResult<DonationView> {
        let donation = self.donation_repo.get_by_id(donation_id).await?;
        self.with_names(vec![donation])
            .await?
            .pop()
            .ok_or_else(|| AppError::NotFound("Donation not found.".to_string()))
    }

    /// Approve a pending donation and tell the donor.
    pub async fn approve(
        &self,
        officer: &user_account::Model,
        donation_id: &str,
        client: &ClientInfo,
    ) -> AppResult<String> {
        let donation = self
            .review(officer, donation_id, ApprovalStatus::Approved, None)
            .await?;

        tracing::info!(donation_id = %donation.id, officer_id = %officer.id, "Donation approved");

        let sent = self
            .notify_donor(EmailNotificationType::DonationApproved, &donation, None)
            .await;

        self.audit
            .record(
                LogEntry::new(&officer.id, MODULE, "approve", format!("Approved donation \"{}\"", donation.title))
                    .related("food_donation", &donation.id)
                    .metadata(json!({ "email_sent": sent })),
                client,
            )
            .await;

        Ok(format!(
            "Food donation approved successfully!{}",
            email_suffix(sent, "donor")
        ))
    }

    /// Reject a pending donation with a reason and tell the donor.
    pub async fn reject(
        &self,
        officer: &user_account::Model,
        donation_id: &str,
        reason: Option<&str>,
        client: &ClientInfo,
    ) -> AppResult<String> {
        let reason = reason
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .ok_or_else(|| AppError::BadRequest("Rejection reason is required.".to_string()))?;

        let donation = self
            .review(officer, donation_id, ApprovalStatus::Rejected, Some(reason))
            .await?;

        tracing::info!(donation_id = %donation.id, officer_id = %officer.id, "Donation rejected");

        let sent = self
            .notify_donor(EmailNotificationType::DonationRejected, &donation, Some(reason))
            .await;

        self.audit
            .record(
                LogEntry::new(&officer.id, MODULE, "reject", format!("Rejected donation \"{}\"", donation.title))
                    .related("food_donation", &donation.id)
                    .metadata(json!({ "reason": reason, "email_sent": sent })),
                client,
            )
            .await;

        Ok(format!("Food donation rejected.{}", email_suffix(sent, "donor")))
    }

    /// Delete a donation, then its stored images, then tell the donor.
    pub async fn delete(
        &self,
        officer: &user_account::Model,
        donation_id: &str,
        reason: Option<&str>,
        client: &ClientInfo,
    ) -> AppResult<String> {
        let donation = self.donation_repo.get_by_id(donation_id).await?;
        let reason = reason
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .unwrap_or(DEFAULT_DELETE_REASON);

        self.donation_repo.delete(&donation.id).await?;

        tracing::info!(donation_id = %donation.id, officer_id = %officer.id, "Donation deleted");

        let images = donation.image_keys();
        let failed = self.storage.delete_all(&images).await;
        if failed > 0 {
            tracing::warn!(donation_id = %donation.id, failed, "Some donation images were not removed");
        }

        let sent = self
            .notify_donor(EmailNotificationType::DonationDeleted, &donation, Some(reason))
            .await;

        self.audit
            .record(
                LogEntry::new(&officer.id, MODULE, "delete", format!("Deleted donation \"{}\"", donation.title))
                    .related("food_donation", &donation.id)
                    .metadata(json!({
                        "reason": reason,
                        "images": images.len(),
                        "email_sent": sent,
                    })),
                client,
            )
            .await;

        Ok(format!(
            "Donation deleted successfully!{}",
            email_suffix(sent, "donor")
        ))
    }

    /// Move the expiry date. An expired donation becomes available again.
    pub async fn extend(
        &self,
        officer: &user_account::Model,
        donation_id: &str,
        new_expiry: Option<&str>,
        client: &ClientInfo,
    ) -> AppResult<String> {
        let new_expiry = new_expiry
            .map(str::trim)
            .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
            .ok_or_else(|| {
                AppError::BadRequest("A valid new expiry date (YYYY-MM-DD) is required.".to_string())
            })?;

        let donation = self.donation_repo.get_by_id(donation_id).await?;
        let previous = donation.expiration_date;
        let revive = donation.status == DonationStatus::Expired;

        let mut active: food_donation::ActiveModel = donation.into();
        active.expiration_date = Set(Some(new_expiry));
        if revive {
            active.status = Set(DonationStatus::Available);
        }
        active.updated_at = Set(Some(Utc::now().into()));
        let donation = self.donation_repo.update(active).await?;

        tracing::info!(donation_id = %donation.id, %new_expiry, "Donation expiry extended");

        self.audit
            .record(
                LogEntry::new(&officer.id, MODULE, "extend", format!("Extended expiry of \"{}\"", donation.title))
                    .related("food_donation", &donation.id)
                    .metadata(json!({
                        "previous_expiry": previous,
                        "new_expiry": new_expiry,
                        "reactivated": revive,
                    })),
                client,
            )
            .await;

        Ok("Donation expiry extended successfully!".to_string())
    }

    /// Hand an approved donation to a resident.
    pub async fn assign(
        &self,
        officer: &user_account::Model,
        donation_id: &str,
        resident_id: &str,
        notes: Option<&str>,
        client: &ClientInfo,
    ) -> AppResult<String> {
        let donation = self
            .donation_repo
            .find_by_id(donation_id)
            .await?
            .filter(|d| d.approval_status == ApprovalStatus::Approved)
            .ok_or_else(|| AppError::NotFound("Donation not found or not approved.".to_string()))?;

        if donation.user_id == resident_id {
            return Err(AppError::BadRequest(
                "Cannot assign donation to the donor. A donor cannot receive their own donation."
                    .to_string(),
            ));
        }

        let resident = self
            .user_repo
            .find_by_id(resident_id)
            .await?
            .filter(|u| u.role == UserRole::Resident)
            .ok_or_else(|| AppError::BadRequest("Invalid resident selected.".to_string()))?;

        let notes = notes.map(str::trim).filter(|n| !n.is_empty());
        let message = notes.map_or_else(
            || "Assigned by team officer".to_string(),
            |n| format!("Assigned by team officer: {n}"),
        );
        let contact_info = match resident.phone_number.as_deref().filter(|p| !p.is_empty()) {
            Some(phone) => format!("{} / {phone}", resident.email),
            None => resident.email.clone(),
        };

        let now = Utc::now();
        let mut active: food_donation::ActiveModel = donation.into();
        active.assigned_to_user_id = Set(Some(resident.id.clone()));
        active.assigned_at = Set(Some(now.into()));
        active.assigned_by = Set(Some(officer.id.clone()));
        active.assignment_notes = Set(notes.map(String::from));
        active.status = Set(DonationStatus::Reserved);
        active.updated_at = Set(Some(now.into()));

        let donation = self
            .donation_repo
            .assign(
                active,
                AssignedReservation {
                    id: self.id_gen.generate(),
                    requester_id: resident.id.clone(),
                    message,
                    contact_info,
                    officer_id: officer.id.clone(),
                    at: now,
                },
            )
            .await?;

        tracing::info!(
            donation_id = %donation.id,
            resident_id = %resident.id,
            officer_id = %officer.id,
            "Donation assigned"
        );

        let donor = self.user_repo.find_by_id(&donation.user_id).await?;
        let mut vars = template_vars(&donation, &resident.full_name);
        vars.notes = notes.map(String::from);
        if let Some(donor) = donor {
            vars.donor_name = Some(donor.full_name);
            vars.donor_email = Some(donor.email);
            vars.donor_phone = donor.phone_number;
        }
        let sent = self
            .email
            .send_notification(EmailNotificationType::DonationAssigned, &resident.email, &vars)
            .await
            .success;

        self.audit
            .record(
                LogEntry::new(
                    &officer.id,
                    MODULE,
                    "assign",
                    format!("Assigned \"{}\" to {}", donation.title, resident.full_name),
                )
                .related("food_donation", &donation.id)
                .metadata(json!({
                    "resident_id": resident.id,
                    "notes": notes,
                    "email_sent": sent,
                })),
                client,
            )
            .await;

        Ok(format!(
            "Donation assigned successfully to {}!{}",
            resident.full_name,
            email_suffix(sent, "resident")
        ))
    }

    /// Apply a review to a pending donation and return the reviewed row.
    async fn review(
        &self,
        officer: &user_account::Model,
        donation_id: &str,
        status: ApprovalStatus,
        rejection_reason: Option<&str>,
    ) -> AppResult<food_donation::Model> {
        let already_reviewed =
            || AppError::Conflict("Donation has already been reviewed.".to_string());

        let mut donation = self.donation_repo.get_by_id(donation_id).await?;
        if donation.approval_status != ApprovalStatus::Pending {
            return Err(already_reviewed());
        }

        let now = Utc::now();
        let applied = self
            .donation_repo
            .review(
                &donation.id,
                DonationReview {
                    status,
                    officer_id: officer.id.clone(),
                    rejection_reason: rejection_reason.map(str::to_string),
                    at: now,
                },
            )
            .await?;
        if !applied {
            return Err(already_reviewed());
        }

        donation.approval_status = status;
        donation.approved_at = Some(now.into());
        donation.approved_by = Some(officer.id.clone());
        donation.rejection_reason = rejection_reason.map(str::to_string);
        donation.updated_at = Some(now.into());
        Ok(donation)
    }

    /// Send a donor notification. Returns whether it went out.
    async fn notify_donor(
        &self,
        kind: EmailNotificationType,
        donation: &food_donation::Model,
        reason: Option<&str>,
    ) -> bool {
        let donor = match self.user_repo.find_by_id(&donation.user_id).await {
            Ok(Some(donor)) => donor,
            Ok(None) => return false,
            Err(e) => {
                tracing::warn!(donation_id = %donation.id, error = %e, "Could not load donor for email");
                return false;
            }
        };

        let mut vars = template_vars(donation, &donor.full_name);
        vars.reason = reason.map(String::from);

        self.email
            .send_notification(kind, &donor.email, &vars)
            .await
            .success
    }

    async fn with_names(&self, donations: Vec<food_donation::Model>) -> AppResult<Vec<DonationView>> {
        let mut ids: Vec<String> = donations
            .iter()
            .flat_map(|d| {
                [
                    Some(d.user_id.clone()),
                    d.approved_by.clone(),
                    d.assigned_to_user_id.clone(),
                ]
            })
            .flatten()
            .collect();
        ids.sort();
        ids.dedup();

        let users: HashMap<String, user_account::Model> = self
            .user_repo
            .find_by_ids(&ids)
            .await?
            .into_iter()
            .map(|u| (u.id.clone(), u))
            .collect();
        let name_of = |id: Option<&String>| id.and_then(|id| users.get(id)).map(|u| u.full_name.clone());

        Ok(donations
            .into_iter()
            .map(|donation| {
                let donor = users.get(&donation.user_id);
                DonationView {
                    image_urls: donation
                        .image_keys()
                        .iter()
                        .map(|key| self.storage.public_url(key))
                        .collect(),
                    donor_name: donor.map(|u| u.full_name.clone()),
                    donor_email: donor.map(|u| u.email.clone()),
                    donor_phone: donor.and_then(|u| u.phone_number.clone()),
                    approved_by_name: name_of(donation.approved_by.as_ref()),
                    assigned_to_name: name_of(donation.assigned_to_user_id.as_ref()),
                    donation,
                }
            })
            .collect())
    }
}

fn template_vars(donation: &food_donation::Model, recipient_name: &str) -> EmailTemplateVars {
    EmailTemplateVars {
        recipient_name: recipient_name.to_string(),
        title: donation.title.clone(),
        description: donation.description.clone(),
        food_type: Some(ucfirst(&donation.food_type)),
        quantity: Some(donation.quantity.clone()),
        expiration_date: donation.expiration_date,
        location: donation.location_address.clone(),
        pickup_start: donation.pickup_time_start,
        pickup_end: donation.pickup_time_end,
        ..Default::default()
    }
}

fn ucfirst(s: &str) -> String {
    let mut chars = s.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}
