//! Food donation repository.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use foodify_common::{AppError, AppResult};
use sea_orm::{
    sea_query::{Expr, Query}, ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection,
    EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};

use super::contains_ci;
use crate::entities::{
    food_donation::{self, ApprovalStatus, DonationStatus},
    food_reservation::{self, ReservationStatus},
    user_account, FoodDonation, FoodReservation, UserAccount,
};

/// Filters for the donation management listing.
#[derive(Debug, Clone, Default)]
pub struct DonationFilter {
    pub approval_status: Option<ApprovalStatus>,
    /// Title, description or donor name
    pub search: Option<String>,
    pub food_type: Option<String>,
    /// `Some(true)`: past expiry; `Some(false)`: not past expiry or no date
    pub expired: Option<bool>,
    pub today: NaiveDate,
}

/// Approved reservation written together with an assignment.
#[derive(Debug, Clone)]
pub struct AssignedReservation {
    /// ID used when no reservation exists yet
    pub id: String,
    pub requester_id: String,
    pub message: String,
    pub contact_info: String,
    pub officer_id: String,
    pub at: DateTime<Utc>,
}

/// Outcome of reviewing a pending donation.
#[derive(Debug, Clone)]
pub struct DonationReview {
    pub status: ApprovalStatus,
    pub officer_id: String,
    /// Only kept for rejections
    pub rejection_reason: Option<String>,
    pub at: DateTime<Utc>,
}

/// Repository for food donation operations.
#[derive(Clone)]
pub struct FoodDonationRepository {
    db: Arc<DatabaseConnection>,
}

impl FoodDonationRepository {
    /// Create a new food donation repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a donation by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<food_donation::Model>> {
        FoodDonation::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a donation by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<food_donation::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Donation not found.".to_string()))
    }

    /// Create a donation.
    pub async fn create(&self, model: food_donation::ActiveModel) -> AppResult<food_donation::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a donation.
    pub async fn update(&self, model: food_donation::ActiveModel) -> AppResult<food_donation::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Move a donation out of `pending`. The write only matches a row that
    /// is still pending, so of two concurrent reviews exactly one wins.
    /// Returns whether this call was the one that applied.
    pub async fn review(&self, id: &str, review: DonationReview) -> AppResult<bool> {
        let result = FoodDonation::update_many()
            .col_expr(food_donation::Column::ApprovalStatus, Expr::value(review.status))
            .col_expr(food_donation::Column::ApprovedAt, Expr::value(review.at))
            .col_expr(food_donation::Column::ApprovedBy, Expr::value(review.officer_id))
            .col_expr(
                food_donation::Column::RejectionReason,
                Expr::value(review.rejection_reason),
            )
            .col_expr(food_donation::Column::UpdatedAt, Expr::value(review.at))
            .filter(food_donation::Column::Id.eq(id))
            .filter(food_donation::Column::ApprovalStatus.eq(ApprovalStatus::Pending))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected == 1)
    }

    /// Delete a donation. Reservations go with it through the foreign key.
    pub async fn delete(&self, id: &str) -> AppResult<u64> {
        FoodDonation::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map(|r| r.rows_affected)
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Save an assignment and upsert the assignee's reservation in one
    /// transaction.
    pub async fn assign(
        &self,
        donation: food_donation::ActiveModel,
        reservation: AssignedReservation,
    ) -> AppResult<food_donation::Model> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let donation = donation
            .update(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let existing = FoodReservation::find()
            .filter(food_reservation::Column::DonationId.eq(donation.id.as_str()))
            .filter(food_reservation::Column::RequesterId.eq(reservation.requester_id.as_str()))
            .one(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let at = reservation.at.into();
        if let Some(existing) = existing {
            let responded_at = existing.responded_at.unwrap_or(at);
            let mut active: food_reservation::ActiveModel = existing.into();
            active.status = Set(ReservationStatus::Approved);
            active.message = Set(Some(reservation.message));
            active.contact_info = Set(Some(reservation.contact_info));
            active.reserved_at = Set(at);
            active.responded_at = Set(Some(responded_at));
            active.updated_at = Set(Some(at));
            active.updated_by = Set(Some(reservation.officer_id));
            active
                .update(&txn)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
        } else {
            food_reservation::ActiveModel {
                id: Set(reservation.id),
                donation_id: Set(donation.id.clone()),
                requester_id: Set(reservation.requester_id),
                status: Set(ReservationStatus::Approved),
                message: Set(Some(reservation.message)),
                contact_info: Set(Some(reservation.contact_info)),
                admin_notes: Set(None),
                reserved_at: Set(at),
                responded_at: Set(Some(at)),
                updated_at: Set(Some(at)),
                updated_by: Set(Some(reservation.officer_id)),
            }
            .insert(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        }

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(donation)
    }

    /// Donations awaiting review, newest first.
    pub async fn find_pending(&self) -> AppResult<Vec<food_donation::Model>> {
        FoodDonation::find()
            .filter(food_donation::Column::ApprovalStatus.eq(ApprovalStatus::Pending))
            .order_by_desc(food_donation::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Management listing, newest first.
    pub async fn find_filtered(&self, filter: &DonationFilter) -> AppResult<Vec<food_donation::Model>> {
        let mut query = FoodDonation::find();

        if let Some(status) = filter.approval_status {
            query = query.filter(food_donation::Column::ApprovalStatus.eq(status));
        }

        if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            let donors = Query::select()
                .column(user_account::Column::Id)
                .from(UserAccount)
                .and_where(contains_ci((UserAccount, user_account::Column::FullName), search))
                .to_owned();

            query = query.filter(
                Condition::any()
                    .add(contains_ci((FoodDonation, food_donation::Column::Title), search))
                    .add(contains_ci((FoodDonation, food_donation::Column::Description), search))
                    .add(food_donation::Column::UserId.in_subquery(donors)),
            );
        }

        if let Some(food_type) = filter.food_type.as_deref().filter(|s| !s.is_empty()) {
            query = query.filter(food_donation::Column::FoodType.eq(food_type));
        }

        match filter.expired {
            Some(true) => {
                query = query.filter(food_donation::Column::ExpirationDate.lt(filter.today));
            }
            Some(false) => {
                query = query.filter(
                    Condition::any()
                        .add(food_donation::Column::ExpirationDate.gte(filter.today))
                        .add(food_donation::Column::ExpirationDate.is_null()),
                );
            }
            None => {}
        }

        query
            .order_by_desc(food_donation::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Expired or withdrawn listings, soonest expiry first.
    pub async fn find_expired(&self, today: NaiveDate) -> AppResult<Vec<food_donation::Model>> {
        FoodDonation::find()
            .filter(
                Condition::any()
                    .add(food_donation::Column::ExpirationDate.lt(today))
                    .add(
                        food_donation::Column::Status
                            .is_in([DonationStatus::Expired, DonationStatus::Cancelled]),
                    ),
            )
            .order_by_asc(food_donation::Column::ExpirationDate)
            .order_by_desc(food_donation::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Most recent donations.
    pub async fn find_recent(&self, limit: u64) -> AppResult<Vec<food_donation::Model>> {
        FoodDonation::find()
            .order_by_desc(food_donation::Column::CreatedAt)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Most recent donations of one donor.
    pub async fn find_recent_by_donor(
        &self,
        user_id: &str,
        limit: u64,
    ) -> AppResult<Vec<food_donation::Model>> {
        FoodDonation::find()
            .filter(food_donation::Column::UserId.eq(user_id))
            .order_by_desc(food_donation::Column::CreatedAt)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find donations by IDs. Unknown IDs are skipped.
    pub async fn find_by_ids(&self, ids: &[String]) -> AppResult<Vec<food_donation::Model>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        FoodDonation::find()
            .filter(food_donation::Column::Id.is_in(ids.iter().cloned()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use serde_json::json;

    fn create_test_donation(id: &str, approval_status: ApprovalStatus) -> food_donation::Model {
        food_donation::Model {
            id: id.to_string(),
            user_id: "donor1".to_string(),
            title: "Fresh bread".to_string(),
            description: Some("Sourdough".to_string()),
            food_type: "bakery".to_string(),
            quantity: "4 loaves".to_string(),
            expiration_date: NaiveDate::from_ymd_opt(2025, 6, 1),
            location_address: None,
            location_lat: None,
            location_lng: None,
            pickup_time_start: None,
            pickup_time_end: None,
            contact_method: None,
            contact_info: None,
            images: json!(["donations/bread.jpg"]),
            dietary_info: None,
            allergens: None,
            storage_instructions: None,
            approval_status,
            status: DonationStatus::Available,
            views_count: 0,
            approved_at: None,
            approved_by: None,
            rejection_reason: None,
            assigned_to_user_id: None,
            assigned_at: None,
            assigned_by: None,
            assignment_notes: None,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_get_by_id_not_found_message() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<food_donation::Model>::new()])
                .into_connection(),
        );

        let repo = FoodDonationRepository::new(db);
        let err = repo.get_by_id("nope").await.unwrap_err();

        assert_eq!(err.message(), "Donation not found.");
    }

    #[tokio::test]
    async fn test_find_pending_returns_pending() {
        let d1 = create_test_donation("d1", ApprovalStatus::Pending);
        let d2 = create_test_donation("d2", ApprovalStatus::Pending);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[d1, d2]])
                .into_connection(),
        );

        let repo = FoodDonationRepository::new(db);
        let pending = repo.find_pending().await.unwrap();

        assert_eq!(pending.len(), 2);
        assert!(pending.iter().all(|d| d.approval_status == ApprovalStatus::Pending));
    }

    #[tokio::test]
    async fn test_find_filtered_builds_search_and_expiry() {
        let d1 = create_test_donation("d1", ApprovalStatus::Approved);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[d1]])
                .into_connection(),
        );

        let repo = FoodDonationRepository::new(Arc::clone(&db));
        let filter = DonationFilter {
            approval_status: Some(ApprovalStatus::Approved),
            search: Some("Bread".to_string()),
            food_type: None,
            expired: Some(false),
            today: NaiveDate::from_ymd_opt(2025, 5, 1).unwrap(),
        };
        let rows = repo.find_filtered(&filter).await.unwrap();
        assert_eq!(rows.len(), 1);
        drop(repo);

        let log = Arc::try_unwrap(db).ok().unwrap().into_transaction_log();
        let sql = format!("{:?}", log[0]);
        assert!(sql.contains("LIKE"));
        assert!(sql.contains("IS NULL"));
        assert!(sql.contains("%bread%"));
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

        let repo = FoodDonationRepository::new(db);
        assert_eq!(repo.delete("d1").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_review_only_matches_pending_rows() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );

        let repo = FoodDonationRepository::new(Arc::clone(&db));
        let applied = repo
            .review(
                "d1",
                DonationReview {
                    status: ApprovalStatus::Approved,
                    officer_id: "off1".to_string(),
                    rejection_reason: None,
                    at: Utc::now(),
                },
            )
            .await
            .unwrap();
        assert!(!applied);
        drop(repo);

        let log = Arc::try_unwrap(db).ok().unwrap().into_transaction_log();
        let sql = format!("{:?}", log[0]);
        let (_, predicate) = sql.split_once("WHERE").unwrap();
        assert!(predicate.contains("id"));
        assert!(predicate.contains("approval_status"));
        assert!(sql.contains("pending"));
    }

    #[tokio::test]
    async fn test_assign_updates_existing_reservation() {
        let mut assigned = create_test_donation("d1", ApprovalStatus::Approved);
        assigned.status = DonationStatus::Reserved;
        assigned.assigned_to_user_id = Some("res1".to_string());

        let now = Utc::now();
        let existing = food_reservation::Model {
            id: "r1".to_string(),
            donation_id: "d1".to_string(),
            requester_id: "res1".to_string(),
            status: ReservationStatus::Pending,
            message: Some("Please".to_string()),
            contact_info: None,
            admin_notes: None,
            reserved_at: now.into(),
            responded_at: None,
            updated_at: None,
            updated_by: None,
        };
        let mut updated = existing.clone();
        updated.status = ReservationStatus::Approved;

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[assigned.clone()]])
                .append_query_results([[existing]])
                .append_query_results([[updated]])
                .into_connection(),
        );

        let repo = FoodDonationRepository::new(Arc::clone(&db));
        let mut active: food_donation::ActiveModel = assigned.into();
        active.status = Set(DonationStatus::Reserved);

        let result = repo
            .assign(
                active,
                AssignedReservation {
                    id: "r-new".to_string(),
                    requester_id: "res1".to_string(),
                    message: "Assigned by team officer".to_string(),
                    contact_info: "res1@example.org".to_string(),
                    officer_id: "off1".to_string(),
                    at: now,
                },
            )
            .await
            .unwrap();
        assert_eq!(result.assigned_to_user_id.as_deref(), Some("res1"));
        drop(repo);

        let log = Arc::try_unwrap(db).ok().unwrap().into_transaction_log();
        let sql = format!("{log:?}");
        assert_eq!(sql.matches("UPDATE").count(), 2);
        assert!(!sql.contains("INSERT"));
    }
}
