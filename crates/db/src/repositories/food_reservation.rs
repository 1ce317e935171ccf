//! Food reservation (request) repository.

use std::sync::Arc;

use chrono::{DateTime, Days, NaiveDate, Utc};
use foodify_common::{AppError, AppResult};
use sea_orm::{
    sea_query::{Expr, Func, Query},
    ActiveModelTrait, ColumnTrait, Condition, DatabaseBackend, DatabaseConnection, EntityTrait,
    FromQueryResult, QueryFilter, QueryOrder, Statement,
};
use serde::Serialize;

use super::contains_ci;
use crate::entities::{
    food_donation,
    food_reservation::{self, ReservationStatus},
    user_account, FoodDonation, FoodReservation, UserAccount,
};

/// Filters for the request listing.
#[derive(Debug, Clone, Default)]
pub struct ReservationFilter {
    pub status: Option<ReservationStatus>,
    /// Donation title, requester name or donor name
    pub search: Option<String>,
    /// Inclusive, on the date of `reserved_at`
    pub date_from: Option<NaiveDate>,
    /// Inclusive, on the date of `reserved_at`
    pub date_to: Option<NaiveDate>,
}

/// Request counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, FromQueryResult, Serialize)]
pub struct ReservationStats {
    pub total: i64,
    pub pending: i64,
    pub approved: i64,
    pub rejected: i64,
    pub completed: i64,
    pub cancelled: i64,
    pub today: i64,
    pub this_week: i64,
}

/// Repository for food reservation operations.
#[derive(Clone)]
pub struct FoodReservationRepository {
    db: Arc<DatabaseConnection>,
}

impl FoodReservationRepository {
    /// Create a new food reservation repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a request by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<food_reservation::Model>> {
        FoodReservation::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find the request of one resident for one donation.
    pub async fn find_by_donation_and_requester(
        &self,
        donation_id: &str,
        requester_id: &str,
    ) -> AppResult<Option<food_reservation::Model>> {
        FoodReservation::find()
            .filter(food_reservation::Column::DonationId.eq(donation_id))
            .filter(food_reservation::Column::RequesterId.eq(requester_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a request.
    pub async fn create(
        &self,
        model: food_reservation::ActiveModel,
    ) -> AppResult<food_reservation::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a request.
    pub async fn update(
        &self,
        model: food_reservation::ActiveModel,
    ) -> AppResult<food_reservation::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Request listing, newest `reserved_at` first.
    pub async fn find_filtered(
        &self,
        filter: &ReservationFilter,
    ) -> AppResult<Vec<food_reservation::Model>> {
        let mut query = FoodReservation::find();

        if let Some(status) = filter.status {
            query = query.filter(food_reservation::Column::Status.eq(status));
        }

        if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            let named_users = Query::select()
                .column(user_account::Column::Id)
                .from(UserAccount)
                .and_where(contains_ci((UserAccount, user_account::Column::FullName), search))
                .to_owned();

            let matching_donations = Query::select()
                .column(food_donation::Column::Id)
                .from(FoodDonation)
                .cond_where(
                    Condition::any()
                        .add(contains_ci((FoodDonation, food_donation::Column::Title), search))
                        .add(food_donation::Column::UserId.in_subquery(named_users.clone())),
                )
                .to_owned();

            query = query.filter(
                Condition::any()
                    .add(food_reservation::Column::DonationId.in_subquery(matching_donations))
                    .add(food_reservation::Column::RequesterId.in_subquery(named_users)),
            );
        }

        if let Some(from) = filter.date_from {
            query = query.filter(food_reservation::Column::ReservedAt.gte(start_of_day(from)));
        }

        if let Some(to) = filter.date_to.and_then(|d| d.checked_add_days(Days::new(1))) {
            query = query.filter(food_reservation::Column::ReservedAt.lt(start_of_day(to)));
        }

        query
            .order_by_desc(food_reservation::Column::ReservedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Set the status of many requests in one statement.
    ///
    /// `responded_at` is only filled where it was still empty.
    pub async fn bulk_update_status(
        &self,
        ids: &[String],
        status: ReservationStatus,
        officer_id: &str,
        now: DateTime<Utc>,
    ) -> AppResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        let mut update = FoodReservation::update_many()
            .col_expr(food_reservation::Column::Status, Expr::value(status))
            .col_expr(food_reservation::Column::UpdatedAt, Expr::value(now))
            .col_expr(food_reservation::Column::UpdatedBy, Expr::value(officer_id));

        if status != ReservationStatus::Pending {
            update = update.col_expr(
                food_reservation::Column::RespondedAt,
                Func::coalesce([
                    Expr::col(food_reservation::Column::RespondedAt).into(),
                    Expr::value(now),
                ])
                .into(),
            );
        }

        update
            .filter(food_reservation::Column::Id.is_in(ids.iter().cloned()))
            .exec(self.db.as_ref())
            .await
            .map(|r| r.rows_affected)
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Request counters by status plus today and the last 7 days.
    pub async fn statistics(&self) -> AppResult<ReservationStats> {
        let stats = ReservationStats::find_by_statement(Statement::from_string(
            DatabaseBackend::Postgres,
            r"
            SELECT
                COUNT(*) AS total,
                COUNT(*) FILTER (WHERE status = 'pending') AS pending,
                COUNT(*) FILTER (WHERE status = 'approved') AS approved,
                COUNT(*) FILTER (WHERE status = 'rejected') AS rejected,
                COUNT(*) FILTER (WHERE status = 'completed') AS completed,
                COUNT(*) FILTER (WHERE status = 'cancelled') AS cancelled,
                COUNT(*) FILTER (WHERE reserved_at::date = CURRENT_DATE) AS today,
                COUNT(*) FILTER (WHERE reserved_at >= NOW() - INTERVAL '7 days') AS this_week
            FROM food_reservation
            ",
        ))
        .one(self.db.as_ref())
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(stats.unwrap_or_default())
    }
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(chrono::NaiveTime::MIN).and_utc()
}
