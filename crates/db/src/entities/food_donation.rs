//! Food donation entity.

use chrono::NaiveDate;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Moderation state of a donation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
#[derive(Default)]
pub enum ApprovalStatus {
    #[sea_orm(string_value = "pending")]
    #[default]
    Pending,
    #[sea_orm(string_value = "approved")]
    Approved,
    #[sea_orm(string_value = "rejected")]
    Rejected,
}

impl ApprovalStatus {
    /// Parse the lowercase wire name.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }
}

/// Availability of a donation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
#[derive(Default)]
pub enum DonationStatus {
    #[sea_orm(string_value = "available")]
    #[default]
    Available,
    #[sea_orm(string_value = "reserved")]
    Reserved,
    #[sea_orm(string_value = "claimed")]
    Claimed,
    #[sea_orm(string_value = "expired")]
    Expired,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

impl DonationStatus {
    /// The lowercase wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Reserved => "reserved",
            Self::Claimed => "claimed",
            Self::Expired => "expired",
            Self::Cancelled => "cancelled",
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "food_donation")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Donor
    pub user_id: String,

    pub title: String,

    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,

    pub food_type: String,

    pub quantity: String,

    #[sea_orm(nullable)]
    pub expiration_date: Option<Date>,

    #[sea_orm(column_type = "Text", nullable)]
    pub location_address: Option<String>,

    #[sea_orm(nullable)]
    pub location_lat: Option<f64>,

    #[sea_orm(nullable)]
    pub location_lng: Option<f64>,

    #[sea_orm(nullable)]
    pub pickup_time_start: Option<Time>,

    #[sea_orm(nullable)]
    pub pickup_time_end: Option<Time>,

    #[sea_orm(nullable)]
    pub contact_method: Option<String>,

    #[sea_orm(nullable)]
    pub contact_info: Option<String>,

    /// JSON array of storage keys
    pub images: Json,

    #[sea_orm(column_type = "Text", nullable)]
    pub dietary_info: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub allergens: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub storage_instructions: Option<String>,

    pub approval_status: ApprovalStatus,

    pub status: DonationStatus,

    #[sea_orm(default_value = 0)]
    pub views_count: i32,

    #[sea_orm(nullable)]
    pub approved_at: Option<DateTimeWithTimeZone>,

    /// Officer who approved or rejected
    #[sea_orm(nullable)]
    pub approved_by: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub rejection_reason: Option<String>,

    #[sea_orm(nullable)]
    pub assigned_to_user_id: Option<String>,

    #[sea_orm(nullable)]
    pub assigned_at: Option<DateTimeWithTimeZone>,

    #[sea_orm(nullable)]
    pub assigned_by: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub assignment_notes: Option<String>,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

impl Model {
    /// Storage keys of the attached images. Non-string entries are skipped.
    #[must_use]
    pub fn image_keys(&self) -> Vec<String> {
        self.images
            .as_array()
            .map(|items| {
                items
                    .iter()
                    .filter_map(|v| v.as_str())
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Listed as expired on `today`: past its date, or marked expired or cancelled.
    #[must_use]
    pub fn is_expired_on(&self, today: NaiveDate) -> bool {
        self.expiration_date.is_some_and(|d| d < today)
            || matches!(self.status, DonationStatus::Expired | DonationStatus::Cancelled)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user_account::Entity",
        from = "Column::UserId",
        to = "super::user_account::Column::Id",
        on_delete = "Cascade"
    )]
    Donor,

    #[sea_orm(has_many = "super::food_reservation::Entity")]
    Reservations,
}

impl Related<super::user_account::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Donor.def()
    }
}

impl Related<super::food_reservation::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Reservations.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
