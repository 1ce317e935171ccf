//! User account entity.
//!
//! Residents, team officers and admins share one table; officers are tied
//! to residents only through the `address` column.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Account role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[sea_orm(string_value = "resident")]
    Resident,
    #[sea_orm(string_value = "team officer")]
    #[serde(rename = "team officer")]
    TeamOfficer,
    #[sea_orm(string_value = "admin")]
    Admin,
}

/// Account approval status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
#[derive(Default)]
pub enum AccountStatus {
    #[sea_orm(string_value = "pending")]
    #[default]
    Pending,
    #[sea_orm(string_value = "approved")]
    Approved,
    #[sea_orm(string_value = "rejected")]
    Rejected,
    /// Set from a user report; never resolves a session
    #[sea_orm(string_value = "suspended")]
    Suspended,
}

impl AccountStatus {
    /// Parse the lowercase wire name.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            "suspended" => Some(Self::Suspended),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user_account")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub full_name: String,

    #[sea_orm(unique)]
    pub email: String,

    #[sea_orm(nullable)]
    pub phone_number: Option<String>,

    /// Free-form street address; compared case- and whitespace-insensitively
    #[sea_orm(column_type = "Text", nullable)]
    pub address: Option<String>,

    pub role: UserRole,

    pub status: AccountStatus,

    #[sea_orm(nullable)]
    pub profile_img: Option<String>,

    /// Argon2 PHC string
    #[sea_orm(nullable)]
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,

    /// Session token
    #[sea_orm(unique, nullable)]
    #[serde(skip_serializing)]
    pub token: Option<String>,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

impl Model {
    /// Whether this account may use the officer panel.
    #[must_use]
    pub const fn is_officer(&self) -> bool {
        matches!(self.role, UserRole::TeamOfficer | UserRole::Admin)
    }

    /// The address with outer whitespace removed, if any is left.
    #[must_use]
    pub fn trimmed_address(&self) -> Option<&str> {
        self.address
            .as_deref()
            .map(str::trim)
            .filter(|a| !a.is_empty())
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::food_donation::Entity")]
    Donations,

    #[sea_orm(has_many = "super::announcement::Entity")]
    Announcements,
}

impl Related<super::food_donation::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Donations.def()
    }
}

impl Related<super::announcement::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Announcements.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
