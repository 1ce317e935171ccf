//! Like on an announcement or donation.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// What an engagement row points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
#[derive(Default)]
pub enum PostType {
    #[sea_orm(string_value = "announcement")]
    #[default]
    Announcement,
    #[sea_orm(string_value = "food_donation")]
    FoodDonation,
}

impl PostType {
    /// Parse the wire name, defaulting to `announcement` when absent.
    #[must_use]
    pub fn parse_or_default(s: Option<&str>) -> Option<Self> {
        match s.map(str::trim) {
            None | Some("" | "announcement") => Some(Self::Announcement),
            Some("food_donation") => Some(Self::FoodDonation),
            Some(_) => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "post_like")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub post_id: String,
    pub post_type: PostType,
    pub user_id: String,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
