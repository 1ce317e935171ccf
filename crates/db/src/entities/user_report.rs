//! User report entity.
//!
//! Residents file reports from their own app; officers triage them here.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// What was reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
#[derive(Default)]
pub enum ReportTarget {
    #[sea_orm(string_value = "user")]
    #[default]
    User,
    #[sea_orm(string_value = "post")]
    Post,
    #[sea_orm(string_value = "donation")]
    Donation,
    #[sea_orm(string_value = "comment")]
    Comment,
    #[sea_orm(string_value = "other")]
    Other,
}

/// Why it was reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum ReportCategory {
    #[sea_orm(string_value = "spam")]
    Spam,
    #[sea_orm(string_value = "harassment")]
    Harassment,
    #[sea_orm(string_value = "inappropriate")]
    Inappropriate,
    #[sea_orm(string_value = "fake")]
    Fake,
    #[sea_orm(string_value = "violence")]
    Violence,
    #[sea_orm(string_value = "other")]
    Other,
}

impl ReportCategory {
    /// Parse the lowercase wire name.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "spam" => Some(Self::Spam),
            "harassment" => Some(Self::Harassment),
            "inappropriate" => Some(Self::Inappropriate),
            "fake" => Some(Self::Fake),
            "violence" => Some(Self::Violence),
            "other" => Some(Self::Other),
            _ => None,
        }
    }
}

/// Triage state, in the order the listing sorts by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
#[derive(Default)]
pub enum UserReportStatus {
    #[sea_orm(string_value = "pending")]
    #[default]
    Pending,
    #[sea_orm(string_value = "reviewing")]
    Reviewing,
    #[sea_orm(string_value = "resolved")]
    Resolved,
    #[sea_orm(string_value = "dismissed")]
    Dismissed,
}

impl UserReportStatus {
    /// The lowercase wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Reviewing => "reviewing",
            Self::Resolved => "resolved",
            Self::Dismissed => "dismissed",
        }
    }

    /// Parse the lowercase wire name.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "reviewing" => Some(Self::Reviewing),
            "resolved" => Some(Self::Resolved),
            "dismissed" => Some(Self::Dismissed),
            _ => None,
        }
    }
}

/// Report urgency. Declared most urgent last so `Ord` ranks it highest.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
#[derive(Default)]
pub enum ReportPriority {
    #[sea_orm(string_value = "low")]
    Low,
    #[sea_orm(string_value = "medium")]
    #[default]
    Medium,
    #[sea_orm(string_value = "high")]
    High,
    #[sea_orm(string_value = "critical")]
    Critical,
}

impl ReportPriority {
    /// The lowercase wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }

    /// Parse the lowercase wire name.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            "critical" => Some(Self::Critical),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user_report")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub reporter_id: String,

    #[sea_orm(nullable)]
    pub reported_user_id: Option<String>,

    /// Post, donation or comment ID, depending on `report_type`
    #[sea_orm(nullable)]
    pub reported_post_id: Option<String>,

    pub report_type: ReportTarget,

    pub category: ReportCategory,

    #[sea_orm(column_type = "Text")]
    pub description: String,

    pub status: UserReportStatus,

    pub priority: ReportPriority,

    /// Officer who last changed the status
    #[sea_orm(nullable)]
    pub resolved_by: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub resolution_note: Option<String>,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user_account::Entity",
        from = "Column::ReporterId",
        to = "super::user_account::Column::Id",
        on_delete = "Cascade"
    )]
    Reporter,
}

impl Related<super::user_account::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Reporter.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
