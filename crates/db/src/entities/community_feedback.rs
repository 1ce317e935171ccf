//! Community feedback entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// What the feedback is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
#[derive(Default)]
pub enum FeedbackType {
    #[sea_orm(string_value = "platform")]
    #[default]
    Platform,
    #[sea_orm(string_value = "feature")]
    Feature,
    #[sea_orm(string_value = "donation")]
    Donation,
    #[sea_orm(string_value = "announcement")]
    Announcement,
    #[sea_orm(string_value = "support")]
    Support,
    #[sea_orm(string_value = "other")]
    Other,
}

impl FeedbackType {
    /// Parse the lowercase wire name.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "platform" => Some(Self::Platform),
            "feature" => Some(Self::Feature),
            "donation" => Some(Self::Donation),
            "announcement" => Some(Self::Announcement),
            "support" => Some(Self::Support),
            "other" => Some(Self::Other),
            _ => None,
        }
    }
}

/// Handling state, in the order the listing sorts by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
#[derive(Default)]
pub enum FeedbackStatus {
    #[sea_orm(string_value = "new")]
    #[default]
    New,
    #[sea_orm(string_value = "reviewed")]
    Reviewed,
    #[sea_orm(string_value = "responded")]
    Responded,
    #[sea_orm(string_value = "resolved")]
    Resolved,
    #[sea_orm(string_value = "archived")]
    Archived,
}

impl FeedbackStatus {
    /// The lowercase wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Reviewed => "reviewed",
            Self::Responded => "responded",
            Self::Resolved => "resolved",
            Self::Archived => "archived",
        }
    }

    /// Parse the lowercase wire name.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "new" => Some(Self::New),
            "reviewed" => Some(Self::Reviewed),
            "responded" => Some(Self::Responded),
            "resolved" => Some(Self::Resolved),
            "archived" => Some(Self::Archived),
            _ => None,
        }
    }
}

/// Feedback urgency. Declared most urgent last so `Ord` ranks it highest.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
#[derive(Default)]
pub enum FeedbackPriority {
    #[sea_orm(string_value = "low")]
    Low,
    #[sea_orm(string_value = "medium")]
    #[default]
    Medium,
    #[sea_orm(string_value = "high")]
    High,
    #[sea_orm(string_value = "urgent")]
    Urgent,
}

impl FeedbackPriority {
    /// Parse the lowercase wire name.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            "urgent" => Some(Self::Urgent),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "community_feedback")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Author
    pub user_id: String,

    pub feedback_type: FeedbackType,

    /// 1 to 5
    pub rating: i32,

    pub subject: String,

    #[sea_orm(column_type = "Text")]
    pub message: String,

    pub status: FeedbackStatus,

    pub priority: FeedbackPriority,

    #[sea_orm(column_type = "Text", nullable)]
    pub response: Option<String>,

    #[sea_orm(nullable)]
    pub responded_by: Option<String>,

    #[sea_orm(nullable)]
    pub responded_at: Option<DateTimeWithTimeZone>,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user_account::Entity",
        from = "Column::UserId",
        to = "super::user_account::Column::Id",
        on_delete = "Cascade"
    )]
    Author,
}

impl Related<super::user_account::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Author.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
