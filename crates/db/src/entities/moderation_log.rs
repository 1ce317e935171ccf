//! Moderation log entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One officer action.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "moderation_log")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Officer who acted
    pub actor_id: String,

    /// e.g. `approve`, `bulk_action`
    pub action_type: String,

    /// e.g. `donations`, `requests`
    pub module: String,

    #[sea_orm(column_type = "Text")]
    pub description: String,

    #[sea_orm(nullable)]
    pub related_id: Option<String>,

    #[sea_orm(nullable)]
    pub related_type: Option<String>,

    #[sea_orm(nullable)]
    pub metadata: Option<Json>,

    #[sea_orm(nullable)]
    pub ip_address: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub user_agent: Option<String>,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user_account::Entity",
        from = "Column::ActorId",
        to = "super::user_account::Column::Id",
        on_delete = "Cascade"
    )]
    Actor,
}

impl Related<super::user_account::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Actor.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
