//! Share of an announcement or donation.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::post_like::PostType;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "post_share")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub post_id: String,
    pub post_type: PostType,
    pub user_id: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub share_message: Option<String>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
