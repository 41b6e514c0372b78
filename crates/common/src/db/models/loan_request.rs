//! Loan request entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "loan_requests")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub museum_id: Uuid,

    pub start_date: Date,

    pub end_date: Date,

    #[sea_orm(column_type = "Text")]
    pub status: String,

    #[sea_orm(column_type = "Text", nullable)]
    pub notes: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::requested_artwork::Entity", on_delete = "Cascade")]
    RequestedArtworks,
}

impl Related<super::requested_artwork::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RequestedArtworks.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
