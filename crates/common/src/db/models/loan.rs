//! Loan (cession) entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "loans")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub museum_id: Uuid,

    pub start_date: Date,

    pub end_date: Date,

    pub returned_on: Option<Date>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::museum::Entity",
        from = "Column::MuseumId",
        to = "super::museum::Column::Id",
        on_delete = "Restrict"
    )]
    Museum,
}

impl Related<super::museum::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Museum.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
