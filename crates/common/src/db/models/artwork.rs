//! Artwork entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "artworks")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[sea_orm(column_type = "Text", unique)]
    pub title: String,

    #[sea_orm(column_type = "Text")]
    pub author: String,

    #[sea_orm(column_type = "Decimal(Some((14, 2)))")]
    pub valuation: Decimal,

    #[sea_orm(column_type = "Text")]
    pub creation_date: String,

    pub museum_entry_date: Date,

    #[sea_orm(column_type = "Text")]
    pub state: String,

    #[sea_orm(column_type = "Text")]
    pub kind: String,

    pub period_id: Uuid,

    pub room_id: Uuid,

    #[sea_orm(column_type = "Text", nullable)]
    pub image: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::taxonomy_entry::Entity",
        from = "Column::RoomId",
        to = "super::taxonomy_entry::Column::Id",
        on_delete = "Restrict"
    )]
    Room,

    #[sea_orm(
        belongs_to = "super::taxonomy_entry::Entity",
        from = "Column::PeriodId",
        to = "super::taxonomy_entry::Column::Id",
        on_delete = "Restrict"
    )]
    Period,

    #[sea_orm(has_many = "super::restoration::Entity")]
    Restorations,
}

impl Related<super::restoration::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Restorations.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
