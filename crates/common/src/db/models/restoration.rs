//! Restoration entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "restorations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub artwork_id: Uuid,

    pub start_date: Date,

    /// Null while the restoration is open
    pub end_date: Option<Date>,

    #[sea_orm(column_type = "Text")]
    pub damage_report: String,

    #[sea_orm(column_type = "Text")]
    pub restoration_type: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::artwork::Entity",
        from = "Column::ArtworkId",
        to = "super::artwork::Column::Id",
        on_delete = "Cascade"
    )]
    Artwork,
}

impl Related<super::artwork::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Artwork.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
