//! Phone numbers and email addresses owned by a partner museum

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "museum_contacts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub museum_id: Uuid,

    /// "phone" or "email"
    #[sea_orm(column_type = "Text")]
    pub channel: String,

    #[sea_orm(column_type = "Text")]
    pub value: String,

    pub position: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::museum::Entity",
        from = "Column::MuseumId",
        to = "super::museum::Column::Id",
        on_delete = "Cascade"
    )]
    Museum,
}

impl Related<super::museum::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Museum.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
