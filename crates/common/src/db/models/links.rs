//! Join tables for the many-to-many relations
//!
//! Each row pairs an owner with a member; the pair is the primary key.

/// Styles, techniques and materials of an artwork. The entry's kind tells
/// them apart.
pub mod artwork_taxonomy {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
    #[sea_orm(table_name = "artwork_taxonomy")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub artwork_id: Uuid,
        #[sea_orm(primary_key, auto_increment = false)]
        pub entry_id: Uuid,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

pub mod restoration_team {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
    #[sea_orm(table_name = "restoration_team")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub restoration_id: Uuid,
        #[sea_orm(primary_key, auto_increment = false)]
        pub restorer_id: Uuid,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

pub mod loan_artworks {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
    #[sea_orm(table_name = "loan_artworks")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub loan_id: Uuid,
        #[sea_orm(primary_key, auto_increment = false)]
        pub artwork_id: Uuid,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

pub mod exhibition_artworks {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
    #[sea_orm(table_name = "exhibition_artworks")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub exhibition_id: Uuid,
        #[sea_orm(primary_key, auto_increment = false)]
        pub artwork_id: Uuid,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}
