//! Showcase ↔ practice area pivot.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "showcase_practice_areas")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub showcase_id: Uuid,
    #[sea_orm(primary_key, auto_increment = false)]
    pub practice_area_id: Uuid,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::showcase::Entity",
        from = "Column::ShowcaseId",
        to = "super::showcase::Column::Id",
        on_delete = "Cascade"
    )]
    Showcase,
    #[sea_orm(
        belongs_to = "super::practice_area::Entity",
        from = "Column::PracticeAreaId",
        to = "super::practice_area::Column::Id",
        on_delete = "Cascade"
    )]
    PracticeArea,
}

impl ActiveModelBehavior for ActiveModel {}
