//! Showcase image entity; the bytes live in S3 under `storage_key`.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "showcase_images")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub showcase_id: Uuid,
    pub storage_key: String,
    pub content_type: String,
    pub sort_order: i32,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
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
}

impl Related<super::showcase::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Showcase.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
