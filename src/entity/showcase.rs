//! Showcase entity (user-submitted project).

use sea_orm::entity::prelude::*;
use serde_json::Value as JsonValue;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "showcases")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub slug: String,
    pub tagline: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub project_url: Option<String>,
    pub repository_url: Option<String>,
    /// draft, pending, approved or rejected
    pub status: String,
    pub submitted_date: Option<DateTimeUtc>,
    pub moderated_at: Option<DateTimeUtc>,
    pub moderated_by: Option<Uuid>,
    #[sea_orm(column_type = "Text", nullable)]
    pub rejection_reason: Option<String>,
    pub thumbnail_image_id: Option<Uuid>,
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub thumbnail_crops: Option<JsonValue>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
    pub deleted_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    Owner,
    #[sea_orm(has_many = "super::showcase_image::Entity")]
    Images,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Owner.def()
    }
}

impl Related<super::showcase_image::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Images.def()
    }
}

impl Related<super::practice_area::Entity> for Entity {
    fn to() -> RelationDef {
        super::showcase_practice_area::Relation::PracticeArea.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::showcase_practice_area::Relation::Showcase.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
