//! Course entity.

use sea_orm::entity::prelude::*;
use serde_json::Value as JsonValue;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "courses")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// Owning user (author)
    pub user_id: Uuid,
    pub title: String,
    pub slug: String,
    pub tagline: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub learning_objectives: Option<String>,
    /// beginner, intermediate or advanced
    pub experience_level: String,
    pub is_visible: bool,
    pub publish_date: Option<DateTimeUtc>,
    pub thumbnail_key: Option<String>,
    /// Named crop rectangles: {"square": {...}, "landscape": {...}}
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub thumbnail_crops: Option<JsonValue>,
    pub sort_order: i32,
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
    #[sea_orm(has_many = "super::lesson::Entity")]
    Lessons,
    #[sea_orm(has_many = "super::course_user::Entity")]
    CourseUsers,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Owner.def()
    }
}

impl Related<super::lesson::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Lessons.def()
    }
}

impl Related<super::course_user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CourseUsers.def()
    }
}

impl Related<super::tag::Entity> for Entity {
    fn to() -> RelationDef {
        super::course_tag::Relation::Tag.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::course_tag::Relation::Course.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
