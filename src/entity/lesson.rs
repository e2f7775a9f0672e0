//! Lesson entity.

use sea_orm::entity::prelude::*;
use serde_json::Value as JsonValue;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "lessons")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub course_id: Uuid,
    pub title: String,
    /// Unique within the course
    pub slug: String,
    pub tagline: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    /// Long-form markdown shown under the player
    #[sea_orm(column_type = "Text", nullable)]
    pub marketing_copy: Option<String>,
    pub is_gated: bool,
    pub is_visible: bool,
    pub publish_date: Option<DateTimeUtc>,
    /// Provider name, currently always "mux"
    pub video_host: String,
    pub asset_id: Option<String>,
    pub playback_id: Option<String>,
    pub duration_seconds: Option<i32>,
    pub video_synced_at: Option<DateTimeUtc>,
    pub thumbnail_key: Option<String>,
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
        belongs_to = "super::course::Entity",
        from = "Column::CourseId",
        to = "super::course::Column::Id",
        on_delete = "Cascade"
    )]
    Course,
    #[sea_orm(has_many = "super::transcript_line::Entity")]
    TranscriptLines,
    #[sea_orm(has_many = "super::lesson_user::Entity")]
    LessonUsers,
}

impl Related<super::course::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Course.def()
    }
}

impl Related<super::transcript_line::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TranscriptLines.def()
    }
}

impl Related<super::lesson_user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LessonUsers.def()
    }
}

impl Related<super::tag::Entity> for Entity {
    fn to() -> RelationDef {
        super::lesson_tag::Relation::Tag.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::lesson_tag::Relation::Lesson.def().rev())
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        super::lesson_instructor::Relation::User.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::lesson_instructor::Relation::Lesson.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
