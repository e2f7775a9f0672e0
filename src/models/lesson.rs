//! Lesson domain models and DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::course::is_published;
use super::crop::{Crops, crops_from_json};
use super::file_url;
use super::progress::LessonProgress;
use super::taxonomy::TagResponse;
use super::user::InstructorResponse;
use crate::entity::{lesson, transcript_line};
use crate::services::readiness::Readiness;

/// Supported video providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum VideoHostKind {
    #[default]
    Mux,
}

impl VideoHostKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mux => "mux",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "mux" => Some(Self::Mux),
            _ => None,
        }
    }
}

/// Create/update body for a lesson.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LessonRequest {
    #[validate(length(min = 1, max = 255, message = "The title field is required"))]
    pub title: String,
    #[validate(length(max = 255))]
    pub tagline: Option<String>,
    #[validate(length(max = 20000))]
    pub description: Option<String>,
    #[validate(length(max = 50000))]
    pub copy: Option<String>,
    #[serde(default = "default_gated")]
    pub is_gated: bool,
    #[serde(default)]
    pub video_host: VideoHostKind,
    #[validate(length(max = 255))]
    pub asset_id: Option<String>,
    #[serde(default)]
    pub tag_ids: Vec<Uuid>,
    #[serde(default)]
    pub instructor_ids: Vec<Uuid>,
}

fn default_gated() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TranscriptLineResponse {
    pub start_ms: i64,
    pub end_ms: i64,
    pub body: String,
}

impl From<transcript_line::Model> for TranscriptLineResponse {
    fn from(m: transcript_line::Model) -> Self {
        Self {
            start_ms: m.start_ms,
            end_ms: m.end_ms,
            body: m.body,
        }
    }
}

/// Lesson row within a course page.
#[derive(Debug, Serialize, ToSchema)]
pub struct LessonSummary {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub tagline: Option<String>,
    pub duration_seconds: Option<i32>,
    pub thumbnail_url: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub thumbnail_crops: Option<Crops>,
    pub is_gated: bool,
    pub is_published: bool,
    pub publish_date: Option<DateTime<Utc>>,
    pub sort_order: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

impl LessonSummary {
    pub fn from_model(m: &lesson::Model, completed: Option<bool>, now: DateTime<Utc>) -> Self {
        Self {
            id: m.id,
            title: m.title.clone(),
            slug: m.slug.clone(),
            tagline: m.tagline.clone(),
            duration_seconds: m.duration_seconds,
            thumbnail_url: m.thumbnail_key.as_deref().map(file_url),
            thumbnail_crops: crops_from_json(m.thumbnail_crops.as_ref()),
            is_gated: m.is_gated,
            is_published: is_published(m.publish_date, now),
            publish_date: m.publish_date,
            sort_order: m.sort_order,
            completed,
        }
    }
}

/// Lesson page. Playback fields are omitted for previews and locked lessons.
#[derive(Debug, Serialize, ToSchema)]
pub struct LessonDetail {
    pub id: Uuid,
    pub course_slug: String,
    pub course_title: String,
    pub title: String,
    pub slug: String,
    pub tagline: Option<String>,
    pub description: Option<String>,
    pub copy: Option<String>,
    pub duration_seconds: Option<i32>,
    pub thumbnail_url: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub thumbnail_crops: Option<Crops>,
    pub publish_date: Option<DateTime<Utc>>,
    pub is_gated: bool,
    pub is_published: bool,
    /// Unpublished lesson shown as a teaser.
    pub is_preview: bool,
    /// Gated lesson viewed without signing in.
    pub locked: bool,
    pub playback_id: Option<String>,
    pub transcript: Vec<TranscriptLineResponse>,
    pub instructors: Vec<InstructorResponse>,
    pub tags: Vec<TagResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<LessonProgress>,
    pub previous_slug: Option<String>,
    pub next_slug: Option<String>,
}

/// Full lesson record for the admin editor.
#[derive(Debug, Serialize, ToSchema)]
pub struct AdminLessonResponse {
    pub id: Uuid,
    pub course_id: Uuid,
    pub title: String,
    pub slug: String,
    pub tagline: Option<String>,
    pub description: Option<String>,
    pub copy: Option<String>,
    pub is_gated: bool,
    pub is_visible: bool,
    pub publish_date: Option<DateTime<Utc>>,
    pub video_host: VideoHostKind,
    pub asset_id: Option<String>,
    pub playback_id: Option<String>,
    pub duration_seconds: Option<i32>,
    pub video_synced_at: Option<DateTime<Utc>>,
    pub thumbnail_url: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub thumbnail_crops: Option<Crops>,
    pub sort_order: i32,
    pub transcript_line_count: u64,
    pub tags: Vec<TagResponse>,
    pub instructors: Vec<InstructorResponse>,
    pub readiness: Readiness,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AdminLessonResponse {
    pub fn from_model(
        m: lesson::Model,
        transcript_line_count: u64,
        tags: Vec<TagResponse>,
        instructors: Vec<InstructorResponse>,
        readiness: Readiness,
    ) -> Self {
        Self {
            video_host: VideoHostKind::parse(&m.video_host).unwrap_or_default(),
            thumbnail_url: m.thumbnail_key.as_deref().map(file_url),
            thumbnail_crops: crops_from_json(m.thumbnail_crops.as_ref()),
            id: m.id,
            course_id: m.course_id,
            title: m.title,
            slug: m.slug,
            tagline: m.tagline,
            description: m.description,
            copy: m.marketing_copy,
            is_gated: m.is_gated,
            is_visible: m.is_visible,
            publish_date: m.publish_date,
            asset_id: m.asset_id,
            playback_id: m.playback_id,
            duration_seconds: m.duration_seconds,
            video_synced_at: m.video_synced_at,
            sort_order: m.sort_order,
            transcript_line_count,
            tags,
            instructors,
            readiness,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

/// Copywriter output; returned to the editor, never saved automatically.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CopySuggestion {
    pub tagline: String,
    pub description: String,
    pub copy: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lesson_request_defaults() {
        let req: LessonRequest = serde_json::from_str(r#"{"title":"Intro"}"#).unwrap();
        assert!(req.is_gated);
        assert_eq!(req.video_host, VideoHostKind::Mux);
        assert!(req.instructor_ids.is_empty());
    }

    #[test]
    fn test_unknown_video_host_is_rejected() {
        let err = serde_json::from_str::<LessonRequest>(r#"{"title":"x","video_host":"vimeo"}"#);
        assert!(err.is_err());
    }
}
