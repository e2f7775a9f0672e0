//! Course domain models and DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::crop::{Crops, crops_from_json};
use super::lesson::LessonSummary;
use super::progress::CourseProgress;
use super::taxonomy::TagResponse;
use super::user::InstructorResponse;
use super::file_url;
use crate::entity::course;
use crate::services::readiness::Readiness;

/// Course difficulty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ExperienceLevel {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

impl ExperienceLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Beginner => "beginner",
            Self::Intermediate => "intermediate",
            Self::Advanced => "advanced",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "beginner" => Some(Self::Beginner),
            "intermediate" => Some(Self::Intermediate),
            "advanced" => Some(Self::Advanced),
            _ => None,
        }
    }
}

/// Create/update body for a course.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CourseRequest {
    #[validate(length(min = 1, max = 255, message = "The title field is required"))]
    pub title: String,
    #[validate(length(max = 255))]
    pub tagline: Option<String>,
    #[validate(length(max = 20000))]
    pub description: Option<String>,
    #[validate(length(max = 20000))]
    pub learning_objectives: Option<String>,
    #[serde(default)]
    pub experience_level: ExperienceLevel,
    #[serde(default)]
    pub tag_ids: Vec<Uuid>,
}

/// Set or clear a publish date.
#[derive(Debug, Deserialize, ToSchema)]
pub struct PublishDateRequest {
    pub publish_date: Option<DateTime<Utc>>,
}

/// Enable or disable preview visibility.
#[derive(Debug, Deserialize, ToSchema)]
pub struct VisibilityRequest {
    pub is_visible: bool,
}

/// New ordering; must be a permutation of the existing ids.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ReorderRequest {
    pub ids: Vec<Uuid>,
}

/// Course card for listings.
#[derive(Debug, Serialize, ToSchema)]
pub struct CourseSummary {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub tagline: Option<String>,
    pub experience_level: ExperienceLevel,
    pub thumbnail_url: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub thumbnail_crops: Option<Crops>,
    pub publish_date: Option<DateTime<Utc>>,
    pub is_published: bool,
    pub lesson_count: u64,
    pub tags: Vec<TagResponse>,
    /// Caller's progress, present when signed in.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<CourseProgress>,
}

impl CourseSummary {
    pub fn from_model(
        m: &course::Model,
        lesson_count: u64,
        tags: Vec<TagResponse>,
        progress: Option<CourseProgress>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: m.id,
            title: m.title.clone(),
            slug: m.slug.clone(),
            tagline: m.tagline.clone(),
            experience_level: ExperienceLevel::parse(&m.experience_level).unwrap_or_default(),
            thumbnail_url: m.thumbnail_key.as_deref().map(file_url),
            thumbnail_crops: crops_from_json(m.thumbnail_crops.as_ref()),
            publish_date: m.publish_date,
            is_published: is_published(m.publish_date, now),
            lesson_count,
            tags,
            progress,
        }
    }
}

/// Course page.
#[derive(Debug, Serialize, ToSchema)]
pub struct CourseDetail {
    #[serde(flatten)]
    pub summary: CourseSummary,
    pub description: Option<String>,
    pub learning_objectives: Option<String>,
    pub lessons: Vec<LessonSummary>,
    pub instructors: Vec<InstructorResponse>,
}

/// Full course record for the admin editor.
#[derive(Debug, Serialize, ToSchema)]
pub struct AdminCourseResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub slug: String,
    pub tagline: Option<String>,
    pub description: Option<String>,
    pub learning_objectives: Option<String>,
    pub experience_level: ExperienceLevel,
    pub is_visible: bool,
    pub publish_date: Option<DateTime<Utc>>,
    pub thumbnail_url: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub thumbnail_crops: Option<Crops>,
    pub sort_order: i32,
    pub tags: Vec<TagResponse>,
    pub readiness: Readiness,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AdminCourseResponse {
    pub fn from_model(m: course::Model, tags: Vec<TagResponse>, readiness: Readiness) -> Self {
        Self {
            experience_level: ExperienceLevel::parse(&m.experience_level).unwrap_or_default(),
            thumbnail_url: m.thumbnail_key.as_deref().map(file_url),
            thumbnail_crops: crops_from_json(m.thumbnail_crops.as_ref()),
            id: m.id,
            user_id: m.user_id,
            title: m.title,
            slug: m.slug,
            tagline: m.tagline,
            description: m.description,
            learning_objectives: m.learning_objectives,
            is_visible: m.is_visible,
            publish_date: m.publish_date,
            sort_order: m.sort_order,
            tags,
            readiness,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

/// A record is published once its publish date has passed.
pub fn is_published(publish_date: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    publish_date.is_some_and(|d| d <= now)
}

/// Learners see previews (visible) and published records.
pub fn is_listed(is_visible: bool, publish_date: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    is_visible || is_published(publish_date, now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_is_published() {
        let now = Utc::now();
        assert!(!is_published(None, now));
        assert!(is_published(Some(now), now));
        assert!(is_published(Some(now - Duration::days(1)), now));
        assert!(!is_published(Some(now + Duration::minutes(1)), now));
    }

    #[test]
    fn test_is_listed() {
        let now = Utc::now();
        let tomorrow = Some(now + Duration::days(1));
        assert!(is_listed(true, None, now));
        assert!(is_listed(false, Some(now), now));
        assert!(!is_listed(false, tomorrow, now));
        assert!(is_listed(true, tomorrow, now));
    }

    #[test]
    fn test_experience_level_defaults_to_beginner() {
        let req: CourseRequest = serde_json::from_str(r#"{"title":"Rust"}"#).unwrap();
        assert_eq!(req.experience_level, ExperienceLevel::Beginner);
        assert!(req.tag_ids.is_empty());
        assert_eq!(ExperienceLevel::parse("expert"), None);
    }
}
