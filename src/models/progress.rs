//! Learner progress DTOs.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entity::lesson_user;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CourseProgress {
    pub completed_lessons: u64,
    pub total_lessons: u64,
    /// Rounded completion percentage, 0–100.
    pub percentage: u8,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LessonProgress {
    pub lesson_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DashboardEntry {
    pub course_id: Uuid,
    pub title: String,
    pub slug: String,
    pub thumbnail_url: Option<String>,
    pub progress: CourseProgress,
    /// First published lesson not yet completed.
    pub next_lesson_slug: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DashboardResponse {
    pub courses: Vec<DashboardEntry>,
}

/// Result of starting, completing or resetting a lesson.
#[derive(Debug, Serialize, ToSchema)]
pub struct LessonProgressResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lesson: Option<LessonProgress>,
    pub course: CourseProgress,
}

impl From<lesson_user::Model> for LessonProgress {
    fn from(m: lesson_user::Model) -> Self {
        Self {
            lesson_id: m.lesson_id,
            started_at: m.started_at,
            completed_at: m.completed_at,
        }
    }
}
