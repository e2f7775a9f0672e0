//! Publish/preview readiness for courses and lessons.
//!
//! A record must carry its learner-facing content before it can be given a
//! publish date or made visible as a preview. Clearing either is always
//! allowed. Evaluation is pure; callers load the data.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::entity::{course, lesson};
use crate::error::{AppError, AppResult, FieldErrors};

pub const MISSING_TITLE: &str = "title";
pub const MISSING_TAGLINE: &str = "tagline";
pub const MISSING_DESCRIPTION: &str = "description";
pub const MISSING_LEARNING_OBJECTIVES: &str = "learning objectives";
pub const MISSING_ASSET_ID: &str = "asset ID";
pub const MISSING_PLAYBACK_ID: &str = "playback ID";
pub const MISSING_DURATION: &str = "duration";
pub const MISSING_TRANSCRIPT: &str = "transcript";
pub const MISSING_SAME_DAY_LESSON: &str = "lesson published on the same day";

/// Readiness verdict with the list of missing items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Readiness {
    pub ready: bool,
    pub missing: Vec<String>,
}

impl Readiness {
    fn from_missing(missing: Vec<&str>) -> Self {
        Self {
            ready: missing.is_empty(),
            missing: missing.into_iter().map(String::from).collect(),
        }
    }

    /// Turn a not-ready verdict into a validation error on `field`.
    pub fn require(&self, field: &str) -> AppResult<()> {
        if self.ready {
            return Ok(());
        }
        let mut errors = FieldErrors::new();
        errors.insert(
            field.to_string(),
            self.missing
                .iter()
                .map(|m| format!("The {} is required", m))
                .collect(),
        );
        Err(AppError::Validation(errors))
    }
}

fn blank(value: Option<&str>) -> bool {
    value.is_none_or(|v| v.trim().is_empty())
}

pub fn course_readiness(course: &course::Model) -> Readiness {
    let mut missing = Vec::new();
    if course.title.trim().is_empty() {
        missing.push(MISSING_TITLE);
    }
    if blank(course.tagline.as_deref()) {
        missing.push(MISSING_TAGLINE);
    }
    if blank(course.description.as_deref()) {
        missing.push(MISSING_DESCRIPTION);
    }
    if blank(course.learning_objectives.as_deref()) {
        missing.push(MISSING_LEARNING_OBJECTIVES);
    }
    Readiness::from_missing(missing)
}

pub fn lesson_readiness(lesson: &lesson::Model, transcript_line_count: u64) -> Readiness {
    let mut missing = Vec::new();
    if lesson.title.trim().is_empty() {
        missing.push(MISSING_TITLE);
    }
    if blank(lesson.tagline.as_deref()) {
        missing.push(MISSING_TAGLINE);
    }
    if blank(lesson.description.as_deref()) {
        missing.push(MISSING_DESCRIPTION);
    }
    if blank(lesson.asset_id.as_deref()) {
        missing.push(MISSING_ASSET_ID);
    }
    if blank(lesson.playback_id.as_deref()) {
        missing.push(MISSING_PLAYBACK_ID);
    }
    if lesson.duration_seconds.is_none_or(|d| d <= 0) {
        missing.push(MISSING_DURATION);
    }
    if transcript_line_count == 0 {
        missing.push(MISSING_TRANSCRIPT);
    }
    Readiness::from_missing(missing)
}

/// A course publish date needs a ready course and at least one of its
/// lessons publishing on the same UTC calendar day.
pub fn check_course_publish_date(
    course: &course::Model,
    date: DateTime<Utc>,
    lesson_publish_dates: &[Option<DateTime<Utc>>],
) -> Readiness {
    let mut readiness = course_readiness(course);
    let day = date.date_naive();
    let has_same_day_lesson = lesson_publish_dates
        .iter()
        .flatten()
        .any(|d| d.date_naive() == day);

    if !has_same_day_lesson {
        readiness.ready = false;
        readiness.missing.push(MISSING_SAME_DAY_LESSON.to_string());
    }
    readiness
}

/// Field that guards a live record: a scheduled record must stay ready
/// under `publish_date`, a preview under `is_visible`. `None` while neither.
pub fn live_field(publish_date: Option<DateTime<Utc>>, is_visible: bool) -> Option<&'static str> {
    if publish_date.is_some() {
        Some("publish_date")
    } else if is_visible {
        Some("is_visible")
    } else {
        None
    }
}
