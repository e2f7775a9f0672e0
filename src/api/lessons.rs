//! Learner-facing lesson pages.
//!
//! Unpublished lessons are previews: no playback, transcript or copy.
//! Gated lessons need a session, otherwise they come back `locked`.
//! Admins see everything.

use actix_web::{HttpResponse, get, web};
use chrono::Utc;

use super::courses::find_listed_course;
use super::tag_responses;
use crate::auth::OptionalSession;
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::course::{is_listed, is_published};
use crate::models::crop::crops_from_json;
use crate::models::{
    InstructorResponse, LessonDetail, LessonProgress, TranscriptLineResponse, file_url,
};

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(get_lesson);
}

/// What a viewer may see of a lesson.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Access {
    pub is_preview: bool,
    pub locked: bool,
}

impl Access {
    pub(crate) fn evaluate(published: bool, gated: bool, signed_in: bool, admin: bool) -> Self {
        if admin {
            return Self {
                is_preview: false,
                locked: false,
            };
        }
        Self {
            is_preview: !published,
            locked: gated && !signed_in,
        }
    }

    pub(crate) fn can_watch(&self) -> bool {
        !self.is_preview && !self.locked
    }
}

/// Lesson page by course and lesson slug.
#[utoipa::path(
    get,
    path = "/api/v1/courses/{course_slug}/lessons/{lesson_slug}",
    tag = "lessons",
    params(
        ("course_slug" = String, Path, description = "Course slug"),
        ("lesson_slug" = String, Path, description = "Lesson slug")
    ),
    responses(
        (status = 200, description = "Lesson detail, gated per viewer", body = LessonDetail),
        (status = 404, description = "Course or lesson not found", body = crate::error::ErrorResponse)
    )
)]
#[get("/courses/{course_slug}/lessons/{lesson_slug}")]
pub async fn get_lesson(
    pool: web::Data<DbPool>,
    session: OptionalSession,
    path: web::Path<(String, String)>,
) -> AppResult<HttpResponse> {
    let (course_slug, lesson_slug) = path.into_inner();
    let now = Utc::now();
    let admin = session.is_admin();

    let course = find_listed_course(&pool, &course_slug, admin, now).await?;
    let lesson = pool
        .find_lesson_by_slug(course.id, &lesson_slug)
        .await?
        .filter(|l| admin || is_listed(l.is_visible, l.publish_date, now))
        .ok_or_else(|| AppError::NotFound(format!("Lesson '{}'", lesson_slug)))?;

    let published = is_published(lesson.publish_date, now);
    let access = Access::evaluate(published, lesson.is_gated, session.user().is_some(), admin);

    let siblings = pool.list_lessons(course.id, admin).await?;
    let position = siblings.iter().position(|l| l.id == lesson.id);
    let previous_slug = position
        .and_then(|i| i.checked_sub(1))
        .and_then(|i| siblings.get(i))
        .map(|l| l.slug.clone());
    let next_slug = position
        .and_then(|i| siblings.get(i + 1))
        .map(|l| l.slug.clone());

    let transcript = if access.can_watch() {
        pool.transcript(lesson.id)
            .await?
            .into_iter()
            .map(TranscriptLineResponse::from)
            .collect()
    } else {
        Vec::new()
    };

    let instructors = pool
        .lesson_instructors(lesson.id)
        .await?
        .into_iter()
        .map(InstructorResponse::from)
        .collect();
    let tags = tag_responses(pool.tags_for_lessons(&[lesson.id]).await?.remove(&lesson.id));

    let progress = match session.user_id() {
        Some(user_id) => pool
            .find_lesson_user(user_id, lesson.id)
            .await?
            .map(LessonProgress::from),
        None => None,
    };

    let detail = LessonDetail {
        id: lesson.id,
        course_slug: course.slug,
        course_title: course.title,
        title: lesson.title,
        slug: lesson.slug,
        tagline: lesson.tagline,
        description: lesson.description,
        copy: if access.is_preview {
            None
        } else {
            lesson.marketing_copy
        },
        duration_seconds: lesson.duration_seconds,
        thumbnail_url: lesson.thumbnail_key.as_deref().map(file_url),
        thumbnail_crops: crops_from_json(lesson.thumbnail_crops.as_ref()),
        publish_date: lesson.publish_date,
        is_gated: lesson.is_gated,
        is_published: published,
        is_preview: access.is_preview,
        locked: access.locked,
        playback_id: if access.can_watch() {
            lesson.playback_id
        } else {
            None
        },
        transcript,
        instructors,
        tags,
        progress,
        previous_slug,
        next_slug,
    };

    Ok(HttpResponse::Ok().json(detail))
}
