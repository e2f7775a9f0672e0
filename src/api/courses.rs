//! Learner-facing course catalogue.

use std::collections::HashSet;

use actix_web::{HttpResponse, get, web};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::progress::ProgressIndex;
use super::tag_responses;
use crate::auth::OptionalSession;
use crate::db::DbPool;
use crate::entity::course;
use crate::error::{AppError, AppResult};
use crate::models::course::{is_listed, is_published};
use crate::models::{CourseDetail, CourseSummary, InstructorResponse, LessonSummary};
use crate::services::progress::course_progress;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(list_courses).service(get_course);
}

/// Course by slug, hidden from learners until previewed or published.
pub(crate) async fn find_listed_course(
    pool: &DbPool,
    slug: &str,
    include_hidden: bool,
    now: DateTime<Utc>,
) -> AppResult<course::Model> {
    pool.find_course_by_slug(slug)
        .await?
        .filter(|c| include_hidden || is_listed(c.is_visible, c.publish_date, now))
        .ok_or_else(|| AppError::NotFound(format!("Course '{}'", slug)))
}

/// List courses in catalogue order.
#[utoipa::path(
    get,
    path = "/api/v1/courses",
    tag = "courses",
    responses(
        (status = 200, description = "Courses with tags, lesson counts and the caller's progress", body = Vec<CourseSummary>)
    )
)]
#[get("/courses")]
pub async fn list_courses(
    pool: web::Data<DbPool>,
    session: OptionalSession,
) -> AppResult<HttpResponse> {
    let now = Utc::now();
    let courses = pool.list_courses(session.is_admin()).await?;
    let ids: Vec<Uuid> = courses.iter().map(|c| c.id).collect();
    let lessons = pool.listed_lessons_for_courses(&ids).await?;
    let mut tags = pool.tags_for_courses(&ids).await?;

    let progress = match session.user_id() {
        Some(user_id) => Some(ProgressIndex::load(&pool, user_id, &lessons).await?),
        None => None,
    };

    let summaries: Vec<CourseSummary> = courses
        .iter()
        .map(|c| {
            let course_lessons = lessons.get(&c.id).map(Vec::as_slice).unwrap_or_default();
            let progress = progress
                .as_ref()
                .map(|p| p.course_progress(c.id, course_lessons, now));
            CourseSummary::from_model(
                c,
                course_lessons.len() as u64,
                tag_responses(tags.remove(&c.id)),
                progress,
                now,
            )
        })
        .collect();

    Ok(HttpResponse::Ok().json(summaries))
}

/// Course page with its lessons and instructors.
#[utoipa::path(
    get,
    path = "/api/v1/courses/{slug}",
    tag = "courses",
    params(("slug" = String, Path, description = "Course slug")),
    responses(
        (status = 200, description = "Course detail", body = CourseDetail),
        (status = 404, description = "Course not found", body = crate::error::ErrorResponse)
    )
)]
#[get("/courses/{slug}")]
pub async fn get_course(
    pool: web::Data<DbPool>,
    session: OptionalSession,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let now = Utc::now();
    let admin = session.is_admin();
    let course = find_listed_course(&pool, &path, admin, now).await?;

    let lessons = pool.list_lessons(course.id, admin).await?;
    let lesson_ids: Vec<Uuid> = lessons.iter().map(|l| l.id).collect();
    let mut instructors_by_lesson = pool.instructors_for_lessons(&lesson_ids).await?;
    let tags = tag_responses(pool.tags_for_courses(&[course.id]).await?.remove(&course.id));

    let mut seen = HashSet::new();
    let mut instructors = Vec::new();
    for lesson in &lessons {
        for user in instructors_by_lesson.remove(&lesson.id).unwrap_or_default() {
            if seen.insert(user.id) {
                instructors.push(InstructorResponse::from(user));
            }
        }
    }

    let (completed, progress) = match session.user_id() {
        Some(user_id) => {
            let completed = pool.completed_lesson_ids(user_id, &lesson_ids).await?;
            let published: Vec<Uuid> = lessons
                .iter()
                .filter(|l| is_published(l.publish_date, now))
                .map(|l| l.id)
                .collect();
            let done = published.iter().filter(|id| completed.contains(id)).count();
            let enrollment = pool.find_course_user(user_id, course.id).await?;
            let progress = course_progress(
                done as u64,
                published.len() as u64,
                enrollment.as_ref(),
            );
            (Some(completed), Some(progress))
        }
        None => (None, None),
    };

    let lesson_summaries = lessons
        .iter()
        .map(|l| {
            let done = completed.as_ref().map(|c| c.contains(&l.id));
            LessonSummary::from_model(l, done, now)
        })
        .collect();

    let detail = CourseDetail {
        summary: CourseSummary::from_model(&course, lessons.len() as u64, tags, progress, now),
        description: course.description.clone(),
        learning_objectives: course.learning_objectives.clone(),
        lessons: lesson_summaries,
        instructors,
    };
    Ok(HttpResponse::Ok().json(detail))
}
