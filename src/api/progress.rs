//! Learner progress: start, complete and reset lessons; dashboard.

use std::collections::{HashMap, HashSet};

use actix_web::{HttpResponse, delete, get, post, web};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::courses::find_listed_course;
use crate::auth::SessionUser;
use crate::db::DbPool;
use crate::entity::{course_user, lesson};
use crate::error::{AppError, AppResult};
use crate::models::course::{is_listed, is_published};
use crate::models::{
    CourseProgress, DashboardEntry, DashboardResponse, LessonProgress, LessonProgressResponse,
    file_url,
};
use crate::services::progress::course_progress;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(start_lesson)
        .service(complete_lesson)
        .service(reset_lesson)
        .service(get_course_progress)
        .service(dashboard);
}

/// A user's completions and enrollments, loaded once for many courses.
pub(crate) struct ProgressIndex {
    completed: HashSet<Uuid>,
    enrollments: HashMap<Uuid, course_user::Model>,
}

impl ProgressIndex {
    pub(crate) async fn load(
        pool: &DbPool,
        user_id: Uuid,
        lessons_by_course: &HashMap<Uuid, Vec<lesson::Model>>,
    ) -> AppResult<Self> {
        let lesson_ids: Vec<Uuid> = lessons_by_course
            .values()
            .flatten()
            .map(|l| l.id)
            .collect();
        let completed = pool.completed_lesson_ids(user_id, &lesson_ids).await?;
        let enrollments = pool
            .enrollments(user_id)
            .await?
            .into_iter()
            .map(|e| (e.course_id, e))
            .collect();
        Ok(Self {
            completed,
            enrollments,
        })
    }

    /// Progress over the published lessons among `lessons`.
    pub(crate) fn course_progress(
        &self,
        course_id: Uuid,
        lessons: &[lesson::Model],
        now: DateTime<Utc>,
    ) -> CourseProgress {
        let published: Vec<&lesson::Model> = lessons
            .iter()
            .filter(|l| is_published(l.publish_date, now))
            .collect();
        let done = published
            .iter()
            .filter(|l| self.completed.contains(&l.id))
            .count();
        course_progress(
            done as u64,
            published.len() as u64,
            self.enrollments.get(&course_id),
        )
    }

    /// First published lesson not yet completed.
    pub(crate) fn next_lesson<'a>(
        &self,
        lessons: &'a [lesson::Model],
        now: DateTime<Utc>,
    ) -> Option<&'a lesson::Model> {
        lessons
            .iter()
            .filter(|l| is_published(l.publish_date, now))
            .find(|l| !self.completed.contains(&l.id))
    }
}

async fn course_progress_for(
    pool: &DbPool,
    user_id: Uuid,
    course_id: Uuid,
) -> AppResult<CourseProgress> {
    let published = pool.published_lesson_ids(course_id).await?;
    let completed = pool.completed_lesson_ids(user_id, &published).await?;
    let enrollment = pool.find_course_user(user_id, course_id).await?;
    Ok(course_progress(
        completed.len() as u64,
        published.len() as u64,
        enrollment.as_ref(),
    ))
}

/// A lesson the user may record progress on: listed course, published lesson.
async fn trackable_lesson(
    pool: &DbPool,
    session: &SessionUser,
    lesson_id: Uuid,
) -> AppResult<lesson::Model> {
    let now = Utc::now();
    let admin = session.is_admin();
    let lesson = pool.get_lesson(lesson_id).await?;
    let course = pool.get_course(lesson.course_id).await?;

    if !admin && !is_listed(course.is_visible, course.publish_date, now) {
        return Err(AppError::NotFound(format!("Lesson {}", lesson_id)));
    }
    if !is_published(lesson.publish_date, now) {
        if !admin && !lesson.is_visible {
            return Err(AppError::NotFound(format!("Lesson {}", lesson_id)));
        }
        return Err(AppError::InvalidInput(
            "Progress can only be recorded on published lessons".to_string(),
        ));
    }
    Ok(lesson)
}

/// Record that the user opened a lesson.
#[utoipa::path(
    post,
    path = "/api/v1/lessons/{id}/start",
    tag = "progress",
    params(("id" = Uuid, Path, description = "Lesson ID")),
    responses(
        (status = 200, description = "Lesson started", body = LessonProgressResponse),
        (status = 401, description = "Not signed in", body = crate::error::ErrorResponse),
        (status = 404, description = "Lesson not found", body = crate::error::ErrorResponse)
    ),
    security(("session_cookie" = []))
)]
#[post("/lessons/{id}/start")]
pub async fn start_lesson(
    pool: web::Data<DbPool>,
    session: SessionUser,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let lesson = trackable_lesson(&pool, &session, path.into_inner()).await?;
    let record = pool
        .start_lesson(session.id, lesson.id, lesson.course_id)
        .await?;
    let course = course_progress_for(&pool, session.id, lesson.course_id).await?;

    Ok(HttpResponse::Ok().json(LessonProgressResponse {
        lesson: Some(LessonProgress::from(record)),
        course,
    }))
}

/// Mark a lesson complete.
#[utoipa::path(
    post,
    path = "/api/v1/lessons/{id}/complete",
    tag = "progress",
    params(("id" = Uuid, Path, description = "Lesson ID")),
    responses(
        (status = 200, description = "Lesson completed", body = LessonProgressResponse),
        (status = 401, description = "Not signed in", body = crate::error::ErrorResponse),
        (status = 404, description = "Lesson not found", body = crate::error::ErrorResponse)
    ),
    security(("session_cookie" = []))
)]
#[post("/lessons/{id}/complete")]
pub async fn complete_lesson(
    pool: web::Data<DbPool>,
    session: SessionUser,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let lesson = trackable_lesson(&pool, &session, path.into_inner()).await?;
    let record = pool
        .complete_lesson(session.id, lesson.id, lesson.course_id)
        .await?;
    let course = course_progress_for(&pool, session.id, lesson.course_id).await?;
    tracing::debug!(
        "User {} completed lesson {} ({}% of course)",
        session.id,
        lesson.id,
        course.percentage
    );

    Ok(HttpResponse::Ok().json(LessonProgressResponse {
        lesson: Some(LessonProgress::from(record)),
        course,
    }))
}

/// Clear a lesson's completion.
#[utoipa::path(
    delete,
    path = "/api/v1/lessons/{id}/complete",
    tag = "progress",
    params(("id" = Uuid, Path, description = "Lesson ID")),
    responses(
        (status = 200, description = "Completion cleared", body = LessonProgressResponse),
        (status = 401, description = "Not signed in", body = crate::error::ErrorResponse)
    ),
    security(("session_cookie" = []))
)]
#[delete("/lessons/{id}/complete")]
pub async fn reset_lesson(
    pool: web::Data<DbPool>,
    session: SessionUser,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let lesson = pool.get_lesson(path.into_inner()).await?;
    let record = pool
        .reset_lesson(session.id, lesson.id, lesson.course_id)
        .await?;
    let course = course_progress_for(&pool, session.id, lesson.course_id).await?;

    Ok(HttpResponse::Ok().json(LessonProgressResponse {
        lesson: record.map(LessonProgress::from),
        course,
    }))
}

/// The signed-in user's progress through one course.
#[utoipa::path(
    get,
    path = "/api/v1/courses/{slug}/progress",
    tag = "progress",
    params(("slug" = String, Path, description = "Course slug")),
    responses(
        (status = 200, description = "Course progress", body = CourseProgress),
        (status = 401, description = "Not signed in", body = crate::error::ErrorResponse)
    ),
    security(("session_cookie" = []))
)]
#[get("/courses/{slug}/progress")]
pub async fn get_course_progress(
    pool: web::Data<DbPool>,
    session: SessionUser,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let course = find_listed_course(&pool, &path, session.is_admin(), Utc::now()).await?;
    let progress = course_progress_for(&pool, session.id, course.id).await?;
    Ok(HttpResponse::Ok().json(progress))
}

/// Courses the user has started, most recent first.
#[utoipa::path(
    get,
    path = "/api/v1/dashboard",
    tag = "progress",
    responses(
        (status = 200, description = "Started courses with progress", body = DashboardResponse),
        (status = 401, description = "Not signed in", body = crate::error::ErrorResponse)
    ),
    security(("session_cookie" = []))
)]
#[get("/dashboard")]
pub async fn dashboard(pool: web::Data<DbPool>, session: SessionUser) -> AppResult<HttpResponse> {
    let now = Utc::now();
    let enrollments = pool.enrollments(session.id).await?;

    let mut courses = Vec::with_capacity(enrollments.len());
    for enrollment in &enrollments {
        if let Some(course) = pool.find_course(enrollment.course_id).await? {
            courses.push(course);
        }
    }
    let ids: Vec<Uuid> = courses.iter().map(|c| c.id).collect();
    let lessons = pool.listed_lessons_for_courses(&ids).await?;
    let index = ProgressIndex::load(&pool, session.id, &lessons).await?;

    let entries = courses
        .into_iter()
        .map(|course| {
            let course_lessons = lessons
                .get(&course.id)
                .map(Vec::as_slice)
                .unwrap_or_default();
            DashboardEntry {
                course_id: course.id,
                progress: index.course_progress(course.id, course_lessons, now),
                next_lesson_slug: index.next_lesson(course_lessons, now).map(|l| l.slug.clone()),
                thumbnail_url: course.thumbnail_key.as_deref().map(file_url),
                title: course.title,
                slug: course.slug,
            }
        })
        .collect();

    Ok(HttpResponse::Ok().json(DashboardResponse { courses: entries }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn lesson(course_id: Uuid, slug: &str, publish_date: Option<DateTime<Utc>>) -> lesson::Model {
        let now = Utc::now();
        lesson::Model {
            id: Uuid::now_v7(),
            course_id,
            title: slug.to_string(),
            slug: slug.to_string(),
            tagline: None,
            description: None,
            marketing_copy: None,
            is_gated: true,
            is_visible: true,
            publish_date,
            video_host: "mux".to_string(),
            asset_id: None,
            playback_id: None,
            duration_seconds: None,
            video_synced_at: None,
            thumbnail_key: None,
            thumbnail_crops: None,
            sort_order: 1,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    #[test]
    fn test_index_counts_only_published_lessons() {
        let now = Utc::now();
        let course_id = Uuid::now_v7();
        let past = Some(now - Duration::days(1));
        let lessons = vec![
            lesson(course_id, "one", past),
            lesson(course_id, "two", past),
            lesson(course_id, "preview", Some(now + Duration::days(3))),
        ];
        let index = ProgressIndex {
            completed: [lessons[0].id, lessons[2].id].into_iter().collect(),
            enrollments: HashMap::new(),
        };

        let progress = index.course_progress(course_id, &lessons, now);
        assert_eq!(progress.completed_lessons, 1);
        assert_eq!(progress.total_lessons, 2);
        assert_eq!(progress.percentage, 50);
        assert!(progress.started_at.is_none());

        assert_eq!(index.next_lesson(&lessons, now).map(|l| l.slug.as_str()), Some("two"));
    }
}
