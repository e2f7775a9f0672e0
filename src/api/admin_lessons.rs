//! Lesson administration (admin role): CRUD, scheduling, video sync and
//! copy suggestions.

use actix_multipart::Multipart;
use actix_web::{HttpResponse, delete, get, post, put, web};
use serde::Serialize;
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::{store_thumbnail, tag_responses};
use crate::auth::SessionUser;
use crate::config::Config;
use crate::db::users::{self, trimmed};
use crate::db::DbPool;
use crate::entity::lesson;
use crate::error::{AppError, AppResult};
use crate::models::{
    AdminLessonResponse, CopySuggestion, InstructorResponse, LessonRequest, PublishDateRequest,
    ReorderRequest, UserRole, VideoHostKind, VisibilityRequest,
};
use crate::services::readiness::{lesson_readiness, live_field};
use crate::services::slug::{slugify, unique_slug};
use crate::services::upload::read_image_form;
use crate::services::video_host::{VideoHostService, sync_lesson_video};
use crate::services::{Copywriter, Storage};

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(list_lessons)
        .service(create_lesson)
        .service(reorder_lessons)
        .service(get_lesson)
        .service(update_lesson)
        .service(delete_lesson)
        .service(set_publish_date)
        .service(set_visibility)
        .service(upload_thumbnail)
        .service(sync_video)
        .service(suggest_copy);
}

/// Result of a video sync.
#[derive(Debug, Serialize, ToSchema)]
pub struct VideoSyncResponse {
    pub lesson: AdminLessonResponse,
    pub transcript_lines: usize,
    pub thumbnail_updated: bool,
}

async fn lesson_slug(
    pool: &DbPool,
    course_id: Uuid,
    title: &str,
    exclude: Option<Uuid>,
) -> AppResult<String> {
    let base = slugify(title);
    let taken = pool.lesson_slugs_like(course_id, &base, exclude).await?;
    Ok(unique_slug(&base, &taken))
}

async fn ensure_instructors_exist(pool: &DbPool, ids: &[Uuid]) -> AppResult<()> {
    let mut wanted = ids.to_vec();
    wanted.sort();
    wanted.dedup();
    if wanted.is_empty() {
        return Ok(());
    }
    let found = users::find_many(pool.connection(), &wanted).await?;
    if found.len() != wanted.len() {
        return Err(AppError::field(
            "instructor_ids",
            "The selected instructors are invalid",
        ));
    }
    Ok(())
}

async fn validate_request(pool: &DbPool, req: &LessonRequest) -> AppResult<()> {
    req.validate()?;
    pool.ensure_tags_exist(&req.tag_ids).await?;
    ensure_instructors_exist(pool, &req.instructor_ids).await
}

/// A scheduled or visible lesson keeps its video and stays ready.
async fn check_live_edit(pool: &DbPool, lesson: &lesson::Model, req: &LessonRequest) -> AppResult<()> {
    let Some(field) = live_field(lesson.publish_date, lesson.is_visible) else {
        return Ok(());
    };
    let asset_id = trimmed(req.asset_id.as_deref());
    if asset_id != lesson.asset_id {
        return Err(AppError::field(
            "asset_id",
            "Unpublish the lesson before changing its video asset",
        ));
    }

    let edited = lesson::Model {
        title: req.title.trim().to_string(),
        tagline: trimmed(req.tagline.as_deref()),
        description: trimmed(req.description.as_deref()),
        asset_id,
        ..lesson.clone()
    };
    let line_count = pool.transcript_line_count(lesson.id).await?;
    lesson_readiness(&edited, line_count).require(field)
}

async fn admin_response(pool: &DbPool, lesson: lesson::Model) -> AppResult<AdminLessonResponse> {
    let line_count = pool.transcript_line_count(lesson.id).await?;
    let tags = tag_responses(pool.tags_for_lessons(&[lesson.id]).await?.remove(&lesson.id));
    let instructors = pool
        .lesson_instructors(lesson.id)
        .await?
        .into_iter()
        .map(InstructorResponse::from)
        .collect();
    let readiness = lesson_readiness(&lesson, line_count);
    Ok(AdminLessonResponse::from_model(
        lesson,
        line_count,
        tags,
        instructors,
        readiness,
    ))
}

/// Every lesson of a course, in order.
#[utoipa::path(
    get,
    path = "/api/v1/admin/courses/{course_id}/lessons",
    tag = "admin",
    params(("course_id" = Uuid, Path, description = "Course ID")),
    responses(
        (status = 200, description = "Lessons with readiness", body = Vec<AdminLessonResponse>),
        (status = 404, description = "Course not found", body = crate::error::ErrorResponse)
    ),
    security(("session_cookie" = []))
)]
#[get("/admin/courses/{course_id}/lessons")]
pub async fn list_lessons(
    pool: web::Data<DbPool>,
    session: SessionUser,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    session.require(UserRole::Admin)?;
    let course = pool.get_course(path.into_inner()).await?;

    let lessons = pool.list_lessons(course.id, true).await?;
    let mut response = Vec::with_capacity(lessons.len());
    for lesson in lessons {
        response.push(admin_response(&pool, lesson).await?);
    }
    Ok(HttpResponse::Ok().json(response))
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/courses/{course_id}/lessons",
    tag = "admin",
    params(("course_id" = Uuid, Path, description = "Course ID")),
    request_body = LessonRequest,
    responses(
        (status = 201, description = "Lesson created", body = AdminLessonResponse),
        (status = 422, description = "Validation failed", body = crate::error::ErrorResponse)
    ),
    security(("session_cookie" = []))
)]
#[post("/admin/courses/{course_id}/lessons")]
pub async fn create_lesson(
    pool: web::Data<DbPool>,
    session: SessionUser,
    path: web::Path<Uuid>,
    body: web::Json<LessonRequest>,
) -> AppResult<HttpResponse> {
    session.require(UserRole::Admin)?;
    let course = pool.get_course(path.into_inner()).await?;
    validate_request(&pool, &body).await?;

    let slug = lesson_slug(&pool, course.id, &body.title, None).await?;
    let lesson = pool.insert_lesson(course.id, &body, slug).await?;
    info!(
        "Lesson {} '{}' created in course {} by {}",
        lesson.id, lesson.slug, course.id, session.id
    );

    Ok(HttpResponse::Created().json(admin_response(&pool, lesson).await?))
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/courses/{course_id}/lessons/reorder",
    tag = "admin",
    params(("course_id" = Uuid, Path, description = "Course ID")),
    request_body = ReorderRequest,
    responses(
        (status = 204, description = "Lessons reordered"),
        (status = 422, description = "Not a permutation of the course's lessons", body = crate::error::ErrorResponse)
    ),
    security(("session_cookie" = []))
)]
#[post("/admin/courses/{course_id}/lessons/reorder")]
pub async fn reorder_lessons(
    pool: web::Data<DbPool>,
    session: SessionUser,
    path: web::Path<Uuid>,
    body: web::Json<ReorderRequest>,
) -> AppResult<HttpResponse> {
    session.require(UserRole::Admin)?;
    let course = pool.get_course(path.into_inner()).await?;
    pool.reorder_lessons(course.id, &body.ids).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/lessons/{id}",
    tag = "admin",
    params(("id" = Uuid, Path, description = "Lesson ID")),
    responses(
        (status = 200, description = "Lesson with readiness", body = AdminLessonResponse),
        (status = 404, description = "Lesson not found", body = crate::error::ErrorResponse)
    ),
    security(("session_cookie" = []))
)]
#[get("/admin/lessons/{id}")]
pub async fn get_lesson(
    pool: web::Data<DbPool>,
    session: SessionUser,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    session.require(UserRole::Admin)?;
    let lesson = pool.get_lesson(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(admin_response(&pool, lesson).await?))
}

/// Update content, gating, asset, tags and instructors.
///
/// Changing the asset ID discards the synced playback data and transcript,
/// so it is refused while the lesson is scheduled or visible. Live lessons
/// must stay ready.
#[utoipa::path(
    put,
    path = "/api/v1/admin/lessons/{id}",
    tag = "admin",
    params(("id" = Uuid, Path, description = "Lesson ID")),
    request_body = LessonRequest,
    responses(
        (status = 200, description = "Lesson updated", body = AdminLessonResponse),
        (status = 422, description = "Validation failed", body = crate::error::ErrorResponse)
    ),
    security(("session_cookie" = []))
)]
#[put("/admin/lessons/{id}")]
pub async fn update_lesson(
    pool: web::Data<DbPool>,
    session: SessionUser,
    path: web::Path<Uuid>,
    body: web::Json<LessonRequest>,
) -> AppResult<HttpResponse> {
    session.require(UserRole::Admin)?;
    let lesson = pool.get_lesson(path.into_inner()).await?;
    validate_request(&pool, &body).await?;
    check_live_edit(&pool, &lesson, &body).await?;

    let slug = if body.title.trim() == lesson.title {
        lesson.slug.clone()
    } else {
        lesson_slug(&pool, lesson.course_id, &body.title, Some(lesson.id)).await?
    };
    let lesson = pool.update_lesson(lesson, &body, slug).await?;

    Ok(HttpResponse::Ok().json(admin_response(&pool, lesson).await?))
}

#[utoipa::path(
    delete,
    path = "/api/v1/admin/lessons/{id}",
    tag = "admin",
    params(("id" = Uuid, Path, description = "Lesson ID")),
    responses(
        (status = 204, description = "Lesson deleted"),
        (status = 404, description = "Lesson not found", body = crate::error::ErrorResponse)
    ),
    security(("session_cookie" = []))
)]
#[delete("/admin/lessons/{id}")]
pub async fn delete_lesson(
    pool: web::Data<DbPool>,
    session: SessionUser,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    session.require(UserRole::Admin)?;
    let id = path.into_inner();
    pool.soft_delete_lesson(id).await?;
    info!("Lesson {} deleted by {}", id, session.id);
    Ok(HttpResponse::NoContent().finish())
}

/// Schedule or unschedule a lesson. Scheduling needs a ready lesson.
#[utoipa::path(
    put,
    path = "/api/v1/admin/lessons/{id}/publish-date",
    tag = "admin",
    params(("id" = Uuid, Path, description = "Lesson ID")),
    request_body = PublishDateRequest,
    responses(
        (status = 200, description = "Publish date updated", body = AdminLessonResponse),
        (status = 422, description = "Lesson not ready", body = crate::error::ErrorResponse)
    ),
    security(("session_cookie" = []))
)]
#[put("/admin/lessons/{id}/publish-date")]
pub async fn set_publish_date(
    pool: web::Data<DbPool>,
    session: SessionUser,
    path: web::Path<Uuid>,
    body: web::Json<PublishDateRequest>,
) -> AppResult<HttpResponse> {
    session.require(UserRole::Admin)?;
    let lesson = pool.get_lesson(path.into_inner()).await?;

    if body.publish_date.is_some() {
        let line_count = pool.transcript_line_count(lesson.id).await?;
        lesson_readiness(&lesson, line_count).require("publish_date")?;
    }
    let lesson = pool.set_lesson_publish_date(lesson, body.publish_date).await?;

    Ok(HttpResponse::Ok().json(admin_response(&pool, lesson).await?))
}

/// Toggle preview visibility. Enabling needs a ready lesson.
#[utoipa::path(
    put,
    path = "/api/v1/admin/lessons/{id}/visibility",
    tag = "admin",
    params(("id" = Uuid, Path, description = "Lesson ID")),
    request_body = VisibilityRequest,
    responses(
        (status = 200, description = "Visibility updated", body = AdminLessonResponse),
        (status = 422, description = "Lesson not ready", body = crate::error::ErrorResponse)
    ),
    security(("session_cookie" = []))
)]
#[put("/admin/lessons/{id}/visibility")]
pub async fn set_visibility(
    pool: web::Data<DbPool>,
    session: SessionUser,
    path: web::Path<Uuid>,
    body: web::Json<VisibilityRequest>,
) -> AppResult<HttpResponse> {
    session.require(UserRole::Admin)?;
    let lesson = pool.get_lesson(path.into_inner()).await?;

    if body.is_visible {
        let line_count = pool.transcript_line_count(lesson.id).await?;
        lesson_readiness(&lesson, line_count).require("is_visible")?;
    }
    let lesson = pool.set_lesson_visibility(lesson, body.is_visible).await?;

    Ok(HttpResponse::Ok().json(admin_response(&pool, lesson).await?))
}

/// Upload a custom thumbnail and/or update its crops.
#[utoipa::path(
    post,
    path = "/api/v1/admin/lessons/{id}/thumbnail",
    tag = "admin",
    params(("id" = Uuid, Path, description = "Lesson ID")),
    responses(
        (status = 200, description = "Thumbnail stored", body = AdminLessonResponse),
        (status = 422, description = "Invalid image or crops", body = crate::error::ErrorResponse)
    ),
    security(("session_cookie" = []))
)]
#[post("/admin/lessons/{id}/thumbnail")]
pub async fn upload_thumbnail(
    pool: web::Data<DbPool>,
    storage: web::Data<Storage>,
    config: web::Data<Config>,
    session: SessionUser,
    path: web::Path<Uuid>,
    payload: Multipart,
) -> AppResult<HttpResponse> {
    session.require(UserRole::Admin)?;
    let lesson = pool.get_lesson(path.into_inner()).await?;
    let form = read_image_form(payload, config.max_image_size).await?;

    let lesson_id = lesson.id;
    let (key, crops) = store_thumbnail(
        &storage,
        lesson.thumbnail_key.as_deref(),
        form,
        |ext| Storage::lesson_thumbnail_key(lesson_id, ext),
    )
    .await?;
    let lesson = pool.set_lesson_thumbnail(lesson, key, crops).await?;

    Ok(HttpResponse::Ok().json(admin_response(&pool, lesson).await?))
}

/// Pull playback id, duration, captions and thumbnail from the video host.
#[utoipa::path(
    post,
    path = "/api/v1/admin/lessons/{id}/sync",
    tag = "admin",
    params(("id" = Uuid, Path, description = "Lesson ID")),
    responses(
        (status = 200, description = "Video synced", body = VideoSyncResponse),
        (status = 422, description = "Video host error, message under asset_id", body = crate::error::ErrorResponse)
    ),
    security(("session_cookie" = []))
)]
#[post("/admin/lessons/{id}/sync")]
pub async fn sync_video(
    pool: web::Data<DbPool>,
    storage: web::Data<Storage>,
    host: web::Data<dyn VideoHostService>,
    session: SessionUser,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    session.require(UserRole::Admin)?;
    let lesson = pool.get_lesson(path.into_inner()).await?;

    if VideoHostKind::parse(&lesson.video_host) != Some(host.kind()) {
        return Err(AppError::field(
            "video_host",
            format!("Lessons on {} cannot be synced", lesson.video_host),
        ));
    }

    let outcome = sync_lesson_video(&pool, &storage, host.get_ref(), &lesson).await?;
    Ok(HttpResponse::Ok().json(VideoSyncResponse {
        lesson: admin_response(&pool, outcome.lesson).await?,
        transcript_lines: outcome.transcript_lines,
        thumbnail_updated: outcome.thumbnail_updated,
    }))
}

/// Draft a tagline, description and marketing copy from the transcript.
#[utoipa::path(
    post,
    path = "/api/v1/admin/lessons/{id}/copy-suggestion",
    tag = "admin",
    params(("id" = Uuid, Path, description = "Lesson ID")),
    responses(
        (status = 200, description = "Suggested copy (not saved)", body = CopySuggestion),
        (status = 422, description = "Lesson has no transcript", body = crate::error::ErrorResponse),
        (status = 502, description = "Copywriter failed", body = crate::error::ErrorResponse)
    ),
    security(("session_cookie" = []))
)]
#[post("/admin/lessons/{id}/copy-suggestion")]
pub async fn suggest_copy(
    pool: web::Data<DbPool>,
    copywriter: web::Data<Copywriter>,
    session: SessionUser,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    session.require(UserRole::Admin)?;
    let lesson = pool.get_lesson(path.into_inner()).await?;
    let transcript: Vec<String> = pool
        .transcript(lesson.id)
        .await?
        .into_iter()
        .map(|line| line.body)
        .collect();

    let suggestion = copywriter.suggest(&lesson.title, &transcript).await?;
    Ok(HttpResponse::Ok().json(suggestion))
}
