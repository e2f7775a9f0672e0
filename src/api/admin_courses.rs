//! Course administration (admin role).

use actix_multipart::Multipart;
use actix_web::{HttpResponse, delete, get, post, put, web};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use super::{store_thumbnail, tag_responses};
use crate::auth::SessionUser;
use crate::config::Config;
use crate::db::DbPool;
use crate::db::users::trimmed;
use crate::entity::course;
use crate::error::AppResult;
use crate::models::{
    AdminCourseResponse, CourseRequest, PublishDateRequest, ReorderRequest, UserRole,
    VisibilityRequest,
};
use crate::services::Storage;
use crate::services::readiness::{check_course_publish_date, course_readiness, live_field};
use crate::services::slug::{slugify, unique_slug};
use crate::services::upload::read_image_form;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(list_courses)
        .service(create_course)
        .service(reorder_courses)
        .service(get_course)
        .service(update_course)
        .service(delete_course)
        .service(set_publish_date)
        .service(set_visibility)
        .service(upload_thumbnail);
}

async fn course_slug(pool: &DbPool, title: &str, exclude: Option<Uuid>) -> AppResult<String> {
    let base = slugify(title);
    let taken = pool.course_slugs_like(&base, exclude).await?;
    Ok(unique_slug(&base, &taken))
}

async fn admin_response(pool: &DbPool, course: course::Model) -> AppResult<AdminCourseResponse> {
    let tags = tag_responses(pool.tags_for_courses(&[course.id]).await?.remove(&course.id));
    let readiness = course_readiness(&course);
    Ok(AdminCourseResponse::from_model(course, tags, readiness))
}

/// Every course, including hidden and scheduled ones.
#[utoipa::path(
    get,
    path = "/api/v1/admin/courses",
    tag = "admin",
    responses(
        (status = 200, description = "All courses", body = Vec<AdminCourseResponse>),
        (status = 403, description = "Admin role required", body = crate::error::ErrorResponse)
    ),
    security(("session_cookie" = []))
)]
#[get("/admin/courses")]
pub async fn list_courses(pool: web::Data<DbPool>, session: SessionUser) -> AppResult<HttpResponse> {
    session.require(UserRole::Admin)?;

    let courses = pool.list_courses(true).await?;
    let ids: Vec<Uuid> = courses.iter().map(|c| c.id).collect();
    let mut tags = pool.tags_for_courses(&ids).await?;

    let response: Vec<AdminCourseResponse> = courses
        .into_iter()
        .map(|c| {
            let readiness = course_readiness(&c);
            let course_tags = tag_responses(tags.remove(&c.id));
            AdminCourseResponse::from_model(c, course_tags, readiness)
        })
        .collect();
    Ok(HttpResponse::Ok().json(response))
}

/// Create a hidden, unscheduled course.
#[utoipa::path(
    post,
    path = "/api/v1/admin/courses",
    tag = "admin",
    request_body = CourseRequest,
    responses(
        (status = 201, description = "Course created", body = AdminCourseResponse),
        (status = 422, description = "Validation failed", body = crate::error::ErrorResponse)
    ),
    security(("session_cookie" = []))
)]
#[post("/admin/courses")]
pub async fn create_course(
    pool: web::Data<DbPool>,
    session: SessionUser,
    body: web::Json<CourseRequest>,
) -> AppResult<HttpResponse> {
    session.require(UserRole::Admin)?;
    body.validate()?;
    pool.ensure_tags_exist(&body.tag_ids).await?;

    let slug = course_slug(&pool, &body.title, None).await?;
    let course = pool.insert_course(session.id, &body, slug).await?;
    info!("Course {} '{}' created by {}", course.id, course.slug, session.id);

    Ok(HttpResponse::Created().json(admin_response(&pool, course).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/courses/{id}",
    tag = "admin",
    params(("id" = Uuid, Path, description = "Course ID")),
    responses(
        (status = 200, description = "Course with readiness", body = AdminCourseResponse),
        (status = 404, description = "Course not found", body = crate::error::ErrorResponse)
    ),
    security(("session_cookie" = []))
)]
#[get("/admin/courses/{id}")]
pub async fn get_course(
    pool: web::Data<DbPool>,
    session: SessionUser,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    session.require(UserRole::Admin)?;
    let course = pool.get_course(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(admin_response(&pool, course).await?))
}

/// Update content fields and tags. A new title gets a new slug.
///
/// Scheduled or visible courses must stay ready.
#[utoipa::path(
    put,
    path = "/api/v1/admin/courses/{id}",
    tag = "admin",
    params(("id" = Uuid, Path, description = "Course ID")),
    request_body = CourseRequest,
    responses(
        (status = 200, description = "Course updated", body = AdminCourseResponse),
        (status = 422, description = "Validation failed", body = crate::error::ErrorResponse)
    ),
    security(("session_cookie" = []))
)]
#[put("/admin/courses/{id}")]
pub async fn update_course(
    pool: web::Data<DbPool>,
    session: SessionUser,
    path: web::Path<Uuid>,
    body: web::Json<CourseRequest>,
) -> AppResult<HttpResponse> {
    session.require(UserRole::Admin)?;
    body.validate()?;
    let course = pool.get_course(path.into_inner()).await?;

    if let Some(field) = live_field(course.publish_date, course.is_visible) {
        let edited = course::Model {
            title: body.title.trim().to_string(),
            tagline: trimmed(body.tagline.as_deref()),
            description: trimmed(body.description.as_deref()),
            learning_objectives: trimmed(body.learning_objectives.as_deref()),
            ..course.clone()
        };
        course_readiness(&edited).require(field)?;
    }
    pool.ensure_tags_exist(&body.tag_ids).await?;

    let slug = if body.title.trim() == course.title {
        course.slug.clone()
    } else {
        course_slug(&pool, &body.title, Some(course.id)).await?
    };
    let course = pool.update_course(course, &body, slug).await?;

    Ok(HttpResponse::Ok().json(admin_response(&pool, course).await?))
}

#[utoipa::path(
    delete,
    path = "/api/v1/admin/courses/{id}",
    tag = "admin",
    params(("id" = Uuid, Path, description = "Course ID")),
    responses(
        (status = 204, description = "Course deleted"),
        (status = 404, description = "Course not found", body = crate::error::ErrorResponse)
    ),
    security(("session_cookie" = []))
)]
#[delete("/admin/courses/{id}")]
pub async fn delete_course(
    pool: web::Data<DbPool>,
    session: SessionUser,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    session.require(UserRole::Admin)?;
    let id = path.into_inner();
    pool.soft_delete_course(id).await?;
    info!("Course {} deleted by {}", id, session.id);
    Ok(HttpResponse::NoContent().finish())
}

/// Schedule or unschedule a course.
///
/// Scheduling needs a ready course and a lesson publishing the same UTC day.
#[utoipa::path(
    put,
    path = "/api/v1/admin/courses/{id}/publish-date",
    tag = "admin",
    params(("id" = Uuid, Path, description = "Course ID")),
    request_body = PublishDateRequest,
    responses(
        (status = 200, description = "Publish date updated", body = AdminCourseResponse),
        (status = 422, description = "Course not ready", body = crate::error::ErrorResponse)
    ),
    security(("session_cookie" = []))
)]
#[put("/admin/courses/{id}/publish-date")]
pub async fn set_publish_date(
    pool: web::Data<DbPool>,
    session: SessionUser,
    path: web::Path<Uuid>,
    body: web::Json<PublishDateRequest>,
) -> AppResult<HttpResponse> {
    session.require(UserRole::Admin)?;
    let course = pool.get_course(path.into_inner()).await?;

    if let Some(date) = body.publish_date {
        let lesson_dates = pool.lesson_publish_dates(course.id).await?;
        check_course_publish_date(&course, date, &lesson_dates).require("publish_date")?;
    }
    let course = pool.set_course_publish_date(course, body.publish_date).await?;

    Ok(HttpResponse::Ok().json(admin_response(&pool, course).await?))
}

/// Toggle preview visibility. Enabling needs a ready course.
#[utoipa::path(
    put,
    path = "/api/v1/admin/courses/{id}/visibility",
    tag = "admin",
    params(("id" = Uuid, Path, description = "Course ID")),
    request_body = VisibilityRequest,
    responses(
        (status = 200, description = "Visibility updated", body = AdminCourseResponse),
        (status = 422, description = "Course not ready", body = crate::error::ErrorResponse)
    ),
    security(("session_cookie" = []))
)]
#[put("/admin/courses/{id}/visibility")]
pub async fn set_visibility(
    pool: web::Data<DbPool>,
    session: SessionUser,
    path: web::Path<Uuid>,
    body: web::Json<VisibilityRequest>,
) -> AppResult<HttpResponse> {
    session.require(UserRole::Admin)?;
    let course = pool.get_course(path.into_inner()).await?;

    if body.is_visible {
        course_readiness(&course).require("is_visible")?;
    }
    let course = pool.set_course_visibility(course, body.is_visible).await?;

    Ok(HttpResponse::Ok().json(admin_response(&pool, course).await?))
}

/// Upload a thumbnail and/or update its crops (multipart `image` + `crops`).
#[utoipa::path(
    post,
    path = "/api/v1/admin/courses/{id}/thumbnail",
    tag = "admin",
    params(("id" = Uuid, Path, description = "Course ID")),
    responses(
        (status = 200, description = "Thumbnail stored", body = AdminCourseResponse),
        (status = 422, description = "Invalid image or crops", body = crate::error::ErrorResponse)
    ),
    security(("session_cookie" = []))
)]
#[post("/admin/courses/{id}/thumbnail")]
pub async fn upload_thumbnail(
    pool: web::Data<DbPool>,
    storage: web::Data<Storage>,
    config: web::Data<Config>,
    session: SessionUser,
    path: web::Path<Uuid>,
    payload: Multipart,
) -> AppResult<HttpResponse> {
    session.require(UserRole::Admin)?;
    let course = pool.get_course(path.into_inner()).await?;
    let form = read_image_form(payload, config.max_image_size).await?;

    let course_id = course.id;
    let (key, crops) = store_thumbnail(
        &storage,
        course.thumbnail_key.as_deref(),
        form,
        |ext| Storage::course_thumbnail_key(course_id, ext),
    )
    .await?;
    let course = pool.set_course_thumbnail(course, key, crops).await?;

    Ok(HttpResponse::Ok().json(admin_response(&pool, course).await?))
}

/// Renumber the catalogue in the given order.
#[utoipa::path(
    post,
    path = "/api/v1/admin/courses/reorder",
    tag = "admin",
    request_body = ReorderRequest,
    responses(
        (status = 204, description = "Courses reordered"),
        (status = 422, description = "Not a permutation of the existing courses", body = crate::error::ErrorResponse)
    ),
    security(("session_cookie" = []))
)]
#[post("/admin/courses/reorder")]
pub async fn reorder_courses(
    pool: web::Data<DbPool>,
    session: SessionUser,
    body: web::Json<ReorderRequest>,
) -> AppResult<HttpResponse> {
    session.require(UserRole::Admin)?;
    pool.reorder_courses(&body.ids).await?;
    Ok(HttpResponse::NoContent().finish())
}
