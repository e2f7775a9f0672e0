//! Showcases: public listing plus the owner's draft → review workflow.

use std::collections::HashMap;

use actix_multipart::Multipart;
use actix_web::{HttpResponse, delete, get, post, put, web};
use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::auth::{OptionalSession, SessionUser};
use crate::config::Config;
use crate::db::showcases::StatusChange;
use crate::db::{DbPool, users};
use crate::entity::showcase;
use crate::error::{AppError, AppResult, FieldErrors};
use crate::models::crop::{crops_from_json, crops_to_json, validate_crops};
use crate::models::{
    InstructorResponse, Pagination, PaginationParams, PracticeAreaResponse, ReorderRequest,
    ShowcaseAction, ShowcaseImageResponse, ShowcaseListQuery, ShowcaseListResponse,
    ShowcaseRequest, ShowcaseResponse, ShowcaseStatus, ThumbnailSelection,
};
use crate::services::Storage;
use crate::services::slug::{slugify, unique_slug};
use crate::services::upload::read_image_form;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(list_showcases)
        .service(my_showcases)
        .service(create_showcase)
        .service(get_showcase)
        .service(update_showcase)
        .service(delete_showcase)
        .service(upload_image)
        .service(delete_image)
        .service(reorder_images)
        .service(select_thumbnail)
        .service(submit_showcase)
        .service(withdraw_showcase);
}

fn status_of(showcase: &showcase::Model) -> ShowcaseStatus {
    ShowcaseStatus::parse(&showcase.status).unwrap_or(ShowcaseStatus::Draft)
}

/// Turn rows into responses, loading images, practice areas and owners in
/// bulk. Rejection reasons are kept only where `show_reason` allows.
pub(crate) async fn showcase_responses(
    pool: &DbPool,
    showcases: Vec<showcase::Model>,
    show_reason: impl Fn(&showcase::Model) -> bool,
) -> AppResult<Vec<ShowcaseResponse>> {
    let ids: Vec<Uuid> = showcases.iter().map(|s| s.id).collect();
    let mut images = pool.images_for_showcases(&ids).await?;
    let mut areas = pool.practice_areas_for_showcases(&ids).await?;

    let mut owner_ids: Vec<Uuid> = showcases.iter().map(|s| s.user_id).collect();
    owner_ids.sort();
    owner_ids.dedup();
    let owners: HashMap<Uuid, InstructorResponse> = users::find_many(pool.connection(), &owner_ids)
        .await?
        .into_iter()
        .map(|u| (u.id, InstructorResponse::from(u)))
        .collect();

    Ok(showcases
        .into_iter()
        .map(|s| {
            let rejection_reason = if show_reason(&s) {
                s.rejection_reason.clone()
            } else {
                None
            };
            ShowcaseResponse {
                status: status_of(&s),
                images: images
                    .remove(&s.id)
                    .unwrap_or_default()
                    .into_iter()
                    .map(ShowcaseImageResponse::from)
                    .collect(),
                practice_areas: areas
                    .remove(&s.id)
                    .unwrap_or_default()
                    .into_iter()
                    .map(PracticeAreaResponse::from)
                    .collect(),
                owner: owners.get(&s.user_id).cloned(),
                thumbnail_crops: crops_from_json(s.thumbnail_crops.as_ref()),
                rejection_reason,
                id: s.id,
                title: s.title,
                slug: s.slug,
                tagline: s.tagline,
                description: s.description,
                project_url: s.project_url,
                repository_url: s.repository_url,
                submitted_date: s.submitted_date,
                moderated_at: s.moderated_at,
                thumbnail_image_id: s.thumbnail_image_id,
                created_at: s.created_at,
                updated_at: s.updated_at,
            }
        })
        .collect())
}

async fn single_response(pool: &DbPool, showcase: showcase::Model) -> AppResult<ShowcaseResponse> {
    showcase_responses(pool, vec![showcase], |_| true)
        .await?
        .pop()
        .ok_or_else(|| AppError::Database("Showcase response was not built".to_string()))
}

/// The caller's own showcase; others get a 404 rather than a hint it exists.
async fn owned_showcase(
    pool: &DbPool,
    session: &SessionUser,
    id: Uuid,
) -> AppResult<showcase::Model> {
    pool.find_showcase(id)
        .await?
        .filter(|s| s.user_id == session.id)
        .ok_or_else(|| AppError::NotFound(format!("Showcase {}", id)))
}

fn require_editable(showcase: &showcase::Model) -> AppResult<()> {
    let status = status_of(showcase);
    if status.is_editable() {
        Ok(())
    } else {
        Err(AppError::field(
            "status",
            format!("A showcase in {} status cannot be edited", status),
        ))
    }
}

async fn showcase_slug(pool: &DbPool, title: &str, exclude: Option<Uuid>) -> AppResult<String> {
    let base = slugify(title);
    let taken = pool.showcase_slugs_like(&base, exclude).await?;
    Ok(unique_slug(&base, &taken))
}

/// Fields a showcase needs before it can enter review.
pub(crate) fn submission_errors(showcase: &showcase::Model, image_count: usize) -> FieldErrors {
    let mut errors = FieldErrors::new();
    let blank = |v: &Option<String>| v.as_deref().is_none_or(|s| s.trim().is_empty());

    if showcase.title.trim().is_empty() {
        errors.insert("title".to_string(), vec!["The title field is required".to_string()]);
    }
    if blank(&showcase.tagline) {
        errors.insert(
            "tagline".to_string(),
            vec!["The tagline field is required".to_string()],
        );
    }
    if blank(&showcase.description) {
        errors.insert(
            "description".to_string(),
            vec!["The description field is required".to_string()],
        );
    }
    if image_count == 0 {
        errors.insert(
            "images".to_string(),
            vec!["At least one image is required".to_string()],
        );
    }
    errors
}

/// Approved showcases, newest first, optionally within a practice area.
#[utoipa::path(
    get,
    path = "/api/v1/showcases",
    tag = "showcases",
    params(
        ("practice_area" = Option<String>, Query, description = "Practice area slug"),
        ("page" = Option<u32>, Query, description = "Page number"),
        ("limit" = Option<u32>, Query, description = "Page size (max 100)")
    ),
    responses(
        (status = 200, description = "Approved showcases", body = ShowcaseListResponse)
    )
)]
#[get("/showcases")]
pub async fn list_showcases(
    pool: web::Data<DbPool>,
    query: web::Query<ShowcaseListQuery>,
) -> AppResult<HttpResponse> {
    let paging = PaginationParams {
        page: query.page,
        limit: query.limit,
    };

    let area_id = match query.practice_area.as_deref().filter(|s| !s.is_empty()) {
        Some(slug) => match pool.find_practice_area_by_slug(slug).await? {
            Some(area) => Some(area.id),
            None => {
                return Ok(HttpResponse::Ok().json(ShowcaseListResponse {
                    showcases: Vec::new(),
                    pagination: Pagination::new(paging.page(), paging.clamped_limit(), 0),
                }));
            }
        },
        None => None,
    };

    let (rows, total) = pool
        .list_showcases_by_status(
            ShowcaseStatus::Approved,
            area_id,
            paging.offset(),
            paging.clamped_limit() as u64,
        )
        .await?;
    let showcases = showcase_responses(&pool, rows, |_| false).await?;

    Ok(HttpResponse::Ok().json(ShowcaseListResponse {
        showcases,
        pagination: Pagination::new(paging.page(), paging.clamped_limit(), total),
    }))
}

/// The signed-in user's showcases in every status.
#[utoipa::path(
    get,
    path = "/api/v1/showcases/mine",
    tag = "showcases",
    responses(
        (status = 200, description = "Own showcases", body = Vec<ShowcaseResponse>),
        (status = 401, description = "Not signed in", body = crate::error::ErrorResponse)
    ),
    security(("session_cookie" = []))
)]
#[get("/showcases/mine")]
pub async fn my_showcases(pool: web::Data<DbPool>, session: SessionUser) -> AppResult<HttpResponse> {
    let rows = pool.list_user_showcases(session.id).await?;
    Ok(HttpResponse::Ok().json(showcase_responses(&pool, rows, |_| true).await?))
}

/// Showcase by slug. Unapproved ones are visible to the owner and moderators.
#[utoipa::path(
    get,
    path = "/api/v1/showcases/{slug}",
    tag = "showcases",
    params(("slug" = String, Path, description = "Showcase slug")),
    responses(
        (status = 200, description = "Showcase", body = ShowcaseResponse),
        (status = 404, description = "Showcase not found", body = crate::error::ErrorResponse)
    )
)]
#[get("/showcases/{slug}")]
pub async fn get_showcase(
    pool: web::Data<DbPool>,
    session: OptionalSession,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let slug = path.into_inner();
    let privileged = |s: &showcase::Model| {
        session
            .user()
            .is_some_and(|u| u.id == s.user_id || u.is_moderator())
    };

    let showcase = pool
        .find_showcase_by_slug(&slug)
        .await?
        .filter(|s| status_of(s) == ShowcaseStatus::Approved || privileged(s))
        .ok_or_else(|| AppError::NotFound(format!("Showcase '{}'", slug)))?;

    let response = showcase_responses(&pool, vec![showcase], privileged)
        .await?
        .pop()
        .ok_or_else(|| AppError::NotFound(format!("Showcase '{}'", slug)))?;
    Ok(HttpResponse::Ok().json(response))
}

/// Start a new draft.
#[utoipa::path(
    post,
    path = "/api/v1/showcases",
    tag = "showcases",
    request_body = ShowcaseRequest,
    responses(
        (status = 201, description = "Draft created", body = ShowcaseResponse),
        (status = 422, description = "Validation failed", body = crate::error::ErrorResponse)
    ),
    security(("session_cookie" = []))
)]
#[post("/showcases")]
pub async fn create_showcase(
    pool: web::Data<DbPool>,
    session: SessionUser,
    body: web::Json<ShowcaseRequest>,
) -> AppResult<HttpResponse> {
    body.validate()?;
    pool.ensure_practice_areas_exist(&body.practice_area_ids)
        .await?;

    let slug = showcase_slug(&pool, &body.title, None).await?;
    let showcase = pool.insert_showcase(session.id, &body, slug).await?;
    info!("Showcase {} '{}' created by {}", showcase.id, showcase.slug, session.id);

    Ok(HttpResponse::Created().json(single_response(&pool, showcase).await?))
}

/// Edit content and practice areas while in draft or rejected.
#[utoipa::path(
    put,
    path = "/api/v1/showcases/{id}",
    tag = "showcases",
    params(("id" = Uuid, Path, description = "Showcase ID")),
    request_body = ShowcaseRequest,
    responses(
        (status = 200, description = "Showcase updated", body = ShowcaseResponse),
        (status = 422, description = "Validation failed or not editable", body = crate::error::ErrorResponse)
    ),
    security(("session_cookie" = []))
)]
#[put("/showcases/{id}")]
pub async fn update_showcase(
    pool: web::Data<DbPool>,
    session: SessionUser,
    path: web::Path<Uuid>,
    body: web::Json<ShowcaseRequest>,
) -> AppResult<HttpResponse> {
    let showcase = owned_showcase(&pool, &session, path.into_inner()).await?;
    require_editable(&showcase)?;
    body.validate()?;
    pool.ensure_practice_areas_exist(&body.practice_area_ids)
        .await?;

    let slug = if body.title.trim() == showcase.title {
        showcase.slug.clone()
    } else {
        showcase_slug(&pool, &body.title, Some(showcase.id)).await?
    };
    let showcase = pool.update_showcase(showcase, &body, slug).await?;

    Ok(HttpResponse::Ok().json(single_response(&pool, showcase).await?))
}

#[utoipa::path(
    delete,
    path = "/api/v1/showcases/{id}",
    tag = "showcases",
    params(("id" = Uuid, Path, description = "Showcase ID")),
    responses(
        (status = 204, description = "Showcase deleted"),
        (status = 404, description = "Showcase not found", body = crate::error::ErrorResponse)
    ),
    security(("session_cookie" = []))
)]
#[delete("/showcases/{id}")]
pub async fn delete_showcase(
    pool: web::Data<DbPool>,
    session: SessionUser,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let showcase = owned_showcase(&pool, &session, path.into_inner()).await?;
    pool.soft_delete_showcase(showcase.id).await?;
    info!("Showcase {} deleted by {}", showcase.id, session.id);
    Ok(HttpResponse::NoContent().finish())
}

/// Append an image (multipart field `image`).
#[utoipa::path(
    post,
    path = "/api/v1/showcases/{id}/images",
    tag = "showcases",
    params(("id" = Uuid, Path, description = "Showcase ID")),
    responses(
        (status = 201, description = "Image stored", body = ShowcaseImageResponse),
        (status = 422, description = "Invalid image or limit reached", body = crate::error::ErrorResponse)
    ),
    security(("session_cookie" = []))
)]
#[post("/showcases/{id}/images")]
pub async fn upload_image(
    pool: web::Data<DbPool>,
    storage: web::Data<Storage>,
    config: web::Data<Config>,
    session: SessionUser,
    path: web::Path<Uuid>,
    payload: Multipart,
) -> AppResult<HttpResponse> {
    let showcase = owned_showcase(&pool, &session, path.into_inner()).await?;
    require_editable(&showcase)?;

    let existing = pool.showcase_images(showcase.id).await?;
    if existing.len() >= config.max_showcase_images {
        return Err(AppError::field(
            "image",
            format!(
                "A showcase can have at most {} images",
                config.max_showcase_images
            ),
        ));
    }

    let image = read_image_form(payload, config.max_image_size)
        .await?
        .image
        .ok_or_else(|| AppError::field("image", "The image field is required"))?;

    let image_id = Uuid::now_v7();
    let key = Storage::showcase_image_key(showcase.id, image_id, image.extension);
    storage
        .put(&key, image.data, Some(image.content_type))
        .await?;

    let record = pool
        .insert_showcase_image(showcase.id, image_id, key, image.content_type.to_string())
        .await?;
    Ok(HttpResponse::Created().json(ShowcaseImageResponse::from(record)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/showcases/{id}/images/{image_id}",
    tag = "showcases",
    params(
        ("id" = Uuid, Path, description = "Showcase ID"),
        ("image_id" = Uuid, Path, description = "Image ID")
    ),
    responses(
        (status = 204, description = "Image deleted"),
        (status = 404, description = "Image not found", body = crate::error::ErrorResponse)
    ),
    security(("session_cookie" = []))
)]
#[delete("/showcases/{id}/images/{image_id}")]
pub async fn delete_image(
    pool: web::Data<DbPool>,
    storage: web::Data<Storage>,
    session: SessionUser,
    path: web::Path<(Uuid, Uuid)>,
) -> AppResult<HttpResponse> {
    let (id, image_id) = path.into_inner();
    let showcase = owned_showcase(&pool, &session, id).await?;
    require_editable(&showcase)?;

    let image = pool.delete_showcase_image(&showcase, image_id).await?;
    if let Err(e) = storage.delete(&image.storage_key).await {
        warn!("Failed to delete showcase image {}: {}", image.storage_key, e);
    }
    Ok(HttpResponse::NoContent().finish())
}

#[utoipa::path(
    post,
    path = "/api/v1/showcases/{id}/images/reorder",
    tag = "showcases",
    params(("id" = Uuid, Path, description = "Showcase ID")),
    request_body = ReorderRequest,
    responses(
        (status = 204, description = "Images reordered"),
        (status = 422, description = "Not a permutation of the showcase's images", body = crate::error::ErrorResponse)
    ),
    security(("session_cookie" = []))
)]
#[post("/showcases/{id}/images/reorder")]
pub async fn reorder_images(
    pool: web::Data<DbPool>,
    session: SessionUser,
    path: web::Path<Uuid>,
    body: web::Json<ReorderRequest>,
) -> AppResult<HttpResponse> {
    let showcase = owned_showcase(&pool, &session, path.into_inner()).await?;
    require_editable(&showcase)?;
    pool.reorder_showcase_images(showcase.id, &body.ids).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Pick one of the showcase's images as thumbnail.
#[utoipa::path(
    put,
    path = "/api/v1/showcases/{id}/thumbnail",
    tag = "showcases",
    params(("id" = Uuid, Path, description = "Showcase ID")),
    request_body = ThumbnailSelection,
    responses(
        (status = 200, description = "Thumbnail selected", body = ShowcaseResponse),
        (status = 422, description = "Unknown image or invalid crops", body = crate::error::ErrorResponse)
    ),
    security(("session_cookie" = []))
)]
#[put("/showcases/{id}/thumbnail")]
pub async fn select_thumbnail(
    pool: web::Data<DbPool>,
    session: SessionUser,
    path: web::Path<Uuid>,
    body: web::Json<ThumbnailSelection>,
) -> AppResult<HttpResponse> {
    let showcase = owned_showcase(&pool, &session, path.into_inner()).await?;
    require_editable(&showcase)?;
    validate_crops(&body.crops)?;

    let images = pool.showcase_images(showcase.id).await?;
    if !images.iter().any(|i| i.id == body.image_id) {
        return Err(AppError::field(
            "image_id",
            "The image does not belong to this showcase",
        ));
    }

    let showcase = pool
        .set_showcase_thumbnail(showcase, Some(body.image_id), crops_to_json(&body.crops))
        .await?;
    Ok(HttpResponse::Ok().json(single_response(&pool, showcase).await?))
}

/// Send a draft or rejected showcase to the moderation queue.
#[utoipa::path(
    post,
    path = "/api/v1/showcases/{id}/submit",
    tag = "showcases",
    params(("id" = Uuid, Path, description = "Showcase ID")),
    responses(
        (status = 200, description = "Submitted for review", body = ShowcaseResponse),
        (status = 422, description = "Incomplete or wrong status", body = crate::error::ErrorResponse)
    ),
    security(("session_cookie" = []))
)]
#[post("/showcases/{id}/submit")]
pub async fn submit_showcase(
    pool: web::Data<DbPool>,
    session: SessionUser,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let showcase = owned_showcase(&pool, &session, path.into_inner()).await?;
    let status = status_of(&showcase)
        .apply(ShowcaseAction::Submit)
        .map_err(|msg| AppError::field("status", msg))?;

    let image_count = pool.showcase_images(showcase.id).await?.len();
    let errors = submission_errors(&showcase, image_count);
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let showcase = pool
        .apply_status_change(
            showcase,
            StatusChange {
                status,
                submitted_date: Some(Some(Utc::now())),
                moderated_by: None,
                rejection_reason: Some(None),
            },
        )
        .await?;
    info!("Showcase {} submitted for review", showcase.id);

    Ok(HttpResponse::Ok().json(single_response(&pool, showcase).await?))
}

/// Pull a pending or approved showcase back to draft.
#[utoipa::path(
    post,
    path = "/api/v1/showcases/{id}/withdraw",
    tag = "showcases",
    params(("id" = Uuid, Path, description = "Showcase ID")),
    responses(
        (status = 200, description = "Back in draft", body = ShowcaseResponse),
        (status = 422, description = "Wrong status", body = crate::error::ErrorResponse)
    ),
    security(("session_cookie" = []))
)]
#[post("/showcases/{id}/withdraw")]
pub async fn withdraw_showcase(
    pool: web::Data<DbPool>,
    session: SessionUser,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let showcase = owned_showcase(&pool, &session, path.into_inner()).await?;
    let status = status_of(&showcase)
        .apply(ShowcaseAction::Withdraw)
        .map_err(|msg| AppError::field("status", msg))?;

    let showcase = pool
        .apply_status_change(
            showcase,
            StatusChange {
                status,
                submitted_date: Some(None),
                moderated_by: Some(None),
                rejection_reason: None,
            },
        )
        .await?;

    Ok(HttpResponse::Ok().json(single_response(&pool, showcase).await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn showcase(tagline: Option<&str>, description: Option<&str>) -> showcase::Model {
        let now = Utc::now();
        showcase::Model {
            id: Uuid::now_v7(),
            user_id: Uuid::now_v7(),
            title: "Contract parser".to_string(),
            slug: "contract-parser".to_string(),
            tagline: tagline.map(str::to_string),
            description: description.map(str::to_string),
            project_url: None,
            repository_url: None,
            status: "draft".to_string(),
            submitted_date: None,
            moderated_at: None,
            moderated_by: None,
            rejection_reason: None,
            thumbnail_image_id: None,
            thumbnail_crops: None,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    #[test]
    fn test_complete_showcase_can_be_submitted() {
        let s = showcase(Some("Reads NDAs"), Some("A long description"));
        assert!(submission_errors(&s, 1).is_empty());
    }

    #[test]
    fn test_submission_lists_every_missing_field() {
        let s = showcase(Some("   "), None);
        let errors = submission_errors(&s, 0);
        let mut fields: Vec<&str> = errors.keys().map(String::as_str).collect();
        fields.sort();
        assert_eq!(fields, vec!["description", "images", "tagline"]);
    }

    #[test]
    fn test_unknown_status_reads_as_draft() {
        let mut s = showcase(None, None);
        s.status = "archived".to_string();
        assert_eq!(status_of(&s), ShowcaseStatus::Draft);
    }
}
