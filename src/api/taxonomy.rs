//! Tags and practice areas: public lists, admin create/delete.

use actix_web::{HttpResponse, delete, get, post, web};
use uuid::Uuid;
use validator::Validate;

use crate::auth::SessionUser;
use crate::db::DbPool;
use crate::error::AppResult;
use crate::models::{PracticeAreaResponse, TagResponse, TaxonomyRequest, UserRole};

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(list_tags)
        .service(create_tag)
        .service(delete_tag)
        .service(list_practice_areas)
        .service(create_practice_area)
        .service(delete_practice_area);
}

#[utoipa::path(
    get,
    path = "/api/v1/tags",
    tag = "taxonomy",
    responses((status = 200, description = "All tags by name", body = Vec<TagResponse>))
)]
#[get("/tags")]
pub async fn list_tags(pool: web::Data<DbPool>) -> AppResult<HttpResponse> {
    let tags: Vec<TagResponse> = pool
        .list_tags()
        .await?
        .into_iter()
        .map(TagResponse::from)
        .collect();
    Ok(HttpResponse::Ok().json(tags))
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/tags",
    tag = "admin",
    request_body = TaxonomyRequest,
    responses(
        (status = 201, description = "Tag created", body = TagResponse),
        (status = 422, description = "Name missing or taken", body = crate::error::ErrorResponse)
    ),
    security(("session_cookie" = []))
)]
#[post("/admin/tags")]
pub async fn create_tag(
    pool: web::Data<DbPool>,
    session: SessionUser,
    body: web::Json<TaxonomyRequest>,
) -> AppResult<HttpResponse> {
    session.require(UserRole::Admin)?;
    body.validate()?;
    let tag = pool.create_tag(&body.name).await?;
    Ok(HttpResponse::Created().json(TagResponse::from(tag)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/admin/tags/{id}",
    tag = "admin",
    params(("id" = Uuid, Path, description = "Tag ID")),
    responses(
        (status = 204, description = "Tag deleted"),
        (status = 404, description = "Tag not found", body = crate::error::ErrorResponse)
    ),
    security(("session_cookie" = []))
)]
#[delete("/admin/tags/{id}")]
pub async fn delete_tag(
    pool: web::Data<DbPool>,
    session: SessionUser,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    session.require(UserRole::Admin)?;
    pool.delete_tag(path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[utoipa::path(
    get,
    path = "/api/v1/practice-areas",
    tag = "taxonomy",
    responses((status = 200, description = "All practice areas by name", body = Vec<PracticeAreaResponse>))
)]
#[get("/practice-areas")]
pub async fn list_practice_areas(pool: web::Data<DbPool>) -> AppResult<HttpResponse> {
    let areas: Vec<PracticeAreaResponse> = pool
        .list_practice_areas()
        .await?
        .into_iter()
        .map(PracticeAreaResponse::from)
        .collect();
    Ok(HttpResponse::Ok().json(areas))
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/practice-areas",
    tag = "admin",
    request_body = TaxonomyRequest,
    responses(
        (status = 201, description = "Practice area created", body = PracticeAreaResponse),
        (status = 422, description = "Name missing or taken", body = crate::error::ErrorResponse)
    ),
    security(("session_cookie" = []))
)]
#[post("/admin/practice-areas")]
pub async fn create_practice_area(
    pool: web::Data<DbPool>,
    session: SessionUser,
    body: web::Json<TaxonomyRequest>,
) -> AppResult<HttpResponse> {
    session.require(UserRole::Admin)?;
    body.validate()?;
    let area = pool.create_practice_area(&body.name).await?;
    Ok(HttpResponse::Created().json(PracticeAreaResponse::from(area)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/admin/practice-areas/{id}",
    tag = "admin",
    params(("id" = Uuid, Path, description = "Practice area ID")),
    responses(
        (status = 204, description = "Practice area deleted"),
        (status = 404, description = "Practice area not found", body = crate::error::ErrorResponse)
    ),
    security(("session_cookie" = []))
)]
#[delete("/admin/practice-areas/{id}")]
pub async fn delete_practice_area(
    pool: web::Data<DbPool>,
    session: SessionUser,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    session.require(UserRole::Admin)?;
    pool.delete_practice_area(path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}
