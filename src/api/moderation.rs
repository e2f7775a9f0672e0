//! Showcase moderation queue (moderator role).

use actix_web::{HttpResponse, get, post, web};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use super::showcases::showcase_responses;
use crate::auth::SessionUser;
use crate::db::DbPool;
use crate::db::showcases::StatusChange;
use crate::entity::showcase;
use crate::error::{AppError, AppResult};
use crate::models::{
    ModerationQuery, Pagination, PaginationParams, RejectRequest, ShowcaseAction,
    ShowcaseListResponse, ShowcaseResponse, ShowcaseStatus, UserRole,
};

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(moderation_queue)
        .service(approve_showcase)
        .service(reject_showcase);
}

async fn moderate(
    pool: &DbPool,
    session: &SessionUser,
    id: Uuid,
    action: ShowcaseAction,
    rejection_reason: Option<String>,
) -> AppResult<showcase::Model> {
    let showcase = pool.get_showcase(id).await?;
    let current = ShowcaseStatus::parse(&showcase.status).unwrap_or(ShowcaseStatus::Draft);
    let status = current
        .apply(action)
        .map_err(|msg| AppError::field("status", msg))?;

    let showcase = pool
        .apply_status_change(
            showcase,
            StatusChange {
                status,
                submitted_date: None,
                moderated_by: Some(Some(session.id)),
                rejection_reason: Some(rejection_reason),
            },
        )
        .await?;
    info!("Showcase {} {} by {}", showcase.id, status, session.id);
    Ok(showcase)
}

/// Showcases in one status, oldest submission first. Defaults to pending.
#[utoipa::path(
    get,
    path = "/api/v1/moderation/showcases",
    tag = "moderation",
    params(
        ("status" = Option<ShowcaseStatus>, Query, description = "Status filter (default pending)"),
        ("page" = Option<u32>, Query, description = "Page number"),
        ("limit" = Option<u32>, Query, description = "Page size (max 100)")
    ),
    responses(
        (status = 200, description = "Moderation queue", body = ShowcaseListResponse),
        (status = 403, description = "Moderator role required", body = crate::error::ErrorResponse)
    ),
    security(("session_cookie" = []))
)]
#[get("/moderation/showcases")]
pub async fn moderation_queue(
    pool: web::Data<DbPool>,
    session: SessionUser,
    query: web::Query<ModerationQuery>,
) -> AppResult<HttpResponse> {
    session.require(UserRole::Moderator)?;
    let paging = PaginationParams {
        page: query.page,
        limit: query.limit,
    };
    let status = query.status.unwrap_or(ShowcaseStatus::Pending);

    let (rows, total) = pool
        .list_showcases_by_status(status, None, paging.offset(), paging.clamped_limit() as u64)
        .await?;
    let showcases = showcase_responses(&pool, rows, |_| true).await?;

    Ok(HttpResponse::Ok().json(ShowcaseListResponse {
        showcases,
        pagination: Pagination::new(paging.page(), paging.clamped_limit(), total),
    }))
}

#[utoipa::path(
    post,
    path = "/api/v1/moderation/showcases/{id}/approve",
    tag = "moderation",
    params(("id" = Uuid, Path, description = "Showcase ID")),
    responses(
        (status = 200, description = "Showcase approved", body = ShowcaseResponse),
        (status = 422, description = "Showcase is not pending", body = crate::error::ErrorResponse)
    ),
    security(("session_cookie" = []))
)]
#[post("/moderation/showcases/{id}/approve")]
pub async fn approve_showcase(
    pool: web::Data<DbPool>,
    session: SessionUser,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    session.require(UserRole::Moderator)?;
    let showcase = moderate(&pool, &session, path.into_inner(), ShowcaseAction::Approve, None).await?;
    let response = showcase_responses(&pool, vec![showcase], |_| true).await?;
    Ok(HttpResponse::Ok().json(response.into_iter().next()))
}

/// Send a pending showcase back to its owner with a reason.
#[utoipa::path(
    post,
    path = "/api/v1/moderation/showcases/{id}/reject",
    tag = "moderation",
    params(("id" = Uuid, Path, description = "Showcase ID")),
    request_body = RejectRequest,
    responses(
        (status = 200, description = "Showcase rejected", body = ShowcaseResponse),
        (status = 422, description = "Missing reason or showcase is not pending", body = crate::error::ErrorResponse)
    ),
    security(("session_cookie" = []))
)]
#[post("/moderation/showcases/{id}/reject")]
pub async fn reject_showcase(
    pool: web::Data<DbPool>,
    session: SessionUser,
    path: web::Path<Uuid>,
    body: web::Json<RejectRequest>,
) -> AppResult<HttpResponse> {
    session.require(UserRole::Moderator)?;
    body.validate()?;
    let reason = body.into_inner().reason.trim().to_string();

    let showcase = moderate(
        &pool,
        &session,
        path.into_inner(),
        ShowcaseAction::Reject,
        Some(reason),
    )
    .await?;
    let response = showcase_responses(&pool, vec![showcase], |_| true).await?;
    Ok(HttpResponse::Ok().json(response.into_iter().next()))
}
