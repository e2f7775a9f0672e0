//! User profiles and role administration.

use actix_web::{HttpResponse, get, put, web};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::auth::SessionUser;
use crate::db::{DbPool, refresh_tokens, users};
use crate::error::{AppError, AppResult};
use crate::models::{
    Pagination, PaginationParams, ProfileResponse, SetRoleRequest, UpdateProfileRequest,
    UserListResponse, UserResponse, UserRole,
};

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(update_profile)
        .service(get_user)
        .service(list_users)
        .service(set_role);
}

/// Update the signed-in user's profile.
#[utoipa::path(
    put,
    path = "/api/v1/users/me",
    tag = "users",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = ProfileResponse),
        (status = 401, description = "Not signed in", body = crate::error::ErrorResponse),
        (status = 422, description = "Validation failed", body = crate::error::ErrorResponse)
    ),
    security(("session_cookie" = []))
)]
#[put("/users/me")]
pub async fn update_profile(
    pool: web::Data<DbPool>,
    session: SessionUser,
    body: web::Json<UpdateProfileRequest>,
) -> AppResult<HttpResponse> {
    body.validate()?;
    let user = users::update_profile(pool.connection(), session.id, &body).await?;
    Ok(HttpResponse::Ok().json(ProfileResponse::from(user)))
}

/// Public profile card.
#[utoipa::path(
    get,
    path = "/api/v1/users/{id}",
    tag = "users",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "Public profile", body = UserResponse),
        (status = 404, description = "User not found", body = crate::error::ErrorResponse)
    )
)]
#[get("/users/{id}")]
pub async fn get_user(pool: web::Data<DbPool>, path: web::Path<Uuid>) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    let user = users::find_by_id(pool.connection(), id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {}", id)))?;
    Ok(HttpResponse::Ok().json(UserResponse::from(user)))
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/users",
    tag = "admin",
    params(
        ("page" = Option<u32>, Query, description = "Page number"),
        ("limit" = Option<u32>, Query, description = "Page size (max 100)")
    ),
    responses(
        (status = 200, description = "Users, newest first", body = UserListResponse),
        (status = 403, description = "Admin role required", body = crate::error::ErrorResponse)
    ),
    security(("session_cookie" = []))
)]
#[get("/admin/users")]
pub async fn list_users(
    pool: web::Data<DbPool>,
    session: SessionUser,
    query: web::Query<PaginationParams>,
) -> AppResult<HttpResponse> {
    session.require(UserRole::Admin)?;
    let limit = query.clamped_limit();
    let (rows, total) = users::list(pool.connection(), query.offset(), limit as u64).await?;

    Ok(HttpResponse::Ok().json(UserListResponse {
        users: rows.into_iter().map(ProfileResponse::from).collect(),
        pagination: Pagination::new(query.page(), limit, total),
    }))
}

/// Change a user's role. Their refresh tokens are revoked, so the new role
/// applies once the current access token expires.
#[utoipa::path(
    put,
    path = "/api/v1/admin/users/{id}/role",
    tag = "admin",
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = SetRoleRequest,
    responses(
        (status = 200, description = "Role updated", body = ProfileResponse),
        (status = 422, description = "Cannot change own role", body = crate::error::ErrorResponse)
    ),
    security(("session_cookie" = []))
)]
#[put("/admin/users/{id}/role")]
pub async fn set_role(
    pool: web::Data<DbPool>,
    session: SessionUser,
    path: web::Path<Uuid>,
    body: web::Json<SetRoleRequest>,
) -> AppResult<HttpResponse> {
    session.require(UserRole::Admin)?;
    let id = path.into_inner();
    if id == session.id {
        return Err(AppError::field("role", "You cannot change your own role"));
    }

    let user = users::set_role(pool.connection(), id, body.role).await?;
    let revoked = refresh_tokens::revoke_all_for_user(pool.connection(), user.id).await?;
    info!(
        "User {} is now {} (set by {}, {} sessions revoked)",
        user.id, user.role, session.id, revoked
    );
    Ok(HttpResponse::Ok().json(ProfileResponse::from(user)))
}
