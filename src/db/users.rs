//! Database operations for users.

use chrono::Utc;
use sea_orm::*;
use uuid::Uuid;

use crate::entity::user;
use crate::error::{AppError, AppResult};
use crate::models::user::{LinkedInUserInfo, UpdateProfileRequest, User, UserRole};

/// Find or create a user by LinkedIn subject. Refreshes the profile on each
/// login and reports whether the account was just created.
pub async fn upsert_from_linkedin(
    db: &DatabaseConnection,
    info: &LinkedInUserInfo,
) -> AppResult<(User, bool)> {
    let existing = user::Entity::find()
        .filter(user::Column::LinkedinId.eq(info.sub.as_str()))
        .filter(user::Column::DeletedAt.is_null())
        .one(db)
        .await?;

    if let Some(m) = existing {
        let mut active: user::ActiveModel = m.into();
        active.name = Set(info.display_name());
        if info.picture.is_some() {
            active.avatar_url = Set(info.picture.clone());
        }
        if info.email.is_some() {
            active.email = Set(info.email.clone());
        }
        active.last_login_at = Set(Some(Utc::now()));
        let updated = active.update(db).await?;
        return Ok((updated.into(), false));
    }

    let now = Utc::now();
    let model = user::ActiveModel {
        id: Set(Uuid::now_v7()),
        linkedin_id: Set(Some(info.sub.clone())),
        name: Set(info.display_name()),
        email: Set(info.email.clone()),
        avatar_url: Set(info.picture.clone()),
        headline: Set(None),
        bio: Set(None),
        website_url: Set(None),
        role: Set(UserRole::Member.as_str().to_string()),
        last_login_at: Set(Some(now)),
        created_at: Set(now),
        updated_at: Set(now),
        deleted_at: Set(None),
    };

    let inserted = model.insert(db).await?;
    Ok((inserted.into(), true))
}

/// Find an active user by ID.
pub async fn find_by_id(db: &DatabaseConnection, id: Uuid) -> AppResult<Option<User>> {
    let result = user::Entity::find_by_id(id)
        .filter(user::Column::DeletedAt.is_null())
        .one(db)
        .await?;

    Ok(result.map(User::from))
}

pub async fn find_by_email(db: &DatabaseConnection, email: &str) -> AppResult<Option<User>> {
    let result = user::Entity::find()
        .filter(user::Column::Email.eq(email))
        .filter(user::Column::DeletedAt.is_null())
        .one(db)
        .await?;

    Ok(result.map(User::from))
}

/// Active users among `ids`, in no particular order.
pub async fn find_many(db: &DatabaseConnection, ids: &[Uuid]) -> AppResult<Vec<user::Model>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    Ok(user::Entity::find()
        .filter(user::Column::Id.is_in(ids.iter().copied()))
        .filter(user::Column::DeletedAt.is_null())
        .all(db)
        .await?)
}

/// Page through users, newest first. Returns the page and the total count.
pub async fn list(
    db: &DatabaseConnection,
    offset: u64,
    limit: u64,
) -> AppResult<(Vec<User>, u64)> {
    let query = user::Entity::find().filter(user::Column::DeletedAt.is_null());
    let total = query.clone().count(db).await?;
    let users = query
        .order_by_desc(user::Column::CreatedAt)
        .offset(offset)
        .limit(limit)
        .all(db)
        .await?;

    Ok((users.into_iter().map(User::from).collect(), total))
}

pub async fn set_role(db: &DatabaseConnection, id: Uuid, role: UserRole) -> AppResult<User> {
    let m = user::Entity::find_by_id(id)
        .filter(user::Column::DeletedAt.is_null())
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {}", id)))?;

    let mut active: user::ActiveModel = m.into();
    active.role = Set(role.as_str().to_string());
    Ok(active.update(db).await?.into())
}

pub async fn update_profile(
    db: &DatabaseConnection,
    id: Uuid,
    req: &UpdateProfileRequest,
) -> AppResult<User> {
    let m = user::Entity::find_by_id(id)
        .filter(user::Column::DeletedAt.is_null())
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {}", id)))?;

    let mut active: user::ActiveModel = m.into();
    active.name = Set(req.name.trim().to_string());
    active.headline = Set(trimmed(req.headline.as_deref()));
    active.bio = Set(trimmed(req.bio.as_deref()));
    active.website_url = Set(trimmed(req.website_url.as_deref()));
    Ok(active.update(db).await?.into())
}

/// Empty strings are stored as NULL.
pub(crate) fn trimmed(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}
