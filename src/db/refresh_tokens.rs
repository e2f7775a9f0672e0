//! Database operations for refresh tokens.

use chrono::Utc;
use sea_orm::*;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::entity::refresh_token;
use crate::error::AppResult;

/// Hash a refresh token using SHA-256.
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Generate a random refresh token string.
pub fn generate_token() -> String {
    let random_bytes: [u8; 32] = rand::random();
    format!("acad_rt_{}", hex::encode(random_bytes))
}

/// Insert a new refresh token (stores the hash, not the raw token).
pub async fn insert(
    db: &DatabaseConnection,
    user_id: Uuid,
    token_hash: &str,
    ttl_secs: u64,
) -> AppResult<()> {
    let now = Utc::now();
    let expires_at = now + chrono::Duration::seconds(ttl_secs as i64);

    let model = refresh_token::ActiveModel {
        id: Set(Uuid::now_v7()),
        user_id: Set(user_id),
        token_hash: Set(token_hash.to_string()),
        expires_at: Set(expires_at),
        revoked_at: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        deleted_at: Set(None),
    };

    refresh_token::Entity::insert(model).exec(db).await?;

    Ok(())
}

/// Find an active (non-revoked, non-expired) refresh token by its hash.
/// Returns the user_id if valid.
pub async fn find_valid_by_hash(
    db: &DatabaseConnection,
    token_hash: &str,
) -> AppResult<Option<Uuid>> {
    let result = refresh_token::Entity::find()
        .filter(refresh_token::Column::TokenHash.eq(token_hash))
        .filter(refresh_token::Column::RevokedAt.is_null())
        .filter(refresh_token::Column::DeletedAt.is_null())
        .filter(refresh_token::Column::ExpiresAt.gt(Utc::now()))
        .one(db)
        .await?;

    Ok(result.map(|m| m.user_id))
}

/// Revoke a refresh token by its hash.
pub async fn revoke_by_hash(db: &DatabaseConnection, token_hash: &str) -> AppResult<bool> {
    let result = refresh_token::Entity::update_many()
        .col_expr(
            refresh_token::Column::RevokedAt,
            sea_orm::prelude::Expr::value(Some(Utc::now())),
        )
        .filter(refresh_token::Column::TokenHash.eq(token_hash))
        .filter(refresh_token::Column::RevokedAt.is_null())
        .filter(refresh_token::Column::DeletedAt.is_null())
        .exec(db)
        .await?;

    Ok(result.rows_affected > 0)
}

/// Revoke every active token of a user. Role changes call this so the
/// new role is picked up at the next sign-in.
pub async fn revoke_all_for_user(db: &DatabaseConnection, user_id: Uuid) -> AppResult<u64> {
    let result = refresh_token::Entity::update_many()
        .col_expr(
            refresh_token::Column::RevokedAt,
            sea_orm::prelude::Expr::value(Some(Utc::now())),
        )
        .filter(refresh_token::Column::UserId.eq(user_id))
        .filter(refresh_token::Column::RevokedAt.is_null())
        .filter(refresh_token::Column::DeletedAt.is_null())
        .exec(db)
        .await?;

    Ok(result.rows_affected)
}

/// Soft-delete expired and revoked tokens older than the given age (cleanup job).
pub async fn cleanup_expired(db: &DatabaseConnection, older_than_secs: u64) -> AppResult<u64> {
    let now = Utc::now();
    let cutoff = now - chrono::Duration::seconds(older_than_secs as i64);

    let result = refresh_token::Entity::update_many()
        .filter(refresh_token::Column::DeletedAt.is_null())
        .filter(
            Condition::any()
                .add(refresh_token::Column::ExpiresAt.lt(cutoff))
                .add(refresh_token::Column::RevokedAt.lt(cutoff)),
        )
        .col_expr(
            refresh_token::Column::DeletedAt,
            sea_orm::prelude::Expr::value(Some(now)),
        )
        .exec(db)
        .await?;

    Ok(result.rows_affected)
}
