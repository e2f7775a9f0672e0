//! API endpoint modules.

pub mod admin_courses;
pub mod admin_lessons;
pub mod courses;
pub mod files;
pub mod health;
pub mod lessons;
pub mod moderation;
pub mod openapi;
pub mod progress;
pub mod showcases;
pub mod taxonomy;
pub mod users;

pub use health::configure_health_routes;
pub use openapi::ApiDoc;

use actix_web::web;
use tracing::warn;

use crate::entity::tag;
use crate::error::{AppError, AppResult};
use crate::models::TagResponse;
use crate::models::crop::crops_to_json;
use crate::services::Storage;
use crate::services::upload::ImageForm;

/// Every `/api/v1` route.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.configure(configure_health_routes)
        .configure(files::configure_routes)
        .configure(crate::services::configure_auth_routes)
        .configure(users::configure_routes)
        .configure(taxonomy::configure_routes)
        .configure(admin_courses::configure_routes)
        .configure(admin_lessons::configure_routes)
        .configure(progress::configure_routes)
        .configure(lessons::configure_routes)
        .configure(courses::configure_routes)
        .configure(moderation::configure_routes)
        .configure(showcases::configure_routes);
}

pub(crate) fn tag_responses(tags: Option<Vec<tag::Model>>) -> Vec<TagResponse> {
    tags.unwrap_or_default()
        .into_iter()
        .map(TagResponse::from)
        .collect()
}

/// Store a new thumbnail (or keep the current one for a crop-only update).
///
/// Returns the key and the crops to persist. The replaced object is removed
/// on a best-effort basis.
pub(crate) async fn store_thumbnail(
    storage: &Storage,
    current_key: Option<&str>,
    form: ImageForm,
    new_key: impl FnOnce(&str) -> String,
) -> AppResult<(String, Option<serde_json::Value>)> {
    let crops = crops_to_json(&form.crops);

    let Some(image) = form.image else {
        return match current_key {
            Some(key) => Ok((key.to_string(), crops)),
            None => Err(AppError::field("image", "The image field is required")),
        };
    };

    let key = new_key(image.extension);
    storage
        .put(&key, image.data, Some(image.content_type))
        .await?;

    if let Some(old) = current_key.filter(|old| *old != key)
        && let Err(e) = storage.delete(old).await
    {
        warn!("Failed to delete replaced thumbnail {}: {}", old, e);
    }

    Ok((key, crops))
}
