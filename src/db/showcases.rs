//! Database queries for showcases and their images.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sea_orm::prelude::Expr;
use sea_orm::*;
use serde_json::Value as JsonValue;
use uuid::Uuid;

use super::users::trimmed;
use super::{DbPool, check_permutation};
use crate::entity::showcase::{self, ActiveModel, Entity as Showcase};
use crate::entity::{showcase_image, showcase_practice_area};
use crate::error::{AppError, AppResult};
use crate::models::{ShowcaseRequest, ShowcaseStatus};

/// Columns touched by a status transition.
#[derive(Debug)]
pub struct StatusChange {
    pub status: ShowcaseStatus,
    pub submitted_date: Option<Option<DateTime<Utc>>>,
    pub moderated_by: Option<Option<Uuid>>,
    pub rejection_reason: Option<Option<String>>,
}

impl DbPool {
    pub async fn find_showcase(&self, id: Uuid) -> AppResult<Option<showcase::Model>> {
        Ok(Showcase::find_by_id(id)
            .filter(showcase::Column::DeletedAt.is_null())
            .one(self.connection())
            .await?)
    }

    pub async fn get_showcase(&self, id: Uuid) -> AppResult<showcase::Model> {
        self.find_showcase(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Showcase {}", id)))
    }

    pub async fn find_showcase_by_slug(&self, slug: &str) -> AppResult<Option<showcase::Model>> {
        Ok(Showcase::find()
            .filter(showcase::Column::Slug.eq(slug))
            .filter(showcase::Column::DeletedAt.is_null())
            .one(self.connection())
            .await?)
    }

    pub async fn showcase_slugs_like(
        &self,
        base: &str,
        exclude: Option<Uuid>,
    ) -> AppResult<Vec<String>> {
        let mut query = Showcase::find()
            .select_only()
            .column(showcase::Column::Slug)
            .filter(showcase::Column::Slug.starts_with(base))
            .filter(showcase::Column::DeletedAt.is_null());
        if let Some(id) = exclude {
            query = query.filter(showcase::Column::Id.ne(id));
        }
        Ok(query.into_tuple::<String>().all(self.connection()).await?)
    }

    /// Page through showcases in one status, optionally within a practice
    /// area. Approved showcases list newest-moderated first, the moderation
    /// queue oldest-submitted first.
    pub async fn list_showcases_by_status(
        &self,
        status: ShowcaseStatus,
        practice_area_id: Option<Uuid>,
        offset: u64,
        limit: u64,
    ) -> AppResult<(Vec<showcase::Model>, u64)> {
        let mut query = Showcase::find()
            .filter(showcase::Column::Status.eq(status.as_str()))
            .filter(showcase::Column::DeletedAt.is_null());

        if let Some(area_id) = practice_area_id {
            let showcase_ids: Vec<Uuid> = showcase_practice_area::Entity::find()
                .select_only()
                .column(showcase_practice_area::Column::ShowcaseId)
                .filter(showcase_practice_area::Column::PracticeAreaId.eq(area_id))
                .into_tuple()
                .all(self.connection())
                .await?;
            query = query.filter(showcase::Column::Id.is_in(showcase_ids));
        }

        let total = query.clone().count(self.connection()).await?;
        let query = match status {
            ShowcaseStatus::Approved => query
                .order_by_desc(showcase::Column::ModeratedAt)
                .order_by_desc(showcase::Column::CreatedAt),
            _ => query
                .order_by_asc(showcase::Column::SubmittedDate)
                .order_by_asc(showcase::Column::CreatedAt),
        };
        let showcases = query
            .offset(offset)
            .limit(limit)
            .all(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to list showcases: {}", e)))?;

        Ok((showcases, total))
    }

    pub async fn list_user_showcases(&self, user_id: Uuid) -> AppResult<Vec<showcase::Model>> {
        Ok(Showcase::find()
            .filter(showcase::Column::UserId.eq(user_id))
            .filter(showcase::Column::DeletedAt.is_null())
            .order_by_desc(showcase::Column::CreatedAt)
            .all(self.connection())
            .await?)
    }

    pub async fn insert_showcase(
        &self,
        owner_id: Uuid,
        req: &ShowcaseRequest,
        slug: String,
    ) -> AppResult<showcase::Model> {
        let now = Utc::now();
        let model = ActiveModel {
            id: Set(Uuid::now_v7()),
            user_id: Set(owner_id),
            title: Set(req.title.trim().to_string()),
            slug: Set(slug),
            tagline: Set(trimmed(req.tagline.as_deref())),
            description: Set(trimmed(req.description.as_deref())),
            project_url: Set(trimmed(req.project_url.as_deref())),
            repository_url: Set(trimmed(req.repository_url.as_deref())),
            status: Set(ShowcaseStatus::Draft.as_str().to_string()),
            submitted_date: Set(None),
            moderated_at: Set(None),
            moderated_by: Set(None),
            rejection_reason: Set(None),
            thumbnail_image_id: Set(None),
            thumbnail_crops: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            deleted_at: Set(None),
        };

        let txn = self.connection().begin().await?;
        let inserted = model
            .insert(&txn)
            .await
            .map_err(|e| AppError::Database(format!("Failed to insert showcase: {}", e)))?;
        replace_practice_areas(&txn, inserted.id, &req.practice_area_ids).await?;
        txn.commit().await?;

        Ok(inserted)
    }

    pub async fn update_showcase(
        &self,
        existing: showcase::Model,
        req: &ShowcaseRequest,
        slug: String,
    ) -> AppResult<showcase::Model> {
        let id = existing.id;
        let mut active: ActiveModel = existing.into();
        active.title = Set(req.title.trim().to_string());
        active.slug = Set(slug);
        active.tagline = Set(trimmed(req.tagline.as_deref()));
        active.description = Set(trimmed(req.description.as_deref()));
        active.project_url = Set(trimmed(req.project_url.as_deref()));
        active.repository_url = Set(trimmed(req.repository_url.as_deref()));

        let txn = self.connection().begin().await?;
        let updated = active.update(&txn).await?;
        replace_practice_areas(&txn, id, &req.practice_area_ids).await?;
        txn.commit().await?;

        Ok(updated)
    }

    pub async fn soft_delete_showcase(&self, id: Uuid) -> AppResult<()> {
        let result = Showcase::update_many()
            .col_expr(showcase::Column::DeletedAt, Expr::value(Some(Utc::now())))
            .filter(showcase::Column::Id.eq(id))
            .filter(showcase::Column::DeletedAt.is_null())
            .exec(self.connection())
            .await?;
        if result.rows_affected == 0 {
            return Err(AppError::NotFound(format!("Showcase {}", id)));
        }
        Ok(())
    }

    pub async fn apply_status_change(
        &self,
        existing: showcase::Model,
        change: StatusChange,
    ) -> AppResult<showcase::Model> {
        let mut active: ActiveModel = existing.into();
        active.status = Set(change.status.as_str().to_string());
        if let Some(submitted) = change.submitted_date {
            active.submitted_date = Set(submitted);
        }
        if let Some(moderator) = change.moderated_by {
            active.moderated_by = Set(moderator);
            active.moderated_at = Set(moderator.map(|_| Utc::now()));
        }
        if let Some(reason) = change.rejection_reason {
            active.rejection_reason = Set(reason);
        }
        Ok(active.update(self.connection()).await?)
    }

    pub async fn set_showcase_thumbnail(
        &self,
        existing: showcase::Model,
        image_id: Option<Uuid>,
        crops: Option<JsonValue>,
    ) -> AppResult<showcase::Model> {
        let mut active: ActiveModel = existing.into();
        active.thumbnail_image_id = Set(image_id);
        active.thumbnail_crops = Set(crops);
        Ok(active.update(self.connection()).await?)
    }

    pub async fn showcase_images(&self, showcase_id: Uuid) -> AppResult<Vec<showcase_image::Model>> {
        Ok(showcase_image::Entity::find()
            .filter(showcase_image::Column::ShowcaseId.eq(showcase_id))
            .order_by_asc(showcase_image::Column::SortOrder)
            .all(self.connection())
            .await?)
    }

    pub async fn images_for_showcases(
        &self,
        showcase_ids: &[Uuid],
    ) -> AppResult<HashMap<Uuid, Vec<showcase_image::Model>>> {
        if showcase_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let images = showcase_image::Entity::find()
            .filter(showcase_image::Column::ShowcaseId.is_in(showcase_ids.iter().copied()))
            .order_by_asc(showcase_image::Column::SortOrder)
            .all(self.connection())
            .await?;

        let mut grouped: HashMap<Uuid, Vec<showcase_image::Model>> = HashMap::new();
        for image in images {
            grouped.entry(image.showcase_id).or_default().push(image);
        }
        Ok(grouped)
    }

    pub async fn insert_showcase_image(
        &self,
        showcase_id: Uuid,
        image_id: Uuid,
        storage_key: String,
        content_type: String,
    ) -> AppResult<showcase_image::Model> {
        let last = showcase_image::Entity::find()
            .filter(showcase_image::Column::ShowcaseId.eq(showcase_id))
            .order_by_desc(showcase_image::Column::SortOrder)
            .one(self.connection())
            .await?;
        let now = Utc::now();

        Ok(showcase_image::ActiveModel {
            id: Set(image_id),
            showcase_id: Set(showcase_id),
            storage_key: Set(storage_key),
            content_type: Set(content_type),
            sort_order: Set(last.map_or(1, |i| i.sort_order + 1)),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(self.connection())
        .await?)
    }

    /// Delete an image row; clears the thumbnail if it pointed at it.
    pub async fn delete_showcase_image(
        &self,
        showcase: &showcase::Model,
        image_id: Uuid,
    ) -> AppResult<showcase_image::Model> {
        let image = showcase_image::Entity::find_by_id(image_id)
            .filter(showcase_image::Column::ShowcaseId.eq(showcase.id))
            .one(self.connection())
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Image {}", image_id)))?;

        let txn = self.connection().begin().await?;
        showcase_image::Entity::delete_by_id(image_id)
            .exec(&txn)
            .await?;
        if showcase.thumbnail_image_id == Some(image_id) {
            Showcase::update_many()
                .col_expr(showcase::Column::ThumbnailImageId, Expr::value(None::<Uuid>))
                .col_expr(
                    showcase::Column::ThumbnailCrops,
                    Expr::value(None::<JsonValue>),
                )
                .filter(showcase::Column::Id.eq(showcase.id))
                .exec(&txn)
                .await?;
        }
        txn.commit().await?;

        Ok(image)
    }

    pub async fn reorder_showcase_images(&self, showcase_id: Uuid, ids: &[Uuid]) -> AppResult<()> {
        let existing: Vec<Uuid> = showcase_image::Entity::find()
            .select_only()
            .column(showcase_image::Column::Id)
            .filter(showcase_image::Column::ShowcaseId.eq(showcase_id))
            .into_tuple()
            .all(self.connection())
            .await?;
        check_permutation(&existing, ids)?;

        let txn = self.connection().begin().await?;
        for (index, id) in ids.iter().enumerate() {
            showcase_image::Entity::update_many()
                .col_expr(showcase_image::Column::SortOrder, Expr::value(index as i32 + 1))
                .filter(showcase_image::Column::Id.eq(*id))
                .exec(&txn)
                .await?;
        }
        txn.commit().await?;
        Ok(())
    }
}

async fn replace_practice_areas<C: ConnectionTrait>(
    conn: &C,
    showcase_id: Uuid,
    area_ids: &[Uuid],
) -> AppResult<()> {
    showcase_practice_area::Entity::delete_many()
        .filter(showcase_practice_area::Column::ShowcaseId.eq(showcase_id))
        .exec(conn)
        .await?;

    let mut seen = Vec::with_capacity(area_ids.len());
    for area_id in area_ids {
        if seen.contains(area_id) {
            continue;
        }
        seen.push(*area_id);
        showcase_practice_area::ActiveModel {
            showcase_id: Set(showcase_id),
            practice_area_id: Set(*area_id),
        }
        .insert(conn)
        .await?;
    }
    Ok(())
}
