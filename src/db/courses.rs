//! Database queries for courses.

use chrono::{DateTime, Utc};
use sea_orm::prelude::Expr;
use sea_orm::*;
use serde_json::Value as JsonValue;
use uuid::Uuid;

use super::users::trimmed;
use super::{DbPool, check_permutation};
use crate::entity::course::{self, ActiveModel, Entity as Course};
use crate::entity::course_tag;
use crate::error::{AppError, AppResult};
use crate::models::CourseRequest;

impl DbPool {
    /// Courses ordered by `sort_order`. Learners only see previews and
    /// published courses.
    pub async fn list_courses(&self, include_hidden: bool) -> AppResult<Vec<course::Model>> {
        let mut query = Course::find().filter(course::Column::DeletedAt.is_null());
        if !include_hidden {
            query = query.filter(
                Condition::any()
                    .add(course::Column::IsVisible.eq(true))
                    .add(course::Column::PublishDate.lte(Utc::now())),
            );
        }

        let courses = query
            .order_by_asc(course::Column::SortOrder)
            .order_by_asc(course::Column::CreatedAt)
            .all(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to list courses: {}", e)))?;

        Ok(courses)
    }

    pub async fn find_course(&self, id: Uuid) -> AppResult<Option<course::Model>> {
        Ok(Course::find_by_id(id)
            .filter(course::Column::DeletedAt.is_null())
            .one(self.connection())
            .await?)
    }

    pub async fn get_course(&self, id: Uuid) -> AppResult<course::Model> {
        self.find_course(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Course {}", id)))
    }

    pub async fn find_course_by_slug(&self, slug: &str) -> AppResult<Option<course::Model>> {
        Ok(Course::find()
            .filter(course::Column::Slug.eq(slug))
            .filter(course::Column::DeletedAt.is_null())
            .one(self.connection())
            .await?)
    }

    /// Active course slugs starting with `base`, excluding one course.
    pub async fn course_slugs_like(
        &self,
        base: &str,
        exclude: Option<Uuid>,
    ) -> AppResult<Vec<String>> {
        let mut query = Course::find()
            .select_only()
            .column(course::Column::Slug)
            .filter(course::Column::Slug.starts_with(base))
            .filter(course::Column::DeletedAt.is_null());
        if let Some(id) = exclude {
            query = query.filter(course::Column::Id.ne(id));
        }
        Ok(query.into_tuple::<String>().all(self.connection()).await?)
    }

    async fn next_course_sort_order(&self) -> AppResult<i32> {
        let last = Course::find()
            .filter(course::Column::DeletedAt.is_null())
            .order_by_desc(course::Column::SortOrder)
            .one(self.connection())
            .await?;
        Ok(last.map_or(1, |c| c.sort_order + 1))
    }

    pub async fn insert_course(
        &self,
        owner_id: Uuid,
        req: &CourseRequest,
        slug: String,
    ) -> AppResult<course::Model> {
        let now = Utc::now();
        let sort_order = self.next_course_sort_order().await?;

        let model = ActiveModel {
            id: Set(Uuid::now_v7()),
            user_id: Set(owner_id),
            title: Set(req.title.trim().to_string()),
            slug: Set(slug),
            tagline: Set(trimmed(req.tagline.as_deref())),
            description: Set(trimmed(req.description.as_deref())),
            learning_objectives: Set(trimmed(req.learning_objectives.as_deref())),
            experience_level: Set(req.experience_level.as_str().to_string()),
            is_visible: Set(false),
            publish_date: Set(None),
            thumbnail_key: Set(None),
            thumbnail_crops: Set(None),
            sort_order: Set(sort_order),
            created_at: Set(now),
            updated_at: Set(now),
            deleted_at: Set(None),
        };

        let txn = self.connection().begin().await?;
        let inserted = model
            .insert(&txn)
            .await
            .map_err(|e| AppError::Database(format!("Failed to insert course: {}", e)))?;
        replace_course_tags(&txn, inserted.id, &req.tag_ids).await?;
        txn.commit().await?;

        Ok(inserted)
    }

    pub async fn update_course(
        &self,
        existing: course::Model,
        req: &CourseRequest,
        slug: String,
    ) -> AppResult<course::Model> {
        let id = existing.id;
        let mut active: ActiveModel = existing.into();
        active.title = Set(req.title.trim().to_string());
        active.slug = Set(slug);
        active.tagline = Set(trimmed(req.tagline.as_deref()));
        active.description = Set(trimmed(req.description.as_deref()));
        active.learning_objectives = Set(trimmed(req.learning_objectives.as_deref()));
        active.experience_level = Set(req.experience_level.as_str().to_string());

        let txn = self.connection().begin().await?;
        let updated = active
            .update(&txn)
            .await
            .map_err(|e| AppError::Database(format!("Failed to update course: {}", e)))?;
        replace_course_tags(&txn, id, &req.tag_ids).await?;
        txn.commit().await?;

        Ok(updated)
    }

    pub async fn soft_delete_course(&self, id: Uuid) -> AppResult<()> {
        let result = Course::update_many()
            .col_expr(course::Column::DeletedAt, Expr::value(Some(Utc::now())))
            .filter(course::Column::Id.eq(id))
            .filter(course::Column::DeletedAt.is_null())
            .exec(self.connection())
            .await?;
        if result.rows_affected == 0 {
            return Err(AppError::NotFound(format!("Course {}", id)));
        }
        Ok(())
    }

    pub async fn set_course_publish_date(
        &self,
        existing: course::Model,
        publish_date: Option<DateTime<Utc>>,
    ) -> AppResult<course::Model> {
        let mut active: ActiveModel = existing.into();
        active.publish_date = Set(publish_date);
        Ok(active.update(self.connection()).await?)
    }

    pub async fn set_course_visibility(
        &self,
        existing: course::Model,
        is_visible: bool,
    ) -> AppResult<course::Model> {
        let mut active: ActiveModel = existing.into();
        active.is_visible = Set(is_visible);
        Ok(active.update(self.connection()).await?)
    }

    pub async fn set_course_thumbnail(
        &self,
        existing: course::Model,
        key: String,
        crops: Option<JsonValue>,
    ) -> AppResult<course::Model> {
        let mut active: ActiveModel = existing.into();
        active.thumbnail_key = Set(Some(key));
        active.thumbnail_crops = Set(crops);
        Ok(active.update(self.connection()).await?)
    }

    /// Renumber courses `1..n` in the requested order.
    pub async fn reorder_courses(&self, ids: &[Uuid]) -> AppResult<()> {
        let existing: Vec<Uuid> = Course::find()
            .select_only()
            .column(course::Column::Id)
            .filter(course::Column::DeletedAt.is_null())
            .into_tuple()
            .all(self.connection())
            .await?;
        check_permutation(&existing, ids)?;

        let txn = self.connection().begin().await?;
        for (index, id) in ids.iter().enumerate() {
            Course::update_many()
                .col_expr(course::Column::SortOrder, Expr::value(index as i32 + 1))
                .filter(course::Column::Id.eq(*id))
                .exec(&txn)
                .await?;
        }
        txn.commit().await?;
        Ok(())
    }
}

async fn replace_course_tags<C: ConnectionTrait>(
    conn: &C,
    course_id: Uuid,
    tag_ids: &[Uuid],
) -> AppResult<()> {
    course_tag::Entity::delete_many()
        .filter(course_tag::Column::CourseId.eq(course_id))
        .exec(conn)
        .await?;

    let mut seen = Vec::with_capacity(tag_ids.len());
    for tag_id in tag_ids {
        if seen.contains(tag_id) {
            continue;
        }
        seen.push(*tag_id);
        course_tag::ActiveModel {
            course_id: Set(course_id),
            tag_id: Set(*tag_id),
        }
        .insert(conn)
        .await?;
    }
    Ok(())
}
