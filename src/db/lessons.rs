//! Database queries for lessons, their pivots and transcripts.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sea_orm::prelude::Expr;
use sea_orm::*;
use serde_json::Value as JsonValue;
use uuid::Uuid;

use super::users::trimmed;
use super::{DbPool, check_permutation};
use crate::entity::lesson::{self, ActiveModel, Entity as Lesson};
use crate::entity::{lesson_instructor, lesson_tag, transcript_line, user};
use crate::error::{AppError, AppResult};
use crate::models::LessonRequest;
use crate::services::video_host::TranscriptCue;

/// Data written by a successful video sync.
#[derive(Debug)]
pub struct VideoSyncUpdate {
    pub playback_id: String,
    pub duration_seconds: Option<i32>,
    /// New generated thumbnail, if one was fetched.
    pub thumbnail_key: Option<String>,
    pub cues: Vec<TranscriptCue>,
}

impl DbPool {
    /// Lessons of a course in `sort_order`. Learners only see previews and
    /// published lessons.
    pub async fn list_lessons(
        &self,
        course_id: Uuid,
        include_hidden: bool,
    ) -> AppResult<Vec<lesson::Model>> {
        let mut query = Lesson::find()
            .filter(lesson::Column::CourseId.eq(course_id))
            .filter(lesson::Column::DeletedAt.is_null());
        if !include_hidden {
            query = query.filter(
                Condition::any()
                    .add(lesson::Column::IsVisible.eq(true))
                    .add(lesson::Column::PublishDate.lte(Utc::now())),
            );
        }

        Ok(query
            .order_by_asc(lesson::Column::SortOrder)
            .order_by_asc(lesson::Column::CreatedAt)
            .all(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to list lessons: {}", e)))?)
    }

    /// Learner-listed lessons (preview or published) for many courses.
    pub async fn listed_lessons_for_courses(
        &self,
        course_ids: &[Uuid],
    ) -> AppResult<HashMap<Uuid, Vec<lesson::Model>>> {
        if course_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let lessons = Lesson::find()
            .filter(lesson::Column::CourseId.is_in(course_ids.iter().copied()))
            .filter(lesson::Column::DeletedAt.is_null())
            .filter(
                Condition::any()
                    .add(lesson::Column::IsVisible.eq(true))
                    .add(lesson::Column::PublishDate.lte(Utc::now())),
            )
            .order_by_asc(lesson::Column::SortOrder)
            .all(self.connection())
            .await?;

        let mut grouped: HashMap<Uuid, Vec<lesson::Model>> = HashMap::new();
        for l in lessons {
            grouped.entry(l.course_id).or_default().push(l);
        }
        Ok(grouped)
    }

    /// Ids of the published lessons of a course.
    pub async fn published_lesson_ids(&self, course_id: Uuid) -> AppResult<Vec<Uuid>> {
        Ok(Lesson::find()
            .select_only()
            .column(lesson::Column::Id)
            .filter(lesson::Column::CourseId.eq(course_id))
            .filter(lesson::Column::DeletedAt.is_null())
            .filter(lesson::Column::PublishDate.lte(Utc::now()))
            .into_tuple()
            .all(self.connection())
            .await?)
    }

    /// Publish dates of every active lesson of a course.
    pub async fn lesson_publish_dates(
        &self,
        course_id: Uuid,
    ) -> AppResult<Vec<Option<DateTime<Utc>>>> {
        Ok(Lesson::find()
            .select_only()
            .column(lesson::Column::PublishDate)
            .filter(lesson::Column::CourseId.eq(course_id))
            .filter(lesson::Column::DeletedAt.is_null())
            .into_tuple()
            .all(self.connection())
            .await?)
    }

    pub async fn find_lesson(&self, id: Uuid) -> AppResult<Option<lesson::Model>> {
        Ok(Lesson::find_by_id(id)
            .filter(lesson::Column::DeletedAt.is_null())
            .one(self.connection())
            .await?)
    }

    pub async fn get_lesson(&self, id: Uuid) -> AppResult<lesson::Model> {
        self.find_lesson(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Lesson {}", id)))
    }

    pub async fn find_lesson_by_slug(
        &self,
        course_id: Uuid,
        slug: &str,
    ) -> AppResult<Option<lesson::Model>> {
        Ok(Lesson::find()
            .filter(lesson::Column::CourseId.eq(course_id))
            .filter(lesson::Column::Slug.eq(slug))
            .filter(lesson::Column::DeletedAt.is_null())
            .one(self.connection())
            .await?)
    }

    pub async fn lesson_slugs_like(
        &self,
        course_id: Uuid,
        base: &str,
        exclude: Option<Uuid>,
    ) -> AppResult<Vec<String>> {
        let mut query = Lesson::find()
            .select_only()
            .column(lesson::Column::Slug)
            .filter(lesson::Column::CourseId.eq(course_id))
            .filter(lesson::Column::Slug.starts_with(base))
            .filter(lesson::Column::DeletedAt.is_null());
        if let Some(id) = exclude {
            query = query.filter(lesson::Column::Id.ne(id));
        }
        Ok(query.into_tuple::<String>().all(self.connection()).await?)
    }

    async fn next_lesson_sort_order(&self, course_id: Uuid) -> AppResult<i32> {
        let last = Lesson::find()
            .filter(lesson::Column::CourseId.eq(course_id))
            .filter(lesson::Column::DeletedAt.is_null())
            .order_by_desc(lesson::Column::SortOrder)
            .one(self.connection())
            .await?;
        Ok(last.map_or(1, |l| l.sort_order + 1))
    }

    pub async fn insert_lesson(
        &self,
        course_id: Uuid,
        req: &LessonRequest,
        slug: String,
    ) -> AppResult<lesson::Model> {
        let now = Utc::now();
        let sort_order = self.next_lesson_sort_order(course_id).await?;

        let model = ActiveModel {
            id: Set(Uuid::now_v7()),
            course_id: Set(course_id),
            title: Set(req.title.trim().to_string()),
            slug: Set(slug),
            tagline: Set(trimmed(req.tagline.as_deref())),
            description: Set(trimmed(req.description.as_deref())),
            marketing_copy: Set(trimmed(req.copy.as_deref())),
            is_gated: Set(req.is_gated),
            is_visible: Set(false),
            publish_date: Set(None),
            video_host: Set(req.video_host.as_str().to_string()),
            asset_id: Set(trimmed(req.asset_id.as_deref())),
            playback_id: Set(None),
            duration_seconds: Set(None),
            video_synced_at: Set(None),
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
            .map_err(|e| AppError::Database(format!("Failed to insert lesson: {}", e)))?;
        replace_lesson_pivots(&txn, inserted.id, &req.tag_ids, &req.instructor_ids).await?;
        txn.commit().await?;

        Ok(inserted)
    }

    /// Update editable fields. Changing the asset invalidates synced video data.
    pub async fn update_lesson(
        &self,
        existing: lesson::Model,
        req: &LessonRequest,
        slug: String,
    ) -> AppResult<lesson::Model> {
        let id = existing.id;
        let new_asset = trimmed(req.asset_id.as_deref());
        let asset_changed = new_asset != existing.asset_id;

        let mut active: ActiveModel = existing.into();
        active.title = Set(req.title.trim().to_string());
        active.slug = Set(slug);
        active.tagline = Set(trimmed(req.tagline.as_deref()));
        active.description = Set(trimmed(req.description.as_deref()));
        active.marketing_copy = Set(trimmed(req.copy.as_deref()));
        active.is_gated = Set(req.is_gated);
        active.video_host = Set(req.video_host.as_str().to_string());
        active.asset_id = Set(new_asset);
        if asset_changed {
            active.playback_id = Set(None);
            active.duration_seconds = Set(None);
            active.video_synced_at = Set(None);
        }

        let txn = self.connection().begin().await?;
        let updated = active
            .update(&txn)
            .await
            .map_err(|e| AppError::Database(format!("Failed to update lesson: {}", e)))?;
        replace_lesson_pivots(&txn, id, &req.tag_ids, &req.instructor_ids).await?;
        if asset_changed {
            transcript_line::Entity::delete_many()
                .filter(transcript_line::Column::LessonId.eq(id))
                .exec(&txn)
                .await?;
        }
        txn.commit().await?;

        Ok(updated)
    }

    pub async fn soft_delete_lesson(&self, id: Uuid) -> AppResult<()> {
        let result = Lesson::update_many()
            .col_expr(lesson::Column::DeletedAt, Expr::value(Some(Utc::now())))
            .filter(lesson::Column::Id.eq(id))
            .filter(lesson::Column::DeletedAt.is_null())
            .exec(self.connection())
            .await?;
        if result.rows_affected == 0 {
            return Err(AppError::NotFound(format!("Lesson {}", id)));
        }
        Ok(())
    }

    pub async fn set_lesson_publish_date(
        &self,
        existing: lesson::Model,
        publish_date: Option<DateTime<Utc>>,
    ) -> AppResult<lesson::Model> {
        let mut active: ActiveModel = existing.into();
        active.publish_date = Set(publish_date);
        Ok(active.update(self.connection()).await?)
    }

    pub async fn set_lesson_visibility(
        &self,
        existing: lesson::Model,
        is_visible: bool,
    ) -> AppResult<lesson::Model> {
        let mut active: ActiveModel = existing.into();
        active.is_visible = Set(is_visible);
        Ok(active.update(self.connection()).await?)
    }

    pub async fn set_lesson_thumbnail(
        &self,
        existing: lesson::Model,
        key: String,
        crops: Option<JsonValue>,
    ) -> AppResult<lesson::Model> {
        let mut active: ActiveModel = existing.into();
        active.thumbnail_key = Set(Some(key));
        active.thumbnail_crops = Set(crops);
        Ok(active.update(self.connection()).await?)
    }

    /// Renumber a course's lessons `1..n` in the requested order.
    pub async fn reorder_lessons(&self, course_id: Uuid, ids: &[Uuid]) -> AppResult<()> {
        let existing: Vec<Uuid> = Lesson::find()
            .select_only()
            .column(lesson::Column::Id)
            .filter(lesson::Column::CourseId.eq(course_id))
            .filter(lesson::Column::DeletedAt.is_null())
            .into_tuple()
            .all(self.connection())
            .await?;
        check_permutation(&existing, ids)?;

        let txn = self.connection().begin().await?;
        for (index, id) in ids.iter().enumerate() {
            Lesson::update_many()
                .col_expr(lesson::Column::SortOrder, Expr::value(index as i32 + 1))
                .filter(lesson::Column::Id.eq(*id))
                .exec(&txn)
                .await?;
        }
        txn.commit().await?;
        Ok(())
    }

    pub async fn transcript(&self, lesson_id: Uuid) -> AppResult<Vec<transcript_line::Model>> {
        Ok(transcript_line::Entity::find()
            .filter(transcript_line::Column::LessonId.eq(lesson_id))
            .order_by_asc(transcript_line::Column::Position)
            .all(self.connection())
            .await?)
    }

    pub async fn transcript_line_count(&self, lesson_id: Uuid) -> AppResult<u64> {
        Ok(transcript_line::Entity::find()
            .filter(transcript_line::Column::LessonId.eq(lesson_id))
            .count(self.connection())
            .await?)
    }

    /// Persist video metadata and swap the transcript atomically.
    pub async fn store_video_sync(
        &self,
        lesson_id: Uuid,
        update: VideoSyncUpdate,
    ) -> AppResult<lesson::Model> {
        let txn = self.connection().begin().await?;

        let existing = Lesson::find_by_id(lesson_id)
            .filter(lesson::Column::DeletedAt.is_null())
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Lesson {}", lesson_id)))?;

        let now = Utc::now();
        let mut active: ActiveModel = existing.into();
        active.playback_id = Set(Some(update.playback_id));
        active.duration_seconds = Set(update.duration_seconds);
        active.video_synced_at = Set(Some(now));
        if let Some(key) = update.thumbnail_key {
            active.thumbnail_key = Set(Some(key));
        }
        let updated = active.update(&txn).await?;

        transcript_line::Entity::delete_many()
            .filter(transcript_line::Column::LessonId.eq(lesson_id))
            .exec(&txn)
            .await?;

        let rows: Vec<transcript_line::ActiveModel> = update
            .cues
            .into_iter()
            .enumerate()
            .map(|(position, cue)| transcript_line::ActiveModel {
                id: Set(Uuid::now_v7()),
                lesson_id: Set(lesson_id),
                position: Set(position as i32 + 1),
                start_ms: Set(cue.start_ms),
                end_ms: Set(cue.end_ms),
                body: Set(cue.text),
                created_at: Set(now),
                updated_at: Set(now),
            })
            .collect();
        // Chunked to stay under the bind-parameter limit on long videos
        for chunk in rows.chunks(500) {
            transcript_line::Entity::insert_many(chunk.to_vec())
                .exec_without_returning(&txn)
                .await?;
        }

        txn.commit().await?;
        Ok(updated)
    }

    pub async fn lesson_instructors(&self, lesson_id: Uuid) -> AppResult<Vec<user::Model>> {
        Ok(self
            .instructors_for_lessons(&[lesson_id])
            .await?
            .remove(&lesson_id)
            .unwrap_or_default())
    }

    /// Instructors for each lesson, sorted by name.
    pub async fn instructors_for_lessons(
        &self,
        lesson_ids: &[Uuid],
    ) -> AppResult<HashMap<Uuid, Vec<user::Model>>> {
        if lesson_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let pivots = lesson_instructor::Entity::find()
            .filter(lesson_instructor::Column::LessonId.is_in(lesson_ids.iter().copied()))
            .all(self.connection())
            .await?;
        if pivots.is_empty() {
            return Ok(HashMap::new());
        }
        let user_ids: Vec<Uuid> = pivots.iter().map(|p| p.user_id).collect();
        let users: HashMap<Uuid, user::Model> = super::users::find_many(self.connection(), &user_ids)
            .await?
            .into_iter()
            .map(|u| (u.id, u))
            .collect();

        let mut grouped: HashMap<Uuid, Vec<user::Model>> = HashMap::new();
        for p in pivots {
            if let Some(u) = users.get(&p.user_id) {
                grouped.entry(p.lesson_id).or_default().push(u.clone());
            }
        }
        for list in grouped.values_mut() {
            list.sort_by(|a, b| a.name.cmp(&b.name));
        }
        Ok(grouped)
    }
}

async fn replace_lesson_pivots<C: ConnectionTrait>(
    conn: &C,
    lesson_id: Uuid,
    tag_ids: &[Uuid],
    instructor_ids: &[Uuid],
) -> AppResult<()> {
    lesson_tag::Entity::delete_many()
        .filter(lesson_tag::Column::LessonId.eq(lesson_id))
        .exec(conn)
        .await?;
    lesson_instructor::Entity::delete_many()
        .filter(lesson_instructor::Column::LessonId.eq(lesson_id))
        .exec(conn)
        .await?;

    let mut seen = Vec::new();
    for tag_id in tag_ids {
        if seen.contains(tag_id) {
            continue;
        }
        seen.push(*tag_id);
        lesson_tag::ActiveModel {
            lesson_id: Set(lesson_id),
            tag_id: Set(*tag_id),
        }
        .insert(conn)
        .await?;
    }

    seen.clear();
    for user_id in instructor_ids {
        if seen.contains(user_id) {
            continue;
        }
        seen.push(*user_id);
        lesson_instructor::ActiveModel {
            lesson_id: Set(lesson_id),
            user_id: Set(*user_id),
        }
        .insert(conn)
        .await?;
    }
    Ok(())
}
