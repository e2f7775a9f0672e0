//! Database operations for learner progress.

use std::collections::HashSet;

use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::*;
use uuid::Uuid;

use super::DbPool;
use crate::entity::{course_user, lesson_user};
use crate::error::{AppError, AppResult};
use crate::services::progress::is_course_complete;

impl DbPool {
    pub async fn find_lesson_user(
        &self,
        user_id: Uuid,
        lesson_id: Uuid,
    ) -> AppResult<Option<lesson_user::Model>> {
        Ok(lesson_user::Entity::find()
            .filter(lesson_user::Column::UserId.eq(user_id))
            .filter(lesson_user::Column::LessonId.eq(lesson_id))
            .one(self.connection())
            .await?)
    }

    pub async fn find_course_user(
        &self,
        user_id: Uuid,
        course_id: Uuid,
    ) -> AppResult<Option<course_user::Model>> {
        Ok(course_user::Entity::find()
            .filter(course_user::Column::UserId.eq(user_id))
            .filter(course_user::Column::CourseId.eq(course_id))
            .one(self.connection())
            .await?)
    }

    /// Record that a user opened a lesson. Idempotent.
    pub async fn start_lesson(
        &self,
        user_id: Uuid,
        lesson_id: Uuid,
        course_id: Uuid,
    ) -> AppResult<lesson_user::Model> {
        let record = match self.find_lesson_user(user_id, lesson_id).await? {
            Some(existing) => existing,
            None => {
                let now = Utc::now();
                // A concurrent start may win the unique key; keep its row
                lesson_user::Entity::insert(lesson_user::ActiveModel {
                    id: Set(Uuid::now_v7()),
                    user_id: Set(user_id),
                    lesson_id: Set(lesson_id),
                    started_at: Set(now),
                    completed_at: Set(None),
                    created_at: Set(now),
                    updated_at: Set(now),
                })
                .on_conflict(
                    OnConflict::columns([
                        lesson_user::Column::UserId,
                        lesson_user::Column::LessonId,
                    ])
                    .do_nothing()
                    .to_owned(),
                )
                .exec_without_returning(self.connection())
                .await?;

                self.find_lesson_user(user_id, lesson_id)
                    .await?
                    .ok_or_else(|| {
                        AppError::Database(format!("Lesson progress missing for {}", lesson_id))
                    })?
            }
        };

        self.ensure_course_user(user_id, course_id).await?;
        Ok(record)
    }

    async fn ensure_course_user(
        &self,
        user_id: Uuid,
        course_id: Uuid,
    ) -> AppResult<course_user::Model> {
        if let Some(existing) = self.find_course_user(user_id, course_id).await? {
            return Ok(existing);
        }
        let now = Utc::now();
        course_user::Entity::insert(course_user::ActiveModel {
            id: Set(Uuid::now_v7()),
            user_id: Set(user_id),
            course_id: Set(course_id),
            started_at: Set(now),
            completed_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        })
        .on_conflict(
            OnConflict::columns([course_user::Column::UserId, course_user::Column::CourseId])
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(self.connection())
        .await?;

        self.find_course_user(user_id, course_id)
            .await?
            .ok_or_else(|| AppError::Database(format!("Course progress missing for {}", course_id)))
    }

    /// Mark a lesson complete, completing the course when every published
    /// lesson is done.
    pub async fn complete_lesson(
        &self,
        user_id: Uuid,
        lesson_id: Uuid,
        course_id: Uuid,
    ) -> AppResult<lesson_user::Model> {
        let record = self.start_lesson(user_id, lesson_id, course_id).await?;
        let record = if record.completed_at.is_none() {
            let mut active: lesson_user::ActiveModel = record.into();
            active.completed_at = Set(Some(Utc::now()));
            active.update(self.connection()).await?
        } else {
            record
        };

        let published = self.published_lesson_ids(course_id).await?;
        let completed = self.completed_lesson_ids(user_id, &published).await?;
        if is_course_complete(completed.len() as u64, published.len() as u64) {
            let enrollment = self.ensure_course_user(user_id, course_id).await?;
            if enrollment.completed_at.is_none() {
                let mut active: course_user::ActiveModel = enrollment.into();
                active.completed_at = Set(Some(Utc::now()));
                active.update(self.connection()).await?;
            }
        }

        Ok(record)
    }

    /// Clear a lesson's completion; the course is no longer complete either.
    pub async fn reset_lesson(
        &self,
        user_id: Uuid,
        lesson_id: Uuid,
        course_id: Uuid,
    ) -> AppResult<Option<lesson_user::Model>> {
        let Some(record) = self.find_lesson_user(user_id, lesson_id).await? else {
            return Ok(None);
        };

        let mut active: lesson_user::ActiveModel = record.into();
        active.completed_at = Set(None);
        let record = active.update(self.connection()).await?;

        if let Some(enrollment) = self.find_course_user(user_id, course_id).await?
            && enrollment.completed_at.is_some()
        {
            let mut active: course_user::ActiveModel = enrollment.into();
            active.completed_at = Set(None);
            active.update(self.connection()).await?;
        }

        Ok(Some(record))
    }

    /// Which of `lesson_ids` the user has completed.
    pub async fn completed_lesson_ids(
        &self,
        user_id: Uuid,
        lesson_ids: &[Uuid],
    ) -> AppResult<HashSet<Uuid>> {
        if lesson_ids.is_empty() {
            return Ok(HashSet::new());
        }
        let ids: Vec<Uuid> = lesson_user::Entity::find()
            .select_only()
            .column(lesson_user::Column::LessonId)
            .filter(lesson_user::Column::UserId.eq(user_id))
            .filter(lesson_user::Column::LessonId.is_in(lesson_ids.iter().copied()))
            .filter(lesson_user::Column::CompletedAt.is_not_null())
            .into_tuple()
            .all(self.connection())
            .await?;
        Ok(ids.into_iter().collect())
    }

    /// Every course the user has started, most recent first.
    pub async fn enrollments(&self, user_id: Uuid) -> AppResult<Vec<course_user::Model>> {
        Ok(course_user::Entity::find()
            .filter(course_user::Column::UserId.eq(user_id))
            .order_by_desc(course_user::Column::StartedAt)
            .all(self.connection())
            .await?)
    }
}
