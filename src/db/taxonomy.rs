//! Database operations for tags and practice areas.

use std::collections::HashMap;

use chrono::Utc;
use sea_orm::*;
use uuid::Uuid;

use super::DbPool;
use crate::entity::{course_tag, lesson_tag, practice_area, showcase_practice_area, tag};
use crate::error::{AppError, AppResult};
use crate::services::slug::slugify;

impl DbPool {
    pub async fn list_tags(&self) -> AppResult<Vec<tag::Model>> {
        Ok(tag::Entity::find()
            .order_by_asc(tag::Column::Name)
            .all(self.connection())
            .await?)
    }

    /// Create a tag, or return the existing one with the same slug.
    pub async fn create_tag(&self, name: &str) -> AppResult<tag::Model> {
        let name = name.trim();
        let slug = slugify(name);
        if let Some(existing) = tag::Entity::find()
            .filter(tag::Column::Slug.eq(slug.as_str()))
            .one(self.connection())
            .await?
        {
            return Ok(existing);
        }

        let now = Utc::now();
        let model = tag::ActiveModel {
            id: Set(Uuid::now_v7()),
            name: Set(name.to_string()),
            slug: Set(slug),
            created_at: Set(now),
            updated_at: Set(now),
        };
        Ok(model.insert(self.connection()).await?)
    }

    pub async fn delete_tag(&self, id: Uuid) -> AppResult<()> {
        let result = tag::Entity::delete_by_id(id).exec(self.connection()).await?;
        if result.rows_affected == 0 {
            return Err(AppError::NotFound(format!("Tag {}", id)));
        }
        Ok(())
    }

    pub async fn list_practice_areas(&self) -> AppResult<Vec<practice_area::Model>> {
        Ok(practice_area::Entity::find()
            .order_by_asc(practice_area::Column::Name)
            .all(self.connection())
            .await?)
    }

    pub async fn create_practice_area(&self, name: &str) -> AppResult<practice_area::Model> {
        let name = name.trim();
        let slug = slugify(name);
        if let Some(existing) = practice_area::Entity::find()
            .filter(practice_area::Column::Slug.eq(slug.as_str()))
            .one(self.connection())
            .await?
        {
            return Ok(existing);
        }

        let now = Utc::now();
        let model = practice_area::ActiveModel {
            id: Set(Uuid::now_v7()),
            name: Set(name.to_string()),
            slug: Set(slug),
            created_at: Set(now),
            updated_at: Set(now),
        };
        Ok(model.insert(self.connection()).await?)
    }

    pub async fn delete_practice_area(&self, id: Uuid) -> AppResult<()> {
        let result = practice_area::Entity::delete_by_id(id)
            .exec(self.connection())
            .await?;
        if result.rows_affected == 0 {
            return Err(AppError::NotFound(format!("Practice area {}", id)));
        }
        Ok(())
    }

    pub async fn find_practice_area_by_slug(
        &self,
        slug: &str,
    ) -> AppResult<Option<practice_area::Model>> {
        Ok(practice_area::Entity::find()
            .filter(practice_area::Column::Slug.eq(slug))
            .one(self.connection())
            .await?)
    }

    /// Reject ids that do not name an existing tag.
    pub async fn ensure_tags_exist(&self, ids: &[Uuid]) -> AppResult<()> {
        if ids.is_empty() {
            return Ok(());
        }
        ensure_all_found(
            "tag_ids",
            ids,
            tag::Entity::find()
                .filter(tag::Column::Id.is_in(ids.iter().copied()))
                .all(self.connection())
                .await?
                .into_iter()
                .map(|t| t.id)
                .collect(),
        )
    }

    pub async fn ensure_practice_areas_exist(&self, ids: &[Uuid]) -> AppResult<()> {
        if ids.is_empty() {
            return Ok(());
        }
        ensure_all_found(
            "practice_area_ids",
            ids,
            practice_area::Entity::find()
                .filter(practice_area::Column::Id.is_in(ids.iter().copied()))
                .all(self.connection())
                .await?
                .into_iter()
                .map(|p| p.id)
                .collect(),
        )
    }

    /// Tags for each of `course_ids`, sorted by name.
    pub async fn tags_for_courses(
        &self,
        course_ids: &[Uuid],
    ) -> AppResult<HashMap<Uuid, Vec<tag::Model>>> {
        if course_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let pivots = course_tag::Entity::find()
            .filter(course_tag::Column::CourseId.is_in(course_ids.iter().copied()))
            .all(self.connection())
            .await?;
        let pairs = pivots.into_iter().map(|p| (p.course_id, p.tag_id)).collect();
        self.group_tags(pairs).await
    }

    pub async fn tags_for_lessons(
        &self,
        lesson_ids: &[Uuid],
    ) -> AppResult<HashMap<Uuid, Vec<tag::Model>>> {
        if lesson_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let pivots = lesson_tag::Entity::find()
            .filter(lesson_tag::Column::LessonId.is_in(lesson_ids.iter().copied()))
            .all(self.connection())
            .await?;
        let pairs = pivots.into_iter().map(|p| (p.lesson_id, p.tag_id)).collect();
        self.group_tags(pairs).await
    }

    async fn group_tags(
        &self,
        pairs: Vec<(Uuid, Uuid)>,
    ) -> AppResult<HashMap<Uuid, Vec<tag::Model>>> {
        if pairs.is_empty() {
            return Ok(HashMap::new());
        }
        let tag_ids: Vec<Uuid> = pairs.iter().map(|(_, t)| *t).collect();
        let tags: HashMap<Uuid, tag::Model> = tag::Entity::find()
            .filter(tag::Column::Id.is_in(tag_ids))
            .all(self.connection())
            .await?
            .into_iter()
            .map(|t| (t.id, t))
            .collect();

        let mut grouped: HashMap<Uuid, Vec<tag::Model>> = HashMap::new();
        for (owner, tag_id) in pairs {
            if let Some(t) = tags.get(&tag_id) {
                grouped.entry(owner).or_default().push(t.clone());
            }
        }
        for list in grouped.values_mut() {
            list.sort_by(|a, b| a.name.cmp(&b.name));
        }
        Ok(grouped)
    }

    pub async fn practice_areas_for_showcases(
        &self,
        showcase_ids: &[Uuid],
    ) -> AppResult<HashMap<Uuid, Vec<practice_area::Model>>> {
        if showcase_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let pivots = showcase_practice_area::Entity::find()
            .filter(showcase_practice_area::Column::ShowcaseId.is_in(showcase_ids.iter().copied()))
            .all(self.connection())
            .await?;
        let area_ids: Vec<Uuid> = pivots.iter().map(|p| p.practice_area_id).collect();
        let areas: HashMap<Uuid, practice_area::Model> = practice_area::Entity::find()
            .filter(practice_area::Column::Id.is_in(area_ids))
            .all(self.connection())
            .await?
            .into_iter()
            .map(|a| (a.id, a))
            .collect();

        let mut grouped: HashMap<Uuid, Vec<practice_area::Model>> = HashMap::new();
        for p in pivots {
            if let Some(a) = areas.get(&p.practice_area_id) {
                grouped.entry(p.showcase_id).or_default().push(a.clone());
            }
        }
        for list in grouped.values_mut() {
            list.sort_by(|a, b| a.name.cmp(&b.name));
        }
        Ok(grouped)
    }
}

fn ensure_all_found(field: &str, requested: &[Uuid], found: Vec<Uuid>) -> AppResult<()> {
    let unknown: Vec<String> = requested
        .iter()
        .filter(|id| !found.contains(id))
        .map(|id| id.to_string())
        .collect();
    if unknown.is_empty() {
        Ok(())
    } else {
        Err(AppError::field(
            field,
            format!("Unknown ids: {}", unknown.join(", ")),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_all_found_lists_unknown_ids() {
        let a = Uuid::now_v7();
        let b = Uuid::now_v7();
        assert!(ensure_all_found("tag_ids", &[a], vec![a, b]).is_ok());
        assert!(ensure_all_found("tag_ids", &[], vec![]).is_ok());
        match ensure_all_found("tag_ids", &[a, b], vec![a]) {
            Err(AppError::Validation(fields)) => {
                assert!(fields["tag_ids"][0].contains(&b.to_string()))
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }
}
