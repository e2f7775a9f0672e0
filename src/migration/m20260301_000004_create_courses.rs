//! Migration: Create courses and course_tags tables.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared(
                r#"
                CREATE TABLE courses (
                    id UUID PRIMARY KEY,
                    user_id UUID NOT NULL REFERENCES users(id),
                    title VARCHAR(255) NOT NULL,
                    slug VARCHAR(280) NOT NULL,
                    tagline VARCHAR(255),
                    description TEXT,
                    learning_objectives TEXT,
                    experience_level VARCHAR(20) NOT NULL DEFAULT 'beginner'
                        CHECK (experience_level IN ('beginner', 'intermediate', 'advanced')),
                    is_visible BOOLEAN NOT NULL DEFAULT FALSE,
                    publish_date TIMESTAMPTZ,

                    -- Thumbnail object key in S3 and named crop rectangles
                    thumbnail_key VARCHAR(500),
                    thumbnail_crops JSONB,

                    sort_order INTEGER NOT NULL DEFAULT 0,

                    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                    deleted_at TIMESTAMPTZ
                );

                CREATE UNIQUE INDEX idx_courses_slug_active
                    ON courses(slug)
                    WHERE deleted_at IS NULL;

                CREATE INDEX idx_courses_sort_order
                    ON courses(sort_order)
                    WHERE deleted_at IS NULL;

                CREATE TABLE course_tags (
                    course_id UUID NOT NULL REFERENCES courses(id) ON DELETE CASCADE,
                    tag_id UUID NOT NULL REFERENCES tags(id) ON DELETE CASCADE,
                    PRIMARY KEY (course_id, tag_id)
                );

                CREATE TRIGGER update_courses_updated_at
                    BEFORE UPDATE ON courses
                    FOR EACH ROW
                    EXECUTE FUNCTION update_updated_at_column();
                "#,
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared(
                r#"
                DROP TABLE IF EXISTS course_tags CASCADE;
                DROP TRIGGER IF EXISTS update_courses_updated_at ON courses;
                DROP TABLE IF EXISTS courses CASCADE;
                "#,
            )
            .await?;

        Ok(())
    }
}
