//! Migration: Create lessons, their pivots and transcript_lines.

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
                CREATE TABLE lessons (
                    id UUID PRIMARY KEY,
                    course_id UUID NOT NULL REFERENCES courses(id) ON DELETE CASCADE,
                    title VARCHAR(255) NOT NULL,
                    slug VARCHAR(280) NOT NULL,
                    tagline VARCHAR(255),
                    description TEXT,
                    marketing_copy TEXT,
                    is_gated BOOLEAN NOT NULL DEFAULT TRUE,
                    is_visible BOOLEAN NOT NULL DEFAULT FALSE,
                    publish_date TIMESTAMPTZ,

                    -- Video host reference; the video itself never touches this server
                    video_host VARCHAR(20) NOT NULL DEFAULT 'mux'
                        CHECK (video_host IN ('mux')),
                    asset_id VARCHAR(255),
                    playback_id VARCHAR(255),
                    duration_seconds INTEGER CHECK (duration_seconds IS NULL OR duration_seconds >= 0),
                    video_synced_at TIMESTAMPTZ,

                    thumbnail_key VARCHAR(500),
                    thumbnail_crops JSONB,
                    sort_order INTEGER NOT NULL DEFAULT 0,

                    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                    deleted_at TIMESTAMPTZ
                );

                CREATE UNIQUE INDEX idx_lessons_course_slug_active
                    ON lessons(course_id, slug)
                    WHERE deleted_at IS NULL;

                CREATE INDEX idx_lessons_course_sort
                    ON lessons(course_id, sort_order)
                    WHERE deleted_at IS NULL;

                -- Course publish-date check looks lessons up by day
                CREATE INDEX idx_lessons_publish_date
                    ON lessons(course_id, publish_date)
                    WHERE deleted_at IS NULL;

                CREATE TABLE lesson_tags (
                    lesson_id UUID NOT NULL REFERENCES lessons(id) ON DELETE CASCADE,
                    tag_id UUID NOT NULL REFERENCES tags(id) ON DELETE CASCADE,
                    PRIMARY KEY (lesson_id, tag_id)
                );

                CREATE TABLE lesson_instructors (
                    lesson_id UUID NOT NULL REFERENCES lessons(id) ON DELETE CASCADE,
                    user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                    PRIMARY KEY (lesson_id, user_id)
                );

                CREATE TABLE transcript_lines (
                    id UUID PRIMARY KEY,
                    lesson_id UUID NOT NULL REFERENCES lessons(id) ON DELETE CASCADE,
                    position INTEGER NOT NULL,
                    start_ms BIGINT NOT NULL CHECK (start_ms >= 0),
                    end_ms BIGINT NOT NULL CHECK (end_ms >= start_ms),
                    body TEXT NOT NULL,

                    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                    UNIQUE (lesson_id, position)
                );

                CREATE TRIGGER update_lessons_updated_at
                    BEFORE UPDATE ON lessons
                    FOR EACH ROW
                    EXECUTE FUNCTION update_updated_at_column();

                CREATE TRIGGER update_transcript_lines_updated_at
                    BEFORE UPDATE ON transcript_lines
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
                DROP TABLE IF EXISTS transcript_lines CASCADE;
                DROP TABLE IF EXISTS lesson_instructors CASCADE;
                DROP TABLE IF EXISTS lesson_tags CASCADE;
                DROP TRIGGER IF EXISTS update_lessons_updated_at ON lessons;
                DROP TABLE IF EXISTS lessons CASCADE;
                "#,
            )
            .await?;

        Ok(())
    }
}
