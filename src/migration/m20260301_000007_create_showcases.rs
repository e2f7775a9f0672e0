//! Migration: Create showcases, showcase_images and showcase_practice_areas.

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
                CREATE TABLE showcases (
                    id UUID PRIMARY KEY,
                    user_id UUID NOT NULL REFERENCES users(id),
                    title VARCHAR(255) NOT NULL,
                    slug VARCHAR(280) NOT NULL,
                    tagline VARCHAR(255),
                    description TEXT,
                    project_url VARCHAR(500),
                    repository_url VARCHAR(500),
                    status VARCHAR(20) NOT NULL DEFAULT 'draft'
                        CHECK (status IN ('draft', 'pending', 'approved', 'rejected')),
                    submitted_date TIMESTAMPTZ,
                    moderated_at TIMESTAMPTZ,
                    moderated_by UUID REFERENCES users(id) ON DELETE SET NULL,
                    rejection_reason TEXT,
                    thumbnail_image_id UUID,
                    thumbnail_crops JSONB,

                    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                    deleted_at TIMESTAMPTZ
                );

                CREATE UNIQUE INDEX idx_showcases_slug_active
                    ON showcases(slug)
                    WHERE deleted_at IS NULL;

                CREATE INDEX idx_showcases_status
                    ON showcases(status, submitted_date)
                    WHERE deleted_at IS NULL;

                CREATE INDEX idx_showcases_user_id
                    ON showcases(user_id)
                    WHERE deleted_at IS NULL;

                CREATE TABLE showcase_images (
                    id UUID PRIMARY KEY,
                    showcase_id UUID NOT NULL REFERENCES showcases(id) ON DELETE CASCADE,
                    storage_key VARCHAR(500) NOT NULL,
                    content_type VARCHAR(100) NOT NULL,
                    sort_order INTEGER NOT NULL DEFAULT 0,

                    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
                );

                CREATE INDEX idx_showcase_images_showcase
                    ON showcase_images(showcase_id, sort_order);

                CREATE TABLE showcase_practice_areas (
                    showcase_id UUID NOT NULL REFERENCES showcases(id) ON DELETE CASCADE,
                    practice_area_id UUID NOT NULL REFERENCES practice_areas(id) ON DELETE CASCADE,
                    PRIMARY KEY (showcase_id, practice_area_id)
                );

                CREATE TRIGGER update_showcases_updated_at
                    BEFORE UPDATE ON showcases
                    FOR EACH ROW
                    EXECUTE FUNCTION update_updated_at_column();

                CREATE TRIGGER update_showcase_images_updated_at
                    BEFORE UPDATE ON showcase_images
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
                DROP TABLE IF EXISTS showcase_practice_areas CASCADE;
                DROP TABLE IF EXISTS showcase_images CASCADE;
                DROP TRIGGER IF EXISTS update_showcases_updated_at ON showcases;
                DROP TABLE IF EXISTS showcases CASCADE;
                "#,
            )
            .await?;

        Ok(())
    }
}
