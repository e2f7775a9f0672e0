//! Migration: Create users table and shared trigger function.
//!
//! Stores LinkedIn sign-in users and their role.

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
                -- Shared trigger function for updated_at
                CREATE OR REPLACE FUNCTION update_updated_at_column()
                RETURNS TRIGGER AS $$
                BEGIN
                    NEW.updated_at = NOW();
                    RETURN NEW;
                END;
                $$ LANGUAGE plpgsql;

                CREATE TABLE users (
                    id UUID PRIMARY KEY,
                    linkedin_id VARCHAR(255),
                    name VARCHAR(255) NOT NULL,
                    email VARCHAR(255),
                    avatar_url VARCHAR(1000),
                    headline VARCHAR(255),
                    bio TEXT,
                    website_url VARCHAR(500),
                    role VARCHAR(20) NOT NULL DEFAULT 'member'
                        CHECK (role IN ('admin', 'moderator', 'member')),
                    last_login_at TIMESTAMPTZ,

                    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                    deleted_at TIMESTAMPTZ
                );

                -- Unique LinkedIn subject (active only)
                CREATE UNIQUE INDEX idx_users_linkedin_id_active
                    ON users(linkedin_id)
                    WHERE deleted_at IS NULL AND linkedin_id IS NOT NULL;

                CREATE INDEX idx_users_role
                    ON users(role)
                    WHERE deleted_at IS NULL;

                CREATE TRIGGER update_users_updated_at
                    BEFORE UPDATE ON users
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
                DROP TRIGGER IF EXISTS update_users_updated_at ON users;
                DROP TABLE IF EXISTS users CASCADE;
                DROP FUNCTION IF EXISTS update_updated_at_column();
                "#,
            )
            .await?;

        Ok(())
    }
}
