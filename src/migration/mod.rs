//! SeaORM database migrations.

pub use sea_orm_migration::prelude::*;

mod m20260301_000001_create_users;
mod m20260301_000002_create_refresh_tokens;
mod m20260301_000003_create_taxonomy;
mod m20260301_000004_create_courses;
mod m20260301_000005_create_lessons;
mod m20260301_000006_create_progress;
mod m20260301_000007_create_showcases;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260301_000001_create_users::Migration),
            Box::new(m20260301_000002_create_refresh_tokens::Migration),
            Box::new(m20260301_000003_create_taxonomy::Migration),
            Box::new(m20260301_000004_create_courses::Migration),
            Box::new(m20260301_000005_create_lessons::Migration),
            Box::new(m20260301_000006_create_progress::Migration),
            Box::new(m20260301_000007_create_showcases::Migration),
        ]
    }
}
