//! Database module providing connection management, migrations, and queries.

pub mod courses;
pub mod lessons;
pub mod progress;
pub mod refresh_tokens;
pub mod showcases;
pub mod taxonomy;
pub mod users;

use std::collections::HashSet;
use std::time::Duration;

use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use tracing::info;
use uuid::Uuid;

use crate::config::DatabaseSettings;
use crate::error::{AppError, AppResult};
use crate::migration::Migrator;

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct DbPool {
    conn: DatabaseConnection,
}

impl DbPool {
    /// Connect to PostgreSQL with pool sizing from configuration.
    pub async fn new(settings: &DatabaseSettings) -> AppResult<Self> {
        let mut options = ConnectOptions::new(settings.url.clone());
        options
            .max_connections(settings.max_connections)
            .min_connections(settings.min_connections)
            .connect_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .sqlx_logging(false);

        let conn = Database::connect(options)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to database: {}", e)))?;

        info!(
            "Database pool ready (min={}, max={})",
            settings.min_connections, settings.max_connections
        );

        Ok(DbPool { conn })
    }

    /// Wrap an existing connection (used by tests with a mock database).
    pub fn from_connection(conn: DatabaseConnection) -> Self {
        DbPool { conn }
    }

    /// Get the underlying SeaORM connection.
    pub fn connection(&self) -> &DatabaseConnection {
        &self.conn
    }

    /// Apply pending migrations.
    pub async fn run_migrations(&self) -> AppResult<()> {
        Migrator::up(&self.conn, None)
            .await
            .map_err(|e| AppError::Database(format!("Failed to run migrations: {}", e)))
    }

    /// Round-trip to the database (health checks).
    pub async fn ping(&self) -> AppResult<()> {
        self.conn
            .ping()
            .await
            .map_err(|e| AppError::Database(format!("Database ping failed: {}", e)))
    }
}

/// A reorder request must name every existing id exactly once.
pub fn check_permutation(existing: &[Uuid], requested: &[Uuid]) -> AppResult<()> {
    let wanted: HashSet<&Uuid> = requested.iter().collect();
    let have: HashSet<&Uuid> = existing.iter().collect();

    if wanted.len() != requested.len() {
        return Err(AppError::field("ids", "The ids field contains duplicates"));
    }
    if requested.len() != existing.len() || wanted != have {
        return Err(AppError::field(
            "ids",
            "The ids field must list every existing item exactly once",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_permutation() {
        let a = Uuid::now_v7();
        let b = Uuid::now_v7();
        let c = Uuid::now_v7();

        assert!(check_permutation(&[a, b, c], &[c, a, b]).is_ok());
        assert!(check_permutation(&[], &[]).is_ok());
        assert!(check_permutation(&[a, b], &[a]).is_err());
        assert!(check_permutation(&[a, b], &[a, a]).is_err());
        assert!(check_permutation(&[a, b], &[a, c]).is_err());
        assert!(check_permutation(&[a], &[a, b]).is_err());
    }
}
