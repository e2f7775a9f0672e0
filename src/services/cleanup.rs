//! Background cleanup of stale refresh tokens.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::interval;
use tracing::{error, info};

use crate::db::{DbPool, refresh_tokens};
use crate::error::AppResult;

/// Configuration for the cleanup task.
#[derive(Clone, Debug)]
pub struct CleanupConfig {
    /// Grace period before expired or revoked tokens are soft-deleted
    pub token_retention_secs: u64,
    /// How often to run cleanup (in seconds)
    pub interval_secs: u64,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            token_retention_secs: 86_400,
            interval_secs: 3_600,
        }
    }
}

/// Spawn the periodic cleanup task.
pub fn start_cleanup_task(pool: Arc<DbPool>, config: CleanupConfig) {
    tokio::spawn(async move {
        info!(
            "Starting cleanup service (token retention: {}s, interval: {}s)",
            config.token_retention_secs, config.interval_secs
        );

        let mut ticker = interval(Duration::from_secs(config.interval_secs.max(1)));
        loop {
            ticker.tick().await;
            if let Err(e) = run_cleanup(&pool, &config).await {
                error!("Cleanup task error: {}", e);
            }
        }
    });
}

/// Run a single cleanup cycle.
async fn run_cleanup(pool: &DbPool, config: &CleanupConfig) -> AppResult<()> {
    let removed =
        refresh_tokens::cleanup_expired(pool.connection(), config.token_retention_secs).await?;
    if removed > 0 {
        info!("Cleaned up {} stale refresh tokens", removed);
    }
    Ok(())
}
