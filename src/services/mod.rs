//! Business logic services.

pub mod cleanup;
pub mod copywriter;
pub mod linkedin_oauth;
pub mod progress;
pub mod readiness;
pub mod slug;
pub mod storage;
pub mod subscriber;
pub mod upload;
pub mod video_host;

pub use cleanup::{CleanupConfig, start_cleanup_task};
pub use copywriter::Copywriter;
pub use linkedin_oauth::configure_routes as configure_auth_routes;
pub use storage::Storage;
