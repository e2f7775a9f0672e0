//! HTTP-level tests for the academy API.
//!
//! The database is a SeaORM `MockDatabase` and Mux is an in-process actix
//! server, so the suite runs without PostgreSQL, S3 or network access.
//!
//! Run with: cargo test --test api

mod mock_mux;
mod test_helpers;

mod test_admin_content;
mod test_auth_guards;
mod test_progress;
mod test_public_routes;
mod test_sessions;
mod test_showcase_flow;
mod test_video_host;
mod test_video_sync;
