//! Academy server library.
//!
//! Course catalogue, lesson playback, learner progress and the showcase
//! moderation workflow, served over actix-web on top of PostgreSQL and S3.

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod entity;
pub mod error;
pub mod middleware;
pub mod migration;
pub mod models;
pub mod services;
