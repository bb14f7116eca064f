//! CampusHive campus management server
//!
//! REST JSON API covering users and their profiles, departments and classes,
//! courses with enrollments and coursework, equipment borrowing and repairs,
//! and venue bookings.

use std::sync::Arc;

use sqlx::PgPool;

pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod repository;
pub mod services;

pub use api::create_router;
pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
    /// Used directly by the readiness probe
    pub pool: PgPool,
}
