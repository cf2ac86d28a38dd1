//! Pretmat equipment lending server
//!
//! REST JSON API for a shared equipment pool: catalog with derived
//! availability, reservations, maintenance windows that preempt bookings,
//! returns with condition tracking and an admin approval queue.

use std::sync::Arc;

use sqlx::PgPool;

pub mod api;
pub mod calendar;
pub mod config;
pub mod error;
pub mod models;
pub mod reference;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}

impl AppState {
    /// Wire repository and services over an existing pool
    pub fn new(pool: PgPool, config: AppConfig) -> Self {
        let repository = repository::Repository::new(pool);
        let services = services::Services::new(repository, config.lending.clone());

        Self {
            config: Arc::new(config),
            services: Arc::new(services),
        }
    }
}
