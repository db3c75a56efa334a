//! Library lending server
//!
//! Keeps a book catalog, a borrower registry and the loan ledger recording
//! who holds which book, and serves them over a REST JSON API.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod models;
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
    pub fn new(config: AppConfig, store: repository::SharedStore) -> Self {
        Self {
            config: Arc::new(config),
            services: Arc::new(services::Services::new(store)),
        }
    }
}
