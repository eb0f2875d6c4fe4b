//! meterd library interface
//!
//! Exposes the application state, router construction and all workflow
//! modules for integration testing.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod validators;

pub use crate::error::{ApiError, ApiResult};

use axum::{
    routing::{get, patch, post},
    Router,
};
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::services::MeterImageExtractor;

/// Application state shared across handlers
///
/// Everything here is constructed in `main` and injected; there are no
/// process-wide client singletons.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Vision backend used by the upload workflow
    pub extractor: Arc<dyn MeterImageExtractor>,
    /// Directory for staged image files
    pub staging_dir: PathBuf,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(
        db: SqlitePool,
        extractor: Arc<dyn MeterImageExtractor>,
        staging_dir: PathBuf,
    ) -> Self {
        Self {
            db,
            extractor,
            staging_dir,
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/upload", post(api::upload::upload_measure))
        .route("/confirm", patch(api::confirm::confirm_measure))
        .route("/:customer_code/list", get(api::list::list_measures))
        .merge(api::health_routes())
        // All origins permitted; the service carries no authentication
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
