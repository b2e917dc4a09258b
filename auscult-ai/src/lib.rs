//! auscult-ai library interface
//!
//! Exposes the router, state and processing pipeline for the binary and for
//! integration tests.

pub mod api;
pub mod audio;
pub mod error;
pub mod features;
pub mod inference;
pub mod models;
pub mod recommendation;
pub mod upload;

pub use crate::error::{ApiError, ApiResult};

use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::Router;
use chrono::{DateTime, Utc};
use tower_http::trace::TraceLayer;

use crate::models::ModelSet;

/// Default request body cap (25 MiB)
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Artifacts loaded once at startup, read-only afterwards
    pub models: Arc<ModelSet>,
    /// Where uploads are held while features are extracted
    pub upload_dir: PathBuf,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(models: ModelSet, upload_dir: impl Into<PathBuf>) -> Self {
        Self {
            models: Arc::new(models),
            upload_dir: upload_dir.into(),
            startup_time: Utc::now(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }

    pub fn with_max_upload_bytes(mut self, max_upload_bytes: usize) -> Self {
        self.max_upload_bytes = max_upload_bytes;
        self
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    let body_limit = state.max_upload_bytes;

    Router::new()
        // UI routes (HTML page + assets)
        .merge(api::ui_routes())
        // API routes
        .merge(api::predict_routes())
        .merge(api::health_routes())
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
