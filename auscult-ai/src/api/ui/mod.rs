//! UI routes - the upload page and its assets
//!
//! - **Root Page** (`root`): upload form, audio preview, result panel
//! - **Static Assets** (`static_assets`): CSS/JS embedded at compile time

use axum::{routing::get, Router};
use crate::AppState;

mod root;
mod static_assets;

use root::root_page;
use static_assets::{serve_app_css, serve_app_js};

/// Build UI routes
pub fn ui_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(root_page))
        .route("/static/app.js", get(serve_app_js))
        .route("/static/app.css", get(serve_app_css))
}
