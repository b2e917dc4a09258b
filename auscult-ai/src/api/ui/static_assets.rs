//! Static asset handlers for the upload page
//!
//! Embeds and serves CSS/JS files at compile time

use axum::{http::StatusCode, response::{IntoResponse, Response}};

const APP_JS: &str = include_str!("../../../static/app.js");
const APP_CSS: &str = include_str!("../../../static/app.css");

/// GET /static/app.js
pub async fn serve_app_js() -> Response {
    (
        StatusCode::OK,
        [
            ("content-type", "application/javascript"),
            ("cache-control", "no-cache, no-store, must-revalidate"),
        ],
        APP_JS,
    )
        .into_response()
}

/// GET /static/app.css
pub async fn serve_app_css() -> Response {
    (
        StatusCode::OK,
        [
            ("content-type", "text/css"),
            ("cache-control", "no-cache, no-store, must-revalidate"),
        ],
        APP_CSS,
    )
        .into_response()
}
