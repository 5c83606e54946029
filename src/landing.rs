//! The built-in landing page and the terminal `404` handler.

use axum::http::StatusCode;
use axum::response::{Html, IntoResponse};

const LANDING_PAGE: &str = include_str!("../assets/landing.html");

pub async fn landing_page() -> Html<&'static str> {
    Html(LANDING_PAGE)
}

pub async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "404 Not Found\n")
}
