use axum::{Router, extract::DefaultBodyLimit};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::SharedState;

/// Write routes for signed-in users.
pub mod admin;
/// Signed-in user extraction.
pub mod auth;
/// Swagger UI and the OpenAPI document.
pub mod docs;
/// Read-only catalog routes.
pub mod games;
/// Health check route.
pub mod health;
/// Image relay routes.
pub mod relay;

/// Room for base64 expansion and the JSON around an image payload.
const BODY_OVERHEAD_BYTES: usize = 64 * 1024;

/// Compose all route trees with their middleware and shared state.
///
/// The relay carries its own cross-origin headers, so the permissive CORS
/// layer only wraps the other routes.
pub fn router(state: SharedState) -> Router<()> {
    let body_limit = state.config().thumbnail_max_bytes / 3 * 4 + BODY_OVERHEAD_BYTES;

    let api_router = health::router()
        .merge(games::router())
        .merge(admin::router())
        .merge(docs::router())
        .layer(CorsLayer::permissive());

    api_router
        .merge(relay::router())
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
