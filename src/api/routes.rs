//! Router construction

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::api::handlers;
use crate::AppState;

/// Build the application router.
///
/// JSON routes are capped at `server.max_body_bytes`. Upload routes carry no
/// body limit: the image field is streamed and its size checked by the pipeline.
pub fn create_router(state: Arc<AppState>) -> Router {
    let max_body_bytes = state.settings.server.max_body_bytes;

    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/generate-text", post(handlers::generate_text))
        .route(
            "/generate-image-captions",
            post(handlers::generate_image_captions).layer(DefaultBodyLimit::disable()),
        )
        .route(
            "/generate-text-from-image",
            post(handlers::generate_text_from_image).layer(DefaultBodyLimit::disable()),
        )
        .route(
            "/generate-image-from-text",
            post(handlers::generate_image_from_text),
        )
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
