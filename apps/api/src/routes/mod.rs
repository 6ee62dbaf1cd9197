pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::generation::handlers as generation;
use crate::state::AppState;
use crate::templates::handlers as templates;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Templates
        .route(
            "/api/v1/templates/:kind",
            get(templates::handle_get_template),
        )
        // Sessions
        .route("/api/v1/sessions", post(generation::handle_create_session))
        .route(
            "/api/v1/sessions/:id/templates/:kind",
            post(templates::handle_upload_template),
        )
        .route(
            "/api/v1/sessions/:id/generate",
            post(generation::handle_generate),
        )
        .route(
            "/api/v1/sessions/:id/history",
            get(generation::handle_history),
        )
        .route(
            "/api/v1/sessions/:id/history/:index/:document",
            get(generation::handle_download),
        )
        .with_state(state)
}
