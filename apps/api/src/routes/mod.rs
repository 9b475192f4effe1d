pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::review::handlers;
use crate::state::AppState;

/// Room for multipart boundaries, headers and the `text` field on top of the file itself.
const FORM_OVERHEAD_BYTES: usize = 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes + FORM_OVERHEAD_BYTES;

    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/test-llm", get(health::llm_ping_handler))
        // Review API
        .route("/resume-review", post(handlers::handle_resume_review))
        .route("/api/resume-review", post(handlers::handle_resume_review))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
