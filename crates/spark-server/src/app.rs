use axum::Router;
use axum::routing::{get, post};
use std::sync::Arc;

use crate::handlers;
use crate::state::AppState;

/// Assemble the API router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/api/status", get(handlers::status))
        .route("/api/intro", post(handlers::intro))
        .route("/api/process-goal", post(handlers::process_goal))
        .route("/api/plan", post(handlers::plan))
        .with_state(Arc::new(state))
}
