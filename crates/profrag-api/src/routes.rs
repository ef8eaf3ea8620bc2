//! API route definitions

use crate::handlers::{chat, health};
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

/// Create API routes, mounted under `/api`
pub fn api_routes() -> Router<Arc<AppState>> {
    Router::new().route("/chat", post(chat::chat_handler))
}

/// Liveness, readiness, and metrics probes
pub fn health_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        .route("/metrics", get(health::metrics))
}
