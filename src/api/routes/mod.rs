//! API routes module

pub mod sessions;

use std::sync::{Arc, RwLock};

use crate::api::state::AppState;
use axum::{Router, routing::get};

type SharedState = Arc<RwLock<AppState>>;

async fn health() -> &'static str {
    "ok"
}

/// Create the combined API router
pub fn router() -> Router<SharedState> {
    Router::new()
        // Liveness check
        .route("/health", get(health))
        // Chat session routes
        .nest("/sessions", sessions::router())
}
