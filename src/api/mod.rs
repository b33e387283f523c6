//! HTTP API module
//!
//! This module contains all HTTP endpoint handlers and response structures.
//! The endpoints are the concrete event source for the daemon: the host
//! server reports lifecycle and membership changes here.

pub mod handlers;
pub mod responses;

use std::sync::Arc;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;
use handlers::*;

/// Create the HTTP router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/session/start", post(session_start_handler))
        .route("/session/stop", post(session_stop_handler))
        .route("/players/join", post(join_handler))
        .route("/players/leave", post(leave_handler))
        .route("/status", get(status_handler))
        .route("/health", get(health_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
