//! HTTP endpoint handlers

use std::sync::Arc;
use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;
use tracing::error;

use crate::state::AppState;
use super::responses::{ApiResponse, HealthResponse, StatusResponse};

/// Optional body for join/leave notifications
#[derive(Debug, Default, Deserialize)]
pub struct PlayerReport {
    pub name: Option<String>,
}

/// Handle POST /players/join - Report a player joining
pub async fn join_handler(
    State(state): State<Arc<AppState>>,
    body: Option<Json<PlayerReport>>,
) -> Result<Json<ApiResponse>, StatusCode> {
    let name = body.and_then(|Json(report)| report.name);
    match state.record_join(name) {
        Ok(online) => Ok(Json(ApiResponse::accepted(
            format!("Player join recorded, {} online", online),
            online,
        ))),
        Err(e) => {
            error!("Failed to record join: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Handle POST /players/leave - Report a player leaving
pub async fn leave_handler(
    State(state): State<Arc<AppState>>,
    body: Option<Json<PlayerReport>>,
) -> Result<Json<ApiResponse>, StatusCode> {
    let name = body.and_then(|Json(report)| report.name);
    match state.record_leave(name) {
        Ok(online) => Ok(Json(ApiResponse::accepted(
            format!("Player leave recorded, {} online", online),
            online,
        ))),
        Err(e) => {
            error!("Failed to record leave: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Handle POST /session/start - Reset the idle monitor for a new session
pub async fn session_start_handler(
    State(state): State<Arc<AppState>>,
) -> Json<ApiResponse> {
    state.session_start();
    Json(ApiResponse::accepted(
        "Session started, idle monitor reset".to_string(),
        state.online_count(),
    ))
}

/// Handle POST /session/stop - Cancel pending shutdown and stop monitoring
pub async fn session_stop_handler(
    State(state): State<Arc<AppState>>,
) -> Json<ApiResponse> {
    state.session_stop();
    Json(ApiResponse::accepted(
        "Session stopped, idle monitor disarmed".to_string(),
        state.online_count(),
    ))
}

/// Handle GET /status - Return current roster and timer status
pub async fn status_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<StatusResponse>, StatusCode> {
    let timer = match state.timer_snapshot() {
        Ok(t) => t,
        Err(e) => {
            error!("Failed to get timer state: {}", e);
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    let (last_event, last_event_time) = state.get_last_event();

    Ok(Json(StatusResponse {
        online: state.online_count(),
        timer,
        shutdown_delay_minutes: state.shutdown_delay_minutes,
        uptime: state.get_uptime(),
        port: state.port,
        host: state.host.clone(),
        last_event,
        last_event_time,
    }))
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}
