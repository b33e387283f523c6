//! API response structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::state::TimerSnapshot;

/// API response structure for event-reporting endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse {
    pub status: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub online: u32,
}

impl ApiResponse {
    /// Create a new API response
    pub fn new(status: String, message: String, online: u32) -> Self {
        Self {
            status,
            message,
            timestamp: Utc::now(),
            online,
        }
    }

    /// Create an accepted response
    pub fn accepted(message: String, online: u32) -> Self {
        Self::new("accepted".to_string(), message, online)
    }
}

/// Status response with roster and timer information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub online: u32,
    pub timer: TimerSnapshot,
    pub shutdown_delay_minutes: u64,
    pub uptime: String,
    pub port: u16,
    pub host: String,
    pub last_event: Option<String>,
    pub last_event_time: Option<DateTime<Utc>>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

impl HealthResponse {
    /// Create a new health response
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: Utc::now(),
            version: "1.2.0".to_string(),
        }
    }
}
