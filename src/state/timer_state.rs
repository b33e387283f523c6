//! Timer phase and snapshot structures

use serde::{Deserialize, Serialize};

/// Phase of the idle-shutdown state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdlePhase {
    /// No countdown is running.
    Idle,
    /// A shutdown countdown is scheduled but not yet due.
    Armed,
    /// The countdown elapsed and the shutdown decision is being taken.
    Firing,
}

impl Default for IdlePhase {
    fn default() -> Self {
        IdlePhase::Idle
    }
}

/// Point-in-time view of the timer for the status endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TimerSnapshot {
    pub phase: IdlePhase,
    pub session_active: bool,
    /// Seconds since the countdown was armed.
    pub armed_seconds: Option<u64>,
    /// Seconds until the pending shutdown, when armed.
    pub remaining_seconds: Option<u64>,
}

impl TimerSnapshot {
    pub fn is_armed(&self) -> bool {
        self.phase == IdlePhase::Armed
    }
}
