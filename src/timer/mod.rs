//! Idle timer module
//!
//! This module contains the idle-shutdown state machine and the collaborator
//! contracts it consumes.

pub mod contract;
pub mod idle_timer;

// Re-export main types
pub use contract::{PopulationSource, ShutdownPolicy, ShutdownRequester};
pub use idle_timer::IdleTimer;
