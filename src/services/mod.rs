//! External actions module
//!
//! This module contains the concrete collaborators that act on the host
//! system when the timer fires.

pub mod system;

// Re-export main types
pub use system::CommandShutdown;
