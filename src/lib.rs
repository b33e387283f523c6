//! Lights Out - a state-managed watchdog that shuts down an empty game server
//!
//! The idle timer arms a shutdown countdown when the last player leaves,
//! cancels it the moment anyone joins, and double-checks the player count
//! before committing to the shutdown.

pub mod config;
pub mod events;
pub mod state;
pub mod timer;
pub mod tasks;
pub mod api;
pub mod services;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use events::ServerEvent;
pub use state::AppState;
pub use timer::IdleTimer;
pub use api::create_router;
pub use utils::signals::shutdown_signal;
