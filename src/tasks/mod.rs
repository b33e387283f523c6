//! Background tasks module
//!
//! This module contains background tasks that run alongside the HTTP server.

pub mod dispatcher;
pub mod ticker;

// Re-export main functions
pub use dispatcher::event_dispatcher_task;
pub use ticker::countdown_ticker_task;
