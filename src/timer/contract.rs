//! Collaborator contracts consumed by the idle timer

use std::time::Duration;

/// Source of the current online player count.
///
/// Consulted for the fire-time double-check and the initial settle check;
/// must be cheap and non-blocking.
pub trait PopulationSource: Send + Sync {
    fn current_count(&self) -> u32;
}

/// Sink for the shutdown decision.
///
/// Invoked at most once per arm episode, fire-and-forget; any marshalling
/// onto a particular thread or process is the implementor's concern.
pub trait ShutdownRequester: Send + Sync {
    fn request_shutdown(&self);
}

/// Timing configuration for the idle timer.
///
/// `shutdown_delay` is read when a countdown is armed; changing it
/// mid-countdown does not move an already-armed deadline.
pub trait ShutdownPolicy: Send + Sync {
    /// Grace period an empty server is given before shutdown.
    fn shutdown_delay(&self) -> Duration;

    /// How long to wait after session start before treating an empty
    /// server as idle.
    fn settle_delay(&self) -> Duration;
}
