//! Event vocabulary shared by the HTTP adapter and the dispatcher

/// Notifications emitted by the host server (or its adapter) and consumed
/// by the event dispatcher in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerEvent {
    /// The server session has started; the idle monitor should reset.
    SessionStarted,
    /// The server session is stopping; pending timers must be cancelled.
    SessionStopped,
    /// A player joined; `online` is the resulting player count.
    PlayerJoined { name: Option<String>, online: u32 },
    /// A player left; `online` is the resulting player count.
    PlayerLeft { name: Option<String>, online: u32 },
    /// Periodic time signal used for countdown logging only.
    Tick,
}
