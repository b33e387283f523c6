//! Event dispatch background task

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::events::ServerEvent;
use crate::timer::IdleTimer;

/// Background task that feeds server events to the idle timer, strictly in
/// arrival order.
///
/// When `enabled` is false (a single-user host), events are drained and
/// discarded: shutting down such a machine for being "empty" is never
/// meaningful, so the timer simply never hears about anything.
pub async fn event_dispatcher_task(
    timer: IdleTimer,
    mut events: mpsc::UnboundedReceiver<ServerEvent>,
    enabled: bool,
) {
    if !enabled {
        info!("Single-user mode: idle shutdown is disabled.");
    }

    while let Some(event) = events.recv().await {
        if !enabled {
            continue;
        }
        match event {
            ServerEvent::SessionStarted => timer.on_session_start(),
            ServerEvent::SessionStopped => timer.on_session_stop(),
            ServerEvent::PlayerJoined { name, online } => {
                info!(
                    "Player {} joined. Players online: {}",
                    name.as_deref().unwrap_or("<unnamed>"),
                    online
                );
                timer.on_population_changed(online);
            }
            ServerEvent::PlayerLeft { name, online } => {
                info!(
                    "Player {} left. Players online: {}",
                    name.as_deref().unwrap_or("<unnamed>"),
                    online
                );
                timer.on_population_changed(online);
            }
            ServerEvent::Tick => timer.on_tick(),
        }
    }

    debug!("Event channel closed, dispatcher exiting");
}
