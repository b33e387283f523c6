//! Main application state management

use std::{
    sync::{Arc, Mutex},
    time::Instant,
};
use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tracing::warn;

use crate::events::ServerEvent;
use crate::timer::IdleTimer;
use super::{PlayerRoster, TimerSnapshot};

/// Shared application state: the roster, the idle timer, and the channel
/// the HTTP adapter reports events through.
pub struct AppState {
    pub roster: Arc<PlayerRoster>,
    pub timer: IdleTimer,
    /// Server metadata
    pub start_time: Instant,
    pub port: u16,
    pub host: String,
    pub shutdown_delay_minutes: u64,
    /// Last event tracking
    pub last_event: Mutex<Option<String>>,
    pub last_event_time: Mutex<Option<DateTime<Utc>>>,
    event_tx: mpsc::UnboundedSender<ServerEvent>,
}

impl AppState {
    pub fn new(
        roster: Arc<PlayerRoster>,
        timer: IdleTimer,
        event_tx: mpsc::UnboundedSender<ServerEvent>,
        host: String,
        port: u16,
        shutdown_delay_minutes: u64,
    ) -> Self {
        Self {
            roster,
            timer,
            start_time: Instant::now(),
            port,
            host,
            shutdown_delay_minutes,
            last_event: Mutex::new(None),
            last_event_time: Mutex::new(None),
            event_tx,
        }
    }

    /// Record a player joining and return the resulting count.
    ///
    /// The count update and the event emission happen under the roster lock,
    /// so the counts carried by events are never reordered against each
    /// other.
    pub fn record_join(&self, name: Option<String>) -> Result<u32, String> {
        self.touch("join");
        self.roster.update(|online| {
            *online = online.saturating_add(1);
            let count = *online;
            self.send_event(ServerEvent::PlayerJoined {
                name,
                online: count,
            });
            count
        })
    }

    /// Record a player leaving and return the resulting count.
    pub fn record_leave(&self, name: Option<String>) -> Result<u32, String> {
        self.touch("leave");
        self.roster.update(|online| {
            *online = online.saturating_sub(1);
            let count = *online;
            self.send_event(ServerEvent::PlayerLeft {
                name,
                online: count,
            });
            count
        })
    }

    /// Announce the start of a server session.
    pub fn session_start(&self) {
        self.touch("session-start");
        self.send_event(ServerEvent::SessionStarted);
    }

    /// Announce that the server session is stopping.
    pub fn session_stop(&self) {
        self.touch("session-stop");
        self.send_event(ServerEvent::SessionStopped);
    }

    pub fn online_count(&self) -> u32 {
        self.roster.current()
    }

    pub fn timer_snapshot(&self) -> Result<TimerSnapshot, String> {
        self.timer.snapshot()
    }

    /// Calculate server uptime as a formatted string
    pub fn get_uptime(&self) -> String {
        let duration = self.start_time.elapsed();
        let hours = duration.as_secs() / 3600;
        let minutes = (duration.as_secs() % 3600) / 60;
        let seconds = duration.as_secs() % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }

    /// Get last event information
    pub fn get_last_event(&self) -> (Option<String>, Option<DateTime<Utc>>) {
        let last_event = self.last_event.lock().ok().and_then(|e| e.clone());
        let last_event_time = self.last_event_time.lock().ok().and_then(|t| *t);
        (last_event, last_event_time)
    }

    fn send_event(&self, event: ServerEvent) {
        if self.event_tx.send(event).is_err() {
            warn!("Event dispatcher is gone; dropping event");
        }
    }

    fn touch(&self, event: &str) {
        if let Ok(mut last_event) = self.last_event.lock() {
            *last_event = Some(event.to_string());
        }
        if let Ok(mut last_time) = self.last_event_time.lock() {
            *last_time = Some(Utc::now());
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::timer::{ShutdownPolicy, ShutdownRequester};

    struct NoopShutdown;

    impl ShutdownRequester for NoopShutdown {
        fn request_shutdown(&self) {}
    }

    struct FixedPolicy;

    impl ShutdownPolicy for FixedPolicy {
        fn shutdown_delay(&self) -> Duration {
            Duration::from_secs(60)
        }

        fn settle_delay(&self) -> Duration {
            Duration::from_secs(5)
        }
    }

    fn state() -> (AppState, mpsc::UnboundedReceiver<ServerEvent>) {
        let roster = Arc::new(PlayerRoster::new());
        let timer = IdleTimer::new(roster.clone(), Arc::new(FixedPolicy), Arc::new(NoopShutdown));
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let state = AppState::new(roster, timer, event_tx, "127.0.0.1".to_string(), 25580, 30);
        (state, event_rx)
    }

    #[tokio::test]
    async fn roster_updates_and_events_stay_in_lockstep() {
        let (state, mut events) = state();

        assert_eq!(state.record_join(Some("alex".to_string())), Ok(1));
        assert_eq!(state.record_join(None), Ok(2));
        assert_eq!(state.record_leave(None), Ok(1));

        assert_eq!(
            events.recv().await,
            Some(ServerEvent::PlayerJoined {
                name: Some("alex".to_string()),
                online: 1
            })
        );
        assert_eq!(
            events.recv().await,
            Some(ServerEvent::PlayerJoined {
                name: None,
                online: 2
            })
        );
        assert_eq!(
            events.recv().await,
            Some(ServerEvent::PlayerLeft {
                name: None,
                online: 1
            })
        );
    }

    #[tokio::test]
    async fn leave_on_an_empty_roster_reports_zero() {
        let (state, mut events) = state();

        assert_eq!(state.record_leave(Some("ghost".to_string())), Ok(0));
        assert_eq!(
            events.recv().await,
            Some(ServerEvent::PlayerLeft {
                name: Some("ghost".to_string()),
                online: 0
            })
        );
    }
}
