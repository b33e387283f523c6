//! Countdown tick background task

use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::interval;
use tracing::debug;

use crate::events::ServerEvent;

/// Background task that emits a `Tick` event every second so the dispatcher
/// can surface countdown warnings. Ticks carry no state: the deadline is
/// owned entirely by the timer's deferred fire task.
pub async fn countdown_ticker_task(events: mpsc::UnboundedSender<ServerEvent>) {
    let mut interval = interval(Duration::from_secs(1));

    loop {
        interval.tick().await;
        if events.send(ServerEvent::Tick).is_err() {
            debug!("Event channel closed, ticker exiting");
            break;
        }
    }
}
