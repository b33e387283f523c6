//! Idle-shutdown state machine
//!
//! One countdown episode at a time: arming schedules a single deferred fire
//! task, a join cancels it, and the fire task re-reads the player count under
//! the same lock before committing to the shutdown. Countdown log lines come
//! from the periodic tick and never influence the deadline itself.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Instant};
use tracing::{debug, error, info, warn};

use super::contract::{PopulationSource, ShutdownPolicy, ShutdownRequester};
use crate::state::{IdlePhase, TimerSnapshot};

/// Remaining-minute marks announced while a countdown is running.
const WARN_THRESHOLDS_MINUTES: [u64; 4] = [15, 10, 5, 1];

/// Everything the timer mutates, behind one lock.
struct TimerInner {
    phase: IdlePhase,
    session_active: bool,
    /// Bumped on every arm. The deferred fire task re-validates it under the
    /// lock, so a task surviving an `abort()` race can never fire into a
    /// newer episode.
    epoch: u64,
    armed_at: Option<Instant>,
    deadline: Option<Instant>,
    /// Grace period captured when the current episode was armed.
    timeout: Duration,
    pending: Option<JoinHandle<()>>,
    settle: Option<JoinHandle<()>>,
    /// Minute marks already announced this episode.
    announced: Vec<u64>,
}

impl TimerInner {
    fn new() -> Self {
        Self {
            phase: IdlePhase::Idle,
            session_active: false,
            epoch: 0,
            armed_at: None,
            deadline: None,
            timeout: Duration::ZERO,
            pending: None,
            settle: None,
            announced: Vec::new(),
        }
    }
}

/// The idle timer. Cheap to clone; all clones share one state.
#[derive(Clone)]
pub struct IdleTimer {
    inner: Arc<Mutex<TimerInner>>,
    population: Arc<dyn PopulationSource>,
    policy: Arc<dyn ShutdownPolicy>,
    shutdown: Arc<dyn ShutdownRequester>,
}

impl IdleTimer {
    pub fn new(
        population: Arc<dyn PopulationSource>,
        policy: Arc<dyn ShutdownPolicy>,
        shutdown: Arc<dyn ShutdownRequester>,
    ) -> Self {
        Self {
            inner: Arc::new(Mutex::new(TimerInner::new())),
            population,
            policy,
            shutdown,
        }
    }

    /// Handle a change in the online player count.
    ///
    /// Zero while idle arms the countdown; anyone online while armed cancels
    /// it. Repeated identical signals are no-ops and never reset an armed
    /// deadline.
    pub fn on_population_changed(&self, online: u32) {
        let Some(mut inner) = self.lock() else { return };

        if online == 0 {
            if inner.session_active && inner.phase == IdlePhase::Idle {
                self.arm(&mut inner);
            }
        } else if inner.phase == IdlePhase::Armed {
            Self::disarm(&mut inner);
            info!("Shutdown cancelled - a player has joined the server.");
        }
    }

    /// Periodic tick, used only to surface countdown warnings.
    ///
    /// Announces each remaining-minute threshold at most once per episode.
    /// Never drives the deadline; expiry belongs to the deferred fire task.
    pub fn on_tick(&self) {
        let Some(mut inner) = self.lock() else { return };
        if inner.phase != IdlePhase::Armed {
            return;
        }
        let Some(deadline) = inner.deadline else { return };

        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return;
        }
        let minutes = remaining.as_secs().div_ceil(60);
        if WARN_THRESHOLDS_MINUTES.contains(&minutes) && !inner.announced.contains(&minutes) {
            inner.announced.push(minutes);
            warn!(
                "Server will shut down in {} minute(s) due to no players online.",
                minutes
            );
        }
    }

    /// Reset for a fresh server session and schedule the one-shot settle
    /// check that catches a server starting out empty.
    pub fn on_session_start(&self) {
        let Some(mut inner) = self.lock() else { return };
        Self::disarm(&mut inner);
        if let Some(task) = inner.settle.take() {
            task.abort();
        }
        inner.session_active = true;

        info!("Idle monitor is now watching the player count.");
        info!(
            "Server will shut down after {} minutes of being empty.",
            self.policy.shutdown_delay().as_secs() / 60
        );

        let runtime = match Handle::try_current() {
            Ok(handle) => handle,
            Err(e) => {
                error!("Cannot schedule initial empty check: {}", e);
                return;
            }
        };
        let settle = self.policy.settle_delay();
        let timer = self.clone();
        inner.settle = Some(runtime.spawn(async move {
            sleep(settle).await;
            timer.settle_check();
        }));
    }

    /// Tear down for session stop: cancel anything scheduled and go idle.
    pub fn on_session_stop(&self) {
        let Some(mut inner) = self.lock() else { return };
        Self::disarm(&mut inner);
        if let Some(task) = inner.settle.take() {
            task.abort();
        }
        inner.session_active = false;
        info!("Idle monitor stopped.");
    }

    /// Current phase and remaining time, for the status endpoint.
    pub fn snapshot(&self) -> Result<TimerSnapshot, String> {
        let inner = self
            .inner
            .lock()
            .map_err(|e| format!("Failed to lock timer state: {}", e))?;

        let now = Instant::now();
        let remaining_seconds = match (inner.phase, inner.deadline) {
            (IdlePhase::Armed, Some(deadline)) => {
                Some(deadline.saturating_duration_since(now).as_secs())
            }
            _ => None,
        };
        let armed_seconds = inner
            .armed_at
            .map(|armed_at| now.saturating_duration_since(armed_at).as_secs());

        Ok(TimerSnapshot {
            phase: inner.phase,
            session_active: inner.session_active,
            armed_seconds,
            remaining_seconds,
        })
    }

    /// Start a countdown episode. Caller must hold the lock with the timer
    /// idle; on scheduling failure the state is left untouched.
    fn arm(&self, inner: &mut TimerInner) {
        let runtime = match Handle::try_current() {
            Ok(handle) => handle,
            Err(e) => {
                error!("Cannot schedule idle shutdown: {}", e);
                return;
            }
        };

        let delay = self.policy.shutdown_delay();
        let now = Instant::now();

        inner.epoch += 1;
        inner.phase = IdlePhase::Armed;
        inner.armed_at = Some(now);
        inner.deadline = Some(now + delay);
        inner.timeout = delay;
        inner.announced.clear();

        let epoch = inner.epoch;
        let timer = self.clone();
        inner.pending = Some(runtime.spawn(async move {
            sleep(delay).await;
            timer.fire(epoch);
        }));

        warn!(
            "Server is empty! Scheduling shutdown in {} minutes...",
            delay.as_secs() / 60
        );
    }

    /// Cancel whatever is scheduled and return to idle. Cancelling a fire
    /// task that already started running is harmless; it will find the
    /// epoch or phase changed and back off.
    fn disarm(inner: &mut TimerInner) {
        if let Some(task) = inner.pending.take() {
            task.abort();
        }
        inner.phase = IdlePhase::Idle;
        inner.armed_at = None;
        inner.deadline = None;
        inner.announced.clear();
    }

    /// Deferred fire path: runs when the grace period elapses.
    fn fire(&self, epoch: u64) {
        let Some(mut inner) = self.lock() else { return };
        if inner.epoch != epoch || inner.phase != IdlePhase::Armed {
            // Cancelled or superseded while this task was waking up.
            return;
        }
        inner.phase = IdlePhase::Firing;

        // Double-check: a join may have raced the countdown and not been
        // observed as a cancel yet.
        let online = self.population.current_count();
        let minutes = inner.timeout.as_secs() / 60;
        Self::disarm(&mut inner);

        if online == 0 {
            warn!(
                "Shutting down server due to no players being online for {} minutes.",
                minutes
            );
            self.shutdown.request_shutdown();
        } else {
            info!(
                "Shutdown cancelled - players are now online ({} online).",
                online
            );
        }
    }

    /// One-shot check after session start: a server that came up empty gets
    /// the same treatment as one the last player just left.
    fn settle_check(&self) {
        let Some(mut inner) = self.lock() else { return };
        inner.settle = None;
        if !inner.session_active || inner.phase != IdlePhase::Idle {
            return;
        }
        if self.population.current_count() == 0 {
            debug!("Server started empty, beginning idle countdown.");
            self.arm(&mut inner);
        }
    }

    fn lock(&self) -> Option<MutexGuard<'_, TimerInner>> {
        match self.inner.lock() {
            Ok(guard) => Some(guard),
            Err(_) => {
                error!("Timer state lock poisoned; leaving state untouched");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use tokio::time::advance;

    use super::*;

    struct FakeRoster(AtomicU32);

    impl FakeRoster {
        fn set(&self, online: u32) {
            self.0.store(online, Ordering::SeqCst);
        }
    }

    impl PopulationSource for FakeRoster {
        fn current_count(&self) -> u32 {
            self.0.load(Ordering::SeqCst)
        }
    }

    #[derive(Default)]
    struct RecordingShutdown(AtomicU32);

    impl RecordingShutdown {
        fn count(&self) -> u32 {
            self.0.load(Ordering::SeqCst)
        }
    }

    impl ShutdownRequester for RecordingShutdown {
        fn request_shutdown(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct TestPolicy {
        delay: Mutex<Duration>,
        settle: Duration,
    }

    impl TestPolicy {
        fn set_delay(&self, delay: Duration) {
            *self.delay.lock().unwrap() = delay;
        }
    }

    impl ShutdownPolicy for TestPolicy {
        fn shutdown_delay(&self) -> Duration {
            *self.delay.lock().unwrap()
        }

        fn settle_delay(&self) -> Duration {
            self.settle
        }
    }

    struct Harness {
        timer: IdleTimer,
        roster: Arc<FakeRoster>,
        shutdown: Arc<RecordingShutdown>,
        policy: Arc<TestPolicy>,
    }

    fn harness_with_population(delay: Duration, online: u32) -> Harness {
        let roster = Arc::new(FakeRoster(AtomicU32::new(online)));
        let shutdown = Arc::new(RecordingShutdown::default());
        let policy = Arc::new(TestPolicy {
            delay: Mutex::new(delay),
            settle: Duration::from_secs(5),
        });
        let timer = IdleTimer::new(roster.clone(), policy.clone(), shutdown.clone());
        Harness {
            timer,
            roster,
            shutdown,
            policy,
        }
    }

    /// Population starts at 1 so the settle check stays out of the way.
    fn harness(delay: Duration) -> Harness {
        harness_with_population(delay, 1)
    }

    /// Let spawned timer tasks run on the paused test runtime.
    async fn run_pending() {
        for _ in 0..8 {
            tokio::task::yield_now().await;
        }
    }

    fn phase(h: &Harness) -> IdlePhase {
        h.timer.snapshot().unwrap().phase
    }

    #[tokio::test(start_paused = true)]
    async fn empty_server_fires_after_grace_period() {
        let h = harness(Duration::from_secs(60));
        h.timer.on_session_start();
        run_pending().await;

        h.roster.set(0);
        h.timer.on_population_changed(0);
        run_pending().await;
        assert_eq!(phase(&h), IdlePhase::Armed);

        advance(Duration::from_secs(59)).await;
        run_pending().await;
        assert_eq!(h.shutdown.count(), 0);

        advance(Duration::from_secs(2)).await;
        run_pending().await;
        assert_eq!(h.shutdown.count(), 1);
        assert_eq!(phase(&h), IdlePhase::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn join_cancels_pending_shutdown() {
        let h = harness(Duration::from_secs(60));
        h.timer.on_session_start();
        run_pending().await;

        h.roster.set(0);
        h.timer.on_population_changed(0);
        run_pending().await;
        advance(Duration::from_secs(30)).await;
        run_pending().await;

        h.roster.set(1);
        h.timer.on_population_changed(1);
        assert_eq!(phase(&h), IdlePhase::Idle);

        advance(Duration::from_secs(3600)).await;
        run_pending().await;
        assert_eq!(h.shutdown.count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn rearm_measures_from_new_arm_time() {
        let h = harness(Duration::from_secs(60));
        h.timer.on_session_start();
        run_pending().await;

        h.roster.set(0);
        h.timer.on_population_changed(0);
        run_pending().await;
        advance(Duration::from_secs(30)).await;
        run_pending().await;

        h.roster.set(1);
        h.timer.on_population_changed(1);
        h.roster.set(0);
        h.timer.on_population_changed(0);
        run_pending().await;

        // 75 s after the first arm, but only 45 s into the fresh window
        advance(Duration::from_secs(45)).await;
        run_pending().await;
        assert_eq!(h.shutdown.count(), 0);

        advance(Duration::from_secs(20)).await;
        run_pending().await;
        assert_eq!(h.shutdown.count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn duplicate_empty_signal_keeps_the_deadline() {
        let h = harness(Duration::from_secs(600));
        h.timer.on_session_start();
        run_pending().await;

        h.roster.set(0);
        h.timer.on_population_changed(0);
        run_pending().await;
        advance(Duration::from_secs(100)).await;
        run_pending().await;

        h.timer.on_population_changed(0);
        let snapshot = h.timer.snapshot().unwrap();
        assert_eq!(snapshot.phase, IdlePhase::Armed);
        assert_eq!(snapshot.armed_seconds, Some(100));
        assert_eq!(snapshot.remaining_seconds, Some(500));

        let inner = h.timer.inner.lock().unwrap();
        assert_eq!(inner.epoch, 1);
        assert!(inner.pending.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn arming_twice_schedules_one_callback() {
        let h = harness(Duration::from_secs(60));
        h.timer.on_session_start();
        run_pending().await;

        h.roster.set(0);
        h.timer.on_population_changed(0);
        h.timer.on_population_changed(0);
        run_pending().await;

        advance(Duration::from_secs(61)).await;
        run_pending().await;
        assert_eq!(h.shutdown.count(), 1);

        advance(Duration::from_secs(3600)).await;
        run_pending().await;
        assert_eq!(h.shutdown.count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn late_join_beats_the_deferred_fire() {
        let h = harness(Duration::from_secs(60));
        h.timer.on_session_start();
        run_pending().await;

        h.roster.set(0);
        h.timer.on_population_changed(0);
        run_pending().await;

        // The join lands as the countdown expires, before any cancel signal
        // reaches the timer. The fire-time double-check must catch it.
        h.roster.set(1);
        advance(Duration::from_secs(61)).await;
        run_pending().await;

        assert_eq!(h.shutdown.count(), 0);
        assert_eq!(phase(&h), IdlePhase::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn session_stop_prevents_late_fires() {
        let h = harness(Duration::from_secs(60));
        h.timer.on_session_start();
        run_pending().await;

        h.roster.set(0);
        h.timer.on_population_changed(0);
        h.timer.on_session_stop();

        let snapshot = h.timer.snapshot().unwrap();
        assert_eq!(snapshot.phase, IdlePhase::Idle);
        assert!(!snapshot.session_active);

        advance(Duration::from_secs(7200)).await;
        run_pending().await;
        assert_eq!(h.shutdown.count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn settle_check_arms_a_server_that_starts_empty() {
        let h = harness_with_population(Duration::from_secs(60), 0);
        h.timer.on_session_start();
        run_pending().await;

        // Ticks during the settle wait must not arm anything.
        h.timer.on_tick();
        advance(Duration::from_secs(4)).await;
        run_pending().await;
        h.timer.on_tick();
        assert_eq!(phase(&h), IdlePhase::Idle);

        advance(Duration::from_secs(2)).await;
        run_pending().await;
        assert_eq!(phase(&h), IdlePhase::Armed);

        advance(Duration::from_secs(61)).await;
        run_pending().await;
        assert_eq!(h.shutdown.count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn join_while_idle_is_a_noop() {
        let h = harness(Duration::from_secs(60));
        h.timer.on_session_start();
        run_pending().await;

        h.timer.on_population_changed(5);
        assert_eq!(phase(&h), IdlePhase::Idle);
        assert_eq!(h.timer.inner.lock().unwrap().epoch, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn policy_change_does_not_move_an_armed_deadline() {
        let h = harness(Duration::from_secs(60));
        h.timer.on_session_start();
        run_pending().await;

        h.roster.set(0);
        h.timer.on_population_changed(0);
        run_pending().await;
        h.policy.set_delay(Duration::from_secs(600));

        // The running episode keeps its 60 s window.
        advance(Duration::from_secs(61)).await;
        run_pending().await;
        assert_eq!(h.shutdown.count(), 1);

        // A fresh arm picks up the new value.
        h.timer.on_population_changed(0);
        run_pending().await;
        advance(Duration::from_secs(61)).await;
        run_pending().await;
        assert_eq!(h.shutdown.count(), 1);

        advance(Duration::from_secs(550)).await;
        run_pending().await;
        assert_eq!(h.shutdown.count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn countdown_warnings_announce_each_threshold_once() {
        let h = harness(Duration::from_secs(16 * 60));
        h.timer.on_session_start();
        run_pending().await;

        h.roster.set(0);
        h.timer.on_population_changed(0);
        run_pending().await;

        h.timer.on_tick();
        assert!(h.timer.inner.lock().unwrap().announced.is_empty());

        advance(Duration::from_secs(60)).await;
        run_pending().await;
        h.timer.on_tick();
        h.timer.on_tick();
        assert_eq!(h.timer.inner.lock().unwrap().announced, vec![15]);

        advance(Duration::from_secs(5 * 60)).await;
        run_pending().await;
        h.timer.on_tick();
        assert_eq!(h.timer.inner.lock().unwrap().announced, vec![15, 10]);

        advance(Duration::from_secs(5 * 60)).await;
        run_pending().await;
        h.timer.on_tick();
        advance(Duration::from_secs(4 * 60)).await;
        run_pending().await;
        h.timer.on_tick();
        assert_eq!(h.timer.inner.lock().unwrap().announced, vec![15, 10, 5, 1]);
    }

    #[test]
    fn arming_without_a_runtime_stays_idle() {
        let h = harness_with_population(Duration::from_secs(60), 0);
        h.timer.inner.lock().unwrap().session_active = true;

        // No tokio runtime here: scheduling fails and the timer must stay
        // idle rather than corrupt its state.
        h.timer.on_population_changed(0);

        let snapshot = h.timer.snapshot().unwrap();
        assert_eq!(snapshot.phase, IdlePhase::Idle);
        assert_eq!(h.shutdown.count(), 0);
    }
}
