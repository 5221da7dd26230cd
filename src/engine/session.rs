//! Run-scoped session state: the stop flag and the rate-limit cool-down.
//!
//! Both flags live on one shared object handed into the worker by reference,
//! reset at the start of every run. The embedding layer (CLI signal handler,
//! UI stop button) only ever calls [`SessionControl::request_stop`]; the
//! worker owns everything else.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::time::Instant;

/// Upper bound on any single uninterruptible sleep, so a stop request is
/// observed within one second even mid-cool-down.
const WAIT_SLICE: Duration = Duration::from_secs(1);

/// Poll interval while parked waiting for the stop flag itself.
const STOP_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Shared stop/cool-down state for one download session.
#[derive(Debug)]
pub struct SessionControl {
    stop: AtomicBool,
    cooldown_until: Mutex<Option<Instant>>,
}

impl SessionControl {
    /// Creates a fresh control with no stop requested and no cool-down.
    #[must_use]
    pub fn new() -> Self {
        Self {
            stop: AtomicBool::new(false),
            cooldown_until: Mutex::new(None),
        }
    }

    /// Clears both flags. Called at the start of every run.
    pub fn reset(&self) {
        self.stop.store(false, Ordering::SeqCst);
        self.set_deadline(None);
    }

    /// Requests a clean stop.
    ///
    /// Also drops any active cool-down so the worker is not left parked
    /// waiting out a limit that no longer matters.
    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
        self.set_deadline(None);
    }

    /// True once a stop has been requested.
    #[must_use]
    pub fn stop_requested(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }

    /// Arms the rate-limit cool-down for the given duration from now.
    pub fn begin_cooldown(&self, duration: Duration) {
        self.set_deadline(Some(Instant::now() + duration));
    }

    /// Clears the cool-down without waiting it out.
    pub fn clear_cooldown(&self) {
        self.set_deadline(None);
    }

    /// Time left on the cool-down; `None` when inactive or already elapsed.
    #[must_use]
    pub fn cooldown_remaining(&self) -> Option<Duration> {
        self.deadline()
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
            .filter(|remaining| !remaining.is_zero())
    }

    /// Parks until a stop is requested. Used to race capability calls.
    pub async fn wait_for_stop(&self) {
        while !self.stop_requested() {
            tokio::time::sleep(STOP_POLL_INTERVAL).await;
        }
    }

    /// Blocks until the active cool-down elapses, in bounded slices.
    ///
    /// Returns `true` once clear to proceed (the flag is also cleared), or
    /// `false` when a stop request arrived first.
    pub async fn wait_out_cooldown(&self) -> bool {
        loop {
            if self.stop_requested() {
                return false;
            }
            match self.cooldown_remaining() {
                None => {
                    self.clear_cooldown();
                    return true;
                }
                Some(remaining) => tokio::time::sleep(remaining.min(WAIT_SLICE)).await,
            }
        }
    }

    /// Sleeps for the full duration unless a stop arrives first.
    ///
    /// Returns `true` after a full sleep, `false` when cut short by a stop.
    pub async fn sleep_cancellable(&self, duration: Duration) -> bool {
        let deadline = Instant::now() + duration;
        loop {
            if self.stop_requested() {
                return false;
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return true;
            }
            tokio::time::sleep(remaining.min(WAIT_SLICE)).await;
        }
    }

    fn set_deadline(&self, value: Option<Instant>) {
        // A poisoned lock only means some thread panicked while writing this
        // plain value; the data is still usable.
        let mut guard = match self.cooldown_until.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = value;
    }

    fn deadline(&self) -> Option<Instant> {
        let guard = match self.cooldown_until.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard
    }
}

impl Default for SessionControl {
    fn default() -> Self {
        Self::new()
    }
}
