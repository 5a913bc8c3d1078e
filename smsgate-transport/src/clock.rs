//! Time source for routers and throttles

use std::{
    fmt::Debug,
    sync::Arc,
    time::{Duration, Instant},
};

use parking_lot::Mutex;

/// Reads the current time and blocks the calling thread
pub trait Clock: Send + Sync + Debug {
    fn now(&self) -> Instant;

    fn sleep(&self, duration: Duration);
}

/// Wall clock backed by [`Instant::now`] and [`std::thread::sleep`]
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// A clock that only moves when told to
///
/// `sleep` advances the clock instead of blocking, and every sleep is recorded
/// so tests can assert on the exact durations requested.
#[derive(Debug, Clone)]
pub struct ManualClock {
    inner: Arc<Mutex<ManualState>>,
}

#[derive(Debug)]
struct ManualState {
    now: Instant,
    sleeps: Vec<Duration>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualClock {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(ManualState {
                now: Instant::now(),
                sleeps: Vec::new(),
            })),
        }
    }

    /// Move the clock forward without recording a sleep
    pub fn advance(&self, duration: Duration) {
        self.inner.lock().now += duration;
    }

    /// Every duration passed to [`Clock::sleep`] so far
    #[must_use]
    pub fn sleeps(&self) -> Vec<Duration> {
        self.inner.lock().sleeps.clone()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.inner.lock().now
    }

    fn sleep(&self, duration: Duration) {
        let mut state = self.inner.lock();
        state.now += duration;
        state.sleeps.push(duration);
    }
}
