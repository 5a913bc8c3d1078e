//! Minimum spacing between consecutive deliveries of one transport

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use parking_lot::Mutex;
use smsgate_common::tracing;

use crate::clock::Clock;

#[derive(Debug)]
struct ThrottleState {
    rate: f64,
    last_sent: Option<Instant>,
}

/// Enforces at most `rate` sends per second
///
/// A rate of zero (or below) disables throttling.
#[derive(Debug)]
pub struct Throttle {
    state: Mutex<ThrottleState>,
    clock: Arc<dyn Clock>,
}

impl Throttle {
    #[must_use]
    pub fn new(rate: f64, clock: Arc<dyn Clock>) -> Self {
        let throttle = Self {
            state: Mutex::new(ThrottleState {
                rate: 0.0,
                last_sent: None,
            }),
            clock,
        };
        throttle.set_max_per_second(rate);
        throttle
    }

    /// Change the rate; a non-positive rate disables throttling and forgets the
    /// last send
    ///
    /// `NaN` counts as non-positive.
    pub fn set_max_per_second(&self, rate: f64) {
        let mut state = self.state.lock();

        if rate > 0.0 {
            state.rate = rate;
        } else {
            state.rate = 0.0;
            state.last_sent = None;
        }
    }

    #[must_use]
    pub fn max_per_second(&self) -> f64 {
        self.state.lock().rate
    }

    /// Block until the next send is allowed, then record it
    pub fn wait(&self) {
        let mut state = self.state.lock();

        if state.rate <= 0.0 {
            return;
        }

        let interval = 1.0 / state.rate;

        if let Some(last_sent) = state.last_sent {
            let elapsed = self.clock.now().saturating_duration_since(last_sent);
            let sleep = interval - elapsed.as_secs_f64();

            if sleep > 0.0 {
                match Duration::try_from_secs_f64(sleep) {
                    Ok(duration) => {
                        tracing::debug!(seconds = sleep, "Throttling delivery");
                        self.clock.sleep(duration);
                    }
                    Err(err) => {
                        tracing::warn!(seconds = sleep, %err, "Throttle interval out of range");
                    }
                }
            }
        }

        state.last_sent = Some(self.clock.now());
    }
}
