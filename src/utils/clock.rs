// src/utils/clock.rs

//! Time source used for throttling, backoff and timestamps.
//!
//! Every wait in a run goes through a [`Clock`], so tests can drive
//! the retry and pacing logic without real sleeps.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Monotonic time, wall-clock time and sleeping.
#[async_trait]
pub trait Clock: Send + Sync {
    /// Monotonic instant for measuring request spacing.
    fn now(&self) -> Instant;

    /// Current UTC wall-clock time for persisted timestamps.
    fn utc_now(&self) -> DateTime<Utc>;

    /// Block the current task for `duration`.
    async fn sleep(&self, duration: Duration);
}

/// Real clock backed by the system and the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn utc_now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    async fn sleep(&self, duration: Duration) {
        if !duration.is_zero() {
            tokio::time::sleep(duration).await;
        }
    }
}

#[cfg(test)]
pub use manual::ManualClock;

#[cfg(test)]
mod manual {
    use std::sync::Mutex;

    use super::*;

    /// Clock that only moves when slept on or advanced; records every sleep.
    pub struct ManualClock {
        inner: Mutex<State>,
    }

    struct State {
        base: Instant,
        start_utc: DateTime<Utc>,
        elapsed: Duration,
        sleeps: Vec<Duration>,
    }

    impl ManualClock {
        pub fn new() -> Self {
            Self::starting_at(Utc::now())
        }

        pub fn starting_at(start_utc: DateTime<Utc>) -> Self {
            Self {
                inner: Mutex::new(State {
                    base: Instant::now(),
                    start_utc,
                    elapsed: Duration::ZERO,
                    sleeps: Vec::new(),
                }),
            }
        }

        /// Move time forward without recording a sleep.
        pub fn advance(&self, duration: Duration) {
            self.inner.lock().unwrap().elapsed += duration;
        }

        /// Every duration passed to `sleep`, in order.
        pub fn sleeps(&self) -> Vec<Duration> {
            self.inner.lock().unwrap().sleeps.clone()
        }
    }

    #[async_trait]
    impl Clock for ManualClock {
        fn now(&self) -> Instant {
            let state = self.inner.lock().unwrap();
            state.base + state.elapsed
        }

        fn utc_now(&self) -> DateTime<Utc> {
            let state = self.inner.lock().unwrap();
            state.start_utc + chrono::Duration::from_std(state.elapsed).unwrap()
        }

        async fn sleep(&self, duration: Duration) {
            let mut state = self.inner.lock().unwrap();
            state.elapsed += duration;
            state.sleeps.push(duration);
        }
    }
}
