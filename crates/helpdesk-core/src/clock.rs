//! Time source abstraction.
//!
//! The engine stamps every mutation and its history row from one clock
//! reading, so tests that need to assert timestamp equality (or strict
//! ordering across operations) swap in a deterministic clock.

use chrono::{DateTime, Duration, Utc};
use std::sync::atomic::{AtomicI64, Ordering};

/// A source of wall-clock time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Production clock: `Utc::now()`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Deterministic clock for tests: starts at a base instant and advances a
/// fixed step on every reading.
#[derive(Debug)]
pub struct SteppingClock {
    base: DateTime<Utc>,
    step_millis: i64,
    ticks: AtomicI64,
}

impl SteppingClock {
    #[must_use]
    pub const fn new(base: DateTime<Utc>, step_millis: i64) -> Self {
        Self {
            base,
            step_millis,
            ticks: AtomicI64::new(0),
        }
    }
}

impl Clock for SteppingClock {
    fn now(&self) -> DateTime<Utc> {
        let n = self.ticks.fetch_add(1, Ordering::Relaxed);
        self.base + Duration::milliseconds(self.step_millis.saturating_mul(n))
    }
}
