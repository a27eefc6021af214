//! Time sources for the registry stores
//!
//! Stores never read the wall clock themselves. The API layer and the
//! expiry sweeper ask an injected [`Clock`] for the current instant, so tests
//! can drive expiry deterministically with a [`ManualClock`].

use std::fmt;
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};

/// Abstraction over the current time
pub trait Clock: Send + Sync + fmt::Debug {
    /// Returns the current instant in UTC.
    fn now(&self) -> DateTime<Utc>;
}

/// Production clock backed by the system time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock whose time only moves when told to
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    /// Set the clock to an absolute instant
    pub fn set(&self, instant: DateTime<Utc>) {
        *self.lock() = instant;
    }

    /// Move the clock forward by `delta`
    pub fn advance(&self, delta: Duration) {
        let mut now = self.lock();
        *now += delta;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, DateTime<Utc>> {
        // a poisoned clock still holds a valid instant
        self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(Utc::now())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.lock()
    }
}
