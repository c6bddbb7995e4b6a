// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Clock abstraction for testable time handling.
//!
//! All on-disk timestamps are local naive datetimes, so the clock hands out
//! `NaiveDateTime` rather than `Instant`. The watcher owns its own sleep;
//! tests drive single ticks and advance a `FakeClock` by hand.

use chrono::NaiveDateTime;

/// A clock that provides the current local time.
pub trait Clock: Clone + Send + Sync + 'static {
    fn now(&self) -> NaiveDateTime;
}

/// Real system clock.
#[derive(Clone, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        chrono::Local::now().naive_local()
    }
}

/// Fake clock for testing with controllable time.
#[cfg(any(test, feature = "test-support"))]
#[derive(Clone)]
pub struct FakeClock {
    current: std::sync::Arc<parking_lot::Mutex<NaiveDateTime>>,
}

#[cfg(any(test, feature = "test-support"))]
impl FakeClock {
    pub fn new(start: NaiveDateTime) -> Self {
        Self {
            current: std::sync::Arc::new(parking_lot::Mutex::new(start)),
        }
    }

    /// Parse a fixed starting instant from an ISO string.
    pub fn at(iso: &str) -> Self {
        let dt = crate::time::parse_iso(iso)
            .unwrap_or_else(|| chrono::Local::now().naive_local());
        Self::new(dt)
    }

    /// Advance the clock by the given number of seconds.
    pub fn advance_secs(&self, secs: i64) {
        *self.current.lock() += chrono::Duration::seconds(secs);
    }

    /// Set the clock to a specific instant.
    pub fn set(&self, dt: NaiveDateTime) {
        *self.current.lock() = dt;
    }
}

#[cfg(any(test, feature = "test-support"))]
impl Clock for FakeClock {
    fn now(&self) -> NaiveDateTime {
        *self.current.lock()
    }
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;
