//! Test clock: deterministic `Clock` implementation for tests.

use branchtale_core::clock::Clock;
use chrono::{DateTime, Utc};

/// A clock that always returns a fixed point in time.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl FixedClock {
    /// The instant used across the workspace's tests.
    ///
    /// # Panics
    ///
    /// Never; the date literal is valid.
    #[must_use]
    pub fn reference() -> Self {
        Self(chrono::TimeZone::with_ymd_and_hms(&Utc, 2026, 1, 15, 10, 0, 0).unwrap())
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
