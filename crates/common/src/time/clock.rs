//! Wall-clock abstraction.
//!
//! Token expiry and sync timestamps are wall-clock values, so the clock hands
//! out `DateTime<Utc>` rather than monotonic instants.
//!
//! ```
//! use backoffice_common::time::{Clock, MockClock};
//! use chrono::Duration;
//!
//! let clock = MockClock::new();
//! let start = clock.now();
//! clock.advance(Duration::seconds(5));
//! assert_eq!(clock.now() - start, Duration::seconds(5));
//! ```

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;

pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> DateTime<Utc>;
}

/// Real system clock for production use
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

impl<T: Clock> Clock for Arc<T> {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}

/// Manually driven clock for tests. Clones share the same time.
#[derive(Debug, Clone)]
pub struct MockClock {
    current: Arc<Mutex<DateTime<Utc>>>,
}

impl MockClock {
    pub fn new() -> Self {
        Self::at(Utc::now())
    }

    pub fn at(start: DateTime<Utc>) -> Self {
        Self { current: Arc::new(Mutex::new(start)) }
    }

    pub fn advance(&self, by: Duration) {
        let mut current = self.current.lock();
        *current += by;
    }

    pub fn set(&self, to: DateTime<Utc>) {
        *self.current.lock() = to;
    }
}

impl Default for MockClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MockClock {
    fn now(&self) -> DateTime<Utc> {
        *self.current.lock()
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn mock_clock_clones_share_time() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let clock = MockClock::at(start);
        let shared = clock.clone();

        shared.advance(Duration::minutes(10));
        assert_eq!(clock.now(), start + Duration::minutes(10));

        clock.set(start);
        assert_eq!(shared.now(), start);
    }

    #[test]
    fn arc_clock_delegates() {
        let clock = Arc::new(MockClock::new());
        let before = clock.now();
        clock.advance(Duration::seconds(1));
        assert_eq!(Clock::now(&clock) - before, Duration::seconds(1));
    }
}
