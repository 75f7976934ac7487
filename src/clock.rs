//! Wall-clock source for task timestamps and reminder scans
//!
//! Due dates are entered as local calendar values, so "now" is the local
//! naive time rather than UTC.

use chrono::{Duration, Local, NaiveDateTime};
use std::sync::{Arc, PoisonError, RwLock};

pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

/// Reads the system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Manually driven clock for tests and replays.
#[derive(Debug, Clone)]
pub struct ManualClock {
    current: Arc<RwLock<NaiveDateTime>>,
}

impl ManualClock {
    pub fn new(start: NaiveDateTime) -> Self {
        Self {
            current: Arc::new(RwLock::new(start)),
        }
    }

    pub fn set(&self, time: NaiveDateTime) {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = time;
    }

    pub fn advance(&self, by: Duration) {
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        *current += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> NaiveDateTime {
        *self.current.read().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn start() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 1)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_manual_clock_advance() {
        let clock = ManualClock::new(start());
        clock.advance(Duration::hours(3));
        assert_eq!(clock.now(), start() + Duration::hours(3));
    }

    #[test]
    fn test_manual_clock_clones_share_time() {
        let clock = ManualClock::new(start());
        let shared = clock.clone();
        shared.set(start() + Duration::days(1));
        assert_eq!(clock.now(), start() + Duration::days(1));
    }
}
