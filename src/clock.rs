//! Monotonic millisecond clock abstraction.
//!
//! Record timestamps and staleness math use monotonic milliseconds rather
//! than wall time so that system clock adjustments cannot evict live records.

use std::time::Instant;

/// Source of monotonic millisecond timestamps.
pub trait Clock: Send + Sync {
    /// Milliseconds elapsed since some fixed origin.
    fn now_ms(&self) -> u64;
}

/// Production clock backed by [`Instant`], origin at construction.
#[derive(Debug)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }
}

/// Manually advanced clock for tests.
#[cfg(any(test, feature = "testkit"))]
pub struct ManualClock {
    now: parking_lot::Mutex<u64>,
}

#[cfg(any(test, feature = "testkit"))]
impl ManualClock {
    #[must_use]
    pub fn new(start_ms: u64) -> Self {
        Self {
            now: parking_lot::Mutex::new(start_ms),
        }
    }

    pub fn advance(&self, ms: u64) {
        *self.now.lock() += ms;
    }

    pub fn set(&self, ms: u64) {
        *self.now.lock() = ms;
    }
}

#[cfg(any(test, feature = "testkit"))]
impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        *self.now.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_clock_is_monotonic() {
        let clock = SystemClock::new();
        let a = clock.now_ms();
        let b = clock.now_ms();
        assert!(b >= a);
    }

    #[test]
    fn manual_clock_advances() {
        let clock = ManualClock::new(100);
        assert_eq!(clock.now_ms(), 100);
        clock.advance(6000);
        assert_eq!(clock.now_ms(), 6100);
        clock.set(0);
        assert_eq!(clock.now_ms(), 0);
    }
}
