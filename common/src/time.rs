// Time types and the clock the sale window guards read as "current time".
//
// IMPORTANT NOTE:
// SystemClock reads SystemTime::now() and is NON-DETERMINISTIC.
// Replays and tests must drive the controller with a ManualClock so that
// every window comparison is reproducible.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use thiserror::Error;

// Seconds timestamps used to determine it using its type
pub type TimestampSeconds = u64;

#[inline]
pub fn get_current_time() -> Duration {
    // A clock set before 1970 is treated as the epoch itself
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
}

// Return timestamp in seconds
pub fn get_current_time_in_seconds() -> TimestampSeconds {
    get_current_time().as_secs()
}

/// Source of "current time" for the sale window guards.
pub trait Clock: Send + Sync + std::fmt::Debug {
    fn now(&self) -> TimestampSeconds;
}

/// Wall clock backed by the system time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> TimestampSeconds {
        get_current_time_in_seconds()
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ClockError {
    #[error("Clock cannot move backwards: current {current}, requested {requested}")]
    Backwards {
        current: TimestampSeconds,
        requested: TimestampSeconds,
    },

    #[error("Clock overflow")]
    Overflow,
}

/// Manually driven clock. Time only moves forward.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    pub fn new(start: TimestampSeconds) -> Self {
        Self {
            now: AtomicU64::new(start),
        }
    }

    /// Jump to `time`. Setting the current time again is a no-op.
    pub fn set(&self, time: TimestampSeconds) -> Result<(), ClockError> {
        let current = self.now.load(Ordering::SeqCst);
        if time < current {
            return Err(ClockError::Backwards {
                current,
                requested: time,
            });
        }
        self.now.store(time, Ordering::SeqCst);
        Ok(())
    }

    pub fn advance(&self, seconds: TimestampSeconds) -> Result<TimestampSeconds, ClockError> {
        let current = self.now.load(Ordering::SeqCst);
        let next = current.checked_add(seconds).ok_or(ClockError::Overflow)?;
        self.now.store(next, Ordering::SeqCst);
        Ok(next)
    }
}

impl Clock for ManualClock {
    fn now(&self) -> TimestampSeconds {
        self.now.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_moves_forward_only() {
        let clock = ManualClock::new(100);
        assert_eq!(clock.now(), 100);

        assert_eq!(clock.advance(10), Ok(110));
        assert_eq!(clock.set(110), Ok(()));
        assert_eq!(clock.set(200), Ok(()));
        assert_eq!(clock.now(), 200);

        assert_eq!(
            clock.set(150),
            Err(ClockError::Backwards {
                current: 200,
                requested: 150
            })
        );
        assert_eq!(clock.now(), 200);
    }

    #[test]
    fn manual_clock_advance_overflow() {
        let clock = ManualClock::new(u64::MAX - 1);
        assert_eq!(clock.advance(2), Err(ClockError::Overflow));
        assert_eq!(clock.now(), u64::MAX - 1);
    }

    #[test]
    fn system_clock_is_after_epoch() {
        assert!(SystemClock.now() > 0);
    }
}
