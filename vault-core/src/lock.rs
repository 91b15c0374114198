//! Epoch lock
//!
//! A time-windowed gate over liquidity operations. Each cycle is a lock
//! period followed by an unlock period, repeating from a fixed origin. The
//! lock is a pure function of wall-clock time; it mutates nothing.

use crate::config::EpochLockConfig;
use chrono::{DateTime, Duration, Utc};

/// Recurring lock/unlock cycle anchored at a fixed start time
#[derive(Debug, Clone)]
pub struct EpochLock {
    start_time: DateTime<Utc>,
    lock_period: Duration,
    unlock_period: Duration,
}

impl EpochLock {
    /// Build from configuration
    pub fn new(config: &EpochLockConfig) -> Self {
        Self {
            start_time: config.start_time,
            lock_period: Duration::seconds(config.lock_period_secs as i64),
            unlock_period: Duration::seconds(config.unlock_period_secs as i64),
        }
    }

    /// Whether `now` falls inside the locked window of the current cycle
    ///
    /// With cycle boundary `t0`, the locked window is `(t0, t0 + lock]`:
    /// open at the boundary itself, closed at the end of the lock period.
    pub fn is_locked(&self, now: DateTime<Utc>) -> bool {
        let cycle = self.lock_period + self.unlock_period;
        let elapsed = (now - self.start_time).num_seconds();
        if elapsed <= 0 {
            return false;
        }

        let epochs = elapsed.div_euclid(cycle.num_seconds());
        let t0 = self.start_time + Duration::seconds(epochs * cycle.num_seconds());
        let into_cycle = now - t0;

        into_cycle > Duration::zero() && into_cycle <= self.lock_period
    }

    /// End of the lock window containing or preceding `now`
    ///
    /// Used for the error callers see while locked.
    pub fn unlock_at(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let cycle = self.lock_period + self.unlock_period;
        let elapsed = (now - self.start_time).num_seconds().max(0);
        let epochs = elapsed.div_euclid(cycle.num_seconds());
        self.start_time + Duration::seconds(epochs * cycle.num_seconds()) + self.lock_period
    }
}
