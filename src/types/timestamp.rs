use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use serde::{Deserialize, Serialize};

/// Milliseconds since the Unix epoch.
///
/// All quota arithmetic happens at millisecond precision, which is also the
/// precision reported back to callers as `next-reset`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(pub u64);

impl Timestamp {
    pub fn from_millis(millis: u64) -> Self {
        Timestamp(millis)
    }

    pub fn as_millis(&self) -> u64 {
        self.0
    }

    /// Elapsed time from `earlier` to `self`, zero if `earlier` is in the future.
    pub fn millis_since(&self, earlier: Timestamp) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

impl std::ops::Sub for Timestamp {
    type Output = Duration;

    fn sub(self, other: Timestamp) -> Duration {
        Duration::from_millis(self.millis_since(other))
    }
}

/// Whole milliseconds in `duration`, saturating at `u64::MAX`.
pub fn duration_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Source of evaluation times for the quota engine.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// Wall clock that never runs backwards.
///
/// If the system clock steps back (NTP adjustment) the last observed value is
/// returned until wall time catches up again.
pub struct SystemClock {
    high_water: AtomicU64,
}

impl SystemClock {
    pub fn new() -> Self {
        SystemClock {
            high_water: AtomicU64::new(0),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        let wall_clock = duration_millis(
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default(),
        );

        let previous = self.high_water.fetch_max(wall_clock, Ordering::SeqCst);
        Timestamp(previous.max(wall_clock))
    }
}

/// Clock driven by hand, for tests and benchmarks.
pub struct ManualClock {
    current: AtomicU64,
}

impl ManualClock {
    pub fn new(start: Timestamp) -> Self {
        ManualClock {
            current: AtomicU64::new(start.0),
        }
    }

    pub fn advance(&self, by: Duration) -> Timestamp {
        let step = duration_millis(by);
        Timestamp(self.current.fetch_add(step, Ordering::SeqCst) + step)
    }

    pub fn set(&self, to: Timestamp) {
        self.current.store(to.0, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        Timestamp(self.current.load(Ordering::SeqCst))
    }
}
