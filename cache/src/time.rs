use once_cell::sync::Lazy;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

// The single, static reference point for all time calculations in the cache.
// It is initialized lazily on its first use.
static CACHE_EPOCH: Lazy<Instant> = Lazy::new(Instant::now);

/// A helper to get the current time as a `Duration` since the epoch.
#[inline]
pub(crate) fn now_duration() -> Duration {
  Instant::now().saturating_duration_since(*CACHE_EPOCH)
}

/// A monotonic time source for entry timestamps.
///
/// Readings are durations since an arbitrary fixed origin; only their
/// differences are meaningful.
pub trait Clock: Send + Sync + fmt::Debug {
  fn now(&self) -> Duration;
}

/// The process-wide monotonic clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
  #[inline]
  fn now(&self) -> Duration {
    now_duration()
  }
}

/// A clock that only moves when told to. Intended for tests.
#[derive(Debug, Default)]
pub struct ManualClock {
  nanos: AtomicU64,
}

impl ManualClock {
  pub fn new() -> Self {
    Self::default()
  }

  /// Moves the clock forward by `by`.
  pub fn advance(&self, by: Duration) {
    self
      .nanos
      .fetch_add(by.as_nanos() as u64, Ordering::SeqCst);
  }

  /// Sets the absolute reading.
  pub fn set(&self, to: Duration) {
    self.nanos.store(to.as_nanos() as u64, Ordering::SeqCst);
  }
}

impl Clock for ManualClock {
  fn now(&self) -> Duration {
    Duration::from_nanos(self.nanos.load(Ordering::SeqCst))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn system_clock_is_monotonic() {
    let a = SystemClock.now();
    let b = SystemClock.now();
    assert!(b >= a);
  }

  #[test]
  fn manual_clock_moves_only_when_told() {
    let clock = ManualClock::new();
    assert_eq!(clock.now(), Duration::ZERO);
    clock.advance(Duration::from_millis(1500));
    assert_eq!(clock.now(), Duration::from_millis(1500));
    clock.set(Duration::from_secs(10));
    assert_eq!(clock.now(), Duration::from_secs(10));
  }
}
