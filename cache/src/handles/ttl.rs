use super::Cache;
use crate::policy::TtlPolicy;
use crate::task::sweeper::{clamp_clean_interval, Sweeper};

use std::hash::{BuildHasher, Hash};
use std::sync::Arc;
use std::time::Duration;

/// A thread-safe cache whose entries expire a fixed time after they were
/// last written.
///
/// Expired entries are dropped lazily by `get` and in bulk by a background
/// sweeper thread. The sweeper holds only a weak reference to the cache and
/// stops when the last handle is dropped.
pub type TtlCache<K, V, H = ahash::RandomState> = Cache<K, V, TtlPolicy<K, V, H>>;

impl<K, V, H> Cache<K, V, TtlPolicy<K, V, H>>
where
  K: Eq + Hash + Clone + Send + Sync + 'static,
  V: Send + Sync + 'static,
  H: BuildHasher + Send + Sync + 'static,
{
  pub fn time_to_live(&self) -> Duration {
    self.shared.policy.read().time_to_live()
  }

  /// Replaces the time-to-live for new and existing entries. Values below
  /// one second are raised to one second.
  pub fn reset_ttl(&self, ttl: Duration) {
    let mut policy = self.shared.policy.write();
    policy.set_time_to_live(ttl);
    tracing::debug!(ttl = ?policy.time_to_live(), "time-to-live reset");
  }

  /// Keys from least to most recently used, including expired entries the
  /// sweeper has not reached yet.
  pub fn keys(&self) -> Vec<K> {
    self.shared.policy.read().keys().cloned().collect()
  }

  /// Drops every expired entry now. Returns how many were dropped.
  pub fn purge_expired(&self) -> usize {
    self.shared.policy.write().expire()
  }

  /// Stops the background sweeper, waiting for an in-flight sweep to end.
  /// Does nothing if it is already stopped.
  pub fn stop_sweeper(&self) {
    let stopped = self.shared.sweeper.lock().take();
    // Joined outside the slot lock so a concurrent restart cannot block on it.
    drop(stopped);
  }

  /// Replaces the background sweeper with one running every `interval`,
  /// raised to at least two seconds. Works whether or not a sweeper is
  /// currently running.
  pub fn restart_sweeper(&self, interval: Duration) {
    let interval = clamp_clean_interval(interval);
    let fresh = self.spawn_sweeper(interval);
    let previous = std::mem::replace(&mut *self.shared.sweeper.lock(), fresh);
    drop(previous);
    tracing::debug!(?interval, "sweeper restarted");
  }

  pub fn is_sweeping(&self) -> bool {
    self.shared.sweeper.lock().is_some()
  }

  /// The interval of the running sweeper, if any.
  pub fn clean_interval(&self) -> Option<Duration> {
    self.shared.sweeper.lock().as_ref().map(Sweeper::interval)
  }

  fn spawn_sweeper(&self, interval: Duration) -> Option<Sweeper> {
    let weak = Arc::downgrade(&self.shared);
    Sweeper::spawn(interval, move || {
      let Some(shared) = weak.upgrade() else {
        return false;
      };
      let expired = shared.policy.write().expire();
      tracing::trace!(expired, "swept expired entries");
      true
    })
  }

  pub(crate) fn start_sweeper(&self, interval: Duration) {
    let sweeper = self.spawn_sweeper(interval);
    *self.shared.sweeper.lock() = sweeper;
  }
}
