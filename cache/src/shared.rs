use crate::metrics::Metrics;
use crate::task::sweeper::Sweeper;

use std::fmt;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

/// The internal, thread-safe core of the cache.
pub(crate) struct CacheShared<P> {
  pub(crate) policy: RwLock<P>,
  pub(crate) metrics: Arc<Metrics>,
  /// Only ever populated for TTL caches.
  pub(crate) sweeper: Mutex<Option<Sweeper>>,
}

impl<P> CacheShared<P> {
  pub(crate) fn new(policy: P, metrics: Arc<Metrics>) -> Self {
    Self {
      policy: RwLock::new(policy),
      metrics,
      sweeper: Mutex::new(None),
    }
  }
}

impl<P: fmt::Debug> fmt::Debug for CacheShared<P> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("CacheShared")
      .field("policy", &self.policy)
      .field("metrics", &self.metrics.snapshot())
      .field("sweeping", &self.sweeper.lock().is_some())
      .finish()
  }
}

impl<P> Drop for CacheShared<P> {
  fn drop(&mut self) {
    // Stop the sweeper before the policy it sweeps is torn down.
    self.sweeper.get_mut().take();
  }
}
