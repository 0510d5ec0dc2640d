use std::fmt;
use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Describes the reason an entry left the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum EvictionReason {
  /// The entry was displaced to make room, by an insert, a shrinking
  /// `resize`, or `remove_least_used`.
  Capacity,
  /// The entry outlived the cache's time-to-live.
  Expired,
  /// The entry was explicitly removed. Only ARC reports explicit removals.
  Invalidated,
  /// The entry was dropped by `clear`.
  Cleared,
}

impl fmt::Display for EvictionReason {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      EvictionReason::Capacity => write!(f, "evicted due to capacity"),
      EvictionReason::Expired => write!(f, "evicted due to expiration (TTL)"),
      EvictionReason::Invalidated => write!(f, "explicitly removed"),
      EvictionReason::Cleared => write!(f, "dropped by clear"),
    }
  }
}

/// A listener that can be registered with a cache to observe evictions.
///
/// `on_evict` is called exactly once for every entry that dies by eviction,
/// expiration or `clear`. It runs synchronously on the thread performing the
/// operation and, behind [`Cache`](crate::Cache), while the cache lock is
/// held. A listener must therefore be fast and must never call back into the
/// cache that invoked it: doing so deadlocks.
pub trait EvictionListener<K, V>: Send + Sync {
  fn on_evict(&self, key: &K, value: &V, reason: EvictionReason);
}

pub(crate) type SharedListener<K, V> = Arc<dyn EvictionListener<K, V>>;

/// Adapts a plain `(key, value)` closure to [`EvictionListener`].
pub(crate) struct FnListener<F>(pub(crate) F);

impl<K, V, F> EvictionListener<K, V> for FnListener<F>
where
  F: Fn(&K, &V) + Send + Sync,
{
  fn on_evict(&self, key: &K, value: &V, _reason: EvictionReason) {
    (self.0)(key, value)
  }
}

#[inline]
pub(crate) fn notify<K, V>(
  listener: &Option<SharedListener<K, V>>,
  key: &K,
  value: &V,
  reason: EvictionReason,
) {
  if let Some(listener) = listener {
    listener.on_evict(key, value, reason);
  }
}
