use crate::listener::{EvictionListener, EvictionReason, SharedListener};

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crossbeam_utils::CachePadded;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A thread-safe, internal metrics collector for the cache.
/// All fields are atomic to allow for lock-free updates.
#[derive(Debug)]
pub(crate) struct Metrics {
  // --- Hit/Miss Ratios ---
  pub(crate) hits: CachePadded<AtomicU64>,
  pub(crate) misses: CachePadded<AtomicU64>,

  // --- Throughput ---
  pub(crate) inserts: CachePadded<AtomicU64>,
  pub(crate) updates: CachePadded<AtomicU64>,
  pub(crate) invalidations: CachePadded<AtomicU64>,

  // --- Eviction Stats ---
  pub(crate) evicted_by_capacity: CachePadded<AtomicU64>,
  pub(crate) evicted_by_ttl: CachePadded<AtomicU64>,
  pub(crate) cleared: CachePadded<AtomicU64>,

  created_at: Instant,
}

impl Default for Metrics {
  fn default() -> Self {
    Self {
      hits: CachePadded::new(AtomicU64::new(0)),
      misses: CachePadded::new(AtomicU64::new(0)),
      inserts: CachePadded::new(AtomicU64::new(0)),
      updates: CachePadded::new(AtomicU64::new(0)),
      invalidations: CachePadded::new(AtomicU64::new(0)),
      evicted_by_capacity: CachePadded::new(AtomicU64::new(0)),
      evicted_by_ttl: CachePadded::new(AtomicU64::new(0)),
      cleared: CachePadded::new(AtomicU64::new(0)),
      created_at: Instant::now(),
    }
  }
}

impl Metrics {
  pub(crate) fn new() -> Self {
    Self::default()
  }

  #[inline]
  pub(crate) fn record_lookup(&self, hit: bool) {
    if hit {
      self.hits.fetch_add(1, Ordering::Relaxed);
    } else {
      self.misses.fetch_add(1, Ordering::Relaxed);
    }
  }

  #[inline]
  pub(crate) fn record_add(&self, found: bool) {
    if found {
      self.updates.fetch_add(1, Ordering::Relaxed);
    } else {
      self.inserts.fetch_add(1, Ordering::Relaxed);
    }
  }

  #[inline]
  pub(crate) fn record_eviction(&self, reason: EvictionReason) {
    let counter = match reason {
      EvictionReason::Capacity => &self.evicted_by_capacity,
      EvictionReason::Expired => &self.evicted_by_ttl,
      EvictionReason::Cleared => &self.cleared,
      // Counted by the facade on every successful `remove`.
      EvictionReason::Invalidated => return,
    };
    counter.fetch_add(1, Ordering::Relaxed);
  }

  /// Creates a point-in-time snapshot of the current metrics.
  pub(crate) fn snapshot(&self) -> MetricsSnapshot {
    let hits = self.hits.load(Ordering::Relaxed);
    let misses = self.misses.load(Ordering::Relaxed);
    let total_lookups = hits + misses;

    MetricsSnapshot {
      hits,
      misses,
      hit_ratio: if total_lookups == 0 {
        0.0
      } else {
        hits as f64 / total_lookups as f64
      },
      inserts: self.inserts.load(Ordering::Relaxed),
      updates: self.updates.load(Ordering::Relaxed),
      invalidations: self.invalidations.load(Ordering::Relaxed),
      evicted_by_capacity: self.evicted_by_capacity.load(Ordering::Relaxed),
      evicted_by_ttl: self.evicted_by_ttl.load(Ordering::Relaxed),
      cleared: self.cleared.load(Ordering::Relaxed),
      uptime_secs: self.created_at.elapsed().as_secs(),
    }
  }
}

/// Counts evictions before handing them to the user's listener, if any.
pub(crate) struct CountingListener<K, V> {
  metrics: Arc<Metrics>,
  inner: Option<SharedListener<K, V>>,
}

impl<K, V> CountingListener<K, V> {
  pub(crate) fn new(metrics: Arc<Metrics>, inner: Option<SharedListener<K, V>>) -> Self {
    Self { metrics, inner }
  }
}

impl<K, V> EvictionListener<K, V> for CountingListener<K, V> {
  fn on_evict(&self, key: &K, value: &V, reason: EvictionReason) {
    self.metrics.record_eviction(reason);
    if let Some(inner) = &self.inner {
      inner.on_evict(key, value, reason);
    }
  }
}

/// A point-in-time, public-facing snapshot of the cache's metrics.
#[derive(Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MetricsSnapshot {
  /// The number of `get` calls that found a live entry.
  pub hits: u64,
  /// The number of `get` calls that found nothing, or an expired entry.
  pub misses: u64,
  /// The cache hit ratio (hits / (hits + misses)).
  pub hit_ratio: f64,
  /// The number of `add` calls that created an entry.
  pub inserts: u64,
  /// The number of `add` calls that replaced a resident value.
  pub updates: u64,
  /// The number of successful explicit removals.
  pub invalidations: u64,
  /// The number of entries displaced to respect the capacity.
  pub evicted_by_capacity: u64,
  /// The number of entries dropped because their TTL elapsed.
  pub evicted_by_ttl: u64,
  /// The number of entries dropped by `clear`.
  pub cleared: u64,
  /// The number of seconds the cache has been running.
  pub uptime_secs: u64,
}

impl fmt::Debug for MetricsSnapshot {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("MetricsSnapshot")
      .field("hits", &self.hits)
      .field("misses", &self.misses)
      .field("hit_ratio", &format!("{:.2}%", self.hit_ratio * 100.0))
      .field("inserts", &self.inserts)
      .field("updates", &self.updates)
      .field("invalidations", &self.invalidations)
      .field("evicted_by_capacity", &self.evicted_by_capacity)
      .field("evicted_by_ttl", &self.evicted_by_ttl)
      .field("cleared", &self.cleared)
      .field("uptime_secs", &self.uptime_secs)
      .finish()
  }
}
