use super::lru::LruPolicy;
use super::{AddOutcome, EvictionPolicy};
use crate::error::CacheError;
use crate::listener::{notify, EvictionListener, EvictionReason, SharedListener};
use crate::time::{Clock, SystemClock};

use std::borrow::Borrow;
use std::fmt;
use std::hash::{BuildHasher, Hash};
use std::sync::Arc;
use std::time::Duration;

/// The shortest time-to-live a cache accepts. Shorter values are raised.
pub const MIN_TIME_TO_LIVE: Duration = Duration::from_secs(1);

/// Clamps a requested time-to-live to [`MIN_TIME_TO_LIVE`].
#[inline]
pub fn clamp_time_to_live(ttl: Duration) -> Duration {
  ttl.max(MIN_TIME_TO_LIVE)
}

// A value stamped with the instant it was last written.
#[derive(Debug)]
pub(crate) struct Timed<V> {
  value: V,
  written_at: Duration,
}

// Forwards evictions of the wrapped LRU with the timestamp stripped.
struct Untimed<K, V>(SharedListener<K, V>);

impl<K, V> EvictionListener<K, Timed<V>> for Untimed<K, V> {
  fn on_evict(&self, key: &K, value: &Timed<V>, reason: EvictionReason) {
    self.0.on_evict(key, &value.value, reason);
  }
}

/// An LRU policy whose entries expire a fixed time after they were written.
///
/// Expiry is checked lazily by `get` and eagerly by [`expire`](Self::expire),
/// which a background sweeper calls periodically. `peek` and `contains` do
/// not look at timestamps, and reads do not extend an entry's life. An
/// expired entry is reported to the listener once, with
/// [`EvictionReason::Expired`], by whichever path removes it first.
pub struct TtlPolicy<K, V, H = ahash::RandomState> {
  inner: LruPolicy<K, Timed<V>, H>,
  ttl: Duration,
  clock: Arc<dyn Clock>,
  listener: Option<SharedListener<K, V>>,
}

impl<K, V, H> fmt::Debug for TtlPolicy<K, V, H> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("TtlPolicy")
      .field("inner", &self.inner)
      .field("ttl", &self.ttl)
      .field("clock", &self.clock)
      .finish_non_exhaustive()
  }
}

impl<K, V> TtlPolicy<K, V, ahash::RandomState>
where
  K: Eq + Hash + Clone + 'static,
  V: 'static,
{
  pub fn new(capacity: usize, ttl: Duration) -> Result<Self, CacheError> {
    Self::from_parts(
      capacity,
      ttl,
      ahash::RandomState::new(),
      Arc::new(SystemClock),
      None,
    )
  }

  /// Like [`new`](Self::new), reading time from `clock`.
  pub fn with_clock(
    capacity: usize,
    ttl: Duration,
    clock: Arc<dyn Clock>,
  ) -> Result<Self, CacheError> {
    Self::from_parts(capacity, ttl, ahash::RandomState::new(), clock, None)
  }
}

impl<K, V, H> TtlPolicy<K, V, H>
where
  K: Eq + Hash + Clone + 'static,
  V: 'static,
  H: BuildHasher,
{
  pub(crate) fn from_parts(
    capacity: usize,
    ttl: Duration,
    hasher: H,
    clock: Arc<dyn Clock>,
    listener: Option<SharedListener<K, V>>,
  ) -> Result<Self, CacheError> {
    let forward = listener
      .clone()
      .map(|l| Arc::new(Untimed(l)) as SharedListener<K, Timed<V>>);
    Ok(Self {
      inner: LruPolicy::from_parts(capacity, hasher, forward)?,
      ttl: clamp_time_to_live(ttl),
      clock,
      listener,
    })
  }
}

impl<K, V, H> TtlPolicy<K, V, H>
where
  K: Eq + Hash + Clone,
  H: BuildHasher,
{
  pub fn time_to_live(&self) -> Duration {
    self.ttl
  }

  /// Replaces the time-to-live, clamped to [`MIN_TIME_TO_LIVE`]. Applies to
  /// existing entries too.
  pub fn set_time_to_live(&mut self, ttl: Duration) {
    self.ttl = clamp_time_to_live(ttl);
  }

  /// Keys from least to most recently used, expired or not.
  pub fn keys(&self) -> impl DoubleEndedIterator<Item = &K> + '_ {
    self.inner.keys()
  }

  #[inline]
  fn is_expired(&self, entry: &Timed<V>, now: Duration) -> bool {
    now.saturating_sub(entry.written_at) > self.ttl
  }

  /// Removes every expired entry, reporting each one. Returns how many.
  pub fn expire(&mut self) -> usize {
    let now = self.clock.now();
    let expired: Vec<K> = self
      .inner
      .iter()
      .filter(|(_, entry)| self.is_expired(entry, now))
      .map(|(key, _)| key.clone())
      .collect();

    let mut count = 0;
    for key in expired {
      if let Some((key, entry)) = self.inner.remove_entry(&key) {
        notify(&self.listener, &key, &entry.value, EvictionReason::Expired);
        count += 1;
      }
    }
    count
  }
}

impl<K, V, H> EvictionPolicy<K, V> for TtlPolicy<K, V, H>
where
  K: Eq + Hash + Clone,
  H: BuildHasher,
{
  fn add(&mut self, key: K, value: V) -> AddOutcome {
    let written_at = self.clock.now();
    self.inner.add(key, Timed { value, written_at })
  }

  fn get<Q>(&mut self, key: &Q) -> Option<&V>
  where
    K: Borrow<Q>,
    Q: Hash + Eq + ?Sized,
  {
    let now = self.clock.now();
    let expired = self.is_expired(self.inner.peek(key)?, now);
    if expired {
      if let Some((key, entry)) = self.inner.remove_entry(key) {
        notify(&self.listener, &key, &entry.value, EvictionReason::Expired);
      }
      return None;
    }
    self.inner.get(key).map(|entry| &entry.value)
  }

  fn peek<Q>(&self, key: &Q) -> Option<&V>
  where
    K: Borrow<Q>,
    Q: Hash + Eq + ?Sized,
  {
    self.inner.peek(key).map(|entry| &entry.value)
  }

  fn contains<Q>(&self, key: &Q) -> bool
  where
    K: Borrow<Q>,
    Q: Hash + Eq + ?Sized,
  {
    self.inner.contains(key)
  }

  fn remove<Q>(&mut self, key: &Q) -> Option<V>
  where
    K: Borrow<Q>,
    Q: Hash + Eq + ?Sized,
  {
    self.inner.remove(key).map(|entry| entry.value)
  }

  fn least_used(&self) -> Option<(&K, &V)> {
    self
      .inner
      .least_used()
      .map(|(key, entry)| (key, &entry.value))
  }

  fn remove_least_used(&mut self) -> Option<(K, V)> {
    self
      .inner
      .remove_least_used()
      .map(|(key, entry)| (key, entry.value))
  }

  fn len(&self) -> usize {
    self.inner.len()
  }

  fn capacity(&self) -> usize {
    self.inner.capacity()
  }

  fn resize(&mut self, capacity: usize) -> Result<isize, CacheError> {
    self.inner.resize(capacity)
  }

  fn clear(&mut self) {
    self.inner.clear();
  }
}
