use crate::error::CacheError;
use crate::metrics::{Metrics, MetricsSnapshot};
use crate::policy::{AddOutcome, EvictionPolicy, LruPolicy};
use crate::shared::CacheShared;

use std::borrow::Borrow;
use std::fmt;
use std::hash::{BuildHasher, Hash};
use std::marker::PhantomData;
use std::sync::atomic::Ordering;
use std::sync::Arc;

/// A thread-safe cache over any [`EvictionPolicy`].
///
/// Every operation that may reorder the policy (`add`, `get`, `remove`,
/// `remove_least_used`, `resize`, `clear`) takes an exclusive lock. `peek`,
/// `contains`, `len` and `least_used` share a read lock.
///
/// Eviction listeners run while the lock is held and must not call back
/// into the cache.
///
/// Cloning a `Cache` is cheap and yields another handle to the same cache.
pub struct Cache<K, V, P> {
  pub(crate) shared: Arc<CacheShared<P>>,
  _marker: PhantomData<fn() -> (K, V)>,
}

impl<K, V, P> Clone for Cache<K, V, P> {
  fn clone(&self) -> Self {
    Self {
      shared: self.shared.clone(),
      _marker: PhantomData,
    }
  }
}

impl<K, V, P: fmt::Debug> fmt::Debug for Cache<K, V, P> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Cache")
      .field("shared", &self.shared)
      .finish()
  }
}

impl<K, V, P> Cache<K, V, P>
where
  P: EvictionPolicy<K, V>,
{
  pub(crate) fn from_shared(shared: Arc<CacheShared<P>>) -> Self {
    Self {
      shared,
      _marker: PhantomData,
    }
  }

  /// Wraps an already constructed policy.
  ///
  /// Evictions are only counted in [`metrics`](Self::metrics) for caches
  /// built through [`CacheBuilder`](crate::CacheBuilder).
  pub fn from_policy(policy: P) -> Self {
    Self::from_shared(Arc::new(CacheShared::new(policy, Arc::new(Metrics::new()))))
  }

  /// Inserts or updates `key`.
  pub fn add(&self, key: K, value: V) -> AddOutcome {
    let outcome = self.shared.policy.write().add(key, value);
    self.shared.metrics.record_add(outcome.found);
    outcome
  }

  /// Returns a clone of the value for `key`, recording the access.
  pub fn get<Q>(&self, key: &Q) -> Option<V>
  where
    K: Borrow<Q>,
    Q: Hash + Eq + ?Sized,
    V: Clone,
  {
    self.get_with(key, V::clone)
  }

  /// Looks up `key`, recording the access, and applies `f` to the value.
  ///
  /// `f` runs while the exclusive lock is held, so it should be fast.
  pub fn get_with<Q, F, R>(&self, key: &Q, f: F) -> Option<R>
  where
    K: Borrow<Q>,
    Q: Hash + Eq + ?Sized,
    F: FnOnce(&V) -> R,
  {
    let result = self.shared.policy.write().get(key).map(f);
    self.shared.metrics.record_lookup(result.is_some());
    result
  }

  /// Returns a clone of the value for `key` without recording the access.
  pub fn peek<Q>(&self, key: &Q) -> Option<V>
  where
    K: Borrow<Q>,
    Q: Hash + Eq + ?Sized,
    V: Clone,
  {
    self.shared.policy.read().peek(key).cloned()
  }

  pub fn contains<Q>(&self, key: &Q) -> bool
  where
    K: Borrow<Q>,
    Q: Hash + Eq + ?Sized,
  {
    self.shared.policy.read().contains(key)
  }

  /// Removes `key`, returning its value.
  pub fn remove<Q>(&self, key: &Q) -> Option<V>
  where
    K: Borrow<Q>,
    Q: Hash + Eq + ?Sized,
  {
    let removed = self.shared.policy.write().remove(key);
    if removed.is_some() {
      self
        .shared
        .metrics
        .invalidations
        .fetch_add(1, Ordering::Relaxed);
    }
    removed
  }

  /// A copy of the entry the policy would evict next.
  pub fn least_used(&self) -> Option<(K, V)>
  where
    K: Clone,
    V: Clone,
  {
    self
      .shared
      .policy
      .read()
      .least_used()
      .map(|(key, value)| (key.clone(), value.clone()))
  }

  pub fn remove_least_used(&self) -> Option<(K, V)> {
    self.shared.policy.write().remove_least_used()
  }

  pub fn len(&self) -> usize {
    self.shared.policy.read().len()
  }

  pub fn is_empty(&self) -> bool {
    self.shared.policy.read().is_empty()
  }

  pub fn capacity(&self) -> usize {
    self.shared.policy.read().capacity()
  }

  /// Changes the capacity, evicting down to it when shrinking. Returns the
  /// signed change in capacity.
  pub fn resize(&self, capacity: usize) -> Result<isize, CacheError> {
    let mut policy = self.shared.policy.write();
    let before = policy.len();
    let delta = policy.resize(capacity)?;
    tracing::debug!(
      capacity,
      delta,
      evicted = before - policy.len(),
      "cache resized"
    );
    Ok(delta)
  }

  pub fn clear(&self) {
    self.shared.policy.write().clear();
  }

  pub fn metrics(&self) -> MetricsSnapshot {
    self.shared.metrics.snapshot()
  }

  /// Runs `f` against the policy under the shared lock.
  ///
  /// Useful for policy-specific observations such as ARC's partition.
  pub fn with_policy<F, R>(&self, f: F) -> R
  where
    F: FnOnce(&P) -> R,
  {
    f(&self.shared.policy.read())
  }
}

impl<K, V, H> Cache<K, V, LruPolicy<K, V, H>>
where
  K: Eq + Hash + Clone,
  H: BuildHasher,
{
  /// Keys from least to most recently used.
  pub fn keys(&self) -> Vec<K> {
    self.shared.policy.read().keys().cloned().collect()
  }
}
