use crate::error::CacheError;
use crate::handles::{Cache, TtlCache};
use crate::listener::{EvictionListener, FnListener, SharedListener};
use crate::metrics::{CountingListener, Metrics};
use crate::policy::ttl::{clamp_time_to_live, MIN_TIME_TO_LIVE};
use crate::policy::{
  AnyPolicy, ArcPolicy, EvictionPolicy, LfuPolicy, LruPolicy, PolicyKind, TtlPolicy,
};
use crate::shared::CacheShared;
use crate::task::sweeper::{clamp_clean_interval, MIN_CLEAN_INTERVAL};
use crate::time::{Clock, SystemClock};

use core::fmt;
use std::hash::{BuildHasher, Hash};
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

/// The capacity used when none is configured.
pub const DEFAULT_CAPACITY: usize = 1024;

/// A builder for creating [`Cache`] and [`TtlCache`] instances.
pub struct CacheBuilder<K, V, H = ahash::RandomState> {
  capacity: usize,
  policy: PolicyKind,
  time_to_live: Duration,
  clean_interval: Duration,
  hasher: H,
  clock: Arc<dyn Clock>,
  listener: Option<SharedListener<K, V>>,
  _marker: PhantomData<fn() -> (K, V)>,
}

// Manual Debug implementation for CacheBuilder.
impl<K, V, H> fmt::Debug for CacheBuilder<K, V, H> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("CacheBuilder")
      .field("capacity", &self.capacity)
      .field("policy", &self.policy)
      .field("time_to_live", &self.time_to_live)
      .field("clean_interval", &self.clean_interval)
      .field("clock", &self.clock)
      .field("has_listener", &self.listener.is_some())
      .finish_non_exhaustive()
  }
}

// --- General Configuration Methods ---
// This impl block has no restrictive bounds on K or V.
impl<K, V, H> CacheBuilder<K, V, H> {
  /// Sets the maximum number of entries. Must be at least 1.
  pub fn capacity(mut self, capacity: usize) -> Self {
    self.capacity = capacity;
    self
  }

  /// Selects the policy used by [`build`](Self::build).
  pub fn policy(mut self, policy: PolicyKind) -> Self {
    self.policy = policy;
    self
  }

  /// Sets the eviction listener for the cache.
  pub fn eviction_listener<Listener>(mut self, listener: Listener) -> Self
  where
    Listener: EvictionListener<K, V> + 'static,
  {
    self.listener = Some(Arc::new(listener));
    self
  }

  /// Sets a listener that only wants the evicted key and value.
  pub fn on_evict<F>(mut self, f: F) -> Self
  where
    F: Fn(&K, &V) + Send + Sync + 'static,
  {
    self.listener = Some(Arc::new(FnListener(f)));
    self
  }

  /// Sets the time-to-live used by [`build_ttl`](Self::build_ttl).
  ///
  /// Values below one second are raised to one second.
  pub fn time_to_live(mut self, duration: Duration) -> Self {
    self.time_to_live = clamp_time_to_live(duration);
    self
  }

  /// Sets how often the TTL sweeper runs.
  ///
  /// Values below two seconds are raised to two seconds.
  pub fn clean_interval(mut self, duration: Duration) -> Self {
    self.clean_interval = clamp_clean_interval(duration);
    self
  }

  /// Sets the time source for TTL bookkeeping.
  pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
    self.clock = clock;
    self
  }

  /// Sets the hasher for the cache's indices.
  pub fn hasher<H2>(self, hasher: H2) -> CacheBuilder<K, V, H2> {
    CacheBuilder {
      capacity: self.capacity,
      policy: self.policy,
      time_to_live: self.time_to_live,
      clean_interval: self.clean_interval,
      hasher,
      clock: self.clock,
      listener: self.listener,
      _marker: PhantomData,
    }
  }
}

// --- Default Constructor ---
impl<K, V, H: BuildHasher + Default> CacheBuilder<K, V, H> {
  /// Creates a new `CacheBuilder` with default settings.
  pub fn new() -> Self {
    Self {
      capacity: DEFAULT_CAPACITY,
      policy: PolicyKind::default(),
      time_to_live: MIN_TIME_TO_LIVE,
      clean_interval: MIN_CLEAN_INTERVAL,
      hasher: H::default(),
      clock: Arc::new(SystemClock),
      listener: None,
      _marker: PhantomData,
    }
  }
}

impl<K, V> Default for CacheBuilder<K, V, ahash::RandomState> {
  fn default() -> Self {
    Self::new()
  }
}

// --- Build Methods ---
impl<K, V, H> CacheBuilder<K, V, H>
where
  K: Eq + Hash + Clone + 'static,
  V: 'static,
  H: BuildHasher + Clone,
{
  /// Splits off the metrics and the listener every policy reports into.
  fn instrument(&mut self) -> (Arc<Metrics>, Option<SharedListener<K, V>>) {
    let metrics = Arc::new(Metrics::new());
    let counting: SharedListener<K, V> =
      Arc::new(CountingListener::new(metrics.clone(), self.listener.take()));
    (metrics, Some(counting))
  }

  fn finish<P>(&self, policy: P, metrics: Arc<Metrics>) -> Cache<K, V, P>
  where
    P: EvictionPolicy<K, V>,
  {
    tracing::debug!(capacity = self.capacity, policy = %self.policy, "cache built");
    Cache::from_shared(Arc::new(CacheShared::new(policy, metrics)))
  }

  /// Builds a least-recently-used cache.
  pub fn build_lru(mut self) -> Result<Cache<K, V, LruPolicy<K, V, H>>, CacheError> {
    self.policy = PolicyKind::Lru;
    let (metrics, listener) = self.instrument();
    let policy = LruPolicy::from_parts(self.capacity, self.hasher.clone(), listener)?;
    Ok(self.finish(policy, metrics))
  }

  /// Builds a least-frequently-used cache.
  pub fn build_lfu(mut self) -> Result<Cache<K, V, LfuPolicy<K, V, H>>, CacheError> {
    self.policy = PolicyKind::Lfu;
    let (metrics, listener) = self.instrument();
    let policy = LfuPolicy::from_parts(self.capacity, self.hasher.clone(), listener)?;
    Ok(self.finish(policy, metrics))
  }

  /// Builds an adaptive replacement cache.
  pub fn build_arc(mut self) -> Result<Cache<K, V, ArcPolicy<K, V, H>>, CacheError> {
    self.policy = PolicyKind::Arc;
    let (metrics, listener) = self.instrument();
    let policy = ArcPolicy::from_parts(self.capacity, self.hasher.clone(), listener)?;
    Ok(self.finish(policy, metrics))
  }

  /// Builds a cache using the policy chosen with [`policy`](Self::policy).
  pub fn build(mut self) -> Result<Cache<K, V, AnyPolicy<K, V, H>>, CacheError> {
    let (metrics, listener) = self.instrument();
    let policy = AnyPolicy::from_parts(self.policy, self.capacity, self.hasher.clone(), listener)?;
    Ok(self.finish(policy, metrics))
  }
}

impl<K, V, H> CacheBuilder<K, V, H>
where
  K: Eq + Hash + Clone + Send + Sync + 'static,
  V: Send + Sync + 'static,
  H: BuildHasher + Clone + Send + Sync + 'static,
{
  /// Builds a least-recently-used cache whose entries expire, and starts its
  /// background sweeper.
  pub fn build_ttl(mut self) -> Result<TtlCache<K, V, H>, CacheError> {
    let (metrics, listener) = self.instrument();
    let policy = TtlPolicy::from_parts(
      self.capacity,
      self.time_to_live,
      self.hasher.clone(),
      self.clock.clone(),
      listener,
    )?;
    tracing::debug!(
      capacity = self.capacity,
      ttl = ?self.time_to_live,
      clean_interval = ?self.clean_interval,
      "ttl cache built"
    );
    let cache = Cache::from_shared(Arc::new(CacheShared::new(policy, metrics)));
    cache.start_sweeper(self.clean_interval);
    Ok(cache)
  }
}
