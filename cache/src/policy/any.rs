use super::{AddOutcome, ArcPolicy, EvictionPolicy, LfuPolicy, LruPolicy, PolicyKind};
use crate::error::CacheError;
use crate::listener::SharedListener;

use std::borrow::Borrow;
use std::fmt;
use std::hash::{BuildHasher, Hash};

/// One of the three eviction cores, chosen at runtime.
pub enum AnyPolicy<K, V, H = ahash::RandomState> {
  Lru(LruPolicy<K, V, H>),
  Lfu(LfuPolicy<K, V, H>),
  Arc(ArcPolicy<K, V, H>),
}

macro_rules! dispatch {
  ($self:expr, $policy:ident => $body:expr) => {
    match $self {
      AnyPolicy::Lru($policy) => $body,
      AnyPolicy::Lfu($policy) => $body,
      AnyPolicy::Arc($policy) => $body,
    }
  };
}

impl<K, V, H> AnyPolicy<K, V, H>
where
  K: Eq + Hash + Clone,
  H: BuildHasher + Clone,
{
  pub(crate) fn from_parts(
    kind: PolicyKind,
    capacity: usize,
    hasher: H,
    listener: Option<SharedListener<K, V>>,
  ) -> Result<Self, CacheError> {
    Ok(match kind {
      PolicyKind::Lru => AnyPolicy::Lru(LruPolicy::from_parts(capacity, hasher, listener)?),
      PolicyKind::Lfu => AnyPolicy::Lfu(LfuPolicy::from_parts(capacity, hasher, listener)?),
      PolicyKind::Arc => AnyPolicy::Arc(ArcPolicy::from_parts(capacity, hasher, listener)?),
    })
  }
}

impl<K, V, H> fmt::Debug for AnyPolicy<K, V, H> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    dispatch!(self, p => fmt::Debug::fmt(p, f))
  }
}

impl<K, V, H> AnyPolicy<K, V, H> {
  pub fn kind(&self) -> PolicyKind {
    match self {
      AnyPolicy::Lru(_) => PolicyKind::Lru,
      AnyPolicy::Lfu(_) => PolicyKind::Lfu,
      AnyPolicy::Arc(_) => PolicyKind::Arc,
    }
  }
}

impl<K, V, H> EvictionPolicy<K, V> for AnyPolicy<K, V, H>
where
  K: Eq + Hash + Clone,
  H: BuildHasher,
{
  fn add(&mut self, key: K, value: V) -> AddOutcome {
    dispatch!(self, p => p.add(key, value))
  }

  fn get<Q>(&mut self, key: &Q) -> Option<&V>
  where
    K: Borrow<Q>,
    Q: Hash + Eq + ?Sized,
  {
    dispatch!(self, p => p.get(key))
  }

  fn peek<Q>(&self, key: &Q) -> Option<&V>
  where
    K: Borrow<Q>,
    Q: Hash + Eq + ?Sized,
  {
    dispatch!(self, p => p.peek(key))
  }

  fn contains<Q>(&self, key: &Q) -> bool
  where
    K: Borrow<Q>,
    Q: Hash + Eq + ?Sized,
  {
    dispatch!(self, p => p.contains(key))
  }

  fn remove<Q>(&mut self, key: &Q) -> Option<V>
  where
    K: Borrow<Q>,
    Q: Hash + Eq + ?Sized,
  {
    dispatch!(self, p => p.remove(key))
  }

  fn least_used(&self) -> Option<(&K, &V)> {
    dispatch!(self, p => p.least_used())
  }

  fn remove_least_used(&mut self) -> Option<(K, V)> {
    dispatch!(self, p => p.remove_least_used())
  }

  fn len(&self) -> usize {
    dispatch!(self, p => p.len())
  }

  fn capacity(&self) -> usize {
    dispatch!(self, p => p.capacity())
  }

  fn resize(&mut self, capacity: usize) -> Result<isize, CacheError> {
    dispatch!(self, p => p.resize(capacity))
  }

  fn clear(&mut self) {
    dispatch!(self, p => p.clear())
  }
}
