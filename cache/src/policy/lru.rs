use super::recency_list::{Handle, RecencyList};
use super::{AddOutcome, EvictionPolicy};
use crate::error::{capacity_delta, check_capacity, CacheError};
use crate::listener::{notify, EvictionListener, EvictionReason, SharedListener};

use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;
use std::hash::{BuildHasher, Hash};
use std::sync::Arc;

/// An eviction policy that evicts the least recently used entry.
///
/// Entries live in a [`RecencyList`] ordered from most to least recently
/// used; the index maps each key to its list handle. The list holds exactly
/// the keys of the index.
pub struct LruPolicy<K, V, H = ahash::RandomState> {
  capacity: usize,
  index: HashMap<K, Handle, H>,
  order: RecencyList<(K, V)>,
  listener: Option<SharedListener<K, V>>,
}

impl<K, V, H> fmt::Debug for LruPolicy<K, V, H> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("LruPolicy")
      .field("capacity", &self.capacity)
      .field("len", &self.order.len())
      .field("has_listener", &self.listener.is_some())
      .finish_non_exhaustive()
  }
}

impl<K, V> LruPolicy<K, V, ahash::RandomState>
where
  K: Eq + Hash + Clone,
{
  pub fn new(capacity: usize) -> Result<Self, CacheError> {
    Self::from_parts(capacity, ahash::RandomState::new(), None)
  }

  pub fn with_listener<L>(capacity: usize, listener: L) -> Result<Self, CacheError>
  where
    L: EvictionListener<K, V> + 'static,
  {
    Self::from_parts(capacity, ahash::RandomState::new(), Some(Arc::new(listener)))
  }
}

impl<K, V, H> LruPolicy<K, V, H>
where
  K: Eq + Hash + Clone,
  H: BuildHasher,
{
  pub fn with_hasher(capacity: usize, hasher: H) -> Result<Self, CacheError> {
    Self::from_parts(capacity, hasher, None)
  }

  pub(crate) fn from_parts(
    capacity: usize,
    hasher: H,
    listener: Option<SharedListener<K, V>>,
  ) -> Result<Self, CacheError> {
    let capacity = check_capacity(capacity)?;
    Ok(Self {
      capacity,
      index: HashMap::with_hasher(hasher),
      order: RecencyList::new(),
      listener,
    })
  }

  /// Keys from least to most recently used.
  pub fn keys(&self) -> impl DoubleEndedIterator<Item = &K> + '_ {
    self.order.iter().rev().map(|(key, _)| key)
  }

  /// Entries from least to most recently used.
  pub fn iter(&self) -> impl DoubleEndedIterator<Item = (&K, &V)> + '_ {
    self.order.iter().rev().map(|(key, value)| (key, value))
  }

  /// Removes `key` and returns the owned key alongside its value.
  /// Like [`remove`](EvictionPolicy::remove), this is not an eviction.
  pub fn remove_entry<Q>(&mut self, key: &Q) -> Option<(K, V)>
  where
    K: Borrow<Q>,
    Q: Hash + Eq + ?Sized,
  {
    let handle = self.index.remove(key)?;
    self.order.remove(handle)
  }

  // Pops the least recently used entry and reports it.
  fn evict_back(&mut self, reason: EvictionReason) -> Option<(K, V)> {
    let (key, value) = self.order.pop_back()?;
    self.index.remove(&key);
    notify(&self.listener, &key, &value, reason);
    Some((key, value))
  }
}

impl<K, V, H> EvictionPolicy<K, V> for LruPolicy<K, V, H>
where
  K: Eq + Hash + Clone,
  H: BuildHasher,
{
  fn add(&mut self, key: K, value: V) -> AddOutcome {
    if let Some(&handle) = self.index.get(&key) {
      if let Some(slot) = self.order.get_mut(handle) {
        slot.1 = value;
      }
      self.order.move_to_front(handle);
      return AddOutcome::updated();
    }

    let handle = self.order.push_front((key.clone(), value));
    self.index.insert(key, handle);

    let evicted = self.order.len() > self.capacity;
    if evicted {
      self.evict_back(EvictionReason::Capacity);
    }
    AddOutcome::inserted(evicted)
  }

  fn get<Q>(&mut self, key: &Q) -> Option<&V>
  where
    K: Borrow<Q>,
    Q: Hash + Eq + ?Sized,
  {
    let handle = *self.index.get(key)?;
    self.order.move_to_front(handle);
    self.order.get(handle).map(|(_, value)| value)
  }

  fn peek<Q>(&self, key: &Q) -> Option<&V>
  where
    K: Borrow<Q>,
    Q: Hash + Eq + ?Sized,
  {
    let handle = *self.index.get(key)?;
    self.order.get(handle).map(|(_, value)| value)
  }

  fn contains<Q>(&self, key: &Q) -> bool
  where
    K: Borrow<Q>,
    Q: Hash + Eq + ?Sized,
  {
    self.index.contains_key(key)
  }

  fn remove<Q>(&mut self, key: &Q) -> Option<V>
  where
    K: Borrow<Q>,
    Q: Hash + Eq + ?Sized,
  {
    self.remove_entry(key).map(|(_, value)| value)
  }

  fn least_used(&self) -> Option<(&K, &V)> {
    let handle = self.order.back()?;
    self.order.get(handle).map(|(key, value)| (key, value))
  }

  fn remove_least_used(&mut self) -> Option<(K, V)> {
    self.evict_back(EvictionReason::Capacity)
  }

  fn len(&self) -> usize {
    self.order.len()
  }

  fn capacity(&self) -> usize {
    self.capacity
  }

  fn resize(&mut self, capacity: usize) -> Result<isize, CacheError> {
    let capacity = check_capacity(capacity)?;
    let delta = capacity_delta(self.capacity, capacity);
    self.capacity = capacity;
    while self.order.len() > self.capacity {
      if self.evict_back(EvictionReason::Capacity).is_none() {
        break;
      }
    }
    Ok(delta)
  }

  fn clear(&mut self) {
    let listener = self.listener.clone();
    self
      .order
      .drain_with(|(key, value)| notify(&listener, &key, &value, EvictionReason::Cleared));
    self.index.clear();
  }
}
