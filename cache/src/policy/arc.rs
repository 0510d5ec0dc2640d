use super::recency_list::{Handle, RecencyList};
use super::{AddOutcome, EvictionPolicy};
use crate::error::{capacity_delta, check_capacity, CacheError};
use crate::listener::{notify, EvictionListener, EvictionReason, SharedListener};

use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;
use std::hash::{BuildHasher, Hash};
use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The four lists of the adaptive replacement cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ArcTier {
  /// T1: resident, referenced once since admission.
  Recent,
  /// T2: resident, referenced at least twice.
  Frequent,
  /// B1: ghost of an entry displaced from T1.
  RecentGhost,
  /// B2: ghost of an entry displaced from T2.
  FrequentGhost,
}

impl ArcTier {
  fn ghost(self) -> ArcTier {
    match self {
      ArcTier::Recent | ArcTier::RecentGhost => ArcTier::RecentGhost,
      ArcTier::Frequent | ArcTier::FrequentGhost => ArcTier::FrequentGhost,
    }
  }
}

#[derive(Debug, Clone, Copy)]
struct Slot {
  tier: ArcTier,
  handle: Handle,
}

/// An eviction policy based on the Adaptive Replacement Cache (ARC) algorithm.
///
/// Residents live in T1 (seen once) or T2 (seen again); keys displaced from
/// either side are remembered, without values, in the ghost lists B1 and B2.
/// A hit on a ghost during `add` moves the target size `p` of T1 towards the
/// side that would have kept the key.
///
/// Ghost membership has its own index, so every lookup is O(1).
///
/// Invariants, with `c` the capacity: `0 <= p <= c`, `|T1| + |B1| <= c`,
/// `|T1| + |T2| + |B1| + |B2| <= 2c`, and a key sits in at most one list.
pub struct ArcPolicy<K, V, H = ahash::RandomState> {
  // Target size of T1. The target size of T2 is `capacity - p`.
  p: usize,
  capacity: usize,

  // T1 and T2 own the values.
  t1: RecencyList<(K, V)>,
  t2: RecencyList<(K, V)>,
  // B1 and B2 remember keys only.
  b1: RecencyList<K>,
  b2: RecencyList<K>,

  // Residents of T1 and T2.
  index: HashMap<K, Slot, H>,
  // Ghosts of B1 and B2.
  ghosts: HashMap<K, Slot, H>,

  listener: Option<SharedListener<K, V>>,
}

impl<K, V, H> fmt::Debug for ArcPolicy<K, V, H> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ArcPolicy")
      .field("capacity", &self.capacity)
      .field("p", &self.p)
      .field("t1", &self.t1.len())
      .field("t2", &self.t2.len())
      .field("b1", &self.b1.len())
      .field("b2", &self.b2.len())
      .finish_non_exhaustive()
  }
}

impl<K, V> ArcPolicy<K, V, ahash::RandomState>
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

impl<K, V, H> ArcPolicy<K, V, H>
where
  K: Eq + Hash + Clone,
  H: BuildHasher + Clone,
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
      p: 0,
      capacity,
      t1: RecencyList::new(),
      t2: RecencyList::new(),
      b1: RecencyList::new(),
      b2: RecencyList::new(),
      index: HashMap::with_hasher(hasher.clone()),
      ghosts: HashMap::with_hasher(hasher),
      listener,
    })
  }
}

impl<K, V, H> ArcPolicy<K, V, H>
where
  K: Eq + Hash + Clone,
  H: BuildHasher,
{
  /// The current target size of T1.
  pub fn p(&self) -> usize {
    self.p
  }

  /// Length of T1.
  pub fn recent_len(&self) -> usize {
    self.t1.len()
  }

  /// Length of T2.
  pub fn frequent_len(&self) -> usize {
    self.t2.len()
  }

  /// Length of B1.
  pub fn recent_ghost_len(&self) -> usize {
    self.b1.len()
  }

  /// Length of B2.
  pub fn frequent_ghost_len(&self) -> usize {
    self.b2.len()
  }

  /// The list currently holding `key`, resident or ghost.
  pub fn tier<Q>(&self, key: &Q) -> Option<ArcTier>
  where
    K: Borrow<Q>,
    Q: Hash + Eq + ?Sized,
  {
    self
      .index
      .get(key)
      .or_else(|| self.ghosts.get(key))
      .map(|slot| slot.tier)
  }

  fn residents(&mut self, tier: ArcTier) -> &mut RecencyList<(K, V)> {
    match tier {
      ArcTier::Frequent | ArcTier::FrequentGhost => &mut self.t2,
      ArcTier::Recent | ArcTier::RecentGhost => &mut self.t1,
    }
  }

  fn ghost_list(&mut self, tier: ArcTier) -> &mut RecencyList<K> {
    match tier.ghost() {
      ArcTier::FrequentGhost => &mut self.b2,
      _ => &mut self.b1,
    }
  }

  // Places a resident at the MRU end of T1 or T2 and indexes it.
  fn push_resident(&mut self, tier: ArcTier, key: K, value: V) -> Handle {
    let handle = self.residents(tier).push_front((key.clone(), value));
    self.index.insert(key, Slot { tier, handle });
    handle
  }

  // Remembers `key` at the MRU end of the ghost list matching `tier`.
  fn push_ghost(&mut self, tier: ArcTier, key: K) {
    let tier = tier.ghost();
    let handle = self.ghost_list(tier).push_front(key.clone());
    self.ghosts.insert(key, Slot { tier, handle });
  }

  // Forgets the LRU ghost of B1 or B2.
  fn drop_ghost_lru(&mut self, tier: ArcTier) -> bool {
    match self.ghost_list(tier).pop_back() {
      Some(key) => {
        self.ghosts.remove(&key);
        true
      }
      None => false,
    }
  }

  // Moves the LRU of T1 (or T2) to the MRU of B1 (or B2), dropping its value.
  fn displace(&mut self, tier: ArcTier, reason: EvictionReason) -> Option<(K, V)> {
    let (key, value) = self.residents(tier).pop_back()?;
    self.index.remove(&key);
    notify(&self.listener, &key, &value, reason);
    self.push_ghost(tier, key.clone());
    Some((key, value))
  }

  // ARC's REPLACE: frees one resident slot, preferring T1 while it is over
  // its target `p`.
  fn replace(&mut self, accessed_in_b2: bool) -> bool {
    let t1 = self.t1.len();
    let from = if t1 > 0 && (t1 > self.p || (t1 == self.p && accessed_in_b2)) {
      ArcTier::Recent
    } else if !self.t2.is_empty() {
      ArcTier::Frequent
    } else {
      ArcTier::Recent
    };
    self.displace(from, EvictionReason::Capacity).is_some()
  }

  // Readmits a ghost into T2, adapting `p` first.
  fn readmit(&mut self, slot: Slot, key: K, value: V) -> AddOutcome {
    let b1 = self.b1.len();
    let b2 = self.b2.len();
    let in_b2 = slot.tier == ArcTier::FrequentGhost;
    if in_b2 {
      let delta = (b1 / b2.max(1)).max(1);
      self.p = self.p.saturating_sub(delta);
    } else {
      let delta = (b2 / b1.max(1)).max(1);
      self.p = self.p.saturating_add(delta).min(self.capacity);
    }

    let evicted = self.replace(in_b2);

    if let Some(ghost) = self.ghost_list(slot.tier).remove(slot.handle) {
      self.ghosts.remove(&ghost);
    }
    self.push_resident(ArcTier::Frequent, key, value);
    AddOutcome::inserted(evicted)
  }

  // Admits a key not seen in any list into T1.
  fn admit(&mut self, key: K, value: V) -> AddOutcome {
    let c = self.capacity;
    let l1 = self.t1.len() + self.b1.len();
    let l2 = self.t2.len() + self.b2.len();
    let mut evicted = false;

    if l1 >= c {
      if self.t1.len() < c {
        self.drop_ghost_lru(ArcTier::RecentGhost);
        evicted = self.replace(false);
      } else if let Some((victim, old)) = self.t1.pop_back() {
        // B1 is empty: the victim leaves without a ghost.
        self.index.remove(&victim);
        notify(&self.listener, &victim, &old, EvictionReason::Capacity);
        evicted = true;
      }
    } else if l1 + l2 >= c {
      if l1 + l2 >= c.saturating_mul(2) && !self.drop_ghost_lru(ArcTier::FrequentGhost) {
        self.drop_ghost_lru(ArcTier::RecentGhost);
      }
      evicted = self.replace(false);
    }

    self.push_resident(ArcTier::Recent, key, value);
    AddOutcome::inserted(evicted)
  }

  // Trims ghosts until the list-size bounds hold for the current capacity.
  fn trim_ghosts(&mut self) {
    while self.t1.len() + self.b1.len() > self.capacity {
      if !self.drop_ghost_lru(ArcTier::RecentGhost) {
        break;
      }
    }
    let bound = self.capacity.saturating_mul(2);
    while self.t1.len() + self.t2.len() + self.b1.len() + self.b2.len() > bound {
      if !self.drop_ghost_lru(ArcTier::FrequentGhost) && !self.drop_ghost_lru(ArcTier::RecentGhost)
      {
        break;
      }
    }
  }
}

impl<K, V, H> EvictionPolicy<K, V> for ArcPolicy<K, V, H>
where
  K: Eq + Hash + Clone,
  H: BuildHasher,
{
  fn add(&mut self, key: K, value: V) -> AddOutcome {
    if let Some(&slot) = self.index.get(&key) {
      // A hit on T1 promotes to T2; a hit on T2 refreshes it.
      if let Some((resident, _)) = self.residents(slot.tier).remove(slot.handle) {
        self.push_resident(ArcTier::Frequent, resident, value);
      }
      return AddOutcome::updated();
    }

    if let Some(&slot) = self.ghosts.get(&key) {
      return self.readmit(slot, key, value);
    }

    self.admit(key, value)
  }

  fn get<Q>(&mut self, key: &Q) -> Option<&V>
  where
    K: Borrow<Q>,
    Q: Hash + Eq + ?Sized,
  {
    // Ghosts are a miss here and leave `p` alone.
    let slot = *self.index.get(key)?;
    let entry = self.residents(slot.tier).remove(slot.handle)?;
    let handle = self.t2.push_front(entry);
    if let Some(slot) = self.index.get_mut(key) {
      slot.tier = ArcTier::Frequent;
      slot.handle = handle;
    }
    self.t2.get(handle).map(|(_, value)| value)
  }

  fn peek<Q>(&self, key: &Q) -> Option<&V>
  where
    K: Borrow<Q>,
    Q: Hash + Eq + ?Sized,
  {
    let slot = self.index.get(key)?;
    let list = match slot.tier {
      ArcTier::Frequent => &self.t2,
      _ => &self.t1,
    };
    list.get(slot.handle).map(|(_, value)| value)
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
    let slot = self.index.remove(key)?;
    let (key, value) = self.residents(slot.tier).remove(slot.handle)?;
    notify(&self.listener, &key, &value, EvictionReason::Invalidated);
    self.push_ghost(slot.tier, key);
    Some(value)
  }

  fn least_used(&self) -> Option<(&K, &V)> {
    let list = if self.t1.is_empty() { &self.t2 } else { &self.t1 };
    list.get(list.back()?).map(|(key, value)| (key, value))
  }

  fn remove_least_used(&mut self) -> Option<(K, V)> {
    let tier = if self.t1.is_empty() {
      ArcTier::Frequent
    } else {
      ArcTier::Recent
    };
    self.displace(tier, EvictionReason::Capacity)
  }

  fn len(&self) -> usize {
    self.index.len()
  }

  fn capacity(&self) -> usize {
    self.capacity
  }

  fn resize(&mut self, capacity: usize) -> Result<isize, CacheError> {
    let capacity = check_capacity(capacity)?;
    let delta = capacity_delta(self.capacity, capacity);
    self.capacity = capacity;
    while self.t1.len() + self.t2.len() > self.capacity {
      if self.remove_least_used().is_none() {
        break;
      }
    }
    self.trim_ghosts();
    self.p = self.p.min(self.capacity);
    Ok(delta)
  }

  fn clear(&mut self) {
    let listener = self.listener.clone();
    let mut report = |(key, value): (K, V)| notify(&listener, &key, &value, EvictionReason::Cleared);
    self.t1.drain_with(&mut report);
    self.t2.drain_with(&mut report);
    self.b1.clear();
    self.b2.clear();
    self.index.clear();
    self.ghosts.clear();
    self.p = 0;
  }
}
