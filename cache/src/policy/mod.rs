//! Single-threaded eviction cores and the contract they share.
//!
//! Every core owns its entries and implements [`EvictionPolicy`]. Cores are
//! not synchronized; wrap one in [`Cache`](crate::Cache) to share it
//! between threads.

pub mod any;
pub mod arc;
pub mod lfu;
pub mod lru;
pub mod recency_list;
pub mod ttl;

use crate::error::CacheError;

use std::borrow::Borrow;
use std::fmt;
use std::hash::Hash;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub use any::AnyPolicy;
pub use arc::{ArcPolicy, ArcTier};
pub use lfu::LfuPolicy;
pub use lru::LruPolicy;
pub use recency_list::{Handle, RecencyList};
pub use ttl::TtlPolicy;

/// What happened to the cache during an `add`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AddOutcome {
  /// The key was already resident; its value was replaced.
  pub found: bool,
  /// At least one resident entry was displaced to make room.
  pub evicted: bool,
}

impl AddOutcome {
  #[inline]
  pub(crate) fn updated() -> Self {
    Self {
      found: true,
      evicted: false,
    }
  }

  #[inline]
  pub(crate) fn inserted(evicted: bool) -> Self {
    Self {
      found: false,
      evicted,
    }
  }
}

/// Selects an eviction policy at runtime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PolicyKind {
  /// Least recently used.
  #[default]
  Lru,
  /// Least frequently used.
  Lfu,
  /// Adaptive replacement cache.
  Arc,
}

impl fmt::Display for PolicyKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      PolicyKind::Lru => write!(f, "lru"),
      PolicyKind::Lfu => write!(f, "lfu"),
      PolicyKind::Arc => write!(f, "arc"),
    }
  }
}

/// The contract shared by every eviction core.
///
/// Methods taking `&self` never reorder internal state, so the thread-safe
/// facade serves them under a shared lock. Everything else takes `&mut self`.
///
/// Capacity is counted in entries. Entries that die by eviction or `clear`
/// are reported to the core's [`EvictionListener`](crate::EvictionListener)
/// exactly once. Whether an explicit `remove` is reported depends on the
/// policy: ARC reports it, LRU, LFU and TTL do not.
pub trait EvictionPolicy<K, V> {
  /// Inserts or updates `key`, evicting as the policy requires.
  fn add(&mut self, key: K, value: V) -> AddOutcome;

  /// Looks up `key`, recording the access.
  fn get<Q>(&mut self, key: &Q) -> Option<&V>
  where
    K: Borrow<Q>,
    Q: Hash + Eq + ?Sized;

  /// Looks up `key` without recording the access.
  fn peek<Q>(&self, key: &Q) -> Option<&V>
  where
    K: Borrow<Q>,
    Q: Hash + Eq + ?Sized;

  /// Tests whether `key` is resident, without recording the access.
  fn contains<Q>(&self, key: &Q) -> bool
  where
    K: Borrow<Q>,
    Q: Hash + Eq + ?Sized;

  /// Removes `key`, returning its value.
  fn remove<Q>(&mut self, key: &Q) -> Option<V>
  where
    K: Borrow<Q>,
    Q: Hash + Eq + ?Sized;

  /// The entry the policy would evict next.
  fn least_used(&self) -> Option<(&K, &V)>;

  /// Evicts and returns the entry the policy would evict next.
  fn remove_least_used(&mut self) -> Option<(K, V)>;

  /// The number of resident entries.
  fn len(&self) -> usize;

  fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// The maximum number of resident entries.
  fn capacity(&self) -> usize;

  /// Changes the capacity, evicting down to it when shrinking.
  ///
  /// Returns the signed change `new - old`.
  fn resize(&mut self, capacity: usize) -> Result<isize, CacheError>;

  /// Drops every entry, reporting each one to the listener.
  fn clear(&mut self);
}
