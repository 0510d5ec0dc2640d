#![allow(dead_code)]

use adaptive_cache::{EvictionListener, EvictionReason};

use std::sync::Arc;

use parking_lot::Mutex;
use rand::SeedableRng;
use rand_pcg::Pcg64;

/// A listener that remembers every eviction it is told about.
pub struct Recorder<K, V> {
  events: Arc<Mutex<Vec<(K, V, EvictionReason)>>>,
}

impl<K, V> Clone for Recorder<K, V> {
  fn clone(&self) -> Self {
    Self {
      events: self.events.clone(),
    }
  }
}

impl<K: Clone, V: Clone> Recorder<K, V> {
  pub fn new() -> Self {
    Self {
      events: Arc::new(Mutex::new(Vec::new())),
    }
  }

  pub fn events(&self) -> Vec<(K, V, EvictionReason)> {
    self.events.lock().clone()
  }

  pub fn keys(&self) -> Vec<K> {
    self.events.lock().iter().map(|(k, _, _)| k.clone()).collect()
  }

  pub fn len(&self) -> usize {
    self.events.lock().len()
  }

  pub fn count(&self, reason: EvictionReason) -> usize {
    self
      .events
      .lock()
      .iter()
      .filter(|(_, _, r)| *r == reason)
      .count()
  }

  pub fn reset(&self) {
    self.events.lock().clear();
  }
}

impl<K, V> EvictionListener<K, V> for Recorder<K, V>
where
  K: Clone + Send,
  V: Clone + Send,
{
  fn on_evict(&self, key: &K, value: &V, reason: EvictionReason) {
    self.events.lock().push((key.clone(), value.clone(), reason));
  }
}

pub fn seeded_rng(seed: u64) -> Pcg64 {
  Pcg64::seed_from_u64(seed)
}
