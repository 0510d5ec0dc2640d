use super::recency_list::{Handle, RecencyList};
use super::{AddOutcome, EvictionPolicy};
use crate::error::{capacity_delta, check_capacity, CacheError};
use crate::listener::{notify, EvictionListener, EvictionReason, SharedListener};

use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;
use std::hash::{BuildHasher, Hash};
use std::sync::Arc;

// A set of keys sharing one access count. Members are kept newest-first so
// that ties break towards the oldest member.
#[derive(Debug)]
struct Bucket<K> {
  frequency: u64,
  members: RecencyList<K>,
}

impl<K> Bucket<K> {
  fn new(frequency: u64) -> Self {
    Self {
      frequency,
      members: RecencyList::new(),
    }
  }
}

#[derive(Debug)]
struct Entry<V> {
  value: V,
  bucket: Handle,
  member: Handle,
}

/// An eviction policy that evicts the least frequently used entry.
///
/// Frequencies are positional: buckets form an ascending list and an entry's
/// count is the count of the bucket it sits in. Touching an entry moves it to
/// the bucket for the next count, creating that bucket if it does not
/// directly follow. Empty buckets are unlinked immediately.
pub struct LfuPolicy<K, V, H = ahash::RandomState> {
  capacity: usize,
  entries: HashMap<K, Entry<V>, H>,
  buckets: RecencyList<Bucket<K>>,
  listener: Option<SharedListener<K, V>>,
}

impl<K, V, H> fmt::Debug for LfuPolicy<K, V, H> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("LfuPolicy")
      .field("capacity", &self.capacity)
      .field("len", &self.entries.len())
      .field("buckets", &self.buckets.len())
      .finish_non_exhaustive()
  }
}

impl<K, V> LfuPolicy<K, V, ahash::RandomState>
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

impl<K, V, H> LfuPolicy<K, V, H>
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
      entries: HashMap::with_hasher(hasher),
      buckets: RecencyList::new(),
      listener,
    })
  }

  /// The access count of a resident key.
  pub fn frequency<Q>(&self, key: &Q) -> Option<u64>
  where
    K: Borrow<Q>,
    Q: Hash + Eq + ?Sized,
  {
    let entry = self.entries.get(key)?;
    self.buckets.get(entry.bucket).map(|bucket| bucket.frequency)
  }

  /// The distinct access counts currently held, ascending.
  pub fn frequencies(&self) -> Vec<u64> {
    self.buckets.iter().map(|bucket| bucket.frequency).collect()
  }

  // Unlinks `bucket` if it no longer has members.
  fn release_if_empty(&mut self, bucket: Handle) {
    if self
      .buckets
      .get(bucket)
      .is_some_and(|b| b.members.is_empty())
    {
      self.buckets.remove(bucket);
    }
  }

  // Moves a member from its bucket to the bucket for the next count.
  // Returns the member's new (bucket, member) handles.
  fn promote(&mut self, bucket: Handle, member: Handle) -> Option<(Handle, Handle)> {
    let next_frequency = self.buckets.get(bucket)?.frequency.saturating_add(1);
    let target = match self.buckets.next(bucket) {
      Some(next) if self.buckets.get(next).map(|b| b.frequency) == Some(next_frequency) => next,
      _ => self.buckets.insert_after(bucket, Bucket::new(next_frequency)),
    };

    let key = self.buckets.get_mut(bucket)?.members.remove(member)?;
    let member = self.buckets.get_mut(target)?.members.push_front(key);
    self.release_if_empty(bucket);
    Some((target, member))
  }

  // Finds or creates the head bucket for count 1.
  fn first_bucket(&mut self) -> Handle {
    match self.buckets.front() {
      Some(head) if self.buckets.get(head).map(|b| b.frequency) == Some(1) => head,
      _ => self.buckets.push_front(Bucket::new(1)),
    }
  }

  // Evicts the oldest member of the lowest-count bucket.
  fn evict_least(&mut self, reason: EvictionReason) -> Option<(K, V)> {
    let head = self.buckets.front()?;
    let key = self.buckets.get_mut(head)?.members.pop_back()?;
    self.release_if_empty(head);
    let entry = self.entries.remove(&key)?;
    notify(&self.listener, &key, &entry.value, reason);
    Some((key, entry.value))
  }
}

impl<K, V, H> EvictionPolicy<K, V> for LfuPolicy<K, V, H>
where
  K: Eq + Hash + Clone,
  H: BuildHasher,
{
  fn add(&mut self, key: K, value: V) -> AddOutcome {
    if let Some(entry) = self.entries.get_mut(&key) {
      entry.value = value;
      let (bucket, member) = (entry.bucket, entry.member);
      if let Some((bucket, member)) = self.promote(bucket, member) {
        if let Some(entry) = self.entries.get_mut(&key) {
          entry.bucket = bucket;
          entry.member = member;
        }
      }
      return AddOutcome::updated();
    }

    // Evict first so that the newcomer is never its own victim.
    let mut evicted = false;
    while self.entries.len() >= self.capacity {
      if self.evict_least(EvictionReason::Capacity).is_none() {
        break;
      }
      evicted = true;
    }

    let bucket = self.first_bucket();
    let member = match self.buckets.get_mut(bucket) {
      Some(b) => b.members.push_front(key.clone()),
      None => return AddOutcome::inserted(evicted),
    };
    self.entries.insert(
      key,
      Entry {
        value,
        bucket,
        member,
      },
    );
    AddOutcome::inserted(evicted)
  }

  fn get<Q>(&mut self, key: &Q) -> Option<&V>
  where
    K: Borrow<Q>,
    Q: Hash + Eq + ?Sized,
  {
    let (bucket, member) = {
      let entry = self.entries.get(key)?;
      (entry.bucket, entry.member)
    };
    let promoted = self.promote(bucket, member);
    let entry = self.entries.get_mut(key)?;
    if let Some((bucket, member)) = promoted {
      entry.bucket = bucket;
      entry.member = member;
    }
    Some(&entry.value)
  }

  fn peek<Q>(&self, key: &Q) -> Option<&V>
  where
    K: Borrow<Q>,
    Q: Hash + Eq + ?Sized,
  {
    self.entries.get(key).map(|entry| &entry.value)
  }

  fn contains<Q>(&self, key: &Q) -> bool
  where
    K: Borrow<Q>,
    Q: Hash + Eq + ?Sized,
  {
    self.entries.contains_key(key)
  }

  fn remove<Q>(&mut self, key: &Q) -> Option<V>
  where
    K: Borrow<Q>,
    Q: Hash + Eq + ?Sized,
  {
    let entry = self.entries.remove(key)?;
    if let Some(bucket) = self.buckets.get_mut(entry.bucket) {
      bucket.members.remove(entry.member);
    }
    self.release_if_empty(entry.bucket);
    Some(entry.value)
  }

  fn least_used(&self) -> Option<(&K, &V)> {
    let head = self.buckets.get(self.buckets.front()?)?;
    let key = head.members.get(head.members.back()?)?;
    self
      .entries
      .get_key_value(key)
      .map(|(key, entry)| (key, &entry.value))
  }

  fn remove_least_used(&mut self) -> Option<(K, V)> {
    self.evict_least(EvictionReason::Capacity)
  }

  fn len(&self) -> usize {
    self.entries.len()
  }

  fn capacity(&self) -> usize {
    self.capacity
  }

  fn resize(&mut self, capacity: usize) -> Result<isize, CacheError> {
    let capacity = check_capacity(capacity)?;
    let delta = capacity_delta(self.capacity, capacity);
    self.capacity = capacity;
    while self.entries.len() > self.capacity {
      if self.evict_least(EvictionReason::Capacity).is_none() {
        break;
      }
    }
    Ok(delta)
  }

  fn clear(&mut self) {
    for (key, entry) in self.entries.drain() {
      notify(&self.listener, &key, &entry.value, EvictionReason::Cleared);
    }
    self.buckets.clear();
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use parking_lot::Mutex;

  type Log = Arc<Mutex<Vec<(i32, EvictionReason)>>>;

  struct Recorder(Log);

  impl EvictionListener<i32, &'static str> for Recorder {
    fn on_evict(&self, key: &i32, _value: &&'static str, reason: EvictionReason) {
      self.0.lock().push((*key, reason));
    }
  }

  fn recorded(capacity: usize) -> (LfuPolicy<i32, &'static str>, Log) {
    let log: Log = Arc::default();
    let lfu = LfuPolicy::with_listener(capacity, Recorder(log.clone())).unwrap();
    (lfu, log)
  }

  // Buckets ascend strictly, none are empty, and every entry's handles
  // point at a bucket that holds its key.
  fn assert_invariants(lfu: &LfuPolicy<i32, &'static str>) {
    let freqs = lfu.frequencies();
    assert!(freqs.windows(2).all(|w| w[0] < w[1]), "buckets not ascending: {freqs:?}");
    assert!(lfu.buckets.iter().all(|b| !b.members.is_empty()));
    let members: usize = lfu.buckets.iter().map(|b| b.members.len()).sum();
    assert_eq!(members, lfu.entries.len());
    for (key, entry) in &lfu.entries {
      let bucket = lfu.buckets.get(entry.bucket).expect("dangling bucket");
      assert_eq!(bucket.members.get(entry.member), Some(key));
    }
  }

  #[test]
  fn new_entries_start_at_one() {
    let (mut lfu, _) = recorded(3);
    lfu.add(1, "a");
    lfu.add(2, "b");
    assert_eq!(lfu.frequency(&1), Some(1));
    assert_eq!(lfu.frequencies(), vec![1]);
    assert_invariants(&lfu);
  }

  #[test]
  fn get_promotes_to_next_bucket() {
    let (mut lfu, _) = recorded(3);
    lfu.add(1, "a");
    lfu.add(2, "b");
    assert_eq!(lfu.get(&1), Some(&"a"));
    assert_eq!(lfu.frequency(&1), Some(2));
    assert_eq!(lfu.frequencies(), vec![1, 2]);

    lfu.get(&1);
    lfu.get(&2);
    // 1 -> 3, 2 -> 2: the count-1 bucket emptied and was released.
    assert_eq!(lfu.frequencies(), vec![2, 3]);
    assert_invariants(&lfu);
  }

  #[test]
  fn update_counts_as_a_touch() {
    let (mut lfu, _) = recorded(2);
    lfu.add(1, "a");
    assert_eq!(lfu.add(1, "b"), AddOutcome::updated());
    assert_eq!(lfu.peek(&1), Some(&"b"));
    assert_eq!(lfu.frequency(&1), Some(2));
    assert_invariants(&lfu);
  }

  #[test]
  fn peek_and_contains_do_not_touch() {
    let (mut lfu, _) = recorded(2);
    lfu.add(1, "a");
    assert_eq!(lfu.peek(&1), Some(&"a"));
    assert!(lfu.contains(&1));
    assert_eq!(lfu.frequency(&1), Some(1));
  }

  #[test]
  fn evicts_least_frequent_oldest_first() {
    let (mut lfu, log) = recorded(2);
    lfu.add(1, "a");
    lfu.add(2, "b");
    lfu.get(&1);
    assert_eq!(lfu.add(3, "c"), AddOutcome::inserted(true));
    assert_eq!(*log.lock(), vec![(2, EvictionReason::Capacity)]);
    assert!(lfu.contains(&1));
    assert!(lfu.contains(&3));
    assert_invariants(&lfu);
  }

  #[test]
  fn head_bucket_is_created_ahead_of_higher_counts() {
    let (mut lfu, _) = recorded(3);
    lfu.add(1, "a");
    lfu.get(&1);
    // Only a count-2 bucket exists; a new key needs a fresh head.
    lfu.add(2, "b");
    assert_eq!(lfu.frequencies(), vec![1, 2]);
    assert_eq!(lfu.least_used(), Some((&2, &"b")));
    assert_invariants(&lfu);
  }

  #[test]
  fn remove_releases_empty_bucket_without_notifying() {
    let (mut lfu, log) = recorded(3);
    lfu.add(1, "a");
    lfu.add(2, "b");
    lfu.get(&2);
    assert_eq!(lfu.remove(&2), Some("b"));
    assert_eq!(lfu.frequencies(), vec![1]);
    assert!(log.lock().is_empty());
    assert_eq!(lfu.remove(&2), None);
    assert_invariants(&lfu);
  }

  #[test]
  fn resize_shrink_evicts_lowest_counts() {
    let (mut lfu, log) = recorded(4);
    for i in 0..4 {
      lfu.add(i, "v");
    }
    lfu.get(&0);
    lfu.get(&3);
    assert_eq!(lfu.resize(2), Ok(-2));
    assert_eq!(lfu.len(), 2);
    assert!(lfu.contains(&0) && lfu.contains(&3));
    assert_eq!(log.lock().len(), 2);
    assert_eq!(lfu.resize(0), Err(CacheError::InvalidCapacity(0)));
    assert_invariants(&lfu);
  }

  #[test]
  fn clear_notifies_and_resets() {
    let (mut lfu, log) = recorded(3);
    lfu.add(1, "a");
    lfu.add(2, "b");
    lfu.get(&2);
    lfu.clear();
    assert!(lfu.is_empty());
    assert!(lfu.frequencies().is_empty());
    assert_eq!(log.lock().len(), 2);
    assert!(lfu.least_used().is_none());
  }
}
