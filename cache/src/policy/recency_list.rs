use generational_arena::{Arena, Index};

/// A stable reference to an element of a [`RecencyList`].
///
/// A handle stays valid until its element is removed. Handles of removed
/// elements never alias a later element, since the arena tags every slot
/// with a generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle(Index);

#[derive(Debug)]
struct Node<T> {
  value: T,
  prev: Option<Index>,
  next: Option<Index>,
}

/// A doubly-linked list whose elements live in a generational arena.
///
/// The front is the most-recently-used end and the back is the
/// least-recently-used end. All splicing operations are O(1).
#[derive(Debug)]
pub struct RecencyList<T> {
  nodes: Arena<Node<T>>,
  head: Option<Index>,
  tail: Option<Index>,
}

impl<T> Default for RecencyList<T> {
  fn default() -> Self {
    Self::new()
  }
}

impl<T> RecencyList<T> {
  pub fn new() -> Self {
    Self {
      nodes: Arena::new(),
      head: None,
      tail: None,
    }
  }

  #[inline]
  pub fn len(&self) -> usize {
    self.nodes.len()
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.nodes.is_empty()
  }

  #[inline]
  pub fn contains(&self, handle: Handle) -> bool {
    self.nodes.contains(handle.0)
  }

  // Detaches a node from its neighbours. The node stays in the arena.
  fn unlink(&mut self, index: Index) {
    let (prev, next) = {
      let node = &self.nodes[index];
      (node.prev, node.next)
    };

    match prev {
      Some(prev_idx) => self.nodes[prev_idx].next = next,
      None => self.head = next,
    }
    match next {
      Some(next_idx) => self.nodes[next_idx].prev = prev,
      None => self.tail = prev,
    }

    let node = &mut self.nodes[index];
    node.prev = None;
    node.next = None;
  }

  // Links a detached node in as the new head.
  fn link_front(&mut self, index: Index) {
    let old_head = self.head;
    {
      let node = &mut self.nodes[index];
      node.prev = None;
      node.next = old_head;
    }
    match old_head {
      Some(old) => self.nodes[old].prev = Some(index),
      None => self.tail = Some(index),
    }
    self.head = Some(index);
  }

  // Links a detached node in as the new tail.
  fn link_back(&mut self, index: Index) {
    let old_tail = self.tail;
    {
      let node = &mut self.nodes[index];
      node.next = None;
      node.prev = old_tail;
    }
    match old_tail {
      Some(old) => self.nodes[old].next = Some(index),
      None => self.head = Some(index),
    }
    self.tail = Some(index);
  }

  /// Prepends `value`, making it the most-recently-used element.
  pub fn push_front(&mut self, value: T) -> Handle {
    let index = self.nodes.insert(Node {
      value,
      prev: None,
      next: None,
    });
    self.link_front(index);
    Handle(index)
  }

  /// Appends `value`, making it the least-recently-used element.
  pub fn push_back(&mut self, value: T) -> Handle {
    let index = self.nodes.insert(Node {
      value,
      prev: None,
      next: None,
    });
    self.link_back(index);
    Handle(index)
  }

  /// Inserts `value` directly behind `anchor` (towards the back).
  ///
  /// If `anchor` is no longer in the list the value is appended instead.
  pub fn insert_after(&mut self, anchor: Handle, value: T) -> Handle {
    if !self.nodes.contains(anchor.0) {
      return self.push_back(value);
    }
    let next = self.nodes[anchor.0].next;
    let index = self.nodes.insert(Node {
      value,
      prev: Some(anchor.0),
      next,
    });
    self.nodes[anchor.0].next = Some(index);
    match next {
      Some(next_idx) => self.nodes[next_idx].prev = Some(index),
      None => self.tail = Some(index),
    }
    Handle(index)
  }

  /// Moves an element to the front. Returns `false` for a stale handle.
  pub fn move_to_front(&mut self, handle: Handle) -> bool {
    if !self.nodes.contains(handle.0) {
      return false;
    }
    if self.head != Some(handle.0) {
      self.unlink(handle.0);
      self.link_front(handle.0);
    }
    true
  }

  /// Moves an element to the back. Returns `false` for a stale handle.
  pub fn move_to_back(&mut self, handle: Handle) -> bool {
    if !self.nodes.contains(handle.0) {
      return false;
    }
    if self.tail != Some(handle.0) {
      self.unlink(handle.0);
      self.link_back(handle.0);
    }
    true
  }

  /// Unlinks an element and returns its payload.
  pub fn remove(&mut self, handle: Handle) -> Option<T> {
    if !self.nodes.contains(handle.0) {
      return None;
    }
    self.unlink(handle.0);
    self.nodes.remove(handle.0).map(|node| node.value)
  }

  #[inline]
  pub fn front(&self) -> Option<Handle> {
    self.head.map(Handle)
  }

  #[inline]
  pub fn back(&self) -> Option<Handle> {
    self.tail.map(Handle)
  }

  /// The neighbour of `handle` towards the back of the list.
  pub fn next(&self, handle: Handle) -> Option<Handle> {
    self.nodes.get(handle.0).and_then(|node| node.next).map(Handle)
  }

  /// The neighbour of `handle` towards the front of the list.
  pub fn prev(&self, handle: Handle) -> Option<Handle> {
    self.nodes.get(handle.0).and_then(|node| node.prev).map(Handle)
  }

  #[inline]
  pub fn get(&self, handle: Handle) -> Option<&T> {
    self.nodes.get(handle.0).map(|node| &node.value)
  }

  #[inline]
  pub fn get_mut(&mut self, handle: Handle) -> Option<&mut T> {
    self.nodes.get_mut(handle.0).map(|node| &mut node.value)
  }

  pub fn pop_front(&mut self) -> Option<T> {
    let head = self.head?;
    self.remove(Handle(head))
  }

  pub fn pop_back(&mut self) -> Option<T> {
    let tail = self.tail?;
    self.remove(Handle(tail))
  }

  pub fn clear(&mut self) {
    self.nodes.clear();
    self.head = None;
    self.tail = None;
  }

  /// Iterates from the front (most recent) to the back (least recent).
  /// Call `.rev()` for the opposite direction.
  pub fn iter(&self) -> Iter<'_, T> {
    Iter {
      list: self,
      front: self.head,
      back: self.tail,
      remaining: self.nodes.len(),
    }
  }

  /// Removes every element, front to back, handing each payload to `f`.
  pub fn drain_with<F>(&mut self, mut f: F)
  where
    F: FnMut(T),
  {
    while let Some(value) = self.pop_front() {
      f(value);
    }
  }
}

/// Double-ended iterator over the payloads of a [`RecencyList`].
pub struct Iter<'a, T> {
  list: &'a RecencyList<T>,
  front: Option<Index>,
  back: Option<Index>,
  remaining: usize,
}

impl<'a, T> Iterator for Iter<'a, T> {
  type Item = &'a T;

  fn next(&mut self) -> Option<Self::Item> {
    if self.remaining == 0 {
      return None;
    }
    let index = self.front?;
    let node = &self.list.nodes[index];
    self.front = node.next;
    self.remaining -= 1;
    Some(&node.value)
  }

  fn size_hint(&self) -> (usize, Option<usize>) {
    (self.remaining, Some(self.remaining))
  }
}

impl<'a, T> DoubleEndedIterator for Iter<'a, T> {
  fn next_back(&mut self) -> Option<Self::Item> {
    if self.remaining == 0 {
      return None;
    }
    let index = self.back?;
    let node = &self.list.nodes[index];
    self.back = node.prev;
    self.remaining -= 1;
    Some(&node.value)
  }
}

impl<'a, T> ExactSizeIterator for Iter<'a, T> {}

#[cfg(test)]
mod tests {
  use super::*;

  fn values(list: &RecencyList<i32>) -> Vec<i32> {
    list.iter().copied().collect()
  }

  #[test]
  fn new_list_is_empty() {
    let list = RecencyList::<i32>::new();
    assert!(list.is_empty());
    assert_eq!(list.len(), 0);
    assert!(list.front().is_none());
    assert!(list.back().is_none());
    assert!(values(&list).is_empty());
  }

  #[test]
  fn push_front_orders_newest_first() {
    let mut list = RecencyList::new();
    list.push_front(1);
    list.push_front(2);
    list.push_front(3);
    assert_eq!(values(&list), vec![3, 2, 1]);
    assert_eq!(list.get(list.back().unwrap()), Some(&1));
    assert_eq!(list.get(list.front().unwrap()), Some(&3));
  }

  #[test]
  fn push_back_appends() {
    let mut list = RecencyList::new();
    list.push_back(1);
    list.push_back(2);
    list.push_front(0);
    assert_eq!(values(&list), vec![0, 1, 2]);
  }

  #[test]
  fn move_to_front_from_back_and_middle() {
    let mut list = RecencyList::new();
    let one = list.push_front(1);
    let two = list.push_front(2);
    list.push_front(3);

    assert!(list.move_to_front(one));
    assert_eq!(values(&list), vec![1, 3, 2]);

    assert!(list.move_to_front(two));
    assert_eq!(values(&list), vec![2, 1, 3]);

    // Already at the front: no-op.
    assert!(list.move_to_front(two));
    assert_eq!(values(&list), vec![2, 1, 3]);
  }

  #[test]
  fn move_to_back_reorders() {
    let mut list = RecencyList::new();
    list.push_back(1);
    let two = list.push_back(2);
    list.push_back(3);
    assert!(list.move_to_back(two));
    assert_eq!(values(&list), vec![1, 3, 2]);
  }

  #[test]
  fn remove_from_middle_and_ends() {
    let mut list = RecencyList::new();
    let a = list.push_back(1);
    let b = list.push_back(2);
    let c = list.push_back(3);

    assert_eq!(list.remove(b), Some(2));
    assert_eq!(values(&list), vec![1, 3]);
    assert_eq!(list.remove(a), Some(1));
    assert_eq!(list.remove(c), Some(3));
    assert!(list.is_empty());
    assert!(list.front().is_none());
    assert!(list.back().is_none());
  }

  #[test]
  fn stale_handles_are_rejected() {
    let mut list = RecencyList::new();
    let a = list.push_back(1);
    assert_eq!(list.remove(a), Some(1));
    // The slot is reused with a new generation.
    let b = list.push_back(2);
    assert_ne!(a, b);
    assert_eq!(list.remove(a), None);
    assert!(!list.move_to_front(a));
    assert!(list.get(a).is_none());
    assert_eq!(values(&list), vec![2]);
  }

  #[test]
  fn insert_after_links_between_neighbours() {
    let mut list = RecencyList::new();
    let a = list.push_back(1);
    list.push_back(3);
    let b = list.insert_after(a, 2);
    assert_eq!(values(&list), vec![1, 2, 3]);
    assert_eq!(list.next(a), Some(b));
    assert_eq!(list.prev(b), Some(a));

    let tail = list.back().unwrap();
    list.insert_after(tail, 4);
    assert_eq!(values(&list), vec![1, 2, 3, 4]);
    assert_eq!(list.get(list.back().unwrap()), Some(&4));
  }

  #[test]
  fn pop_ends() {
    let mut list = RecencyList::new();
    list.push_back(1);
    list.push_back(2);
    list.push_back(3);
    assert_eq!(list.pop_back(), Some(3));
    assert_eq!(list.pop_front(), Some(1));
    assert_eq!(list.pop_back(), Some(2));
    assert_eq!(list.pop_back(), None);
  }

  #[test]
  fn iterates_in_both_directions() {
    let mut list = RecencyList::new();
    for i in 0..5 {
      list.push_front(i);
    }
    let backwards: Vec<i32> = list.iter().rev().copied().collect();
    assert_eq!(backwards, vec![0, 1, 2, 3, 4]);

    let mut iter = list.iter();
    assert_eq!(iter.len(), 5);
    assert_eq!(iter.next(), Some(&4));
    assert_eq!(iter.next_back(), Some(&0));
    assert_eq!(iter.len(), 3);
    let middle: Vec<i32> = iter.copied().collect();
    assert_eq!(middle, vec![3, 2, 1]);
  }

  #[test]
  fn clear_and_drain() {
    let mut list = RecencyList::new();
    list.push_back(1);
    list.push_back(2);
    let mut seen = Vec::new();
    list.drain_with(|v| seen.push(v));
    assert_eq!(seen, vec![1, 2]);
    assert!(list.is_empty());

    list.push_back(9);
    list.clear();
    assert!(list.is_empty());
    assert!(list.back().is_none());
  }
}
