mod common;

use adaptive_cache::{ArcPolicy, ArcTier, Cache, CacheBuilder, EvictionReason};
use common::{seeded_rng, Recorder};

use rand::Rng;

type ArcCache<K, V> = Cache<K, V, ArcPolicy<K, V>>;

fn assert_arc_invariants<V>(cache: &ArcCache<u32, V>, universe: u32) {
  cache.with_policy(|arc| {
    let c = adaptive_cache::EvictionPolicy::capacity(arc);
    let (t1, t2) = (arc.recent_len(), arc.frequent_len());
    let (b1, b2) = (arc.recent_ghost_len(), arc.frequent_ghost_len());
    assert!(arc.p() <= c, "p = {} exceeds capacity {c}", arc.p());
    assert!(t1 + t2 <= c, "residents {t1} + {t2} exceed capacity {c}");
    assert!(t1 + b1 <= c, "|T1| + |B1| = {t1} + {b1} exceeds {c}");
    assert!(t1 + t2 + b1 + b2 <= 2 * c);

    let mut residents = 0;
    let mut ghosts = 0;
    for key in 0..universe {
      let resident = adaptive_cache::EvictionPolicy::contains(arc, &key);
      match arc.tier(&key) {
        Some(ArcTier::Recent) | Some(ArcTier::Frequent) => {
          assert!(resident);
          residents += 1;
        }
        Some(ArcTier::RecentGhost) | Some(ArcTier::FrequentGhost) => {
          assert!(!resident);
          ghosts += 1;
        }
        None => assert!(!resident),
      }
    }
    assert_eq!(residents, t1 + t2);
    assert_eq!(ghosts, b1 + b2);
  });
}

#[test]
fn test_arc_ghost_hit_promotes_and_grows_p() {
  let recorder = Recorder::new();
  let cache = CacheBuilder::default()
    .capacity(2)
    .eviction_listener(recorder.clone())
    .build_arc()
    .unwrap();

  cache.add("a", 1);
  cache.get("a");
  cache.add("b", 2);
  // T1 = [b], T2 = [a]. Admitting c displaces b into B1.
  cache.add("c", 3);
  assert_eq!(cache.with_policy(|p| p.tier("b")), Some(ArcTier::RecentGhost));
  assert_eq!(cache.with_policy(|p| p.p()), 0);

  let outcome = cache.add("b", 20);
  assert!(!outcome.found);
  assert!(outcome.evicted);
  cache.with_policy(|arc| {
    assert_eq!(arc.p(), 1);
    assert_eq!(arc.tier("b"), Some(ArcTier::Frequent));
    assert_eq!(arc.tier("a"), Some(ArcTier::FrequentGhost));
    assert_eq!(arc.tier("c"), Some(ArcTier::Recent));
  });
  assert_eq!(cache.get("b"), Some(20));
  assert_eq!(
    recorder.events(),
    vec![
      ("b", 2, EvictionReason::Capacity),
      ("a", 1, EvictionReason::Capacity)
    ]
  );
}

#[test]
fn test_arc_full_recent_side_drops_without_ghost() {
  let recorder = Recorder::new();
  let cache = CacheBuilder::default()
    .capacity(2)
    .eviction_listener(recorder.clone())
    .build_arc()
    .unwrap();

  cache.add('A', ());
  cache.add('B', ());
  cache.add('C', ());
  assert_eq!(recorder.keys(), vec!['A']);
  cache.with_policy(|arc| {
    assert_eq!(arc.tier(&'A'), None);
    assert_eq!(arc.recent_len(), 2);
    assert_eq!(arc.recent_ghost_len(), 0);
  });

  // A is unknown again, so it re-enters T1 and p stays put.
  cache.add('A', ());
  cache.with_policy(|arc| {
    assert_eq!(arc.tier(&'A'), Some(ArcTier::Recent));
    assert_eq!(arc.p(), 0);
  });
}

#[test]
fn test_arc_replace_prefers_t1_above_target() {
  let recorder = Recorder::new();
  let cache = CacheBuilder::default()
    .capacity(4)
    .eviction_listener(recorder.clone())
    .build_arc()
    .unwrap();

  for key in ['A', 'B', 'C', 'D'] {
    cache.add(key, key as u32);
  }
  cache.get(&'A');
  cache.get(&'B');
  cache.add('E', 'E' as u32);

  // |T1| = 2 > p = 0, so the LRU of T1 leaves.
  assert_eq!(recorder.keys(), vec!['C']);
  cache.with_policy(|arc| {
    assert_eq!(arc.tier(&'C'), Some(ArcTier::RecentGhost));
    assert_eq!(arc.tier(&'A'), Some(ArcTier::Frequent));
    assert_eq!(arc.tier(&'B'), Some(ArcTier::Frequent));
    assert_eq!(arc.tier(&'D'), Some(ArcTier::Recent));
    assert_eq!(arc.tier(&'E'), Some(ArcTier::Recent));
  });
}

#[test]
fn test_arc_replace_takes_t2_within_target() {
  let recorder = Recorder::new();
  let cache = CacheBuilder::default()
    .capacity(2)
    .eviction_listener(recorder.clone())
    .build_arc()
    .unwrap();

  cache.add(1, ());
  cache.get(&1);
  cache.add(2, ());
  cache.add(3, ());
  cache.add(2, ());
  // p = 1, T1 = [3], T2 = [2].
  recorder.reset();

  cache.add(4, ());
  assert_eq!(recorder.keys(), vec![2]);
  cache.with_policy(|arc| {
    assert_eq!(arc.p(), 1);
    assert_eq!(arc.tier(&2), Some(ArcTier::FrequentGhost));
    assert_eq!(arc.tier(&3), Some(ArcTier::Recent));
    assert_eq!(arc.tier(&4), Some(ArcTier::Recent));
    assert_eq!(arc.frequent_len(), 0);
  });
}

#[test]
fn test_arc_b2_hit_shrinks_p() {
  let cache = CacheBuilder::default().capacity(2).build_arc().unwrap();
  cache.add(1, ());
  cache.get(&1);
  cache.add(2, ());
  cache.add(3, ());
  cache.add(2, ());
  // p = 1 and key 1 sits in B2.
  assert_eq!(cache.with_policy(|arc| arc.tier(&1)), Some(ArcTier::FrequentGhost));

  cache.add(1, ());
  cache.with_policy(|arc| {
    assert_eq!(arc.p(), 0);
    assert_eq!(arc.tier(&1), Some(ArcTier::Frequent));
  });
}

#[test]
fn test_arc_remove_reports_and_remembers() {
  let recorder = Recorder::new();
  let cache = CacheBuilder::default()
    .capacity(3)
    .eviction_listener(recorder.clone())
    .build_arc()
    .unwrap();

  cache.add("k", 7);
  assert_eq!(cache.remove("k"), Some(7));
  assert_eq!(recorder.events(), vec![("k", 7, EvictionReason::Invalidated)]);
  assert_eq!(cache.with_policy(|arc| arc.tier("k")), Some(ArcTier::RecentGhost));
  assert_eq!(cache.get("k"), None);
  assert_eq!(cache.with_policy(|arc| arc.p()), 0);

  let snap = cache.metrics();
  assert_eq!(snap.invalidations, 1);
  assert_eq!(snap.evicted_by_capacity, 0);
}

#[test]
fn test_arc_resize_trims_ghosts() {
  let cache = CacheBuilder::default().capacity(4).build_arc().unwrap();
  for key in 0..4u32 {
    cache.add(key, ());
    cache.get(&key);
  }
  for key in 4..8u32 {
    cache.add(key, ());
  }
  assert_eq!(cache.resize(1), Ok(-3));
  assert_eq!(cache.len(), 1);
  assert_arc_invariants(&cache, 8);
  assert!(cache.with_policy(|arc| arc.p()) <= 1);
}

#[test]
fn test_arc_clear_forgets_history() {
  let recorder = Recorder::new();
  let cache = CacheBuilder::default()
    .capacity(2)
    .eviction_listener(recorder.clone())
    .build_arc()
    .unwrap();
  cache.add(1, ());
  cache.get(&1);
  cache.add(2, ());
  cache.add(3, ());
  cache.clear();

  assert_eq!(recorder.count(EvictionReason::Cleared), 2);
  cache.with_policy(|arc| {
    assert_eq!(arc.p(), 0);
    assert_eq!(arc.recent_ghost_len() + arc.frequent_ghost_len(), 0);
    assert_eq!(arc.tier(&2), None);
  });
}

#[test]
fn test_arc_invariants_hold_under_random_load() {
  const UNIVERSE: u32 = 24;
  for seed in 0..8u64 {
    let mut rng = seeded_rng(seed);
    let recorder = Recorder::new();
    let cache = CacheBuilder::default()
      .capacity(rng.random_range(1..=8usize))
      .eviction_listener(recorder.clone())
      .build_arc()
      .unwrap();

    for _ in 0..2_000 {
      let key = rng.random_range(0..UNIVERSE);
      match rng.random_range(0..20) {
        0..=8 => {
          let p_before = cache.with_policy(|arc| arc.p());
          let was_b1_ghost = cache.with_policy(|arc| arc.tier(&key)) == Some(ArcTier::RecentGhost);
          cache.add(key, key);
          if was_b1_ghost {
            cache.with_policy(|arc| {
              assert_eq!(arc.tier(&key), Some(ArcTier::Frequent));
              let c = adaptive_cache::EvictionPolicy::capacity(arc);
              assert!(arc.p() > p_before || arc.p() == c);
            });
          }
        }
        9..=15 => {
          let resident = cache.contains(&key);
          assert_eq!(cache.get(&key).is_some(), resident);
        }
        16 => {
          cache.remove(&key);
        }
        17 => {
          cache.remove_least_used();
        }
        18 => {
          let before = cache.len();
          let capacity = rng.random_range(1..=8usize);
          recorder.reset();
          cache.resize(capacity).unwrap();
          let expected = before.saturating_sub(capacity);
          assert_eq!(recorder.count(EvictionReason::Capacity), expected);
        }
        _ => {
          assert_eq!(cache.peek(&key).is_some(), cache.contains(&key));
        }
      }
      assert_arc_invariants(&cache, UNIVERSE);
    }
  }
}
