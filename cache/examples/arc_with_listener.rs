use adaptive_cache::{CacheBuilder, EvictionListener, EvictionReason};

// A simple listener that just prints evicted entries.
struct PrintListener;

impl EvictionListener<i32, String> for PrintListener {
  fn on_evict(&self, key: &i32, value: &String, reason: EvictionReason) {
    println!(
      "[Listener] Item evicted! Key: {}, Value: '{}', Reason: {}",
      key, value, reason
    );
  }
}

fn print_lists(cache: &adaptive_cache::Cache<i32, String, adaptive_cache::ArcPolicy<i32, String>>) {
  cache.with_policy(|arc| {
    println!(
      "  p = {}, |T1| = {}, |T2| = {}, |B1| = {}, |B2| = {}",
      arc.p(),
      arc.recent_len(),
      arc.frequent_len(),
      arc.recent_ghost_len(),
      arc.frequent_ghost_len()
    )
  });
}

fn main() {
  println!("--- Adaptive replacement cache with an eviction listener ---");

  let cache = CacheBuilder::default()
    .capacity(2)
    .eviction_listener(PrintListener)
    .build_arc()
    .expect("Failed to build cache");

  cache.add(1, "one".to_string());
  cache.get(&1);
  cache.add(2, "two".to_string());
  println!("\nKey 1 was read again, so it moved to T2. Key 2 sits in T1.");
  print_lists(&cache);

  println!("\nAdding key 3 displaces key 2 into the ghost list B1.");
  cache.add(3, "three".to_string());
  print_lists(&cache);

  println!("\nAdding key 2 again is a ghost hit: T1's target p grows.");
  cache.add(2, "two again".to_string());
  print_lists(&cache);

  println!("\nFinal metrics: {:#?}", cache.metrics());
}
