use adaptive_cache::CacheBuilder;
use std::thread;
use std::time::Duration;

fn main() {
  // A cache of 100 items whose entries live for 2 seconds, swept every 2 seconds.
  let cache = CacheBuilder::default()
    .capacity(100)
    .time_to_live(Duration::from_secs(2))
    .clean_interval(Duration::from_secs(2))
    .on_evict(|key: &String, value: &u32| println!("[Listener] {key} = {value} expired"))
    .build_ttl()
    .expect("Failed to build cache");

  println!("Adding ('key1', 100) to the cache.");
  cache.add("key1".to_string(), 100);

  match cache.get("key1") {
    Some(value) => println!("Found value for key1: {}", value),
    None => println!("Value for key1 not found."),
  }

  println!("\nCache metrics: {:#?}", cache.metrics());

  println!("\nWaiting 5 seconds for the sweeper to drop the entry...");
  thread::sleep(Duration::from_secs(5));

  println!("Entries left: {}", cache.len());
  match cache.get("key1") {
    Some(value) => println!("Found value for key1: {}", value),
    None => println!("Value for key1 not found (as expected after TTL)."),
  }

  println!("\nCache metrics after expiration: {:#?}", cache.metrics());
}
