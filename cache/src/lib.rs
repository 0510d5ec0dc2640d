//! Bounded in-memory key-value caches with pluggable eviction.
//!
//! # Features
//! - **Three policies**: least recently used ([`LruPolicy`]), least frequently
//!   used ([`LfuPolicy`]) and the adaptive replacement cache ([`ArcPolicy`]),
//!   all behind one [`EvictionPolicy`] contract.
//! - **Expiration**: [`TtlCache`] drops entries a fixed time after they were
//!   written, lazily on read and in bulk from a background sweeper thread.
//! - **Thread safety**: [`Cache`] wraps any policy in a single reader-writer
//!   lock. The policies themselves are plain single-threaded structures.
//! - **Observability**: eviction listeners and [`MetricsSnapshot`] counters.
//!
//! ```
//! use adaptive_cache::CacheBuilder;
//!
//! let cache = CacheBuilder::default().capacity(2).build_arc().unwrap();
//! cache.add("a", 1);
//! cache.add("b", 2);
//! assert_eq!(cache.get("a"), Some(1));
//! ```

// Public modules that form the API
pub mod builder;
pub mod error;
pub mod handles;
pub mod listener;
pub mod metrics;
pub mod policy;
pub mod time;

// Internal, crate-only modules
mod shared;
mod task;

// Re-export the primary user-facing types for convenience
pub use builder::CacheBuilder;
pub use error::CacheError;
pub use handles::{Cache, TtlCache};
pub use listener::{EvictionListener, EvictionReason};
pub use metrics::MetricsSnapshot;
pub use policy::{
  AddOutcome, AnyPolicy, ArcPolicy, ArcTier, EvictionPolicy, LfuPolicy, LruPolicy, PolicyKind,
  TtlPolicy,
};
pub use task::sweeper::{clamp_clean_interval, MIN_CLEAN_INTERVAL};
pub use time::{Clock, ManualClock, SystemClock};
