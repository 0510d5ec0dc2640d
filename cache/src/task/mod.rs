//! Background work owned by a cache. Today this is only the sweeper that
//! evicts expired entries from a TTL cache.

pub(crate) mod sweeper;
