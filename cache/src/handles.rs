//! The thread-safe cache handles.

mod sync;
mod ttl;

pub use sync::Cache;
pub use ttl::TtlCache;
