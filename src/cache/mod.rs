//! Cache Module
//!
//! Provides the bounded, size-accounted LRU cache each group owns.

mod byteview;
mod entry;
mod lru;
mod stats;
mod store;


// Re-export public types
pub use byteview::{ByteView, Value};
pub use entry::CacheEntry;
pub use lru::{LruList, Slot};
pub use stats::CacheStats;
pub use store::LruCache;

// == Public Constants ==
/// Default per-group capacity in bytes
pub const DEFAULT_CAPACITY_BYTES: usize = 2 << 10;
