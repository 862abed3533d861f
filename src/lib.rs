//! Peercache - A distributed in-memory byte cache
//!
//! Each node keeps bounded LRU caches partitioned into named groups, routes
//! keys it does not own to their owner over HTTP using a consistent hash
//! ring, and coalesces concurrent misses so every key is loaded once.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod group;
pub mod hashring;
pub mod models;
pub mod peers;
pub mod singleflight;
pub mod tasks;

pub use api::AppState;
pub use config::Config;
pub use error::{CacheError, Result};
pub use group::{Group, GroupRegistry};
pub use tasks::spawn_stats_task;
