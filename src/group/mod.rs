//! Group Module
//!
//! A group is a named cache namespace: one bounded cache, an optional
//! loader for keys this node owns, and an optional peer picker for keys
//! other nodes own. Misses are coalesced so each key is loaded at most once
//! at a time.

mod loader;
mod registry;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::cache::{ByteView, CacheStats, LruCache, DEFAULT_CAPACITY_BYTES};
use crate::error::{CacheError, Result};
use crate::peers::{PeerGetter, PeerPicker};
use crate::singleflight::Flight;

pub use loader::{FileLoader, Loader, LoaderFn, MapLoader};
pub use registry::GroupRegistry;

// == Group Stats ==
/// Point-in-time counters for one group.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct GroupStats {
    pub name: String,
    pub cache: CacheStats,
    /// Loads that actually ran (after coalescing)
    pub loads: u64,
    /// Loads served by the local loader
    pub local_loads: u64,
    /// Loads served by a remote peer
    pub peer_loads: u64,
    /// Loads that ended in an error
    pub load_errors: u64,
}

#[derive(Debug, Default)]
struct Counters {
    loads: AtomicU64,
    local_loads: AtomicU64,
    peer_loads: AtomicU64,
    load_errors: AtomicU64,
}

impl Counters {
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

// == Group ==
pub struct Group {
    name: String,
    loader: Option<Arc<dyn Loader>>,
    peers: Option<Arc<dyn PeerPicker>>,
    cache: LruCache<ByteView>,
    flight: Flight<ByteView>,
    counters: Counters,
}

impl std::fmt::Debug for Group {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Group")
            .field("name", &self.name)
            .field("has_loader", &self.loader.is_some())
            .field("has_peers", &self.peers.is_some())
            .field("cache", &self.cache.stats())
            .finish()
    }
}

impl Group {
    /// Starts building a group named `name`.
    pub fn builder(name: impl Into<String>) -> GroupBuilder {
        GroupBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn has_loader(&self) -> bool {
        self.loader.is_some()
    }

    // == Get ==
    /// Returns the value for `key`, loading it on a miss.
    ///
    /// Keys owned by another node are fetched from it and kept in the local
    /// cache; keys owned here go through the loader. A group without a
    /// loader reports every miss it cannot fetch remotely as `NotFound`.
    pub async fn get(&self, key: &str) -> Result<ByteView> {
        if key.is_empty() {
            return Err(CacheError::InvalidArgument("key is required".to_string()));
        }

        if let Some(value) = self.cache.get(key)? {
            debug!(group = %self.name, key, "cache hit");
            return Ok(value);
        }
        debug!(group = %self.name, key, "cache miss");

        self.load(key).await
    }

    // == Add ==
    /// Writes a value straight into the cache, bypassing the loader.
    pub fn add(&self, key: &str, value: impl Into<ByteView>) -> Result<()> {
        self.cache.add(key, value.into())
    }

    /// Drops `key` from the local cache. Returns whether it was present.
    pub fn delete(&self, key: &str) -> Result<bool> {
        self.cache.delete(key)
    }

    // == Stats ==
    pub fn stats(&self) -> GroupStats {
        GroupStats {
            name: self.name.clone(),
            cache: self.cache.stats(),
            loads: self.counters.loads.load(Ordering::Relaxed),
            local_loads: self.counters.local_loads.load(Ordering::Relaxed),
            peer_loads: self.counters.peer_loads.load(Ordering::Relaxed),
            load_errors: self.counters.load_errors.load(Ordering::Relaxed),
        }
    }

    /// Coalesced load. The cache is populated before waiters are released.
    async fn load(&self, key: &str) -> Result<ByteView> {
        self.flight
            .run(key, || async {
                Counters::bump(&self.counters.loads);
                let result = self.load_once(key).await;
                match &result {
                    Ok(value) => self.cache.add(key, value.clone())?,
                    Err(err) => {
                        Counters::bump(&self.counters.load_errors);
                        debug!(group = %self.name, key, error = %err, "load failed");
                    }
                }
                result
            })
            .await
    }

    async fn load_once(&self, key: &str) -> Result<ByteView> {
        if let Some(peer) = self.peers.as_ref().and_then(|p| p.pick_peer(key)) {
            match self.load_from_peer(peer.as_ref(), key).await {
                Ok(value) => return Ok(value),
                Err(CacheError::NotFound(missing)) => return Err(CacheError::NotFound(missing)),
                Err(err) => {
                    warn!(group = %self.name, key, peer = peer.addr(), error = %err,
                        "peer fetch failed, loading locally");
                }
            }
        }
        self.load_locally(key).await
    }

    async fn load_from_peer(&self, peer: &dyn PeerGetter, key: &str) -> Result<ByteView> {
        let bytes = peer.get(&self.name, key).await?;
        Counters::bump(&self.counters.peer_loads);
        debug!(group = %self.name, key, peer = peer.addr(), "loaded from peer");
        Ok(ByteView::from(bytes))
    }

    async fn load_locally(&self, key: &str) -> Result<ByteView> {
        let Some(loader) = &self.loader else {
            return Err(CacheError::NotFound(key.to_string()));
        };
        let bytes = loader.load(key).await?;
        Counters::bump(&self.counters.local_loads);
        debug!(group = %self.name, key, "loaded from local source");
        Ok(ByteView::from(bytes))
    }
}

// == Group Builder ==
/// Validates a group's setup before it can serve requests.
pub struct GroupBuilder {
    name: String,
    capacity: usize,
    loader: Option<Arc<dyn Loader>>,
    peers: Option<Arc<dyn PeerPicker>>,
    load_timeout: Option<Duration>,
}

impl GroupBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            capacity: DEFAULT_CAPACITY_BYTES,
            loader: None,
            peers: None,
            load_timeout: None,
        }
    }

    /// Cache capacity in bytes, 0 = unlimited.
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn loader(mut self, loader: impl Loader + 'static) -> Self {
        self.loader = Some(Arc::new(loader));
        self
    }

    pub fn shared_loader(mut self, loader: Option<Arc<dyn Loader>>) -> Self {
        self.loader = loader;
        self
    }

    pub fn peers(mut self, peers: Arc<dyn PeerPicker>) -> Self {
        self.peers = Some(peers);
        self
    }

    /// Deadline for a coalesced load, shared by every waiter.
    pub fn load_timeout(mut self, timeout: Duration) -> Self {
        self.load_timeout = Some(timeout);
        self
    }

    /// Builds the group.
    ///
    /// A group attached to peers will be authoritative for part of the key
    /// space, so it must have a loader; a standalone group may omit it and
    /// then only serves keys added administratively.
    pub fn build(self) -> Result<Group> {
        if self.name.is_empty() {
            return Err(CacheError::InvalidArgument(
                "group name is required".to_string(),
            ));
        }
        if self.peers.is_some() && self.loader.is_none() {
            return Err(CacheError::Configuration(format!(
                "group {} is routed by peers but has no loader",
                self.name
            )));
        }

        info!(
            group = %self.name,
            capacity = self.capacity,
            loader = self.loader.is_some(),
            peers = self.peers.is_some(),
            "group created"
        );
        Ok(Group {
            name: self.name,
            loader: self.loader,
            peers: self.peers,
            cache: LruCache::new(self.capacity),
            flight: match self.load_timeout {
                Some(timeout) => Flight::with_timeout(timeout),
                None => Flight::new(),
            },
            counters: Counters::default(),
        })
    }
}
