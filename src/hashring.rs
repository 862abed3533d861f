//! Consistent hashing ring with virtual nodes
//!
//! Maps keys to the peer responsible for them. Each peer occupies
//! `replicas` positions on a 32-bit ring, and a key belongs to the first
//! position clockwise from its own hash.
//!
//! # Example
//!
//! ```rust
//! use peercache::hashring::HashRing;
//!
//! let mut ring = HashRing::new(50);
//! ring.add(["http://10.0.0.1:9000", "http://10.0.0.2:9000"]);
//! let owner = ring.get("Tom").unwrap();
//! assert!(owner.starts_with("http://10.0.0."));
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Hash function used to place peers and keys on the ring.
pub type HashFn = Arc<dyn Fn(&[u8]) -> u32 + Send + Sync>;

/// Default number of virtual nodes per peer
pub const DEFAULT_REPLICAS: usize = 50;

// == Hash Ring ==
/// Consistent hash ring.
///
/// Lookups are read-only; callers that add peers while others look keys up
/// must wrap the ring in a lock.
#[derive(Clone)]
pub struct HashRing {
    hash: HashFn,
    replicas: usize,
    /// Sorted virtual node hashes
    keys: Vec<u32>,
    /// Virtual node hash to peer
    nodes: HashMap<u32, String>,
}

impl HashRing {
    // == Constructors ==
    /// Creates an empty ring hashing with CRC-32 (IEEE).
    pub fn new(replicas: usize) -> Self {
        Self::with_hasher(replicas, Arc::new(crc32fast::hash))
    }

    /// Creates an empty ring with a custom hash function.
    pub fn with_hasher(replicas: usize, hash: HashFn) -> Self {
        Self {
            hash,
            replicas: replicas.max(1),
            keys: Vec::new(),
            nodes: HashMap::new(),
        }
    }

    // == Membership ==
    /// Adds peers to the ring.
    ///
    /// Virtual node `i` of peer `p` sits at `hash(i ++ p)`. On a hash
    /// collision the peer placed first keeps the position.
    pub fn add<I, S>(&mut self, peers: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for peer in peers {
            let peer = peer.as_ref();
            for i in 0..self.replicas {
                let hash = (self.hash)(format!("{i}{peer}").as_bytes());
                if let std::collections::hash_map::Entry::Vacant(slot) = self.nodes.entry(hash) {
                    slot.insert(peer.to_string());
                    self.keys.push(hash);
                }
            }
        }
        self.keys.sort_unstable();
    }

    /// Removes a peer and all of its virtual nodes.
    pub fn remove(&mut self, peer: &str) {
        self.nodes.retain(|_, owner| owner != peer);
        let nodes = &self.nodes;
        self.keys.retain(|hash| nodes.contains_key(hash));
    }

    // == Lookup ==
    /// Returns the peer owning `key`, or `None` when the ring is empty.
    pub fn get(&self, key: &str) -> Option<&str> {
        if self.keys.is_empty() {
            return None;
        }

        let hash = (self.hash)(key.as_bytes());
        // First virtual node at or after the key, wrapping to the start.
        let idx = self.keys.partition_point(|&k| k < hash) % self.keys.len();
        self.nodes.get(&self.keys[idx]).map(String::as_str)
    }

    /// Returns the distinct peers on the ring, sorted.
    pub fn peers(&self) -> Vec<String> {
        let mut peers: Vec<String> = self.nodes.values().cloned().collect();
        peers.sort();
        peers.dedup();
        peers
    }

    pub fn replicas(&self) -> usize {
        self.replicas
    }

    /// Number of virtual nodes on the ring.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl fmt::Debug for HashRing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashRing")
            .field("replicas", &self.replicas)
            .field("virtual_nodes", &self.keys.len())
            .field("peers", &self.peers())
            .finish()
    }
}
