//! HTTP Peers
//!
//! Peer-to-peer fetches over the same `GET <base>?groupName=&key=` surface
//! clients use, routed with a consistent hash ring.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::RwLock;
use reqwest::StatusCode;
use tracing::{debug, info};

use crate::error::{CacheError, Result};
use crate::hashring::{HashFn, HashRing};
use crate::peers::{PeerGetter, PeerPicker};

// == HTTP Getter ==
/// Client for one remote node.
#[derive(Debug, Clone)]
pub struct HttpGetter {
    /// Peer address plus base path, e.g. `http://10.0.0.2:9000/peercache`
    base_url: String,
    peer: String,
    client: reqwest::Client,
}

impl HttpGetter {
    pub fn new(peer: &str, base_path: &str, client: reqwest::Client) -> Self {
        Self {
            base_url: format!("{}{}", peer.trim_end_matches('/'), base_path),
            peer: peer.to_string(),
            client,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl PeerGetter for HttpGetter {
    async fn get(&self, group: &str, key: &str) -> Result<Bytes> {
        debug!(peer = %self.peer, group, key, "fetching from peer");
        let response = self
            .client
            .get(&self.base_url)
            .query(&[("groupName", group), ("key", key)])
            .send()
            .await
            .map_err(|e| CacheError::LoadFailure(format!("peer {}: {e}", self.peer)))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(CacheError::NotFound(key.to_string()));
        }
        if status != StatusCode::OK {
            return Err(CacheError::LoadFailure(format!(
                "peer {} returned {status}",
                self.peer
            )));
        }

        response
            .bytes()
            .await
            .map_err(|e| CacheError::LoadFailure(format!("reading body from {}: {e}", self.peer)))
    }

    fn addr(&self) -> &str {
        &self.peer
    }
}

#[derive(Debug)]
struct PoolState {
    ring: HashRing,
    getters: HashMap<String, Arc<HttpGetter>>,
}

// == HTTP Pool ==
/// Ring of every node in the cluster, including this one.
///
/// Keys owned by this node resolve to `None` in [`PeerPicker::pick_peer`],
/// so the group loads them locally.
pub struct HttpPool {
    self_addr: String,
    base_path: String,
    replicas: usize,
    hash: Option<HashFn>,
    client: reqwest::Client,
    state: RwLock<PoolState>,
}

impl HttpPool {
    /// Creates a pool for the node reachable at `self_addr`.
    pub fn new(self_addr: impl Into<String>, base_path: impl Into<String>, replicas: usize) -> Self {
        Self::build(self_addr.into(), base_path.into(), replicas, None)
    }

    /// Creates a pool placing nodes with a custom hash function.
    pub fn with_hasher(
        self_addr: impl Into<String>,
        base_path: impl Into<String>,
        replicas: usize,
        hash: HashFn,
    ) -> Self {
        Self::build(self_addr.into(), base_path.into(), replicas, Some(hash))
    }

    fn build(self_addr: String, base_path: String, replicas: usize, hash: Option<HashFn>) -> Self {
        let ring = new_ring(replicas, hash.clone());
        Self {
            self_addr: self_addr.trim_end_matches('/').to_string(),
            base_path,
            replicas,
            hash,
            client: reqwest::Client::new(),
            state: RwLock::new(PoolState {
                ring,
                getters: HashMap::new(),
            }),
        }
    }

    // == Membership ==
    /// Replaces the cluster membership. This node is always part of it.
    pub fn set_peers<I, S>(&self, peers: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut members: Vec<String> = peers
            .into_iter()
            .map(|p| p.as_ref().trim_end_matches('/').to_string())
            .filter(|p| !p.is_empty())
            .collect();
        members.push(self.self_addr.clone());
        members.sort();
        members.dedup();

        let mut ring = new_ring(self.replicas, self.hash.clone());
        ring.add(&members);
        let getters = members
            .iter()
            .filter(|p| **p != self.self_addr)
            .map(|p| {
                let getter = HttpGetter::new(p, &self.base_path, self.client.clone());
                (p.clone(), Arc::new(getter))
            })
            .collect();

        info!(node = %self.self_addr, peers = ?members, "peer ring updated");
        *self.state.write() = PoolState { ring, getters };
    }

    pub fn self_addr(&self) -> &str {
        &self.self_addr
    }

    /// Node on the ring owning `key`.
    pub fn owner(&self, key: &str) -> Option<String> {
        self.state.read().ring.get(key).map(str::to_string)
    }

    /// All cluster members, sorted.
    pub fn peers(&self) -> Vec<String> {
        self.state.read().ring.peers()
    }
}

impl std::fmt::Debug for HttpPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpPool")
            .field("self_addr", &self.self_addr)
            .field("base_path", &self.base_path)
            .field("state", &*self.state.read())
            .finish()
    }
}

fn new_ring(replicas: usize, hash: Option<HashFn>) -> HashRing {
    match hash {
        Some(hash) => HashRing::with_hasher(replicas, hash),
        None => HashRing::new(replicas),
    }
}

// == Peer Picking ==
impl PeerPicker for HttpPool {
    fn pick_peer(&self, key: &str) -> Option<Arc<dyn PeerGetter>> {
        let state = self.state.read();
        let owner = state.ring.get(key)?;
        if owner == self.self_addr {
            return None;
        }
        let getter = state.getters.get(owner)?;
        Some(Arc::clone(getter) as Arc<dyn PeerGetter>)
    }
}
