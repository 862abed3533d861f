//! Peer Access Module
//!
//! How a group reaches the node that owns a key. The group only sees the two
//! traits below; [`HttpPool`] is the HTTP implementation used by the server.

mod http;

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::Result;

pub use http::{HttpGetter, HttpPool};

// == Peer Getter ==
/// Fetches a value from one remote node.
#[async_trait]
pub trait PeerGetter: Send + Sync {
    async fn get(&self, group: &str, key: &str) -> Result<Bytes>;

    /// Identifier of the remote node, for logging.
    fn addr(&self) -> &str;
}

// == Peer Picker ==
/// Chooses the node responsible for a key.
pub trait PeerPicker: Send + Sync {
    /// Returns the remote owner of `key`, or `None` when this node is
    /// authoritative (or knows no peers).
    fn pick_peer(&self, key: &str) -> Option<Arc<dyn PeerGetter>>;
}
