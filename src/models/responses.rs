//! Response DTOs for the cache node API
//!
//! Defines the structure of JSON response bodies.

use serde::Serialize;

use crate::group::GroupStats;

/// Per-group entry of the stats endpoint
#[derive(Debug, Clone, Serialize)]
pub struct GroupStatsResponse {
    /// Group name
    pub name: String,
    /// Number of cache hits
    pub hits: u64,
    /// Number of cache misses
    pub misses: u64,
    /// Number of evictions
    pub evictions: u64,
    /// Current number of entries in cache
    pub total_entries: usize,
    /// Bytes in use
    pub size_bytes: usize,
    /// Capacity in bytes, 0 = unlimited
    pub capacity_bytes: usize,
    /// Loads that actually ran after coalescing
    pub loads: u64,
    /// Loads served by the local loader
    pub local_loads: u64,
    /// Loads served by peers
    pub peer_loads: u64,
    /// Failed loads
    pub load_errors: u64,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
}

impl From<GroupStats> for GroupStatsResponse {
    fn from(stats: GroupStats) -> Self {
        Self {
            hit_rate: stats.cache.hit_rate(),
            name: stats.name,
            hits: stats.cache.hits,
            misses: stats.cache.misses,
            evictions: stats.cache.evictions,
            total_entries: stats.cache.total_entries,
            size_bytes: stats.cache.size_bytes,
            capacity_bytes: stats.cache.capacity_bytes,
            loads: stats.loads,
            local_loads: stats.local_loads,
            peer_loads: stats.peer_loads,
            load_errors: stats.load_errors,
        }
    }
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    /// This node's ring identifier
    pub node: String,
    /// Cluster members known to this node
    pub peers: Vec<String>,
    /// One entry per registered group
    pub groups: Vec<GroupStatsResponse>,
}

impl StatsResponse {
    /// Creates a new StatsResponse from group statistics
    pub fn new(node: impl Into<String>, peers: Vec<String>, groups: Vec<GroupStats>) -> Self {
        Self {
            node: node.into(),
            peers,
            groups: groups.into_iter().map(Into::into).collect(),
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}
