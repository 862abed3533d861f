//! Configuration Module
//!
//! Handles loading and managing node configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::cache::DEFAULT_CAPACITY_BYTES;
use crate::hashring::DEFAULT_REPLICAS;

/// Node configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Path the cache is served under, e.g. `/peercache`
    pub base_path: String,
    /// This node's own address as it appears on the peer ring
    pub self_addr: String,
    /// Other nodes' addresses
    pub peers: Vec<String>,
    /// Virtual nodes per peer on the hash ring
    pub replicas: usize,
    /// Name of the loader-backed group
    pub group_name: String,
    /// Per-group cache capacity in bytes, 0 = unlimited
    pub cache_bytes: usize,
    /// Directory the group's loader reads values from
    pub data_dir: String,
    /// Deadline for a coalesced load in milliseconds, 0 = none
    pub load_timeout_ms: u64,
    /// Interval in seconds between stats log lines
    pub stats_interval: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 9000)
    /// - `BASE_PATH` - Base path of the cache surface (default: /peercache)
    /// - `SELF_ADDR` - This node's ring identifier (default: http://127.0.0.1:<port>)
    /// - `PEERS` - Comma-separated peer addresses (default: none)
    /// - `REPLICAS` - Virtual nodes per peer (default: 50)
    /// - `GROUP_NAME` - Loader-backed group name (default: scores)
    /// - `CACHE_BYTES` - Per-group capacity in bytes (default: 2048)
    /// - `DATA_DIR` - Loader source directory (default: ./data)
    /// - `LOAD_TIMEOUT_MS` - Coalesced load deadline (default: 3000)
    /// - `STATS_INTERVAL` - Stats logging frequency in seconds (default: 60)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let server_port = parse_var("SERVER_PORT").unwrap_or(defaults.server_port);
        Self {
            server_port,
            base_path: env::var("BASE_PATH")
                .ok()
                .map(|p| normalize_base_path(&p))
                .unwrap_or(defaults.base_path),
            self_addr: env::var("SELF_ADDR")
                .ok()
                .filter(|a| !a.is_empty())
                .unwrap_or_else(|| format!("http://127.0.0.1:{server_port}")),
            peers: env::var("PEERS")
                .map(|v| split_peers(&v))
                .unwrap_or_default(),
            replicas: parse_var("REPLICAS").unwrap_or(defaults.replicas),
            group_name: env::var("GROUP_NAME")
                .ok()
                .filter(|g| !g.is_empty())
                .unwrap_or(defaults.group_name),
            cache_bytes: parse_var("CACHE_BYTES").unwrap_or(defaults.cache_bytes),
            data_dir: env::var("DATA_DIR").unwrap_or(defaults.data_dir),
            load_timeout_ms: parse_var("LOAD_TIMEOUT_MS").unwrap_or(defaults.load_timeout_ms),
            stats_interval: parse_var("STATS_INTERVAL").unwrap_or(defaults.stats_interval),
        }
    }

    /// Coalesced load deadline, if any.
    pub fn load_timeout(&self) -> Option<Duration> {
        (self.load_timeout_ms > 0).then(|| Duration::from_millis(self.load_timeout_ms))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 9000,
            base_path: "/peercache".to_string(),
            self_addr: "http://127.0.0.1:9000".to_string(),
            peers: Vec::new(),
            replicas: DEFAULT_REPLICAS,
            group_name: "scores".to_string(),
            cache_bytes: DEFAULT_CAPACITY_BYTES,
            data_dir: "./data".to_string(),
            load_timeout_ms: 3000,
            stats_interval: 60,
        }
    }
}

fn parse_var<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

/// Splits a comma-separated peer list, dropping blanks and trailing slashes.
pub fn split_peers(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|p| p.trim().trim_end_matches('/'))
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

/// Ensures a single leading slash and no trailing slash.
pub fn normalize_base_path(path: &str) -> String {
    let trimmed = path.trim().trim_matches('/');
    if trimmed.is_empty() {
        Config::default().base_path
    } else {
        format!("/{trimmed}")
    }
}
