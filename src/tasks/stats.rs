//! Stats Reporter Task
//!
//! Background task that periodically logs per-group cache statistics.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::group::GroupRegistry;

/// Spawns a background task that logs every group's statistics.
///
/// The task runs in an infinite loop, sleeping for the specified interval
/// between reports. An interval of 0 is treated as 1 second.
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during graceful shutdown.
///
/// # Example
/// ```ignore
/// let registry = Arc::new(GroupRegistry::default());
/// let stats_handle = spawn_stats_task(registry.clone(), 60);
/// // Later, during shutdown:
/// stats_handle.abort();
/// ```
pub fn spawn_stats_task(registry: Arc<GroupRegistry>, interval_secs: u64) -> JoinHandle<()> {
    let interval = Duration::from_secs(interval_secs.max(1));

    tokio::spawn(async move {
        info!("Starting stats reporter with interval of {:?}", interval);

        loop {
            tokio::time::sleep(interval).await;

            let stats = registry.stats();
            if stats.is_empty() {
                debug!("stats reporter: no groups registered");
                continue;
            }
            for group in stats {
                info!(
                    group = %group.name,
                    entries = group.cache.total_entries,
                    bytes = group.cache.size_bytes,
                    usage = format!("{:.1}%", group.cache.usage() * 100.0),
                    hits = group.cache.hits,
                    misses = group.cache.misses,
                    hit_rate = group.cache.hit_rate(),
                    evictions = group.cache.evictions,
                    local_loads = group.local_loads,
                    peer_loads = group.peer_loads,
                    load_errors = group.load_errors,
                    "group stats"
                );
            }
        }
    })
}
