//! API Handlers
//!
//! HTTP request handlers for each cache node endpoint.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use tracing::info;

use crate::error::{CacheError, Result};
use crate::group::GroupRegistry;
use crate::models::{GetQuery, HealthResponse, StatsResponse};
use crate::peers::HttpPool;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Every group served by this node
    pub registry: Arc<GroupRegistry>,
    /// Cluster membership, when the node runs with peers
    pub pool: Option<Arc<HttpPool>>,
}

impl AppState {
    /// Creates a new AppState for a standalone node.
    pub fn new(registry: Arc<GroupRegistry>) -> Self {
        Self {
            registry,
            pool: None,
        }
    }

    /// Attaches the peer pool reported by the stats endpoint.
    pub fn with_pool(mut self, pool: Arc<HttpPool>) -> Self {
        self.pool = Some(pool);
        self
    }
}

/// Handler for GET <base>?groupName=<g>&key=<k>
///
/// Returns the raw value bytes. Peers call this same endpoint.
pub async fn get_value_handler(
    State(state): State<AppState>,
    Query(query): Query<GetQuery>,
) -> Result<Response> {
    query.validate()?;

    let group = state
        .registry
        .get(&query.group_name)
        .ok_or_else(|| CacheError::GroupNotFound(query.group_name.clone()))?;
    let value = group.get(&query.key).await?;

    Ok((
        [(header::CONTENT_TYPE, "application/octet-stream")],
        value.into_bytes(),
    )
        .into_response())
}

/// Handler for POST <base>/:group/:key/:value
///
/// Seeds a value, creating the group (without a loader) if needed.
pub async fn set_value_handler(
    State(state): State<AppState>,
    Path((group_name, key, value)): Path<(String, String, String)>,
) -> Result<String> {
    if group_name.is_empty() || key.is_empty() || value.is_empty() {
        return Err(CacheError::InvalidArgument(
            "group, key and value are required".to_string(),
        ));
    }

    let (group, _) = state
        .registry
        .lookup(&group_name, true, None)
        .map_err(|_| CacheError::GroupNotFound(group_name.clone()))?;
    group.add(&key, value)?;
    info!(group = %group_name, key = %key, "value added");

    Ok(format!("Key '{key}' added to group '{group_name}'"))
}

/// Handler for DELETE <base>/:group/:key
///
/// Drops a key from this node's copy of the group.
pub async fn delete_value_handler(
    State(state): State<AppState>,
    Path((group_name, key)): Path<(String, String)>,
) -> Result<String> {
    let group = state
        .registry
        .get(&group_name)
        .ok_or_else(|| CacheError::GroupNotFound(group_name.clone()))?;

    if !group.delete(&key)? {
        return Err(CacheError::NotFound(key));
    }
    info!(group = %group_name, key = %key, "value deleted");

    Ok(format!("Key '{key}' deleted from group '{group_name}'"))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let (node, peers) = match &state.pool {
        Some(pool) => (pool.self_addr().to_string(), pool.peers()),
        None => (String::new(), Vec::new()),
    };

    Json(StatsResponse::new(node, peers, state.registry.stats()))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::group::{Group, MapLoader};

    fn test_state() -> AppState {
        let registry = Arc::new(GroupRegistry::default());
        registry
            .register(
                Group::builder("scores")
                    .loader(MapLoader::from_pairs([("Tom", "630")]))
                    .build()
                    .unwrap(),
            )
            .unwrap();
        AppState::new(registry)
    }

    fn query(group: &str, key: &str) -> Query<GetQuery> {
        Query(GetQuery {
            group_name: group.to_string(),
            key: key.to_string(),
        })
    }

    #[tokio::test]
    async fn test_get_value_handler() {
        let state = test_state();

        let response = get_value_handler(State(state), query("scores", "Tom")).await;

        let response = response.unwrap();
        assert_eq!(response.status(), axum::http::StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"630");
    }

    #[tokio::test]
    async fn test_get_unknown_group() {
        let state = test_state();

        let result = get_value_handler(State(state), query("nope", "Tom")).await;
        assert!(matches!(result, Err(CacheError::GroupNotFound(_))));
    }

    #[tokio::test]
    async fn test_set_then_get() {
        let state = test_state();

        let path = Path(("fresh".to_string(), "lk".to_string(), "lh".to_string()));
        let message = set_value_handler(State(state.clone()), path).await.unwrap();
        assert!(message.contains("lk"));

        let response = get_value_handler(State(state), query("fresh", "lk"))
            .await
            .unwrap();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"lh");
    }

    #[tokio::test]
    async fn test_set_invalid_request() {
        let state = test_state();

        let path = Path(("scores".to_string(), "".to_string(), "v".to_string()));
        let result = set_value_handler(State(state), path).await;
        assert!(matches!(result, Err(CacheError::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn test_delete_handler() {
        let state = test_state();
        let path = Path(("scores".to_string(), "Jack".to_string(), "589".to_string()));
        set_value_handler(State(state.clone()), path).await.unwrap();

        let path = Path(("scores".to_string(), "Jack".to_string()));
        assert!(delete_value_handler(State(state.clone()), path).await.is_ok());

        let path = Path(("scores".to_string(), "Jack".to_string()));
        let result = delete_value_handler(State(state), path).await;
        assert!(matches!(result, Err(CacheError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_stats_handler() {
        let state = test_state();
        get_value_handler(State(state.clone()), query("scores", "Tom"))
            .await
            .unwrap();

        let response = stats_handler(State(state)).await;
        assert_eq!(response.groups.len(), 1);
        assert_eq!(response.groups[0].misses, 1);
        assert_eq!(response.groups[0].local_loads, 1);
    }

    #[tokio::test]
    async fn test_health_handler() {
        let response = health_handler().await;
        assert_eq!(response.status, "healthy");
    }
}
