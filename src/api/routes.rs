//! API Routes
//!
//! Configures the Axum router with all cache node endpoints.

use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    delete_value_handler, get_value_handler, health_handler, set_value_handler, stats_handler,
    AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET <base>?groupName=<g>&key=<k>` - Fetch a value (also used by peers)
/// - `POST <base>/:group/:key/:value` - Seed a value
/// - `DELETE <base>/:group/:key` - Drop a value from this node
/// - `GET /stats` - Per-group statistics
/// - `GET /health` - Health check endpoint
///
/// # Middleware
/// - CORS: Allows any origin
/// - Tracing: Logs all requests
pub fn create_router(state: AppState, base_path: &str) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route(base_path, get(get_value_handler))
        .route(&format!("{base_path}/:group/:key/:value"), post(set_value_handler))
        .route(&format!("{base_path}/:group/:key"), delete(delete_value_handler))
        .route("/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
