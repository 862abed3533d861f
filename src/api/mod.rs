//! API Module
//!
//! HTTP handlers and routing for the cache node.
//!
//! # Endpoints
//! - `GET <base>?groupName=<g>&key=<k>` - Fetch a value as raw bytes
//! - `POST <base>/:group/:key/:value` - Seed a value
//! - `DELETE <base>/:group/:key` - Drop a value
//! - `GET /stats` - Per-group statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
