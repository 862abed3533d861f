//! Request and Response models for the cache node API
//!
//! This module defines the DTOs (Data Transfer Objects) used for
//! deserializing query strings and serializing JSON response bodies.
//! Cached values themselves travel as raw bytes, never wrapped in a DTO.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::GetQuery;
pub use responses::{GroupStatsResponse, HealthResponse, StatsResponse};
