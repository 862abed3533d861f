//! Error types for the cache node
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache node.
///
/// `Clone` because one coalesced load result is handed to every waiter.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// Empty key, group or value
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// No group registered under the name
    #[error("No such group: {0}")]
    GroupNotFound(String),

    /// The loader or peer reported the key as absent
    #[error("Key not found: {0}")]
    NotFound(String),

    /// The loader or peer fetch failed for another reason
    #[error("Load failed: {0}")]
    LoadFailure(String),

    /// A coalesced call did not resolve before its deadline
    #[error("Load timed out: {0}")]
    Timeout(String),

    /// Invalid setup detected at construction time
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CacheError {
    /// HTTP status the transport reports for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            CacheError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            CacheError::GroupNotFound(_) | CacheError::NotFound(_) | CacheError::LoadFailure(_) => {
                StatusCode::NOT_FOUND
            }
            CacheError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            CacheError::Configuration(_) | CacheError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

// == IntoResponse Implementation ==
// Bodies are plain text: peers parse the raw body and there is no envelope.
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        (self.status_code(), self.to_string()).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache node.
pub type Result<T> = std::result::Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            CacheError::InvalidArgument("key".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            CacheError::GroupNotFound("g".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            CacheError::LoadFailure("io".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            CacheError::Timeout("k".into()).status_code(),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            CacheError::Configuration("c".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_display() {
        let err = CacheError::NotFound("Tom".into());
        assert_eq!(err.to_string(), "Key not found: Tom");
    }
}
