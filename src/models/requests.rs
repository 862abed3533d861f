//! Request DTOs for the cache node API
//!
//! Defines the query parameters of incoming requests.

use serde::Deserialize;

use crate::error::{CacheError, Result};

/// Query string of a value lookup (`GET <base>?groupName=<g>&key=<k>`)
///
/// Missing parameters deserialize as empty strings so they are reported as
/// invalid arguments rather than rejected by the extractor.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GetQuery {
    /// The group to look in
    #[serde(rename = "groupName", default)]
    pub group_name: String,
    /// The key to look up
    #[serde(default)]
    pub key: String,
}

impl GetQuery {
    /// Validates the query
    pub fn validate(&self) -> Result<()> {
        if self.group_name.is_empty() {
            return Err(CacheError::InvalidArgument("groupName is required".to_string()));
        }
        if self.key.is_empty() {
            return Err(CacheError::InvalidArgument("key is required".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_query_deserialize() {
        let json = r#"{"groupName": "scores", "key": "Tom"}"#;
        let query: GetQuery = serde_json::from_str(json).unwrap();
        assert_eq!(query.group_name, "scores");
        assert_eq!(query.key, "Tom");
        assert!(query.validate().is_ok());
    }

    #[test]
    fn test_get_query_missing_fields() {
        let query: GetQuery = serde_json::from_str("{}").unwrap();
        assert!(matches!(
            query.validate(),
            Err(CacheError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_validate_empty_key() {
        let query = GetQuery {
            group_name: "scores".to_string(),
            key: "".to_string(),
        };
        assert!(query.validate().is_err());
    }
}
