//! Error types for the cache
//!
//! Provides unified error handling using thiserror. A cache miss is not an
//! error: lookups return `Option`.

use std::sync::Arc;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Cache Error Enum ==
/// Unified error type for the cache.
///
/// `Clone` so a single producer outcome can be handed to every coalesced waiter.
#[derive(Error, Debug, Clone)]
pub enum CacheError {
    /// The producer populating a key failed. Never cached.
    #[error("Producer failed: {0}")]
    Producer(Arc<anyhow::Error>),

    /// The producer task was cancelled or panicked before settling
    #[error("Producer aborted for key: {0}")]
    ProducerAborted(String),

    /// Key not found (HTTP surface only)
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl CacheError {
    /// Wraps a producer failure.
    pub fn producer(err: anyhow::Error) -> Self {
        CacheError::Producer(Arc::new(err))
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::Producer(_) => StatusCode::BAD_GATEWAY,
            CacheError::ProducerAborted(_) => StatusCode::BAD_GATEWAY,
            CacheError::NotFound(_) => StatusCode::NOT_FOUND,
            CacheError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        };

        let body = Json(ErrorResponse::new(self.to_string()));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_producer_error_clones_share_source() {
        let err = CacheError::producer(anyhow::anyhow!("backend down"));
        let copy = err.clone();

        match (&err, &copy) {
            (CacheError::Producer(a), CacheError::Producer(b)) => assert!(Arc::ptr_eq(a, b)),
            _ => panic!("expected producer errors"),
        }
        assert!(copy.to_string().contains("backend down"));
    }

    #[test]
    fn test_error_status_codes() {
        let test_cases = vec![
            (CacheError::producer(anyhow::anyhow!("x")), StatusCode::BAD_GATEWAY),
            (CacheError::ProducerAborted("k".to_string()), StatusCode::BAD_GATEWAY),
            (CacheError::NotFound("key".to_string()), StatusCode::NOT_FOUND),
            (CacheError::InvalidRequest("bad".to_string()), StatusCode::BAD_REQUEST),
        ];

        for (error, expected_status) in test_cases {
            let response = error.into_response();
            assert_eq!(response.status(), expected_status);
        }
    }
}
