//! Error types and user-facing messages
//!
//! Lookup failures are never returned as `Err`; they are recorded on cache
//! items and read back as text. `LookupError` covers the HTTP surface only.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Messages ==
/// Generic text for failures that happened before any per-item result could be read.
pub const FATAL_ERROR: &str = "An error occurred. Please consider logging an issue against this problem or contact the data provider directly.";

/// Shown while a lookup is still waiting on the remote service.
pub const PROCESSING: &str = "!!! Processing !!!";

/// Shown when a lookup settled without anything matching.
pub const NO_RESULT: &str = "Query did not provide a result. Please widen your search criteria.";

/// Recorded on items created while no credential is available.
pub const MISSING_CLIENT: &str = "Supply client is not specified. Please log in once with your client Id and Secret before running lookups.";

// == Lookup Error Enum ==
/// Error type for the HTTP surface.
#[derive(Error, Debug)]
pub enum LookupError {
    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Token exchange failed
    #[error("Login failed: {0}")]
    Login(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for LookupError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            LookupError::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            LookupError::Login(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            LookupError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the HTTP surface.
pub type Result<T> = std::result::Result<T, LookupError>;
