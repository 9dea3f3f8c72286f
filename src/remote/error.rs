//! Remote client error types.

use std::sync::Arc;

use crate::error::FATAL_ERROR;

/// Errors from a batched parts-match call.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RemoteError {
    /// No bearer token was available.
    #[error("missing access token")]
    MissingToken,

    /// The call did not complete within its timeout.
    #[error("request timeout")]
    Timeout,

    /// Transport failure.
    #[error("network error: {0}")]
    Network(Arc<reqwest::Error>),

    /// Non-success HTTP status, with the service's own message if the body had one.
    #[error("Server did not return OK ({status})")]
    Http { status: u16, message: Option<String> },

    /// The service answered with a GraphQL error.
    #[error("{0}")]
    Api(String),

    /// The body was not valid JSON for the expected envelope.
    #[error("parse error: {0}")]
    Parse(String),

    /// Valid JSON, but missing the expected shape.
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

impl RemoteError {
    /// Text recorded on every item of a batch that failed with this error.
    ///
    /// Messages the service wrote for the user are passed through; anything
    /// else is reported as the generic fatal message with the detail appended.
    pub fn batch_message(&self) -> String {
        match self {
            RemoteError::Api(message) => message.clone(),
            RemoteError::Http {
                message: Some(message),
                ..
            } => message.clone(),
            other => format!("{} ({})", FATAL_ERROR, other),
        }
    }
}

impl From<reqwest::Error> for RemoteError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            RemoteError::Timeout
        } else {
            RemoteError::Network(Arc::new(err))
        }
    }
}
