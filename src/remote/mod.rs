//! Remote parts-data client.
//!
//! Executes one batched multi-match call per dispatch. The dispatcher only
//! depends on the [`RemoteClient`] trait; [`SupplyClient`] is the HTTP
//! implementation against the supply GraphQL endpoint.

pub mod error;
pub mod query;
pub mod schema;

#[cfg(test)]
pub(crate) mod testing;

pub use error::RemoteError;
pub use query::{PartsMatchQuery, QueryFeatures};
pub use schema::{Company, Document, MultiMatch, Offer, Part, Price, Seller, SupplyResult};

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header;
use tracing::{debug, warn};

/// Default GraphQL endpoint.
pub const DEFAULT_API_URL: &str = "https://api.nexar.com/graphql";

/// Client version reported in request headers.
pub const CLIENT_VERSION: &str = env!("CARGO_PKG_VERSION");

const CLIENT_NAME: &str = "supply-lookup";

/// A batch ready to be sent.
#[derive(Debug, Clone)]
pub struct MatchRequest {
    pub queries: Vec<PartsMatchQuery>,
    pub token: String,
    pub features: QueryFeatures,
    pub timeout: Duration,
}

/// Executes batched part lookups.
#[async_trait]
pub trait RemoteClient: Send + Sync {
    /// Sends every query of `request` in one call.
    ///
    /// On success returns one entry per query the service answered; entries
    /// are correlated by their `reference`, not their position.
    async fn parts_match(&self, request: MatchRequest) -> Result<Vec<MultiMatch>, RemoteError>;
}

/// HTTP client for the supply GraphQL API.
#[derive(Debug, Clone)]
pub struct SupplyClient {
    http: reqwest::Client,
    api_url: String,
}

impl SupplyClient {
    /// Creates a client posting to `api_url`.
    pub fn new(api_url: impl Into<String>) -> Result<Self, RemoteError> {
        let http = reqwest::Client::builder()
            .user_agent(format!("{}/{}", CLIENT_NAME, CLIENT_VERSION))
            .build()
            .map_err(|e| RemoteError::Network(Arc::new(e)))?;

        Ok(Self {
            http,
            api_url: api_url.into(),
        })
    }

    /// The first GraphQL error message of a non-success response body, if any.
    fn error_message(body: &[u8]) -> Option<String> {
        serde_json::from_slice::<SupplyResult>(body)
            .ok()
            .and_then(|result| result.first_error().map(str::to_string))
    }
}

#[async_trait]
impl RemoteClient for SupplyClient {
    async fn parts_match(&self, request: MatchRequest) -> Result<Vec<MultiMatch>, RemoteError> {
        if request.token.is_empty() {
            return Err(RemoteError::MissingToken);
        }
        if request.queries.is_empty() {
            return Ok(Vec::new());
        }

        let start = Instant::now();
        let body = query::request_body(&request.queries, request.features);

        debug!("multi-match request with {} queries", request.queries.len());

        let response = self
            .http
            .post(&self.api_url)
            .bearer_auth(&request.token)
            .header(header::ACCEPT, "application/json")
            .header("X-Supply-Client", CLIENT_NAME)
            .header("X-Supply-Client-Version", CLIENT_VERSION)
            .timeout(request.timeout)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let bytes = response.bytes().await?;

        if !status.is_success() {
            let message = Self::error_message(&bytes);
            warn!("multi-match failed with status {}: {:?}", status, message);
            return Err(RemoteError::Http {
                status: status.as_u16(),
                message,
            });
        }

        let result: SupplyResult =
            serde_json::from_slice(&bytes).map_err(|e| RemoteError::Parse(e.to_string()))?;

        if let Some(message) = result.first_error() {
            return Err(RemoteError::Api(message.to_string()));
        }

        let matches = result
            .data
            .ok_or_else(|| RemoteError::MalformedResponse("data is null".to_string()))?
            .sup_multi_match
            .ok_or_else(|| RemoteError::MalformedResponse("supMultiMatch is missing".to_string()))?;

        if matches.is_empty() {
            return Err(RemoteError::MalformedResponse(
                "supMultiMatch does not have any results".to_string(),
            ));
        }

        debug!(
            "multi-match completed in {:?}, {} results",
            start.elapsed(),
            matches.len()
        );

        Ok(matches)
    }
}
