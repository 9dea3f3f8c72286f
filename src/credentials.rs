//! Credential Provider
//!
//! Supplies the bearer token the dispatcher attaches to every batch, and the
//! query features the account is entitled to. [`Session`] is the provider
//! used by the server: it holds the token obtained through the OAuth
//! client-credentials exchange (or one configured up front).

use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{error, info};

use crate::error::{LookupError, Result};
use crate::remote::QueryFeatures;

/// Default OAuth token endpoint.
pub const DEFAULT_IDENTITY_URL: &str = "https://identity.nexar.com/connect/token";

/// Lifetime assumed when the token response carries no `expires_in`.
const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 24 * 60 * 60;

// == Login Messages ==
pub const LOGIN_MISSING: &str = "Please provide your client Id and Secret";
pub const LOGIN_FAILED: &str = "Unable to login, check client Id and Secret";
pub const LOGIN_EXPIRED: &str = "The access token has expired, please refresh login!";
pub const LOGIN_READY: &str = "The supply lookup service is ready!";

// == Credential Provider ==
/// Source of the bearer credential.
pub trait CredentialProvider: Send + Sync {
    /// The token to send, or `None` if nobody has logged in.
    fn current_token(&self) -> Option<String>;

    /// Optional fields to request.
    fn features(&self) -> QueryFeatures {
        QueryFeatures::default()
    }
}

// == Access Token ==
#[derive(Debug, Clone)]
pub struct AccessToken {
    pub value: String,
    /// `None` for tokens configured without a known lifetime
    pub expires_at: Option<DateTime<Utc>>,
}

impl AccessToken {
    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| at <= Utc::now())
    }
}

#[derive(Debug, Default)]
struct SessionState {
    client_id: String,
    client_secret: String,
    features: QueryFeatures,
    token: Option<AccessToken>,
}

// == Session ==
/// Process-wide login state.
#[derive(Debug, Default)]
pub struct Session {
    state: RwLock<SessionState>,
}

impl Session {
    /// Creates a session with nobody logged in.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a session with a pre-issued token that never expires locally.
    pub fn with_token(token: impl Into<String>) -> Self {
        let session = Self::new();
        session.set_token(Some(AccessToken {
            value: token.into(),
            expires_at: None,
        }));
        session
    }

    pub fn set_token(&self, token: Option<AccessToken>) {
        self.state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .token = token;
    }

    pub fn token_expires_at(&self) -> Option<DateTime<Utc>> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .token
            .as_ref()
            .and_then(|t| t.expires_at)
    }

    /// Logs in with `client_id`/`client_secret` and returns the status text.
    ///
    /// The token exchange only runs when the credentials or features changed,
    /// or when the current token is missing or expired.
    pub async fn login(
        &self,
        exchange: &TokenExchange,
        client_id: &str,
        client_secret: &str,
        features: QueryFeatures,
    ) -> &'static str {
        if client_id.is_empty() || client_secret.is_empty() {
            return LOGIN_MISSING;
        }

        let needs_exchange = {
            let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
            state.client_id != client_id
                || state.client_secret != client_secret
                || state.features != features
                || state.token.as_ref().map_or(true, AccessToken::is_expired)
        };

        if needs_exchange {
            let token = match exchange.fetch(client_id, client_secret).await {
                Ok(token) => {
                    info!("login succeeded, token expires at {:?}", token.expires_at);
                    Some(token)
                }
                Err(e) => {
                    error!("login failed: {}", e);
                    None
                }
            };

            let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
            state.client_id = client_id.to_string();
            state.client_secret = client_secret.to_string();
            state.features = features;
            state.token = token;
        }

        self.status()
    }

    /// Status text for the current login.
    pub fn status(&self) -> &'static str {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        match &state.token {
            None if state.client_id.is_empty() => LOGIN_MISSING,
            None => LOGIN_FAILED,
            Some(token) if token.is_expired() => LOGIN_EXPIRED,
            Some(_) => LOGIN_READY,
        }
    }
}

impl CredentialProvider for Session {
    fn current_token(&self) -> Option<String> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .token
            .as_ref()
            .map(|t| t.value.clone())
            .filter(|v| !v.is_empty())
    }

    fn features(&self) -> QueryFeatures {
        self.state.read().unwrap_or_else(PoisonError::into_inner).features
    }
}

// == Token Exchange ==
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

/// OAuth client-credentials exchange against the identity endpoint.
#[derive(Debug, Clone)]
pub struct TokenExchange {
    http: reqwest::Client,
    token_url: String,
}

impl TokenExchange {
    pub fn new(token_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LookupError::Internal(e.to_string()))?;

        Ok(Self {
            http,
            token_url: token_url.into(),
        })
    }

    /// Exchanges client credentials for an access token.
    pub async fn fetch(&self, client_id: &str, client_secret: &str) -> Result<AccessToken> {
        let response = self
            .http
            .post(&self.token_url)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", client_id),
                ("client_secret", client_secret),
            ])
            .send()
            .await
            .map_err(|e| LookupError::Login(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(LookupError::Login(format!("token endpoint returned {}", status)));
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| LookupError::Login(e.to_string()))?;

        if body.access_token.is_empty() {
            return Err(LookupError::Login("empty access token".to_string()));
        }

        let lifetime = body.expires_in.unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS);
        Ok(AccessToken {
            value: body.access_token,
            expires_at: Some(Utc::now() + chrono::Duration::seconds(lifetime)),
        })
    }
}
