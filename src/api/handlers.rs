//! API Handlers
//!
//! HTTP request handlers for each lookup service endpoint.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use tracing::info;

use crate::config::{Config, WaitConfig};
use crate::credentials::{CredentialProvider, Session, TokenExchange};
use crate::dispatch::BatchDispatcher;
use crate::error::{LookupError, Result};
use crate::lookup::{self, LookupField, LookupRequest};
use crate::models::{
    ClearResponse, ExhaustedResponse, FeaturesResponse, HealthResponse, LastErrorResponse,
    LoginRequest, LoginResponse, LookupParams, LookupResponse, PartsResponse, QueryResponse,
    StatsResponse, VersionResponse,
};
use crate::remote::{SupplyClient, CLIENT_VERSION};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<BatchDispatcher>,
    pub session: Arc<Session>,
    pub exchange: Arc<TokenExchange>,
    pub wait: WaitConfig,
    pub api_url: String,
}

impl AppState {
    /// Creates a new AppState around an existing dispatcher.
    pub fn new(
        dispatcher: Arc<BatchDispatcher>,
        session: Arc<Session>,
        exchange: TokenExchange,
        wait: WaitConfig,
        api_url: impl Into<String>,
    ) -> Self {
        Self {
            dispatcher,
            session,
            exchange: Arc::new(exchange),
            wait,
            api_url: api_url.into(),
        }
    }

    /// Creates a new AppState from configuration.
    ///
    /// Builds the supply client, the session (seeded with `SUPPLY_TOKEN` when
    /// set) and the dispatcher. The idle trigger is not started here.
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = SupplyClient::new(config.api_url.clone())
            .map_err(|e| LookupError::Internal(e.to_string()))?;
        let session = Arc::new(match &config.token {
            Some(token) => Session::with_token(token.clone()),
            None => Session::new(),
        });
        let exchange = TokenExchange::new(
            config.identity_url.clone(),
            config.dispatch().http_timeout,
        )?;
        let dispatcher = Arc::new(BatchDispatcher::new(
            config.dispatch(),
            Arc::new(client),
            session.clone(),
        ));

        Ok(Self::new(
            dispatcher,
            session,
            exchange,
            config.wait(),
            config.api_url.clone(),
        ))
    }
}

/// Handler for POST /query/:q
///
/// Asks for the next page of a lookup.
pub async fn query_handler(
    State(state): State<AppState>,
    Path(query): Path<String>,
) -> Json<QueryResponse> {
    let request = state.dispatcher.request_next_page(&query).await;
    Json(QueryResponse { query, request })
}

/// Handler for GET /parts/:q
///
/// Returns everything cached for a lookup without fetching.
pub async fn parts_handler(
    State(state): State<AppState>,
    Path(query): Path<String>,
) -> Json<PartsResponse> {
    let d = &state.dispatcher;
    Json(PartsResponse {
        parts: d.get_parts(&query).await,
        exhausted: d.is_exhausted(&query).await,
        pending: d.is_pending(&query).await,
        error: d.get_last_error(&query).await,
        pages: d.pages(&query).await,
        query,
    })
}

/// Handler for GET /error/:q
pub async fn error_handler(
    State(state): State<AppState>,
    Path(query): Path<String>,
) -> Json<LastErrorResponse> {
    let error = state.dispatcher.get_last_error(&query).await;
    Json(LastErrorResponse { query, error })
}

/// Handler for GET /exhausted/:q
pub async fn exhausted_handler(
    State(state): State<AppState>,
    Path(query): Path<String>,
) -> Json<ExhaustedResponse> {
    let exhausted = state.dispatcher.is_exhausted(&query).await;
    Json(ExhaustedResponse { query, exhausted })
}

/// Handler for DELETE /cache
pub async fn clear_handler(State(state): State<AppState>) -> Json<ClearResponse> {
    let dropped = state.dispatcher.clear_all().await;
    info!("cache cleared by request, {} items dropped", dropped);
    Json(ClearResponse::new(dropped))
}

/// Handler for GET /lookup/:field/:q
///
/// Runs a lookup function, waiting (bounded) for results.
pub async fn lookup_handler(
    State(state): State<AppState>,
    Path((field, query)): Path<(String, String)>,
    Query(params): Query<LookupParams>,
) -> Result<Json<LookupResponse>> {
    let field: LookupField = field.parse().map_err(LookupError::InvalidRequest)?;
    if let Some(error_msg) = params.validate() {
        return Err(LookupError::InvalidRequest(error_msg));
    }

    let mut request = LookupRequest::new(query.clone()).with_filter(params.filter());
    if let Some(qty) = params.qty {
        request.qty = qty;
    }
    if let Some(currency) = params.currency {
        request.currency = currency;
    }

    let value = lookup::lookup(
        &state.dispatcher,
        state.wait,
        state.session.features(),
        field,
        &request,
    )
    .await;

    Ok(Json(LookupResponse {
        query,
        field: field.name(),
        value,
    }))
}

/// Handler for POST /login
///
/// Exchanges the client credentials for a token when they changed.
pub async fn login_handler(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Json<LoginResponse> {
    let status = state
        .session
        .login(&state.exchange, &req.client_id, &req.client_secret, req.features())
        .await;

    Json(LoginResponse {
        status: status.to_string(),
        expires_at: state.session.token_expires_at(),
    })
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse::new(state.dispatcher.stats().await))
}

/// Handler for GET /version
pub async fn version_handler(State(state): State<AppState>) -> Json<VersionResponse> {
    Json(VersionResponse {
        name: env!("CARGO_PKG_NAME"),
        version: CLIENT_VERSION,
        api_url: state.api_url.clone(),
    })
}

/// Handler for GET /features
pub async fn features_handler(State(state): State<AppState>) -> Json<FeaturesResponse> {
    Json(FeaturesResponse::from(state.session.features()))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::config::DispatchConfig;
    use crate::error::MISSING_CLIENT;
    use crate::remote::testing::ScriptedClient;

    fn state(session: Session, count_trigger: usize) -> AppState {
        let session = Arc::new(session);
        let config = DispatchConfig {
            count_trigger,
            ..DispatchConfig::default()
        };
        let dispatcher = Arc::new(BatchDispatcher::new(
            config,
            Arc::new(ScriptedClient::one_part_each(3)),
            session.clone(),
        ));
        let exchange =
            TokenExchange::new("http://127.0.0.1:9/connect/token", Duration::from_millis(200))
                .unwrap();
        let wait = WaitConfig {
            poll_interval: Duration::from_millis(5),
            max_iterations: 20,
        };
        AppState::new(dispatcher, session, exchange, wait, "http://localhost/graphql")
    }

    #[tokio::test]
    async fn test_query_then_parts() {
        let state = state(Session::with_token("t"), 1);

        let response = query_handler(State(state.clone()), Path("LM317".to_string())).await;
        assert!(matches!(response.request, crate::dispatch::PageRequest::Enqueued { start: 0 }));

        let response = parts_handler(State(state.clone()), Path("lm-317".to_string())).await;
        assert_eq!(response.parts.len(), 1);
        assert!(!response.exhausted);
        assert!(!response.pending);
        assert_eq!(response.pages.len(), 1);
    }

    #[tokio::test]
    async fn test_error_handler_without_credentials() {
        let state = state(Session::new(), 10);

        let response = query_handler(State(state.clone()), Path("INA225*".to_string())).await;
        assert!(matches!(
            response.request,
            crate::dispatch::PageRequest::Rejected { start: 0 }
        ));
        let response = error_handler(State(state), Path("INA225*".to_string())).await;
        assert_eq!(response.error.as_deref(), Some(MISSING_CLIENT));
    }

    #[tokio::test]
    async fn test_clear_handler() {
        let state = state(Session::with_token("t"), 10);

        let _a = query_handler(State(state.clone()), Path("a".to_string())).await;
        let _b = query_handler(State(state.clone()), Path("b".to_string())).await;
        let response = clear_handler(State(state.clone())).await;
        assert_eq!(response.dropped, 2);

        let response = exhausted_handler(State(state), Path("a".to_string())).await;
        assert!(!response.exhausted);
    }

    #[tokio::test]
    async fn test_lookup_handler_unknown_field() {
        let state = state(Session::with_token("t"), 1);

        let result = lookup_handler(
            State(state),
            Path(("colour".to_string(), "lm317".to_string())),
            Query(LookupParams::default()),
        )
        .await;
        assert!(matches!(result, Err(LookupError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_lookup_handler_count_trigger() {
        let state = state(Session::with_token("t"), 1);

        let response = lookup_handler(
            State(state),
            Path(("description".to_string(), "lm317".to_string())),
            Query(LookupParams::default()),
        )
        .await
        .unwrap();
        assert_eq!(response.field, "description");
        assert_eq!(response.value, crate::lookup::CellValue::Text(String::new()));
    }

    #[tokio::test]
    async fn test_login_handler_missing_credentials() {
        let state = state(Session::new(), 1);

        let req = LoginRequest {
            client_id: String::new(),
            client_secret: String::new(),
            include_datasheets: None,
            include_lead_time: None,
        };
        let response = login_handler(State(state), Json(req)).await;
        assert_eq!(response.status, crate::credentials::LOGIN_MISSING);
        assert!(response.expires_at.is_none());
    }

    #[tokio::test]
    async fn test_stats_and_features() {
        let state = state(Session::with_token("t"), 1);
        let _response = query_handler(State(state.clone()), Path("a".to_string())).await;

        let stats = stats_handler(State(state.clone())).await;
        assert_eq!(stats.stats.batches, 1);
        assert_eq!(stats.stats.count_triggers, 1);
        assert_eq!(stats.stats.done, 1);

        let features = features_handler(State(state)).await;
        assert!(features.include_datasheets);
    }

    #[tokio::test]
    async fn test_health_handler() {
        let response = health_handler().await;
        assert_eq!(response.status, "healthy");
    }
}
