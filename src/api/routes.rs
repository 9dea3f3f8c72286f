//! API Routes
//!
//! Configures the Axum router with all lookup service endpoints.

use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    clear_handler, error_handler, exhausted_handler, features_handler, health_handler,
    login_handler, lookup_handler, parts_handler, query_handler, stats_handler, version_handler,
    AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `POST /query/:q` - Request the next page of a lookup
/// - `GET /parts/:q` - Cached parts and page states of a lookup
/// - `GET /error/:q` - Last error of a lookup
/// - `GET /exhausted/:q` - Whether a lookup has everything the service has
/// - `DELETE /cache` - Drop every cached page
/// - `GET /lookup/:field/:q` - Run a lookup function
/// - `POST /login` - Client-credentials login
/// - `GET /stats` - Dispatch statistics
/// - `GET /version`, `GET /features`, `GET /health`
///
/// # Middleware
/// - CORS: Allows any origin (configurable for production)
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/query/:q", post(query_handler))
        .route("/parts/:q", get(parts_handler))
        .route("/error/:q", get(error_handler))
        .route("/exhausted/:q", get(exhausted_handler))
        .route("/cache", delete(clear_handler))
        .route("/lookup/:field/:q", get(lookup_handler))
        .route("/login", post(login_handler))
        .route("/stats", get(stats_handler))
        .route("/version", get(version_handler))
        .route("/features", get(features_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
