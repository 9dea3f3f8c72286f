//! Supply Lookup - batched, cached part lookups served over HTTP

use std::net::SocketAddr;

use anyhow::{bail, Context};
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use supply_lookup::api::create_router;
use supply_lookup::{spawn_idle_trigger, AppState, Config};

/// Main entry point for the supply lookup server.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load and validate configuration from environment variables
/// 3. Build the supply client, session and batch dispatcher
/// 4. Start the background idle trigger
/// 5. Create Axum router with all endpoints
/// 6. Start HTTP server on configured port
/// 7. Handle graceful shutdown on SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "supply_lookup=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Supply Lookup Server");

    let config = Config::from_env();
    if let Some(error_msg) = config.validate() {
        bail!("invalid configuration: {}", error_msg);
    }
    info!(
        "Configuration loaded: count_trigger={}, idle={}ms, limit={}, start_max={}, port={}",
        config.count_trigger,
        config.idle_trigger_ms,
        config.record_limit,
        config.record_start_max,
        config.server_port
    );
    if config.token.is_none() {
        warn!("SUPPLY_TOKEN is not set; lookups fail until POST /login succeeds");
    }

    let state = AppState::from_config(&config).context("failed to build application state")?;
    info!("Dispatcher initialized against {}", config.api_url);

    let idle_handle = spawn_idle_trigger(state.dispatcher.clone());
    info!("Idle trigger started");

    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(idle_handle))
        .await
        .context("server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
///
/// On shutdown signal, aborts the idle trigger and allows graceful shutdown.
async fn shutdown_signal(idle_handle: tokio::task::JoinHandle<()>) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }

    idle_handle.abort();
    warn!("Idle trigger aborted");
}
