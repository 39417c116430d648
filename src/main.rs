//! Tingyuun Worker - An offline-first caching proxy for a static site

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tingyuun_worker::cache::MemoryCacheStorage;
use tingyuun_worker::fetch::HttpNetwork;
use tingyuun_worker::{create_router, AppState, Config, RegisterOutcome, Registration};

/// Main entry point for the caching proxy.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Register the configured worker version (install + activate)
/// 4. Create Axum router with the proxy and control endpoints
/// 5. Start HTTP server on configured port
/// 6. Handle graceful shutdown on SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tingyuun_worker=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Tingyuun caching worker");

    let config = Config::from_env();
    info!(
        "Configuration loaded: origin={}, upstream={}, version={}, port={}",
        config.site_origin, config.upstream_url, config.cache_version, config.server_port
    );

    let settings = config.worker_settings()?;
    let network = HttpNetwork::new(config.site_origin.clone(), config.upstream_url.clone())?;
    let registration = Arc::new(Registration::new(
        Arc::new(MemoryCacheStorage::new()),
        Arc::new(network),
    ));

    // A failed install is not fatal: requests pass through to the network
    // and POST /__sw/update retries.
    match registration.register(settings.clone()).await {
        Ok(RegisterOutcome::Activated { install, .. }) => {
            info!("{} active with {} pre-cached assets", install.generation, install.stored)
        }
        Ok(outcome) => info!("Registration finished: {:?}", outcome),
        Err(e) => error!("Initial install failed, serving uncached: {}", e),
    }

    let app = create_router(AppState::new(registration, settings));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
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
}
