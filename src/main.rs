//! CloudPosture - Main application entry point
//!
//! Starts the HTTP API server.

use std::net::SocketAddr;

use anyhow::Context;
use tokio::{net::TcpListener, signal};
use tokio_util::sync::CancellationToken;

use cloudposture::{create_app, init_tracing, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = dotenvy::dotenv() {
        // Only warn when a .env file exists but cannot be read
        if !e.not_found() {
            eprintln!("Warning: Failed to load .env file: {}", e);
        }
    }

    let config = Config::load()
        .context("Failed to load configuration. Check config files and CLOUDPOSTURE__* env vars")?;

    init_tracing(&config.logging).context("Failed to initialize tracing")?;

    tracing::info!("Starting CloudPosture server...");
    tracing::info!(
        max_concurrent_checks = config.scanner.max_concurrent_checks,
        reports_dir = %config.reports.output_dir.display(),
        "Configuration loaded"
    );

    let host = config.server.host.clone();
    let port = config.server.port;
    let enable_docs = config.server.enable_docs;

    let app = create_app(config)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create application: {}", e))?;

    let addr = SocketAddr::new(host.parse().context("Invalid server.host")?, port);
    tracing::info!("Server listening on {}", addr);
    if enable_docs {
        tracing::info!("API documentation available at http://{}/docs", addr);
    }

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app.router)
        .with_graceful_shutdown(shutdown_signal(app.shutdown_token))
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Wait for a shutdown signal, then cancel background work.
async fn shutdown_signal(shutdown_token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        },
    }

    shutdown_token.cancel();
}
