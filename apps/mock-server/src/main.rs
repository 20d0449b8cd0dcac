//! Mock engine binary.
//!
//! Configured through `OCTANE_MOCK_*` environment variables, logs through
//! `RUST_LOG`.

use anyhow::Context;
use octane_mock_server::{spawn, ServerConfig};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(true)
        .with_thread_ids(true)
        .init();

    info!("Starting Octane mock engine...");

    let config = ServerConfig::load().context("invalid configuration")?;
    info!(
        addr = %config.bind_addr,
        tick_ms = config.tick_interval_ms,
        samples_per_tick = config.samples_per_tick,
        "Configuration loaded"
    );

    let server = spawn(config).await?;
    shutdown_signal().await;
    server.shutdown().await?;
    Ok(())
}

/// Resolves on Ctrl+C, or SIGTERM on unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(?e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(?e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
