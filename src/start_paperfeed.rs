//! Startup helpers for the paperfeed server.

use std::process::ExitCode;

use crate::feed::core::config::FeedConfig;
use crate::server::{self, AppState};

/// Install the global `fmt` subscriber with an `info` default filter.
///
/// Safe to call more than once; later calls are ignored.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .try_init();
}

/// Run the server until Ctrl-C.
///
/// # Returns
/// `ExitCode::SUCCESS` on graceful shutdown, `1` on failure.
#[must_use]
pub fn run() -> ExitCode {
    init_tracing();

    tracing::info!("Starting paperfeed v{}", env!("CARGO_PKG_VERSION"));

    let config = match FeedConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load configuration: {e}");
            return ExitCode::from(1);
        }
    };
    tracing::info!(
        db = %config.storage.sqlite_path.display(),
        model = %config.embedding.model,
        ndims = config.embedding.ndims,
        "configuration loaded"
    );
    let port = config.server.port;

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!("Failed to create runtime: {e}");
            return ExitCode::from(1);
        }
    };

    let state = match rt.block_on(AppState::from_config(config)) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("Failed to create state: {e}");
            return ExitCode::from(1);
        }
    };

    if let Err(e) = rt.block_on(server::run_server_with_shutdown(
        state,
        port,
        shutdown_signal(),
    )) {
        tracing::error!("Server error: {e}");
        return ExitCode::from(1);
    }

    tracing::info!("paperfeed stopped");
    ExitCode::SUCCESS
}

/// Resolves on Ctrl-C.
pub async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
