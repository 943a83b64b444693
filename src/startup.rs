//! Startup helpers for the summarization server.
//!
//! The model is loaded before the runtime starts; a load failure stops the
//! process before it binds a port.

use std::future::Future;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;

use crate::config::ServiceConfig;
use crate::server::{self, AppState};

/// Run the server (used by the `textsum-server` binary).
///
/// # Returns
/// `ExitCode::SUCCESS` on graceful shutdown, `1` on failure.
#[must_use]
pub fn run() -> ExitCode {
    init_tracing();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Starting textsum");

    let config = match ServiceConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {e}");
            return ExitCode::from(1);
        }
    };

    let state = match initialize(&config) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("{e:#}");
            return ExitCode::from(1);
        }
    };

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!("Failed to create runtime: {e}");
            return ExitCode::from(1);
        }
    };

    if let Err(e) = rt.block_on(run_server_with_shutdown(
        state,
        &config,
        shutdown_signal(),
    )) {
        tracing::error!("Server error: {e}");
        return ExitCode::from(1);
    }

    tracing::info!("Server stopped");
    ExitCode::SUCCESS
}

/// Install the global `tracing` subscriber.
///
/// Honours `RUST_LOG`, with INFO as the default level.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();
}

/// Load the model and build application state without starting the server.
///
/// # Errors
/// Returns an error if the model cannot be loaded.
pub fn initialize(config: &ServiceConfig) -> anyhow::Result<Arc<AppState>> {
    AppState::new(config).with_context(|| {
        let (model_id, revision) = (&config.model.model_id, &config.model.revision);
        format!("Error loading the model {model_id} ({revision})")
    })
}

/// Run server with graceful shutdown.
///
/// # Errors
/// Returns an error if the server fails.
pub async fn run_server_with_shutdown<F>(
    state: Arc<AppState>,
    config: &ServiceConfig,
    shutdown_signal: F,
) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    server::run_server_with_shutdown(state, &config.server, shutdown_signal)
        .await
        .context("HTTP server failed")
}

/// Resolves on Ctrl+C.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
