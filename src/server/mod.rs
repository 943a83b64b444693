//! HTTP server for the summarization API.
//!
//! Provides REST endpoints for:
//! - Text summarization
//! - Health checks

pub mod routes;
pub mod state;

pub use routes::create_router;
pub use state::AppState;

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::http::{HeaderValue, Method};
use tower_http::cors::{AllowHeaders, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;
use crate::error::{SummaryError, SummaryResult};

/// Build the CORS layer for the configured allow-list.
///
/// # Errors
/// Returns an error if an origin is not a valid header value.
pub fn cors_layer(allowed_origins: &[String]) -> SummaryResult<CorsLayer> {
    let origins = allowed_origins
        .iter()
        .map(|origin| {
            HeaderValue::from_str(origin.trim_end_matches('/')).map_err(|e| {
                SummaryError::InvalidConfig(format!("invalid allowed origin {origin}: {e}"))
            })
        })
        .collect::<SummaryResult<Vec<_>>>()?;

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true))
}

/// Router with CORS and request tracing applied.
///
/// # Errors
/// Returns an error if the CORS configuration is invalid.
pub fn create_app(state: Arc<AppState>, config: &ServerConfig) -> SummaryResult<Router> {
    Ok(create_router(state)
        .layer(cors_layer(&config.allowed_origins)?)
        .layer(TraceLayer::new_for_http()))
}

/// Start the HTTP server with graceful shutdown support.
///
/// The server will stop accepting new connections when `shutdown_signal` completes.
///
/// # Errors
/// Returns an error if the server fails to start.
pub async fn run_server_with_shutdown<F>(
    state: Arc<AppState>,
    config: &ServerConfig,
    shutdown_signal: F,
) -> SummaryResult<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = create_app(state, config)?;

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Summarization server listening on http://{addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    Ok(())
}
