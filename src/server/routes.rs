//! HTTP route handlers for the summarization API.

use std::sync::Arc;

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::{Instrument, Span, error, info_span, warn};
use uuid::Uuid;

use crate::error::SummaryError;
use crate::summarizer::validate_input;

use super::state::AppState;

/// Create the API router with all routes.
#[must_use]
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/summarize_text", post(summarize_text))
        .with_state(state)
}

/// Health check endpoint.
async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "textsum",
        "version": env!("CARGO_PKG_VERSION"),
        "model": state.model_name,
    }))
}

/// Summarization request.
#[derive(Debug, Deserialize)]
pub struct SummarizeRequest {
    /// Text to summarize.
    pub text: String,
}

/// Summarization response.
#[derive(Debug, Serialize, Deserialize)]
pub struct SummarizeResponse {
    /// Generated summary.
    pub summary: String,
}

/// Error body returned with every non-2xx status.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable cause.
    pub detail: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn rejection_error(rejection: &JsonRejection) -> ApiError {
    (
        rejection.status(),
        Json(ErrorResponse {
            detail: rejection.body_text(),
        }),
    )
}

fn api_error(err: &SummaryError) -> ApiError {
    (
        err.status_code(),
        Json(ErrorResponse {
            detail: err.to_string(),
        }),
    )
}

/// Handle summarization requests.
async fn summarize_text(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SummarizeRequest>, JsonRejection>,
) -> Result<Json<SummarizeResponse>, ApiError> {
    let span = info_span!("summarize_text", request_id = %Uuid::new_v4());

    async move {
        let Json(request) = payload.map_err(|rejection| {
            warn!(detail = %rejection.body_text(), "Malformed request body");
            rejection_error(&rejection)
        })?;

        if let Err(e) = validate_input(&request.text) {
            warn!("Rejected request: {e}");
            return Err(api_error(&e));
        }

        let worker_span = Span::current();
        let text = request.text;
        let outcome = tokio::task::spawn_blocking(move || {
            worker_span.in_scope(|| state.pipeline.run(&text))
        })
        .await
        .unwrap_or_else(|e| Err(SummaryError::Worker(e.to_string())));

        match outcome {
            Ok(summary) => Ok(Json(SummarizeResponse { summary })),
            Err(e) if e.is_client_error() => {
                warn!("Rejected request: {e}");
                Err(api_error(&e))
            }
            Err(e) => {
                error!("Summarization failed: {e}");
                Err(api_error(&e))
            }
        }
    }
    .instrument(span)
    .await
}
