//! Error types for the summarization service.

use axum::http::StatusCode;
use thiserror::Error;

/// Summarization service error type.
#[derive(Debug, Error)]
pub enum SummaryError {
    /// Invalid configuration or unsupported values.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// Request text is empty after trimming.
    #[error("Input text is empty.")]
    EmptyInput,
    /// Segmentation produced no chunks.
    #[error("Unable to split text into chunks.")]
    NoChunks,
    /// Tokenizer load, encode or decode failure.
    #[error("tokenizer error: {0}")]
    Tokenizer(String),
    /// Tensor or model error from candle.
    #[error("model error: {0}")]
    Model(#[from] candle_core::Error),
    /// Hugging Face Hub download error.
    #[error("hub error: {0}")]
    Hub(#[from] hf_hub::api::sync::ApiError),
    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    /// URL parse error.
    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),
    /// Text generation failed for one chunk.
    #[error("Error during summarization: {0}")]
    Generation(String),
    /// Blocking worker task failed to complete.
    #[error("worker error: {0}")]
    Worker(String),
}

impl SummaryError {
    /// Wrap any failure raised while generating a summary.
    #[must_use]
    pub fn generation(cause: impl Into<String>) -> Self {
        Self::Generation(cause.into())
    }

    /// Whether this error was caused by the caller's input.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(self, Self::EmptyInput | Self::NoChunks)
    }

    /// HTTP status the error is surfaced with.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        if self.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// Convenience result alias for summarization operations.
pub type SummaryResult<T> = Result<T, SummaryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_errors_map_to_bad_request() {
        assert_eq!(SummaryError::EmptyInput.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(SummaryError::NoChunks.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_generation_error_maps_to_internal_error() {
        let err = SummaryError::generation("CUDA out of memory");
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            err.to_string(),
            "Error during summarization: CUDA out of memory"
        );
    }

    #[test]
    fn test_empty_input_message() {
        assert_eq!(SummaryError::EmptyInput.to_string(), "Input text is empty.");
    }
}
