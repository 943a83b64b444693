//! Configuration for the summarization service.

use url::Url;

use crate::error::{SummaryError, SummaryResult};
use crate::generation::GenerationParams;

/// Environment variable for the listening port.
pub const PORT_ENV: &str = "TEXTSUM_PORT";
/// Environment variable for the comma-separated CORS allow-list.
pub const ALLOWED_ORIGINS_ENV: &str = "TEXTSUM_ALLOWED_ORIGINS";
/// Environment variable for the pretrained model repository.
pub const MODEL_ENV: &str = "TEXTSUM_MODEL";
/// Environment variable for the model revision.
pub const MODEL_REVISION_ENV: &str = "TEXTSUM_MODEL_REVISION";
/// Environment variable forcing CPU inference.
pub const FORCE_CPU_ENV: &str = "TEXTSUM_FORCE_CPU";
/// Environment variable for the segmenter token threshold.
pub const MAX_CHUNK_TOKENS_ENV: &str = "TEXTSUM_MAX_CHUNK_TOKENS";
/// Environment variable toggling the consolidation pass.
pub const CONSOLIDATE_ENV: &str = "TEXTSUM_CONSOLIDATE";

/// Top-level configuration for the service.
#[derive(Clone, Debug, Default)]
pub struct ServiceConfig {
    /// HTTP settings.
    pub server: ServerConfig,
    /// Pretrained model settings.
    pub model: ModelConfig,
    /// Text segmentation settings.
    pub segmenter: SegmenterConfig,
    /// Summary generation settings.
    pub summarizer: SummarizerConfig,
}

impl ServiceConfig {
    /// Build the configuration from defaults overridden by process environment.
    ///
    /// # Errors
    /// Returns an error if an override cannot be parsed or the result is invalid.
    pub fn from_env() -> SummaryResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from defaults overridden by `lookup`.
    ///
    /// # Errors
    /// Returns an error if an override cannot be parsed or the result is invalid.
    pub fn from_lookup<F>(lookup: F) -> SummaryResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(port) = lookup(PORT_ENV) {
            config.server.port = parse_number(PORT_ENV, &port)?;
        }

        if let Some(origins) = lookup(ALLOWED_ORIGINS_ENV) {
            config.server.allowed_origins = origins
                .split(',')
                .map(str::trim)
                .filter(|origin| !origin.is_empty())
                .map(str::to_string)
                .collect();
        }

        if let Some(model_id) = lookup(MODEL_ENV) {
            config.model.model_id = model_id;
        }

        if let Some(revision) = lookup(MODEL_REVISION_ENV) {
            config.model.revision = revision;
        }

        if let Some(force_cpu) = lookup(FORCE_CPU_ENV) {
            config.model.force_cpu = parse_flag(FORCE_CPU_ENV, &force_cpu)?;
        }

        if let Some(max_tokens) = lookup(MAX_CHUNK_TOKENS_ENV) {
            config.segmenter.max_tokens = parse_number(MAX_CHUNK_TOKENS_ENV, &max_tokens)?;
        }

        if let Some(consolidate) = lookup(CONSOLIDATE_ENV) {
            config.summarizer.consolidate = parse_flag(CONSOLIDATE_ENV, &consolidate)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration invariants.
    ///
    /// # Errors
    /// Returns an error if any values are out of range or invalid.
    pub fn validate(&self) -> SummaryResult<()> {
        for origin in &self.server.allowed_origins {
            let url = Url::parse(origin)?;
            if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
                return Err(SummaryError::InvalidConfig(format!(
                    "allowed origin {origin} must be an http(s) URL with a host"
                )));
            }
        }

        if self.model.model_id.trim().is_empty() {
            return Err(SummaryError::InvalidConfig(
                "model.model_id must not be empty".to_string(),
            ));
        }

        if self.segmenter.max_tokens == 0 {
            return Err(SummaryError::InvalidConfig(
                "segmenter.max_tokens must be > 0".to_string(),
            ));
        }

        if self.summarizer.max_input_tokens == 0 {
            return Err(SummaryError::InvalidConfig(
                "summarizer.max_input_tokens must be > 0".to_string(),
            ));
        }

        self.summarizer.chunk.validate("summarizer.chunk")?;
        self.summarizer.consolidation.validate("summarizer.consolidation")?;

        Ok(())
    }
}

/// HTTP server settings.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Listening port.
    pub port: u16,
    /// Origins allowed to call the API from a browser.
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8000,
            allowed_origins: vec!["http://localhost:5173".to_string()],
        }
    }
}

/// Pretrained model settings.
#[derive(Clone, Debug)]
pub struct ModelConfig {
    /// Hugging Face Hub repository id.
    pub model_id: String,
    /// Repository revision.
    pub revision: String,
    /// Skip accelerator detection.
    pub force_cpu: bool,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model_id: "google-t5/t5-base".to_string(),
            revision: "main".to_string(),
            force_cpu: false,
        }
    }
}

/// Text segmentation settings.
#[derive(Clone, Debug)]
pub struct SegmenterConfig {
    /// Chunks are grown while their token count stays below this value.
    pub max_tokens: usize,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self { max_tokens: 128 }
    }
}

/// Summary generation settings.
#[derive(Clone, Debug)]
pub struct SummarizerConfig {
    /// Instruction prepended to every prompt.
    pub instruction_prefix: String,
    /// Prompt token limit; longer prompts are truncated.
    pub max_input_tokens: usize,
    /// Decoding settings for per-chunk summaries.
    pub chunk: GenerationParams,
    /// Decoding settings for the consolidation pass.
    pub consolidation: GenerationParams,
    /// Run the consolidation pass over the joined chunk summaries.
    pub consolidate: bool,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            instruction_prefix:
                "summarize specially the technical terms so that non technicals can understand: "
                    .to_string(),
            max_input_tokens: 512,
            chunk: GenerationParams::chunk(),
            consolidation: GenerationParams::consolidation(),
            consolidate: true,
        }
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> SummaryResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| SummaryError::InvalidConfig(format!("{key}: invalid number {value:?}")))
}

fn parse_flag(key: &str, value: &str) -> SummaryResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(SummaryError::InvalidConfig(format!(
            "{key}: invalid boolean {value:?}"
        ))),
    }
}
