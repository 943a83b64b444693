//! Application state shared across all request handlers.

use std::sync::Arc;

use crate::config::ServiceConfig;
use crate::error::SummaryResult;
use crate::generation::T5Generator;
use crate::segmenter::Segmenter;
use crate::summarizer::{Summarizer, SummaryPipeline};

/// Shared application state.
pub struct AppState {
    /// Segmentation and generation for one request.
    pub pipeline: SummaryPipeline,
    /// Model name reported by the health endpoint.
    pub model_name: String,
}

impl AppState {
    /// Load the pretrained model and build the request pipeline.
    ///
    /// # Errors
    /// Returns an error if the model or tokenizer cannot be loaded.
    pub fn new(config: &ServiceConfig) -> SummaryResult<Arc<Self>> {
        let generator = Arc::new(T5Generator::from_hub(
            &config.model,
            config.summarizer.max_input_tokens,
        )?);
        let model_name = generator.model_id().to_string();

        let segmenter = Segmenter::new(generator.tokenizer(), config.segmenter.max_tokens);
        let summarizer = Summarizer::new(generator, &config.summarizer);
        let pipeline = SummaryPipeline::new(segmenter, summarizer, config.summarizer.consolidate);

        Ok(Self::with_pipeline(pipeline, model_name))
    }

    /// Wrap an already assembled pipeline.
    #[must_use]
    pub fn with_pipeline(pipeline: SummaryPipeline, model_name: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            pipeline,
            model_name: model_name.into(),
        })
    }
}
