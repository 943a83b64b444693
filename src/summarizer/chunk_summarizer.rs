//! Prompt formatting and one generation call per piece of text.

use std::sync::Arc;

use crate::config::SummarizerConfig;
use crate::error::{SummaryError, SummaryResult};
use crate::generation::{GenerationParams, TextGenerator};

/// Which call site a summary is produced for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SummaryStage {
    /// One segment of the input text.
    Chunk,
    /// The joined chunk summaries.
    Consolidation,
}

/// Formats prompts and runs them through the generator.
#[derive(Clone)]
pub struct Summarizer {
    generator: Arc<dyn TextGenerator>,
    instruction_prefix: String,
    chunk: GenerationParams,
    consolidation: GenerationParams,
}

impl Summarizer {
    /// Create a summarizer over `generator` with the given prompt and length settings.
    #[must_use]
    pub fn new(generator: Arc<dyn TextGenerator>, config: &SummarizerConfig) -> Self {
        Self {
            generator,
            instruction_prefix: config.instruction_prefix.clone(),
            chunk: config.chunk.clone(),
            consolidation: config.consolidation.clone(),
        }
    }

    /// Decoding settings used for `stage`.
    #[must_use]
    pub const fn params(&self, stage: SummaryStage) -> &GenerationParams {
        match stage {
            SummaryStage::Chunk => &self.chunk,
            SummaryStage::Consolidation => &self.consolidation,
        }
    }

    /// Prompt sent to the model for `text`.
    #[must_use]
    pub fn prompt(&self, text: &str) -> String {
        format!("{}{text}", self.instruction_prefix)
    }

    /// Summarize one piece of text.
    ///
    /// # Errors
    /// Any failure is reported as [`SummaryError::Generation`].
    pub fn summarize(&self, text: &str, stage: SummaryStage) -> SummaryResult<String> {
        let prompt = self.prompt(text);
        self.generator
            .generate(&prompt, self.params(stage))
            .map_err(|e| match e {
                SummaryError::Generation(_) => e,
                other => SummaryError::generation(other.to_string()),
            })
    }
}
