//! Segment, summarize every chunk in order, join, then consolidate.

use tracing::debug;

use crate::error::{SummaryError, SummaryResult};
use crate::segmenter::Segmenter;
use crate::summarizer::chunk_summarizer::{Summarizer, SummaryStage};

/// Separator placed between chunk summaries.
pub const SUMMARY_SEPARATOR: &str = " ";

/// Reject empty or whitespace-only input, returning the trimmed text.
///
/// # Errors
/// Returns [`SummaryError::EmptyInput`] when nothing is left after trimming.
pub fn validate_input(text: &str) -> SummaryResult<&str> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(SummaryError::EmptyInput);
    }
    Ok(trimmed)
}

/// Full summarization of one request.
#[derive(Clone)]
pub struct SummaryPipeline {
    segmenter: Segmenter,
    summarizer: Summarizer,
    consolidate: bool,
}

impl SummaryPipeline {
    /// Assemble a pipeline.
    #[must_use]
    pub const fn new(segmenter: Segmenter, summarizer: Summarizer, consolidate: bool) -> Self {
        Self {
            segmenter,
            summarizer,
            consolidate,
        }
    }

    /// Summarize `text`.
    ///
    /// Chunks are summarized in input order and the first failure aborts
    /// the request. With consolidation enabled the joined chunk summaries
    /// go through one more, longer, generation pass and that result is returned.
    ///
    /// # Errors
    /// Returns an error for empty input, input that yields no chunks, or
    /// any generation failure.
    pub fn run(&self, text: &str) -> SummaryResult<String> {
        let text = validate_input(text)?;

        let chunks = self.segmenter.split(text)?;
        if chunks.is_empty() {
            return Err(SummaryError::NoChunks);
        }
        debug!(chunks = chunks.len(), chars = text.len(), "Summarizing text");

        let mut summaries = Vec::with_capacity(chunks.len());
        for (index, chunk) in chunks.iter().enumerate() {
            debug!(chunk = index + 1, total = chunks.len(), "Summarizing chunk");
            summaries.push(self.summarizer.summarize(chunk, SummaryStage::Chunk)?);
        }

        let combined = summaries.join(SUMMARY_SEPARATOR);
        if !self.consolidate {
            return Ok(combined);
        }

        debug!(chars = combined.len(), "Consolidating chunk summaries");
        self.summarizer
            .summarize(&combined, SummaryStage::Consolidation)
    }
}
