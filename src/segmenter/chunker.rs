//! Greedy sentence packing.

use std::sync::Arc;

use tracing::debug;

use crate::error::SummaryResult;
use crate::segmenter::token_counter::TokenCounter;

/// Literal delimiter the input is split on.
pub const SENTENCE_DELIMITER: &str = ". ";

/// Splits text into ordered chunks that each stay under a token threshold.
#[derive(Clone)]
pub struct Segmenter {
    counter: Arc<dyn TokenCounter>,
    max_tokens: usize,
}

impl Segmenter {
    /// Create a segmenter that grows chunks while they encode to fewer than `max_tokens`.
    #[must_use]
    pub const fn new(counter: Arc<dyn TokenCounter>, max_tokens: usize) -> Self {
        Self {
            counter,
            max_tokens,
        }
    }

    /// Token threshold used when packing sentences.
    #[must_use]
    pub const fn max_tokens(&self) -> usize {
        self.max_tokens
    }

    /// Split `text` into chunks without breaking sentences.
    ///
    /// A sentence that alone reaches the threshold becomes its own chunk.
    /// The period consumed by the delimiter is restored, so for text with
    /// single spaces between sentences `chunks.join(" ")` gives back the input.
    ///
    /// # Errors
    /// Returns an error if token counting fails.
    pub fn split(&self, text: &str) -> SummaryResult<Vec<String>> {
        let sentences: Vec<&str> = text.split(SENTENCE_DELIMITER).collect();
        let last = sentences.len().saturating_sub(1);

        let mut chunks = Vec::new();
        let mut current = String::new();

        for (index, sentence) in sentences.into_iter().enumerate() {
            let piece = if index == last {
                sentence.to_string()
            } else {
                format!("{sentence}.")
            };

            if current.is_empty() {
                current = piece;
                continue;
            }

            let candidate = format!("{current} {piece}");
            if self.counter.count_tokens(&candidate)? < self.max_tokens {
                current = candidate;
            } else {
                flush(&mut chunks, &current);
                current = piece;
            }
        }
        flush(&mut chunks, &current);

        debug!(
            chunks = chunks.len(),
            max_tokens = self.max_tokens,
            "Segmented input text"
        );
        Ok(chunks)
    }
}

fn flush(chunks: &mut Vec<String>, current: &str) {
    let trimmed = current.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }
}
