//! Shared test doubles for the segmenter and generator seams.
//!
//! Available only under `#[cfg(test)]`.

use std::sync::Mutex;

use crate::error::{SummaryError, SummaryResult};
use crate::generation::{GenerationParams, TextGenerator};
use crate::segmenter::TokenCounter;

/// Counts whitespace-separated words.
pub struct WordCounter;

impl TokenCounter for WordCounter {
    fn count_tokens(&self, text: &str) -> SummaryResult<usize> {
        Ok(text.split_whitespace().count())
    }
}

/// Token counter that always fails.
pub struct BrokenCounter;

impl TokenCounter for BrokenCounter {
    fn count_tokens(&self, _text: &str) -> SummaryResult<usize> {
        Err(SummaryError::Tokenizer("vocabulary missing".to_string()))
    }
}

/// Deterministic generator that records every call.
///
/// Returns `"<n>:<last word of the prompt>"` for the n-th call, or the
/// configured error once `fail_on_call` is reached.
#[derive(Default)]
pub struct RecordingGenerator {
    calls: Mutex<Vec<(String, GenerationParams)>>,
    fail_on_call: Option<usize>,
}

impl RecordingGenerator {
    /// Generator that never fails.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Generator whose `call`-th invocation (1-based) fails.
    #[must_use]
    pub const fn failing_on(call: usize) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail_on_call: Some(call),
        }
    }

    /// Prompts received so far, in order.
    #[must_use]
    pub fn prompts(&self) -> Vec<String> {
        self.calls
            .lock()
            .map_or_else(
                |_| Vec::new(),
                |calls| calls.iter().map(|(prompt, _)| prompt.clone()).collect(),
            )
    }

    /// Parameters received so far, in order.
    #[must_use]
    pub fn params(&self) -> Vec<GenerationParams> {
        self.calls
            .lock()
            .map_or_else(
                |_| Vec::new(),
                |calls| calls.iter().map(|(_, params)| params.clone()).collect(),
            )
    }
}

impl TextGenerator for RecordingGenerator {
    fn generate(&self, prompt: &str, params: &GenerationParams) -> SummaryResult<String> {
        let mut calls = self
            .calls
            .lock()
            .map_err(|_| SummaryError::generation("recording lock poisoned"))?;
        calls.push((prompt.to_string(), params.clone()));
        let call = calls.len();
        drop(calls);

        if self.fail_on_call == Some(call) {
            return Err(SummaryError::Tokenizer(format!(
                "simulated failure on call {call}"
            )));
        }

        let last_word = prompt.split_whitespace().last().unwrap_or_default();
        Ok(format!("{call}:{last_word}"))
    }
}
