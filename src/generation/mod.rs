//! Text generation: decoding parameters, beam search and the T5 backend.

pub mod beam_search;
pub mod params;
pub mod t5;

pub use beam_search::{StepScorer, beam_search};
pub use params::GenerationParams;
pub use t5::T5Generator;

use crate::error::SummaryResult;

/// Produces text from a prompt with a pretrained model.
///
/// Implementations are shared across request handlers.
pub trait TextGenerator: Send + Sync {
    /// Generate text for `prompt` using the given decoding settings.
    ///
    /// # Errors
    /// Returns an error if tokenization or inference fails.
    fn generate(&self, prompt: &str, params: &GenerationParams) -> SummaryResult<String>;
}
