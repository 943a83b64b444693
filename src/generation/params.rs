//! Beam-search parameters for one generation call site.

use crate::error::{SummaryError, SummaryResult};

/// Decoding settings passed to the generator.
///
/// Lengths count decoder positions, including the decoder start token.
#[derive(Clone, Debug, PartialEq)]
pub struct GenerationParams {
    /// Beam width.
    pub num_beams: usize,
    /// Maximum decoder length.
    pub max_length: usize,
    /// Minimum decoder length before end-of-sequence is allowed.
    pub min_length: usize,
    /// Exponent applied to the hypothesis length when scoring.
    pub length_penalty: f32,
    /// Stop as soon as `num_beams` hypotheses are finished.
    pub early_stopping: bool,
}

impl GenerationParams {
    /// Bounds used for per-chunk summaries.
    #[must_use]
    pub const fn chunk() -> Self {
        Self {
            num_beams: 4,
            max_length: 100,
            min_length: 30,
            length_penalty: 2.0,
            early_stopping: true,
        }
    }

    /// Bounds used for the consolidation pass over joined chunk summaries.
    #[must_use]
    pub const fn consolidation() -> Self {
        Self {
            num_beams: 4,
            max_length: 300,
            min_length: 200,
            length_penalty: 2.0,
            early_stopping: true,
        }
    }

    /// Validate parameter invariants.
    ///
    /// # Errors
    /// Returns an error if any value is out of range.
    pub fn validate(&self, name: &str) -> SummaryResult<()> {
        if self.num_beams == 0 {
            return Err(SummaryError::InvalidConfig(format!(
                "{name}.num_beams must be > 0"
            )));
        }

        if self.max_length < 2 {
            return Err(SummaryError::InvalidConfig(format!(
                "{name}.max_length must be >= 2"
            )));
        }

        if self.min_length > self.max_length {
            return Err(SummaryError::InvalidConfig(format!(
                "{name}.min_length ({min}) must not exceed max_length ({max})",
                min = self.min_length,
                max = self.max_length
            )));
        }

        if !self.length_penalty.is_finite() {
            return Err(SummaryError::InvalidConfig(format!(
                "{name}.length_penalty must be finite"
            )));
        }

        Ok(())
    }
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self::chunk()
    }
}
