//! Sentence-preserving segmentation of long input text.
//!
//! Text is cut on the literal `". "` delimiter and sentences are packed
//! greedily into chunks that stay under a token threshold.

pub mod chunker;
pub mod token_counter;

pub use chunker::{SENTENCE_DELIMITER, Segmenter};
pub use token_counter::TokenCounter;
