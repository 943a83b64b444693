//! HTTP text summarization backed by a pretrained T5 model.
//!
//! Long input is cut into sentence-aligned chunks that fit the model, each
//! chunk is summarized with beam search, and the chunk summaries are joined
//! and optionally summarized once more.

#![deny(warnings)]
#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(dead_code)]
#![deny(non_camel_case_types)]
#![deny(unused_imports)]
#![deny(unused_variables)]
#![deny(unused_must_use)]
#![deny(non_snake_case)]
#![deny(non_upper_case_globals)]
#![deny(nonstandard_style)]
#![forbid(unsafe_op_in_unsafe_fn)]
// Clippy discipline
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![deny(clippy::nursery)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::print_stdout)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]
#![deny(clippy::missing_const_for_fn)]
#![deny(clippy::unwrap_in_result)]
#![deny(clippy::module_inception)]
#![deny(clippy::redundant_clone)]
#![deny(clippy::shadow_unrelated)]
#![deny(clippy::too_many_arguments)]
#![deny(clippy::cognitive_complexity)]
// Robustness
#![deny(overflowing_literals)]

/// Service configuration and environment overrides.
pub mod config;
/// Error type shared by every component.
pub mod error;
/// Decoding parameters, beam search and the T5 backend.
pub mod generation;
/// Sentence-preserving chunking of input text.
pub mod segmenter;
/// HTTP server and API routes.
#[allow(clippy::missing_errors_doc, clippy::unused_async)]
pub mod server;
/// Process entry helpers.
pub mod startup;
/// Chunk summaries and the request pipeline.
pub mod summarizer;

/// Test doubles shared by the unit tests.
#[cfg(test)]
pub mod test_helpers;

pub use config::ServiceConfig;
pub use error::{SummaryError, SummaryResult};
