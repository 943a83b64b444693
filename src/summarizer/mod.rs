//! Chunk summarization and the end-to-end request pipeline.

pub mod chunk_summarizer;
pub mod pipeline;

pub use chunk_summarizer::{Summarizer, SummaryStage};
pub use pipeline::{SummaryPipeline, validate_input};
