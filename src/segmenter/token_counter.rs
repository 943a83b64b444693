//! Token counting seam used by the segmenter.

use tokenizers::Tokenizer;

use crate::error::{SummaryError, SummaryResult};

/// Counts how many model tokens a piece of text encodes to.
pub trait TokenCounter: Send + Sync {
    /// Number of tokens `text` encodes to, special tokens included.
    ///
    /// # Errors
    /// Returns an error if the text cannot be encoded.
    fn count_tokens(&self, text: &str) -> SummaryResult<usize>;
}

impl TokenCounter for Tokenizer {
    fn count_tokens(&self, text: &str) -> SummaryResult<usize> {
        self.encode(text, true)
            .map(|encoding| encoding.len())
            .map_err(|e| SummaryError::Tokenizer(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;
    use std::sync::Arc;

    use super::*;
    use crate::segmenter::Segmenter;
    use crate::test_helpers::WordCounter;

    /// Word-level vocabulary with a T5-style post-processor appending `</s>`.
    fn eos_tokenizer() -> SummaryResult<Tokenizer> {
        let single = serde_json::json!([
            { "Sequence": { "id": "A", "type_id": 0 } },
            { "SpecialToken": { "id": "</s>", "type_id": 0 } }
        ]);
        let pair = serde_json::json!([
            { "Sequence": { "id": "A", "type_id": 0 } },
            { "SpecialToken": { "id": "</s>", "type_id": 0 } },
            { "Sequence": { "id": "B", "type_id": 0 } },
            { "SpecialToken": { "id": "</s>", "type_id": 0 } }
        ]);
        let config = serde_json::json!({
            "version": "1.0",
            "truncation": null,
            "padding": null,
            "added_tokens": [],
            "normalizer": null,
            "pre_tokenizer": { "type": "WhitespaceSplit" },
            "post_processor": {
                "type": "TemplateProcessing",
                "single": single,
                "pair": pair,
                "special_tokens": {
                    "</s>": { "id": "</s>", "ids": [1], "tokens": ["</s>"] }
                }
            },
            "decoder": null,
            "model": {
                "type": "WordLevel",
                "vocab": {
                    "<unk>": 0, "</s>": 1, "Alpha": 2, "beta.": 3, "Gamma": 4, "delta.": 5
                },
                "unk_token": "<unk>"
            }
        });
        Tokenizer::from_str(&config.to_string()).map_err(|e| SummaryError::Tokenizer(e.to_string()))
    }

    #[test]
    fn test_count_includes_end_of_sequence() -> SummaryResult<()> {
        let tokenizer = eos_tokenizer()?;
        assert_eq!(tokenizer.count_tokens("Alpha beta.")?, 3);
        assert_eq!(tokenizer.count_tokens("Alpha beta. Gamma delta.")?, 5);
        assert_eq!(tokenizer.count_tokens("unknown words")?, 3);
        Ok(())
    }

    #[test]
    fn test_end_of_sequence_moves_chunk_boundary() -> SummaryResult<()> {
        let text = "Alpha beta. Gamma delta.";

        let words = Segmenter::new(Arc::new(WordCounter), 5).split(text)?;
        assert_eq!(words, vec![text]);

        let tokens = Segmenter::new(Arc::new(eos_tokenizer()?), 5).split(text)?;
        assert_eq!(tokens, vec!["Alpha beta.", "Gamma delta."]);

        let tokens = Segmenter::new(Arc::new(eos_tokenizer()?), 6).split(text)?;
        assert_eq!(tokens, vec![text]);
        Ok(())
    }
}
