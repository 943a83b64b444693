//! Model-agnostic beam search over decoder log-probabilities.

use std::cmp::Ordering;

use tracing::trace;

use crate::error::{SummaryError, SummaryResult};
use crate::generation::params::GenerationParams;

/// One decoder forward pass over a batch of equal-length sequences.
pub trait StepScorer {
    /// Log-probabilities over the vocabulary for the next token of every sequence.
    ///
    /// Returns one row per input sequence, in the same order.
    ///
    /// # Errors
    /// Returns an error if the forward pass fails.
    fn next_log_probs(&mut self, sequences: &[Vec<u32>]) -> SummaryResult<Vec<Vec<f32>>>;
}

#[derive(Clone, Debug)]
struct Beam {
    tokens: Vec<u32>,
    score: f32,
}

#[derive(Clone, Copy, Debug)]
struct Candidate {
    beam: usize,
    token: u32,
    score: f32,
}

/// Finished hypotheses, capped at the beam width.
struct Hypotheses {
    capacity: usize,
    length_penalty: f32,
    finished: Vec<Beam>,
}

impl Hypotheses {
    const fn new(capacity: usize, length_penalty: f32) -> Self {
        Self {
            capacity,
            length_penalty,
            finished: Vec::new(),
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn normalize(&self, sum_logprobs: f32, len: usize) -> f32 {
        sum_logprobs / (len as f32).powf(self.length_penalty)
    }

    fn worst(&self) -> Option<(usize, f32)> {
        self.finished
            .iter()
            .enumerate()
            .map(|(index, beam)| (index, beam.score))
            .min_by(|a, b| a.1.total_cmp(&b.1))
    }

    fn add(&mut self, tokens: Vec<u32>, sum_logprobs: f32) {
        let score = self.normalize(sum_logprobs, tokens.len());
        let accepted = self.finished.len() < self.capacity
            || self.worst().is_some_and(|(_, worst)| score > worst);
        if !accepted {
            return;
        }

        self.finished.push(Beam { tokens, score });
        if self.finished.len() > self.capacity
            && let Some((index, _)) = self.worst()
        {
            self.finished.swap_remove(index);
        }
    }

    fn is_done(&self, best_running: f32, cur_len: usize, early_stopping: bool) -> bool {
        if self.finished.len() < self.capacity {
            return false;
        }
        if early_stopping {
            return true;
        }
        let best_possible = self.normalize(best_running, cur_len);
        self.worst()
            .is_some_and(|(_, worst)| worst >= best_possible)
    }

    fn into_best(self) -> Option<Beam> {
        self.finished
            .into_iter()
            .max_by(|a, b| a.score.total_cmp(&b.score))
    }
}

/// Run beam search and return the best hypothesis.
///
/// The returned tokens exclude the start token and the end-of-sequence token.
///
/// # Errors
/// Returns an error if the scorer fails or returns a malformed batch.
pub fn beam_search<S>(
    scorer: &mut S,
    params: &GenerationParams,
    start_token: u32,
    eos_token: u32,
) -> SummaryResult<Vec<u32>>
where
    S: StepScorer + ?Sized,
{
    let width = params.num_beams.max(1);
    let mut beams = vec![Beam {
        tokens: vec![start_token],
        score: 0.0,
    }];
    let mut hypotheses = Hypotheses::new(width, params.length_penalty);
    let mut cur_len = 1;
    let mut done = false;

    while cur_len < params.max_length && !beams.is_empty() {
        let sequences: Vec<Vec<u32>> = beams.iter().map(|beam| beam.tokens.clone()).collect();
        let log_probs = scorer.next_log_probs(&sequences)?;
        let (rows, running) = (log_probs.len(), beams.len());
        if rows != running {
            return Err(SummaryError::generation(format!(
                "decoder returned {rows} rows for {running} beams"
            )));
        }

        let blocked = (cur_len < params.min_length).then_some(eos_token);
        let mut candidates = Vec::with_capacity(beams.len() * 2 * width);
        for (index, (beam, row)) in beams.iter().zip(&log_probs).enumerate() {
            for (token, log_prob) in top_tokens(row, 2 * width, blocked) {
                candidates.push(Candidate {
                    beam: index,
                    token,
                    score: beam.score + log_prob,
                });
            }
        }
        candidates.sort_by(|a, b| b.score.total_cmp(&a.score));
        candidates.truncate(2 * width);

        let mut next = Vec::with_capacity(width);
        for (rank, candidate) in candidates.into_iter().enumerate() {
            let parent = &beams[candidate.beam];
            if candidate.token == eos_token {
                // Only end-of-sequence tokens ranked inside the beam width finish a hypothesis.
                if rank < width {
                    hypotheses.add(parent.tokens.clone(), candidate.score);
                }
            } else {
                let mut tokens = Vec::with_capacity(parent.tokens.len() + 1);
                tokens.extend_from_slice(&parent.tokens);
                tokens.push(candidate.token);
                next.push(Beam {
                    tokens,
                    score: candidate.score,
                });
            }
            if next.len() == width {
                break;
            }
        }

        cur_len += 1;
        beams = next;
        trace!(
            cur_len,
            running = beams.len(),
            finished = hypotheses.finished.len(),
            "Beam search step"
        );

        let best_running = beams.first().map_or(f32::NEG_INFINITY, |beam| beam.score);
        if hypotheses.is_done(best_running, cur_len, params.early_stopping) {
            done = true;
            break;
        }
    }

    if !done {
        for beam in beams {
            hypotheses.add(beam.tokens, beam.score);
        }
    }

    hypotheses
        .into_best()
        .map(|beam| beam.tokens.into_iter().skip(1).collect())
        .ok_or_else(|| SummaryError::generation("beam search produced no hypothesis"))
}

/// Highest-scoring `k` tokens of one row, skipping `blocked`.
fn top_tokens(row: &[f32], k: usize, blocked: Option<u32>) -> Vec<(u32, f32)> {
    let mut scored: Vec<(u32, f32)> = row
        .iter()
        .enumerate()
        .filter_map(|(index, &log_prob)| u32::try_from(index).ok().map(|token| (token, log_prob)))
        .filter(|(token, log_prob)| Some(*token) != blocked && !log_prob.is_nan())
        .collect();

    let descending = |a: &(u32, f32), b: &(u32, f32)| -> Ordering { b.1.total_cmp(&a.1) };
    if k == 0 {
        return Vec::new();
    }
    if k < scored.len() {
        scored.select_nth_unstable_by(k - 1, descending);
        scored.truncate(k);
    }
    scored.sort_by(descending);
    scored
}

#[cfg(test)]
mod tests {
    use super::*;

    const START: u32 = 0;
    const EOS: u32 = 1;
    const VOCAB: usize = 6;

    /// Scorer driven by a closure over the current sequence.
    struct ScriptedScorer<F: Fn(&[u32]) -> Vec<f32>> {
        script: F,
        steps: usize,
    }

    impl<F: Fn(&[u32]) -> Vec<f32>> ScriptedScorer<F> {
        const fn new(script: F) -> Self {
            Self { script, steps: 0 }
        }
    }

    impl<F: Fn(&[u32]) -> Vec<f32>> StepScorer for ScriptedScorer<F> {
        fn next_log_probs(&mut self, sequences: &[Vec<u32>]) -> SummaryResult<Vec<Vec<f32>>> {
            self.steps += 1;
            Ok(sequences.iter().map(|seq| (self.script)(seq)).collect())
        }
    }

    fn row(best: u32, best_score: f32, eos_score: f32, rest: f32) -> Vec<f32> {
        let mut row = vec![rest; VOCAB];
        row[EOS as usize] = eos_score;
        row[best as usize] = best_score;
        row
    }

    const fn params(min_length: usize, max_length: usize, early_stopping: bool) -> GenerationParams {
        GenerationParams {
            num_beams: 3,
            max_length,
            min_length,
            length_penalty: 2.0,
            early_stopping,
        }
    }

    #[test]
    fn test_min_length_blocks_early_eos() {
        let mut scorer = ScriptedScorer::new(|_: &[u32]| row(EOS, -0.1, -0.1, -3.0));
        let tokens = beam_search(&mut scorer, &params(6, 20, true), START, EOS).unwrap_or_default();
        assert_eq!(tokens.len() + 1, 6);
        assert!(!tokens.contains(&EOS));
    }

    #[test]
    fn test_max_length_caps_output() {
        let mut scorer = ScriptedScorer::new(|_: &[u32]| row(2, -0.1, -50.0, -3.0));
        let tokens = beam_search(&mut scorer, &params(0, 12, true), START, EOS).unwrap_or_default();
        assert_eq!(tokens.len() + 1, 12);
        assert_eq!(scorer.steps, 11);
    }

    #[test]
    fn test_output_stays_within_bounds() {
        for (min_length, max_length) in [(1, 5), (4, 9), (10, 10), (30, 100)] {
            let mut scorer = ScriptedScorer::new(|seq: &[u32]| {
                if seq.len() % 7 == 0 {
                    row(EOS, -0.2, -0.2, -2.0)
                } else {
                    row(3, -0.3, -2.5, -2.0)
                }
            });
            let tokens =
                beam_search(&mut scorer, &params(min_length, max_length, true), START, EOS)
                    .unwrap_or_default();
            let len = tokens.len() + 1;
            assert!(
                (min_length..=max_length).contains(&len),
                "len {len} outside [{min_length}, {max_length}]"
            );
        }
    }

    #[test]
    fn test_best_path_is_selected() {
        let mut scorer = ScriptedScorer::new(|seq: &[u32]| {
            if seq.len() >= 5 {
                row(EOS, -0.01, -0.01, -5.0)
            } else {
                row(2, -0.1, -4.5, -4.0)
            }
        });
        let tokens = beam_search(&mut scorer, &params(0, 8, false), START, EOS).unwrap_or_default();
        assert_eq!(tokens, vec![2, 2, 2, 2]);
    }

    #[test]
    fn test_scorer_error_propagates() {
        struct Failing;
        impl StepScorer for Failing {
            fn next_log_probs(&mut self, _: &[Vec<u32>]) -> SummaryResult<Vec<Vec<f32>>> {
                Err(SummaryError::generation("device lost"))
            }
        }

        let result = beam_search(&mut Failing, &params(0, 10, true), START, EOS);
        assert!(matches!(result, Err(SummaryError::Generation(msg)) if msg == "device lost"));
    }

    #[test]
    fn test_malformed_batch_is_rejected() {
        struct Empty;
        impl StepScorer for Empty {
            fn next_log_probs(&mut self, _: &[Vec<u32>]) -> SummaryResult<Vec<Vec<f32>>> {
                Ok(Vec::new())
            }
        }

        let result = beam_search(&mut Empty, &params(0, 10, true), START, EOS);
        assert!(result.is_err());
    }

    #[test]
    fn test_top_tokens_skips_blocked() {
        let top = top_tokens(&[-1.0, -0.5, -2.0, -0.1], 2, Some(3));
        assert_eq!(top, vec![(1, -0.5), (0, -1.0)]);
    }
}
