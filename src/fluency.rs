//! Perplexity-based fluency scores.
//!
//! Perplexity is mapped onto 0..=100 by a monotone, continuous curve:
//!
//! | perplexity | score             |
//! |------------|-------------------|
//! | 1 ..= 50   | 100 down to 90    |
//! | 50 ..= 100 | 90 down to 70     |
//! | 100 ..= 500| 70 down to 50     |
//! | > 500      | `50 · 500 / p`    |

use crate::model::{LanguageModel, NgramMode};

/// Score of a sentence that has nothing to measure.
pub const NEUTRAL_SCORE: f64 = 100.0;

/// `exp(-mean(log P(w_i | context_i)))` over `words`, `None` when empty.
pub fn perplexity(model: &LanguageModel, words: &[&str], mode: NgramMode) -> Option<f64> {
    if words.is_empty() {
        return None;
    }

    let log_sum: f64 = words
        .iter()
        .enumerate()
        .map(|(i, word)| {
            let context = &words[i.saturating_sub(2)..i];
            model.log_probability(context, word, mode)
        })
        .sum();

    Some((-log_sum / words.len() as f64).exp())
}

pub fn score_from_perplexity(perplexity: f64) -> f64 {
    let p = perplexity.max(1.0);
    let score = if p <= 50.0 {
        100.0 - 10.0 * (p - 1.0) / 49.0
    } else if p <= 100.0 {
        90.0 - 20.0 * (p - 50.0) / 50.0
    } else if p <= 500.0 {
        70.0 - 20.0 * (p - 100.0) / 400.0
    } else {
        50.0 * 500.0 / p
    };
    score.clamp(0.0, 100.0)
}

/// Fluency of one sentence's words; [`NEUTRAL_SCORE`] if it has none.
pub fn sentence_fluency(model: &LanguageModel, words: &[&str], mode: NgramMode) -> f64 {
    perplexity(model, words, mode).map_or(NEUTRAL_SCORE, score_from_perplexity)
}

/// Mean of `(score, word_count)` pairs weighted by word count.
pub fn document_confidence(sentences: &[(f64, usize)]) -> f64 {
    let words: usize = sentences.iter().map(|&(_, n)| n).sum();
    if words == 0 {
        return NEUTRAL_SCORE;
    }

    let weighted: f64 = sentences.iter().map(|&(score, n)| score * n as f64).sum();
    weighted / words as f64
}

pub fn score_label(score: f64) -> &'static str {
    match score {
        s if s >= 90.0 => "Excellent",
        s if s >= 70.0 => "Good",
        s if s >= 50.0 => "Fair",
        _ => "Needs Improvement",
    }
}
