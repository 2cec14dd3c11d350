//! Interpolated n-gram language model.
//!
//! Mixes the Kneser-Ney estimates of orders 1 to 3:
//!
//! - two context words, trigram mode: `0.5·P3 + 0.3·P2 + 0.2·P1`
//! - one context word, or bigram mode: `0.7·P2 + 0.3·P1`
//! - no context: `P1`
//!
//! Every lookup expects case-folded words. The model is immutable once built
//! and is meant to be shared behind an `Arc`.

use crate::corpus::NgramCounts;
use crate::error::Error;
use crate::kneser_ney::KneserNey;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Floor applied before taking logarithms so unseen words stay finite.
pub const PROBABILITY_FLOOR: f64 = 1e-10;

/// Highest n-gram order consulted by an analysis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NgramMode {
    Bigram,
    #[default]
    Trigram,
}

impl NgramMode {
    /// Number of preceding words this mode conditions on.
    pub fn context_len(self) -> usize {
        match self {
            Self::Bigram => 1,
            Self::Trigram => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bigram => "bigram",
            Self::Trigram => "trigram",
        }
    }
}

impl fmt::Display for NgramMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NgramMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bigram" => Ok(Self::Bigram),
            "trigram" => Ok(Self::Trigram),
            _ => Err(Error::InvalidMode(s.to_string())),
        }
    }
}

/// Mixture weights for each amount of available context.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InterpolationWeights {
    pub trigram: f64,
    pub bigram: f64,
    pub unigram: f64,
    /// Bigram share when only one context word is used.
    pub backoff_bigram: f64,
    /// Unigram share when only one context word is used.
    pub backoff_unigram: f64,
}

impl Default for InterpolationWeights {
    fn default() -> Self {
        Self {
            trigram: 0.5,
            bigram: 0.3,
            unigram: 0.2,
            backoff_bigram: 0.7,
            backoff_unigram: 0.3,
        }
    }
}

/// Smoothed probabilities over a fixed vocabulary.
pub struct LanguageModel {
    counts: NgramCounts,
    estimator: KneserNey,
    weights: InterpolationWeights,
}

impl fmt::Debug for LanguageModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LanguageModel")
            .field("vocabulary_size", &self.vocabulary_size())
            .field("total_words", &self.total_words())
            .field("bigram_types", &self.counts.bigram_types())
            .field("weights", &self.weights)
            .finish()
    }
}

impl LanguageModel {
    pub(crate) fn new(counts: NgramCounts, weights: InterpolationWeights) -> Self {
        let estimator = KneserNey::new(&counts);
        Self {
            counts,
            estimator,
            weights,
        }
    }

    pub fn contains(&self, word: &str) -> bool {
        self.counts.id(word).is_some()
    }

    /// Corpus count of `word`, 0 if unknown.
    pub fn frequency(&self, word: &str) -> u64 {
        self.counts.id(word).map_or(0, |id| self.counts.unigram(id))
    }

    /// Raw corpus count of a one- to three-word n-gram. Unknown words and
    /// longer slices count 0.
    pub fn count(&self, ngram: &[&str]) -> u64 {
        let id = |word: &str| self.counts.id(word);
        let counted = match ngram {
            [word] => id(word).map(|w| self.counts.unigram(w)),
            [prev, word] => id(prev)
                .zip(id(word))
                .map(|(a, b)| self.counts.bigram(a, b)),
            [prev_prev, prev, word] => match (id(prev_prev), id(prev), id(word)) {
                (Some(a), Some(b), Some(c)) => Some(self.counts.trigram(a, b, c)),
                _ => None,
            },
            _ => None,
        };
        counted.unwrap_or(0)
    }

    pub fn vocabulary_size(&self) -> usize {
        self.counts.vocabulary_size()
    }

    pub fn total_words(&self) -> u64 {
        self.counts.total_words()
    }

    pub fn weights(&self) -> &InterpolationWeights {
        &self.weights
    }

    /// Vocabulary words with their frequencies, in no particular order.
    pub fn words(&self) -> impl Iterator<Item = (&str, u64)> {
        self.counts.entries()
    }

    /// Interpolated `P(word | context)`.
    ///
    /// Only the last one or two context words are used, depending on `mode`.
    /// Out-of-vocabulary context words count as an unseen context; an
    /// out-of-vocabulary `word` has probability 0.
    pub fn probability(&self, context: &[&str], word: &str, mode: NgramMode) -> f64 {
        let Some(word) = self.counts.id(word) else {
            return 0.0;
        };

        let used = context.len().min(mode.context_len());
        let context = &context[context.len() - used..];
        let unigram = self.estimator.unigram(&self.counts, word);
        let w = &self.weights;

        match context {
            [] => unigram,
            [prev] => {
                let bigram = self.estimator.bigram(&self.counts, self.counts.id(prev), word);
                w.backoff_bigram * bigram + w.backoff_unigram * unigram
            }
            [.., prev_prev, prev] => {
                let (a, b) = (self.counts.id(prev_prev), self.counts.id(prev));
                let trigram = self.estimator.trigram(&self.counts, a, b, word);
                let bigram = self.estimator.bigram(&self.counts, b, word);
                w.trigram * trigram + w.bigram * bigram + w.unigram * unigram
            }
        }
    }

    /// Natural log of [`probability`](Self::probability), floored at
    /// [`PROBABILITY_FLOOR`].
    pub fn log_probability(&self, context: &[&str], word: &str, mode: NgramMode) -> f64 {
        self.probability(context, word, mode)
            .max(PROBABILITY_FLOOR)
            .ln()
    }

    /// Un-interpolated Kneser-Ney estimate of the order given by the context
    /// length (at most two words).
    pub fn kneser_ney(&self, context: &[&str], word: &str) -> f64 {
        let Some(word) = self.counts.id(word) else {
            return 0.0;
        };
        let id = |w: &&str| self.counts.id(w);

        match context {
            [] => self.estimator.unigram(&self.counts, word),
            [prev] => self.estimator.bigram(&self.counts, id(prev), word),
            [.., prev_prev, prev] => {
                self.estimator
                    .trigram(&self.counts, id(prev_prev), id(prev), word)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::build;

    const TEXT: &str = "The cat sat on the mat. The cat ate the fish. A dog sat on a log. \
                        The dog ran home. She saw the dog on the mat.";

    fn vocabulary(model: &LanguageModel) -> Vec<String> {
        model.words().map(|(w, _)| w.to_string()).collect()
    }

    fn total(model: &LanguageModel, context: &[&str], mode: NgramMode) -> f64 {
        vocabulary(model)
            .iter()
            .map(|w| model.probability(context, w, mode))
            .sum()
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!("bigram".parse::<NgramMode>().unwrap(), NgramMode::Bigram);
        assert_eq!(" Trigram ".parse::<NgramMode>().unwrap(), NgramMode::Trigram);
        assert!(matches!(
            "fourgram".parse::<NgramMode>(),
            Err(Error::InvalidMode(m)) if m == "fourgram"
        ));
        assert_eq!(NgramMode::Bigram.to_string(), "bigram");
        assert_eq!(serde_json::to_string(&NgramMode::Trigram).unwrap(), "\"trigram\"");
    }

    #[test]
    fn test_unknown_word_has_zero_probability() {
        let model = build([TEXT]).unwrap();
        assert_eq!(model.probability(&["the"], "zebra", NgramMode::Trigram), 0.0);
        assert_eq!(
            model.log_probability(&["the"], "zebra", NgramMode::Trigram),
            PROBABILITY_FLOOR.ln()
        );
    }

    #[test]
    fn test_raw_counts() {
        let model = build([TEXT]).unwrap();
        assert_eq!(model.count(&["the"]), 7);
        assert_eq!(model.count(&["sat", "on"]), 2);
        assert_eq!(model.count(&["on", "the", "mat"]), 2);
        assert_eq!(model.count(&["mat", "the"]), 0);
        assert_eq!(model.count(&["zebra"]), 0);
        assert_eq!(model.count(&[]), 0);
    }

    #[test]
    fn test_context_prefers_seen_continuation() {
        let model = build([TEXT]).unwrap();
        let seen = model.probability(&["on", "the"], "mat", NgramMode::Trigram);
        let unseen = model.probability(&["on", "the"], "ran", NgramMode::Trigram);
        assert!(seen > unseen);
    }

    #[test]
    fn test_bigram_mode_ignores_older_context() {
        let model = build([TEXT]).unwrap();
        let short = model.probability(&["cat"], "sat", NgramMode::Bigram);
        let long = model.probability(&["the", "cat"], "sat", NgramMode::Bigram);
        assert_eq!(short, long);
    }

    #[test]
    fn test_interpolation_weights() {
        let model = build([TEXT]).unwrap();
        let p1 = model.kneser_ney(&[], "sat");
        let p2 = model.kneser_ney(&["cat"], "sat");
        let p3 = model.kneser_ney(&["the", "cat"], "sat");

        let one = model.probability(&["cat"], "sat", NgramMode::Trigram);
        assert!((one - (0.7 * p2 + 0.3 * p1)).abs() < 1e-12);

        let two = model.probability(&["the", "cat"], "sat", NgramMode::Trigram);
        assert!((two - (0.5 * p3 + 0.3 * p2 + 0.2 * p1)).abs() < 1e-12);

        assert_eq!(model.probability(&[], "sat", NgramMode::Trigram), p1);
    }

    #[test]
    fn test_interpolated_mass_is_conserved() {
        let model = build([TEXT]).unwrap();
        for mode in [NgramMode::Bigram, NgramMode::Trigram] {
            for context in [
                vec![],
                vec!["the"],
                vec!["the", "cat"],
                vec!["on", "a"],
                vec!["fish", "home"],
                vec!["unknown", "words"],
            ] {
                let sum = total(&model, &context, mode);
                assert!((sum - 1.0).abs() < 1e-9, "{mode} {context:?}: {sum}");
            }
        }
    }

    #[test]
    fn test_frequency_and_sizes() {
        let model = build([TEXT]).unwrap();
        assert_eq!(model.frequency("the"), 7);
        assert_eq!(model.frequency("zebra"), 0);
        assert_eq!(model.total_words(), 28);
        assert!(model.contains("log"));
    }
}
