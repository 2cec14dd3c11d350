//! Interpolated Kneser-Ney estimates for a single n-gram order.
//!
//! For a context `c` (zero, one or two preceding words) and a word `w`:
//!
//! ```text
//! P_KN(w | c) = max(count(c, w) - d, 0) / count(c) + λ(c) · P_cont(w)
//! λ(c)        = d · distinct_continuations(c) / count(c)
//! P_cont(w)   = distinct_predecessors(w) / distinct_bigram_types
//! ```
//!
//! `count(c)` is how often `c` is followed by any word. A context that was
//! never seen contributes no discounted term and gets `λ(c) = 1`, so the
//! estimate falls back to the continuation distribution. Order 1 is plain
//! relative frequency.
//!
//! With these definitions each order is a proper distribution over the
//! vocabulary, seen context or not.

use crate::corpus::{NgramCounts, WordId};
use ahash::AHashMap;

/// Absolute discount subtracted from every seen n-gram count.
pub const DISCOUNT: f64 = 0.75;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct ContextStats {
    /// Occurrences of the context followed by some word.
    total: u64,
    /// Distinct words seen after the context.
    distinct: u64,
}

/// Precomputed context totals and continuation counts.
#[derive(Debug, Clone)]
pub struct KneserNey {
    discount: f64,
    bigram_contexts: AHashMap<WordId, ContextStats>,
    trigram_contexts: AHashMap<(WordId, WordId), ContextStats>,
    continuation: Vec<u64>,
    bigram_types: u64,
}

impl KneserNey {
    pub fn new(counts: &NgramCounts) -> Self {
        Self::with_discount(counts, DISCOUNT)
    }

    pub fn with_discount(counts: &NgramCounts, discount: f64) -> Self {
        let mut continuation = vec![0u64; counts.vocabulary_size()];
        let mut bigram_contexts: AHashMap<WordId, ContextStats> = AHashMap::new();
        for (&(prev, word), &count) in counts.bigrams() {
            continuation[word as usize] += 1;
            let stats = bigram_contexts.entry(prev).or_default();
            stats.total += count;
            stats.distinct += 1;
        }

        let mut trigram_contexts: AHashMap<(WordId, WordId), ContextStats> = AHashMap::new();
        for (&(prev_prev, prev, _), &count) in counts.trigrams() {
            let stats = trigram_contexts.entry((prev_prev, prev)).or_default();
            stats.total += count;
            stats.distinct += 1;
        }

        Self {
            discount,
            bigram_contexts,
            trigram_contexts,
            continuation,
            bigram_types: counts.bigram_types() as u64,
        }
    }

    pub fn discount(&self) -> f64 {
        self.discount
    }

    /// Share of distinct bigram types that end in `word`.
    pub fn continuation_probability(&self, word: WordId) -> f64 {
        if self.bigram_types == 0 {
            return 0.0;
        }
        self.continuation[word as usize] as f64 / self.bigram_types as f64
    }

    pub fn unigram(&self, counts: &NgramCounts, word: WordId) -> f64 {
        if counts.total_words() == 0 {
            return 0.0;
        }
        counts.unigram(word) as f64 / counts.total_words() as f64
    }

    /// `prev` is `None` when the preceding word is out of vocabulary.
    pub fn bigram(&self, counts: &NgramCounts, prev: Option<WordId>, word: WordId) -> f64 {
        match prev {
            Some(prev) => self.smooth(
                counts.bigram(prev, word),
                self.bigram_contexts.get(&prev),
                word,
            ),
            None => self.smooth(0, None, word),
        }
    }

    pub fn trigram(
        &self,
        counts: &NgramCounts,
        prev_prev: Option<WordId>,
        prev: Option<WordId>,
        word: WordId,
    ) -> f64 {
        match (prev_prev, prev) {
            (Some(a), Some(b)) => self.smooth(
                counts.trigram(a, b, word),
                self.trigram_contexts.get(&(a, b)),
                word,
            ),
            _ => self.smooth(0, None, word),
        }
    }

    fn smooth(&self, count: u64, context: Option<&ContextStats>, word: WordId) -> f64 {
        let continuation = self.continuation_probability(word);

        match context {
            Some(stats) if stats.total > 0 => {
                let total = stats.total as f64;
                let discounted = (count as f64 - self.discount).max(0.0) / total;
                let lambda = self.discount * stats.distinct as f64 / total;
                discounted + lambda * continuation
            }
            _ => continuation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::CorpusBuilder;

    fn counts(text: &str) -> NgramCounts {
        let mut builder = CorpusBuilder::new();
        builder.add_text(text);
        builder.into_counts()
    }

    fn id(counts: &NgramCounts, word: &str) -> WordId {
        counts.id(word).unwrap()
    }

    const TEXT: &str = "The cat sat on the mat. The cat ate. A dog sat on a log. The dog ran.";

    #[test]
    fn test_continuation_counts_distinct_predecessors() {
        let counts = counts(TEXT);
        let kn = KneserNey::new(&counts);
        // "sat" follows "cat" and "dog".
        let sat = id(&counts, "sat");
        let expected = 2.0 / counts.bigram_types() as f64;
        assert!((kn.continuation_probability(sat) - expected).abs() < 1e-12);
        // "a" only ever follows "on".
        let expected = 1.0 / counts.bigram_types() as f64;
        assert!((kn.continuation_probability(id(&counts, "a")) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_seen_bigram() {
        let counts = counts(TEXT);
        let kn = KneserNey::new(&counts);
        let (the, cat) = (id(&counts, "the"), id(&counts, "cat"));

        // "the" is followed by cat, mat, cat, dog: total 4, distinct 3.
        let cont = kn.continuation_probability(cat);
        let expected = (2.0 - 0.75) / 4.0 + 0.75 * 3.0 / 4.0 * cont;
        assert!((kn.bigram(&counts, Some(the), cat) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_unseen_context_falls_back_to_continuation() {
        let counts = counts(TEXT);
        let kn = KneserNey::new(&counts);
        let sat = id(&counts, "sat");
        let log = id(&counts, "log");

        // "log" ends its sentence, so it never acts as a context.
        assert_eq!(kn.bigram(&counts, Some(log), sat), kn.continuation_probability(sat));
        assert_eq!(kn.bigram(&counts, None, sat), kn.continuation_probability(sat));
        assert_eq!(
            kn.trigram(&counts, None, Some(log), sat),
            kn.continuation_probability(sat)
        );
    }

    #[test]
    fn test_mass_is_conserved_for_every_order() {
        let counts = counts(TEXT);
        let kn = KneserNey::new(&counts);
        let vocab: Vec<WordId> = (0..counts.vocabulary_size() as WordId).collect();
        let word = |w: &str| Some(id(&counts, w));

        let unigram: f64 = vocab.iter().map(|&w| kn.unigram(&counts, w)).sum();
        assert!((unigram - 1.0).abs() < 1e-9);

        for prev in [word("the"), word("sat"), word("log"), None] {
            let total: f64 = vocab.iter().map(|&w| kn.bigram(&counts, prev, w)).sum();
            assert!((total - 1.0).abs() < 1e-9, "bigram context {prev:?}: {total}");
        }

        for (a, b) in [
            (word("the"), word("cat")),
            (word("sat"), word("on")),
            (word("cat"), word("the")),
            (None, word("dog")),
        ] {
            let total: f64 = vocab.iter().map(|&w| kn.trigram(&counts, a, b, w)).sum();
            assert!((total - 1.0).abs() < 1e-9, "trigram context {a:?} {b:?}: {total}");
        }
    }
}
