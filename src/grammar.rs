//! Context-based real-word correction.
//!
//! A known word is replaced by a nearby vocabulary word when the corpus backs
//! the neighbour and not the word itself. A replacement needs all of:
//!
//! - the word was never seen after the previous word, nor before the next one
//! - the candidate starts with the same letter
//! - the candidate was seen on both sides, and as a trigram with them
//! - the candidate makes the window of the word and the words it conditions
//!   at least `probability_ratio` times more likely
//!
//! Context comes from the spelling-resolved sentence, so a misspelling
//! earlier in the sentence is read as its suggested correction. The pronoun
//! `I` is never replaced. Spans already claimed by the rule pass are skipped,
//! and they count against the per-sentence cap of the [`CorrectionPolicy`].

use crate::config::CorrectionPolicy;
use crate::model::{LanguageModel, NgramMode};
use crate::spelling::match_case;
use crate::symspell::SymSpell;
use crate::tokenizer::Token;
use crate::types::{ErrorKind, GrammarError};
use std::cmp::Ordering;
use tracing::debug;

/// A word of the sentence as the grammar pass sees it.
#[derive(Debug, Clone)]
pub struct ContextWord<'a> {
    pub token: Token<'a>,
    /// Case-folded form used as context for later words.
    pub form: String,
    /// Known word not already flagged by the spelling pass.
    pub checkable: bool,
}

struct Candidate {
    term: String,
    distance: usize,
    probability: f64,
}

pub struct GrammarChecker<'a> {
    model: &'a LanguageModel,
    index: &'a SymSpell,
    policy: &'a CorrectionPolicy,
    mode: NgramMode,
}

impl<'a> GrammarChecker<'a> {
    pub fn new(
        model: &'a LanguageModel,
        index: &'a SymSpell,
        policy: &'a CorrectionPolicy,
        mode: NgramMode,
    ) -> Self {
        Self {
            model,
            index,
            policy,
            mode,
        }
    }

    /// Flag unlikely words left to right. `claimed` holds the sentence's rule
    /// errors; `sentence_start` converts token offsets to sentence-local ones.
    pub fn check(
        &self,
        words: &[ContextWord<'_>],
        claimed: &[GrammarError],
        sentence_start: usize,
        sentence_index: usize,
    ) -> Vec<GrammarError> {
        let cap = self
            .policy
            .max_grammar_corrections(words.len())
            .saturating_sub(claimed.len());
        let forms: Vec<&str> = words.iter().map(|w| w.form.as_str()).collect();
        let mut errors = Vec::new();

        for (i, word) in words.iter().enumerate().skip(1) {
            if errors.len() >= cap {
                break;
            }
            if !word.checkable || word.form == "i" {
                continue;
            }

            let start = word.token.start - sentence_start;
            let end = word.token.end - sentence_start;
            if claimed.iter().any(|e| e.start < end && start < e.end) {
                continue;
            }
            if self.is_attested(&forms, i, &word.form) {
                continue;
            }

            let original = self.window_probability(&forms, i, &word.form);
            let Some(best) = self.best_candidate(&forms, i) else {
                continue;
            };

            if best.probability <= self.policy.probability_ratio * original {
                continue;
            }

            let suggestion = match_case(word.token.text, &best.term);
            debug!(
                word = word.token.text,
                %suggestion,
                original,
                candidate = best.probability,
                "grammar"
            );

            let ratio = if original > 0.0 {
                format!("{:.1}x", best.probability / original)
            } else {
                "far".to_string()
            };
            let context = &forms[i.saturating_sub(self.mode.context_len())..i];
            let explanation = format!(
                "\"{}\" is {} more likely than \"{}\" after \"{}\".",
                suggestion,
                ratio,
                word.token.text,
                context.join(" ")
            );

            errors.push(
                GrammarError::new(ErrorKind::Grammar, start, word.token.text, suggestion, explanation)
                    .in_sentence(sentence_index),
            );
        }

        errors
    }

    /// Whether `word` was seen next to either of its neighbours at `i`.
    fn is_attested(&self, forms: &[&str], i: usize, word: &str) -> bool {
        self.model.count(&[forms[i - 1], word]) > 0
            || forms
                .get(i + 1)
                .is_some_and(|&next| self.model.count(&[word, next]) > 0)
    }

    /// Whether `candidate` was seen in the slot at `i`: after the previous
    /// word, before the next one, and inside a trigram with them.
    fn fits_slot(&self, forms: &[&str], i: usize, candidate: &str) -> bool {
        let prev = forms[i - 1];
        if self.model.count(&[prev, candidate]) == 0 {
            return false;
        }
        match forms.get(i + 1) {
            Some(&next) => {
                self.model.count(&[candidate, next]) > 0
                    && self.model.count(&[prev, candidate, next]) > 0
            }
            None if i >= 2 => self.model.count(&[forms[i - 2], prev, candidate]) > 0,
            None => true,
        }
    }

    /// Probability of the word at `i`, replaced by `word`, together with the
    /// following words that condition on it.
    fn window_probability(&self, forms: &[&str], i: usize, word: &str) -> f64 {
        let order = self.mode.context_len();
        let mut window: Vec<&str> = forms.to_vec();
        window[i] = word;

        let last = (i + order).min(window.len() - 1);
        (i..=last)
            .map(|j| {
                let context = &window[j.saturating_sub(order)..j];
                self.model.probability(context, window[j], self.mode)
            })
            .product()
    }

    /// Most probable neighbour of the word at `i` that fits its slot; ties go
    /// to the smaller edit distance, then alphabetical order.
    fn best_candidate(&self, forms: &[&str], i: usize) -> Option<Candidate> {
        let word = forms[i];
        let initial = word.chars().next();

        self.index
            .candidates(word, self.policy.max_edit_distance)
            .into_iter()
            .filter(|s| s.term.chars().next() == initial)
            .filter(|s| self.fits_slot(forms, i, &s.term))
            .map(|s| Candidate {
                probability: self.window_probability(forms, i, &s.term),
                term: s.term,
                distance: s.distance,
            })
            .min_by(|a, b| {
                b.probability
                    .partial_cmp(&a.probability)
                    .unwrap_or(Ordering::Equal)
                    .then_with(|| a.distance.cmp(&b.distance))
                    .then_with(|| a.term.cmp(&b.term))
            })
    }
}
