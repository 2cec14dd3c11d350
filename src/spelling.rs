//! Out-of-vocabulary detection and correction.
//!
//! A word is flagged when its case-folded form is not in the vocabulary and
//! the candidate index has a replacement within the configured edit distance.
//! Some tokens are never checked because they are usually intentional:
//! single letters, tokens with digits, capitalized words in the middle of a
//! sentence, contractions of known words, and tokens too long to search.
//!
//! The suggestion for the first word of a sentence is capitalized, since the
//! capitalization fix for that word loses to the spelling fix when both are
//! merged.

use crate::config::CorrectionPolicy;
use crate::model::LanguageModel;
use crate::symspell::{SuggestItem, SymSpell};
use crate::tokenizer::{Sentence, Token};
use crate::types::{ErrorKind, GrammarError};
use tracing::debug;

pub struct SpellChecker<'a> {
    model: &'a LanguageModel,
    index: &'a SymSpell,
    policy: &'a CorrectionPolicy,
}

impl<'a> SpellChecker<'a> {
    pub fn new(model: &'a LanguageModel, index: &'a SymSpell, policy: &'a CorrectionPolicy) -> Self {
        Self {
            model,
            index,
            policy,
        }
    }

    /// Flag every misspelled word of `sentence`. Spans are sentence-local.
    pub fn check(&self, sentence: &Sentence<'_>) -> Vec<GrammarError> {
        let words: Vec<&Token<'_>> = sentence.words().collect();
        let forms: Vec<String> = words.iter().map(|t| t.folded()).collect();

        words
            .iter()
            .enumerate()
            .filter(|(i, token)| self.should_check(token, *i == 0))
            .filter_map(|(i, token)| {
                let prev = i.checked_sub(1).map(|p| forms[p].as_str());
                let next = forms.get(i + 1).map(String::as_str);
                let best = self.suggest(&forms[i], prev, next)?;

                let mut suggestion = match_case(token.text, &best.term);
                if i == 0 {
                    suggestion = capitalize(&suggestion);
                }
                debug!(word = token.text, %suggestion, distance = best.distance, "spelling");

                let edits = if best.distance == 1 { "edit" } else { "edits" };
                let explanation = format!(
                    "\"{}\" is not a known word; \"{}\" is {} {} away.",
                    token.text, suggestion, best.distance, edits
                );
                Some(
                    GrammarError::new(
                        ErrorKind::Spelling,
                        token.start - sentence.start,
                        token.text,
                        suggestion,
                        explanation,
                    )
                    .in_sentence(sentence.index),
                )
            })
            .collect()
    }

    /// Whether `token` is a candidate for spelling correction at all.
    pub fn should_check(&self, token: &Token<'_>, sentence_initial: bool) -> bool {
        if !token.is_lexical() {
            return false;
        }

        let length = token.text.chars().count();
        if length < 2 || length > self.policy.max_word_length {
            return false;
        }

        let folded = token.folded();
        if self.model.contains(&folded) {
            return false;
        }

        if !sentence_initial && token.text.chars().next().is_some_and(char::is_uppercase) {
            return false;
        }

        // Contractions and possessives of known words.
        if let Some((stem, _)) = folded.split_once('\'') {
            if self.model.contains(stem) {
                return false;
            }
        }

        true
    }

    /// Best vocabulary replacement for a case-folded word.
    ///
    /// Closer candidates always win. At equal distance, a candidate seen
    /// next to the neighbouring words `prev` and `next` beats one that never
    /// was, and the remaining ties go to the more frequent word.
    pub fn suggest(&self, word: &str, prev: Option<&str>, next: Option<&str>) -> Option<SuggestItem> {
        self.index
            .candidates(word, self.policy.max_edit_distance)
            .into_iter()
            .map(|candidate| (self.neighbour_count(&candidate.term, prev, next), candidate))
            .min_by(|(a_seen, a), (b_seen, b)| {
                a.distance
                    .cmp(&b.distance)
                    .then_with(|| b_seen.cmp(a_seen))
                    .then_with(|| a.rank(b))
            })
            .map(|(_, candidate)| candidate)
    }

    fn neighbour_count(&self, term: &str, prev: Option<&str>, next: Option<&str>) -> u64 {
        let before = prev.map_or(0, |prev| self.model.count(&[prev, term]));
        let after = next.map_or(0, |next| self.model.count(&[term, next]));
        before + after
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Re-case `suggestion` like `original`: all caps, capitalized, or as is.
pub fn match_case(original: &str, suggestion: &str) -> String {
    let letters: Vec<char> = original.chars().filter(|c| c.is_alphabetic()).collect();

    if letters.len() > 1 && letters.iter().all(|c| c.is_uppercase()) {
        return suggestion.to_uppercase();
    }

    if letters.first().is_some_and(|c| c.is_uppercase()) {
        return capitalize(suggestion);
    }

    suggestion.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::build;
    use crate::tokenizer::{segment, tokenize};

    const TEXT: &str = "This is a good test. The test is long. This is the end. \
                        The exam is the test. We walked to school.";

    struct Fixture {
        model: LanguageModel,
        index: SymSpell,
        policy: CorrectionPolicy,
    }

    impl Fixture {
        fn new() -> Self {
            let model = build([TEXT]).unwrap();
            let index = SymSpell::from_model(&model, 2);
            Self {
                model,
                index,
                policy: CorrectionPolicy::default(),
            }
        }

        fn checker(&self) -> SpellChecker<'_> {
            SpellChecker::new(&self.model, &self.index, &self.policy)
        }

        fn check(&self, text: &str) -> Vec<GrammarError> {
            segment(text)
                .iter()
                .flat_map(|s| self.checker().check(s))
                .collect()
        }
    }

    #[test]
    fn test_misspellings_are_corrected_with_case() {
        let fixture = Fixture::new();
        let errors = fixture.check("Ths is a tst.");

        assert_eq!(errors.len(), 2);
        assert_eq!((errors[0].start, errors[0].end), (0, 3));
        assert_eq!(errors[0].suggestion, "This");
        assert_eq!((errors[1].start, errors[1].end), (9, 12));
        assert_eq!(errors[1].original, "tst");
        assert_eq!(errors[1].suggestion, "test");
        assert!(errors[1].explanation.contains("1 edit away"));
    }

    #[test]
    fn test_lowercase_first_word_gets_capital() {
        let fixture = Fixture::new();
        let errors = fixture.check("ths is a tst.");

        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].original, "ths");
        assert_eq!(errors[0].suggestion, "This");
        assert_eq!(errors[1].suggestion, "test");
    }

    #[test]
    fn test_frequent_word_at_distance_one_wins() {
        let fixture = Fixture::new();
        // "tesst" is one deletion from "test".
        let best = fixture.checker().suggest("tesst", None, None).unwrap();
        assert_eq!(best.term, "test");
        assert_eq!(best.distance, 1);
    }

    #[test]
    fn test_neighbours_outrank_frequency() {
        let fixture = Fixture::new();
        let checker = fixture.checker();

        // "the" is more frequent, but only "this" is ever followed by "is".
        assert_eq!(checker.suggest("ths", None, None).unwrap().term, "the");
        assert_eq!(checker.suggest("ths", None, Some("is")).unwrap().term, "this");
        assert_eq!(checker.suggest("ths", Some("is"), Some("end")).unwrap().term, "the");
    }

    #[test]
    fn test_offsets_are_sentence_local() {
        let fixture = Fixture::new();
        let sentences = segment("This is fine. We walkd home.");
        let errors = fixture.checker().check(&sentences[1]);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].start, 3);
        assert_eq!(errors[0].sentence_index, 1);
        assert_eq!(errors[0].suggestion, "walked");
    }

    #[test]
    fn test_skipped_tokens() {
        let fixture = Fixture::new();
        let checker = fixture.checker();
        let check = |text: &str, initial: bool| {
            let tokens = tokenize(text, 0);
            checker.should_check(&tokens[0], initial)
        };

        assert!(check("tst", false));
        assert!(!check("x", false));
        assert!(!check("mp3s", false));
        assert!(!check("Tst", false));
        assert!(check("Tst", true));
        assert!(!check("test's", false));
        assert!(!check(&"a".repeat(30), false));
        assert!(!check("test", false));
    }

    #[test]
    fn test_no_candidate_means_no_flag() {
        let fixture = Fixture::new();
        assert!(fixture.check("This is xylophonic.").is_empty());
    }

    #[test]
    fn test_match_case() {
        assert_eq!(match_case("Ths", "this"), "This");
        assert_eq!(match_case("TST", "test"), "TEST");
        assert_eq!(match_case("tst", "test"), "test");
        assert_eq!(match_case("I", "a"), "A");
    }
}
