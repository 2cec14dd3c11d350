//! The analysis pipeline.
//!
//! ```text
//! text ──segment──▶ sentences ──┬─ spelling ──┬─ rules ─────┐
//!                               │             └─ statistics ┼─ merge ─▶ corrected sentence
//!                               └─ punctuation ─────────────┘              │
//!                                                                    fluency score
//!                                                                          │
//!            AnalysisResult ◀── concatenate / shift ──────────────────────┘
//! ```
//!
//! Both grammar passes read the spelling-resolved words. Rule errors come
//! first and share the per-sentence cap with the statistical pass. Fluency is
//! scored on the corrected sentence.
//!
//! The model and candidate index are shared read-only; everything else lives
//! on the stack of one `analyze` call, so an [`Analyzer`] can be cloned into
//! as many threads as needed.

use crate::config::{Config, CorrectionPolicy};
use crate::error::{Error, Result};
use crate::fluency;
use crate::grammar::{ContextWord, GrammarChecker};
use crate::model::{LanguageModel, NgramMode};
use crate::punctuation::PunctuationChecker;
use crate::rules::RuleChecker;
use crate::spelling::SpellChecker;
use crate::symspell::SymSpell;
use crate::tokenizer::{fold_case, segment, tokenize, Sentence};
use crate::types::{
    apply_corrections, merge_errors, shift, AnalysisResult, ErrorKind, GrammarError, ModelHealth,
    SentenceAnalysis,
};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct Analyzer {
    model: Arc<LanguageModel>,
    index: Arc<SymSpell>,
    policy: CorrectionPolicy,
    max_text_length: usize,
}

impl Analyzer {
    /// Analyzer with the default policy and length limit.
    pub fn new(model: LanguageModel) -> Self {
        Self::with_policy(Arc::new(model), CorrectionPolicy::default())
    }

    pub fn with_policy(model: Arc<LanguageModel>, policy: CorrectionPolicy) -> Self {
        let index = SymSpell::from_model(&model, policy.max_edit_distance);
        info!(
            terms = index.word_count(),
            max_edit_distance = policy.max_edit_distance,
            "candidate index built"
        );

        Self {
            model,
            index: Arc::new(index),
            policy,
            max_text_length: Config::default().max_text_length,
        }
    }

    pub fn from_config(model: LanguageModel, config: &Config) -> Self {
        Self::with_policy(Arc::new(model), config.policy).max_text_length(config.max_text_length)
    }

    pub fn max_text_length(mut self, max: usize) -> Self {
        self.max_text_length = max;
        self
    }

    pub fn model(&self) -> &LanguageModel {
        &self.model
    }

    pub fn policy(&self) -> &CorrectionPolicy {
        &self.policy
    }

    pub fn health(&self) -> ModelHealth {
        ModelHealth {
            model_loaded: true,
            vocabulary_size: self.model.vocabulary_size(),
            total_words: self.model.total_words(),
        }
    }

    /// Check `text` and propose corrections.
    ///
    /// # Errors
    /// Returns [`Error::InputTooLong`] if `text` has more characters than the
    /// configured limit. Failures inside a single sentence are logged and
    /// reported as an unchanged sentence instead.
    pub fn analyze(&self, text: &str, mode: NgramMode) -> Result<AnalysisResult> {
        let started = Instant::now();

        let length = text.chars().count();
        if length > self.max_text_length {
            return Err(Error::InputTooLong {
                length,
                max: self.max_text_length,
            });
        }

        let sentences = segment(text);
        let mut analyses = Vec::with_capacity(sentences.len());
        let mut errors = Vec::new();
        let mut corrected_text = String::with_capacity(text.len());
        let mut scores = Vec::with_capacity(sentences.len());

        for sentence in &sentences {
            let analysis = match self.analyze_sentence(sentence, mode) {
                Ok(analysis) => analysis,
                Err(err) => {
                    warn!(sentence = sentence.index, "sentence left unchanged: {err}");
                    SentenceAnalysis::neutral(sentence.index, sentence.text)
                }
            };

            errors.extend(shift(&analysis.errors, 0, sentence.start as isize));
            corrected_text.push_str(&analysis.corrected);
            scores.push((analysis.fluency_score, sentence.word_count()));
            analyses.push(analysis);
        }

        let confidence_score = fluency::document_confidence(&scores);
        let processing_time_ms = started.elapsed().as_millis() as u64;
        debug!(
            sentences = analyses.len(),
            errors = errors.len(),
            confidence_score,
            processing_time_ms,
            "analysis finished"
        );

        Ok(AnalysisResult {
            original_text: text.to_string(),
            corrected_text,
            errors,
            confidence_score,
            sentences: analyses,
            ngram_mode: mode,
            processing_time_ms,
        })
    }

    fn analyze_sentence(&self, sentence: &Sentence<'_>, mode: NgramMode) -> Result<SentenceAnalysis> {
        let spelling = SpellChecker::new(&self.model, &self.index, &self.policy).check(sentence);
        let words = self.context_words(sentence, &spelling);

        let mut rules =
            RuleChecker::new().check(sentence.text, &words, sentence.start, sentence.index);
        rules.truncate(self.policy.max_grammar_corrections(words.len()));

        let statistical = GrammarChecker::new(&self.model, &self.index, &self.policy, mode).check(
            &words,
            &rules,
            sentence.start,
            sentence.index,
        );
        let punctuation = PunctuationChecker::new().check(sentence.text, sentence.index);

        let errors = merge_errors(
            spelling
                .into_iter()
                .chain(rules)
                .chain(statistical)
                .chain(punctuation),
        );
        let corrected = apply_corrections(sentence.text, &errors)?;

        let forms: Vec<String> = tokenize(&corrected, 0)
            .into_iter()
            .filter(|t| t.is_lexical())
            .map(|t| t.folded())
            .collect();
        let forms: Vec<&str> = forms.iter().map(String::as_str).collect();
        let fluency_score = fluency::sentence_fluency(&self.model, &forms, mode);

        debug!(
            sentence = sentence.index,
            errors = errors.len(),
            fluency_score,
            "sentence analyzed"
        );

        Ok(SentenceAnalysis {
            index: sentence.index,
            original: sentence.text.to_string(),
            corrected,
            errors,
            fluency_score,
        })
    }

    /// Word sequence with misspellings replaced by their suggestions.
    fn context_words<'a>(
        &self,
        sentence: &Sentence<'a>,
        spelling: &[GrammarError],
    ) -> Vec<ContextWord<'a>> {
        sentence
            .words()
            .map(|token| {
                let local = token.start - sentence.start;
                let fix = spelling
                    .iter()
                    .find(|e| e.kind == ErrorKind::Spelling && e.start == local);

                match fix {
                    Some(fix) => ContextWord {
                        token: *token,
                        form: fold_case(&fix.suggestion),
                        checkable: false,
                    },
                    None => {
                        let form = token.folded();
                        ContextWord {
                            token: *token,
                            checkable: token.is_lexical() && self.model.contains(&form),
                            form,
                        }
                    }
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::CorpusBuilder;
    use once_cell::sync::Lazy;

    const CORPUS: &str = "\
        He goes to school every day. She walks to school with her brother. \
        They went to the park on Sunday. We went to school early. I go home. \
        It rained yesterday. I like pears. My sister likes apples. \
        I prefer tea but she likes coffee. Oranges are sweet. \
        This is a good book. The test is long. This is the end of the test.";

    /// Analyzer over the corpus and word list that ship with the crate.
    static SHIPPED: Lazy<Analyzer> = Lazy::new(|| {
        let mut builder = CorpusBuilder::new();
        builder.add_builtin_corpus();
        Analyzer::new(builder.build().unwrap())
    });

    fn analyzer() -> Analyzer {
        let mut builder = CorpusBuilder::new();
        builder.add_text(CORPUS);
        Analyzer::new(builder.build().unwrap())
    }

    fn of_kind(result: &AnalysisResult, kind: ErrorKind) -> Vec<&GrammarError> {
        result.errors.iter().filter(|e| e.kind == kind).collect()
    }

    fn word_errors(result: &AnalysisResult) -> Vec<&GrammarError> {
        result
            .errors
            .iter()
            .filter(|e| e.kind != ErrorKind::Punctuation)
            .collect()
    }

    #[test]
    fn test_grammar_correction_end_to_end() {
        let analyzer = analyzer();
        let result = analyzer
            .analyze("He go to school yesterday.", NgramMode::Trigram)
            .unwrap();

        assert_eq!(result.errors.len(), 1);
        let error = &result.errors[0];
        assert_eq!(error.kind, ErrorKind::Grammar);
        assert_eq!((error.start, error.end), (3, 5));
        assert_eq!(error.original, "go");
        assert_eq!(error.suggestion, "went");
        assert_eq!(result.corrected_text, "He went to school yesterday.");
        assert_eq!(result.ngram_mode, NgramMode::Trigram);
    }

    #[test]
    fn test_conjunction_comma_end_to_end() {
        let analyzer = analyzer();
        let text = "I like apples but I prefer oranges";
        let result = analyzer.analyze(text, NgramMode::Trigram).unwrap();

        assert!(word_errors(&result).is_empty());
        let commas: Vec<&GrammarError> = result
            .errors
            .iter()
            .filter(|e| e.kind == ErrorKind::Punctuation && e.suggestion == ", ")
            .collect();
        assert_eq!(commas.len(), 1);
        assert_eq!(commas[0].start, text.find(" but").unwrap());
        assert_eq!(commas[0].original, " ");

        // The sentence also lacks terminal punctuation.
        assert!(result
            .errors
            .iter()
            .any(|e| e.kind == ErrorKind::Punctuation && e.start == text.len() && e.suggestion == "."));
        assert_eq!(result.corrected_text, "I like apples, but I prefer oranges.");
    }

    #[test]
    fn test_spelling_end_to_end() {
        let analyzer = analyzer();
        let result = analyzer.analyze("Ths is a tst.", NgramMode::Bigram).unwrap();

        let spelling = of_kind(&result, ErrorKind::Spelling);
        assert_eq!(spelling.len(), 2);
        assert_eq!(spelling[0].suggestion, "This");
        assert_eq!(spelling[1].suggestion, "test");
        assert_eq!(result.corrected_text, "This is a test.");
    }

    #[test]
    fn test_fluency_scores_the_corrected_sentence() {
        let analyzer = analyzer();
        let wrong = analyzer
            .analyze("He go to school yesterday.", NgramMode::Trigram)
            .unwrap();
        let right = analyzer
            .analyze("He went to school yesterday.", NgramMode::Trigram)
            .unwrap();

        assert_eq!(wrong.corrected_text, right.corrected_text);
        assert_eq!(wrong.sentences[0].fluency_score, right.sentences[0].fluency_score);
        assert_eq!(wrong.confidence_score, right.confidence_score);
    }

    #[test]
    fn test_fixes_are_idempotent() {
        let analyzer = analyzer();
        for text in ["He go to school yesterday.", "Ths is a tst."] {
            let first = analyzer.analyze(text, NgramMode::Trigram).unwrap();
            let second = analyzer
                .analyze(&first.corrected_text, NgramMode::Trigram)
                .unwrap();
            assert!(second.errors.is_empty(), "{text}: {:?}", second.errors);
            assert_eq!(second.corrected_text, first.corrected_text);
        }
    }

    #[test]
    fn test_global_offsets_and_sentence_concatenation() {
        let analyzer = analyzer();
        let text = "This is a test.  Ths is a tst.";
        let result = analyzer.analyze(text, NgramMode::Trigram).unwrap();

        assert_eq!(result.sentences.len(), 2);
        for error in &result.errors {
            assert_eq!(&text[error.start..error.end], error.original);
        }

        let spelling = of_kind(&result, ErrorKind::Spelling);
        assert_eq!(spelling[0].start, 17);
        assert_eq!(spelling[0].sentence_index, 1);
        assert_eq!(result.sentences[1].errors[0].start, 0);

        let joined: String = result.sentences.iter().map(|s| s.corrected.as_str()).collect();
        assert_eq!(joined, result.corrected_text);
        assert_eq!(result.corrected_text, "This is a test. This is a test.");
    }

    #[test]
    fn test_empty_input() {
        let analyzer = analyzer();
        let result = analyzer.analyze("   \n", NgramMode::Trigram).unwrap();
        assert!(result.sentences.is_empty());
        assert!(result.errors.is_empty());
        assert_eq!(result.confidence_score, 100.0);
        assert_eq!(result.corrected_text, "");
    }

    #[test]
    fn test_input_too_long() {
        let analyzer = analyzer().max_text_length(10);
        let err = analyzer
            .analyze("This is far too long.", NgramMode::Trigram)
            .unwrap_err();
        assert!(matches!(err, Error::InputTooLong { length: 21, max: 10 }));
    }

    #[test]
    fn test_grammar_cap_holds_for_any_sentence() {
        let analyzer = analyzer();
        let vocabulary: Vec<String> = analyzer.model().words().map(|(w, _)| w.to_string()).collect();

        for (i, len) in (1..=12).enumerate() {
            let words: Vec<&str> = (0..len)
                .map(|j| vocabulary[(i * 7 + j * 5) % vocabulary.len()].as_str())
                .collect();
            let text = words.join(" ");
            let result = analyzer.analyze(&text, NgramMode::Trigram).unwrap();
            let grammar = of_kind(&result, ErrorKind::Grammar).len();
            assert!(grammar <= (0.3 * len as f64).floor() as usize, "{text}");
        }
    }

    #[test]
    fn test_rule_and_statistical_errors_share_the_cap() {
        let analyzer = analyzer();
        // Three rule hits, but floor(0.3 * 9) = 2.
        let result = analyzer
            .analyze("She go to school, he go home, it go.", NgramMode::Trigram)
            .unwrap();
        let grammar = of_kind(&result, ErrorKind::Grammar);
        assert_eq!(grammar.len(), 2);
        assert_eq!(grammar[0].start, 4);
        assert_eq!(grammar[1].start, 21);
    }

    #[test]
    fn test_health_and_serialization() {
        let analyzer = analyzer();
        let health = analyzer.health();
        assert!(health.model_loaded);
        assert_eq!(health.vocabulary_size, analyzer.model().vocabulary_size());

        let result = analyzer.analyze("Ths is a tst.", NgramMode::Bigram).unwrap();
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["ngramMode"], "bigram");
        assert_eq!(json["correctedText"], "This is a test.");
        assert_eq!(json["errors"][0]["type"], "spelling");
        assert!(json["processingTimeMs"].is_u64());
    }

    #[test]
    fn test_analyzer_is_shareable() {
        fn assert_send_sync<T: Send + Sync + Clone>() {}
        assert_send_sync::<Analyzer>();

        let analyzer = analyzer();
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let analyzer = analyzer.clone();
                std::thread::spawn(move || {
                    analyzer
                        .analyze("He go to school yesterday.", NgramMode::Trigram)
                        .map(|r| r.corrected_text)
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap().unwrap(), "He went to school yesterday.");
        }
    }

    #[test]
    fn test_shipped_model_fixes_tense() {
        let result = SHIPPED
            .analyze("He go to school yesterday.", NgramMode::Trigram)
            .unwrap();

        assert_eq!(result.errors.len(), 1);
        let error = &result.errors[0];
        assert_eq!(error.kind, ErrorKind::Grammar);
        assert_eq!((error.start, error.end), (3, 5));
        assert_eq!(error.suggestion, "went");
        assert_eq!(result.corrected_text, "He went to school yesterday.");
        assert!(result.confidence_score > 70.0);
    }

    #[test]
    fn test_shipped_model_adds_conjunction_comma() {
        let text = "I like apples but I prefer oranges";
        let result = SHIPPED.analyze(text, NgramMode::Trigram).unwrap();

        assert!(word_errors(&result).is_empty(), "{:?}", result.errors);
        assert!(result
            .errors
            .iter()
            .any(|e| e.suggestion == ", " && e.start == text.find(" but").unwrap()));
        assert_eq!(result.corrected_text, "I like apples, but I prefer oranges.");
    }

    #[test]
    fn test_shipped_model_fixes_spelling() {
        for text in ["Ths is a tst.", "ths is a test."] {
            let result = SHIPPED.analyze(text, NgramMode::Trigram).unwrap();
            assert_eq!(result.corrected_text, "This is a test.", "{:?}", result.errors);
            assert!(of_kind(&result, ErrorKind::Grammar).is_empty());
        }

        let result = SHIPPED
            .analyze("I recieve many letters from my freind.", NgramMode::Trigram)
            .unwrap();
        assert_eq!(result.corrected_text, "I receive many letters from my friend.");
    }

    #[test]
    fn test_shipped_model_leaves_correct_sentences_alone() {
        for text in [
            "My brother works at the hospital in the city.",
            "She has a cat and a dog.",
            "The weather is very nice today.",
            "When I was a child, I lived in a small village by the sea.",
            "He said that he would come back tomorrow.",
            "The weather was cold, so we stayed at home and read books.",
            "I think that the new library is very beautiful.",
            "She is the best student in her class.",
            "It was the worst day of my life.",
        ] {
            let result = SHIPPED.analyze(text, NgramMode::Trigram).unwrap();
            assert!(word_errors(&result).is_empty(), "{text}: {:?}", result.errors);
        }
    }

    #[test]
    fn test_shipped_model_is_idempotent() {
        for text in [
            "He go to school yesterday.",
            "Ths is a tst.",
            "She go to the market every day.",
            "They goes to the park on Sunday.",
            "I could of done it.",
            "We was happy to see them.",
            "There is no enough time.",
            "My brother work at the hospital.",
            "I recieve many letters from my freind.",
        ] {
            let first = SHIPPED.analyze(text, NgramMode::Trigram).unwrap();
            assert!(!first.errors.is_empty(), "{text}");

            let second = SHIPPED
                .analyze(&first.corrected_text, NgramMode::Trigram)
                .unwrap();
            assert!(
                word_errors(&second).is_empty(),
                "{} -> {}: {:?}",
                text,
                first.corrected_text,
                second.errors
            );
        }
    }
}
