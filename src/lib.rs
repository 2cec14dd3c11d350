//! Grammar Check - statistical spelling, grammar and punctuation checking.
//!
//! # Overview
//!
//! Text is segmented into sentences and checked by three independent passes:
//! - a spell checker that maps unknown words to close vocabulary words
//! - grammar rules for common verb, preposition and comparison mistakes,
//!   followed by a statistical pass that replaces known words the language
//!   model finds unlikely in their context
//! - a set of punctuation rules
//!
//! Their findings are merged into positioned, explained corrections, and each
//! sentence gets a fluency score derived from the model's perplexity.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │  Corpora        │ ← Raw text, word lists, built-in corpus (corpus.rs)
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │ Language Model  │ ← Kneser-Ney smoothed n-grams (kneser_ney.rs, model.rs)
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │   Analyzer      │ ← Spelling, grammar, punctuation, fluency (analyzer.rs)
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │ AnalysisResult  │ ← Errors, corrected text, confidence (types.rs)
//! └─────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust
//! use grammar_check::{Analyzer, CorpusBuilder, NgramMode};
//!
//! let mut builder = CorpusBuilder::new();
//! builder.add_text("This is a test. This is a good test.");
//! let analyzer = Analyzer::new(builder.build()?);
//!
//! let result = analyzer.analyze("This is a tst.", NgramMode::Trigram)?;
//! assert_eq!(result.corrected_text, "This is a test.");
//! # Ok::<(), grammar_check::Error>(())
//! ```

pub mod analyzer;
pub mod config;
pub mod corpus;
pub mod error;
pub mod fluency;
pub mod grammar;
pub mod kneser_ney;
pub mod model;
pub mod punctuation;
pub mod rules;
pub mod spelling;
pub mod symspell;
pub mod tokenizer;
pub mod types;

pub use analyzer::Analyzer;
pub use config::{Config, CorrectionPolicy};
pub use corpus::{build, CorpusBuilder};
pub use error::{Error, Result};
pub use fluency::score_label;
pub use model::{InterpolationWeights, LanguageModel, NgramMode};
pub use rules::RuleChecker;
pub use types::{
    apply_corrections, shift, AnalysisResult, ErrorKind, GrammarError, ModelHealth,
    SentenceAnalysis,
};
