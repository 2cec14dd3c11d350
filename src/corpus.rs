//! Corpus ingestion: raw text in, n-gram count tables out.
//!
//! # Sources
//!
//! - Raw text (`add_text`), segmented and lower-cased with the same tokenizer
//!   that analysis uses, so training and lookup agree on what a word is.
//! - Text files (`add_file`), read once at startup.
//! - Word-frequency lists (`add_word_list`) in the format below. These only
//!   extend the vocabulary and unigram counts.
//! - The built-in corpus and word list embedded at compile time
//!   (`add_builtin_corpus`).
//!
//! ```text
//! # Comments start with #
//! word frequency
//! the 1000000
//! hello 15000
//! ```
//!
//! If frequency is omitted, it defaults to 1.
//!
//! Counting is pure aggregation: the order in which sources are added does not
//! change any count, and the same input always yields the same tables.

use crate::error::{Error, Result};
use crate::model::{InterpolationWeights, LanguageModel};
use crate::tokenizer::{fold_case, is_lexical, word_forms};
use ahash::AHashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{debug, info, warn};

// Embedded at compile time so a model can always be built without external data.
const BUILTIN_CORPUS: &str = include_str!("../corpus/builtin.txt");
const BUILTIN_WORDS: &str = include_str!("../corpus/words.txt");

/// Dense index of a vocabulary word.
pub type WordId = u32;

/// Raw occurrence counts for unigrams, bigrams and trigrams.
///
/// Words are interned once; the higher-order tables are keyed by id tuples so
/// lookups never allocate.
#[derive(Debug, Default, Clone)]
pub struct NgramCounts {
    ids: AHashMap<String, WordId>,
    words: Vec<String>,
    unigrams: Vec<u64>,
    bigrams: AHashMap<(WordId, WordId), u64>,
    trigrams: AHashMap<(WordId, WordId, WordId), u64>,
    total_words: u64,
}

impl NgramCounts {
    pub fn id(&self, word: &str) -> Option<WordId> {
        self.ids.get(word).copied()
    }

    pub fn word(&self, id: WordId) -> &str {
        &self.words[id as usize]
    }

    pub fn unigram(&self, word: WordId) -> u64 {
        self.unigrams[word as usize]
    }

    pub fn bigram(&self, prev: WordId, word: WordId) -> u64 {
        self.bigrams.get(&(prev, word)).copied().unwrap_or(0)
    }

    pub fn trigram(&self, prev_prev: WordId, prev: WordId, word: WordId) -> u64 {
        self.trigrams
            .get(&(prev_prev, prev, word))
            .copied()
            .unwrap_or(0)
    }

    pub fn total_words(&self) -> u64 {
        self.total_words
    }

    pub fn vocabulary_size(&self) -> usize {
        self.words.len()
    }

    pub fn bigram_types(&self) -> usize {
        self.bigrams.len()
    }

    pub(crate) fn bigrams(&self) -> impl Iterator<Item = (&(WordId, WordId), &u64)> {
        self.bigrams.iter()
    }

    pub(crate) fn trigrams(&self) -> impl Iterator<Item = (&(WordId, WordId, WordId), &u64)> {
        self.trigrams.iter()
    }

    /// Every vocabulary word with its corpus frequency.
    pub fn entries(&self) -> impl Iterator<Item = (&str, u64)> {
        self.words
            .iter()
            .zip(&self.unigrams)
            .map(|(word, &count)| (word.as_str(), count))
    }

    fn intern(&mut self, word: &str) -> WordId {
        if let Some(&id) = self.ids.get(word) {
            return id;
        }

        let id = self.words.len() as WordId;
        self.ids.insert(word.to_string(), id);
        self.words.push(word.to_string());
        self.unigrams.push(0);
        id
    }

    /// Count every unigram, bigram and trigram of one sentence.
    fn record_sentence(&mut self, words: &[String]) {
        let ids: Vec<WordId> = words.iter().map(|w| self.intern(w)).collect();

        for (i, &word) in ids.iter().enumerate() {
            self.unigrams[word as usize] += 1;
            self.total_words += 1;

            if i > 0 {
                *self.bigrams.entry((ids[i - 1], word)).or_insert(0) += 1;
            }

            if i > 1 {
                *self
                    .trigrams
                    .entry((ids[i - 2], ids[i - 1], word))
                    .or_insert(0) += 1;
            }
        }
    }

    fn record_unigram(&mut self, word: &str, count: u64) {
        let id = self.intern(word);
        self.unigrams[id as usize] += count;
        self.total_words += count;
    }
}

/// Accumulates counts from any number of sources, then builds the model.
///
/// # Example
/// ```rust
/// use grammar_check::CorpusBuilder;
///
/// let mut builder = CorpusBuilder::new();
/// builder.add_text("The quick brown fox jumps. The lazy dog sleeps.");
/// let model = builder.build()?;
/// assert!(model.contains("fox"));
/// # Ok::<(), grammar_check::Error>(())
/// ```
#[derive(Debug, Default)]
pub struct CorpusBuilder {
    counts: NgramCounts,
    weights: InterpolationWeights,
    sentences: usize,
}

impl CorpusBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the interpolation weights of the model being built.
    pub fn weights(&mut self, weights: InterpolationWeights) -> &mut Self {
        self.weights = weights;
        self
    }

    /// Segment, lower-case and count a raw text source.
    pub fn add_text(&mut self, text: &str) -> &mut Self {
        for words in word_forms(text) {
            self.counts.record_sentence(&words);
            self.sentences += 1;
        }
        self
    }

    /// Count pre-tokenized sentences. Words are case-folded; anything that is
    /// not a plain word is dropped.
    pub fn add_sentences<I, S>(&mut self, sentences: I) -> &mut Self
    where
        I: IntoIterator,
        I::Item: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for sentence in sentences {
            let words: Vec<String> = sentence
                .into_iter()
                .filter(|w| is_lexical(w.as_ref()))
                .map(|w| fold_case(w.as_ref()))
                .collect();
            if !words.is_empty() {
                self.counts.record_sentence(&words);
                self.sentences += 1;
            }
        }
        self
    }

    /// Count the corpus and word list shipped inside the binary.
    pub fn add_builtin_corpus(&mut self) -> &mut Self {
        debug!(bytes = BUILTIN_CORPUS.len(), "adding built-in corpus");
        self.add_text(BUILTIN_CORPUS);

        match self.add_word_list(BUILTIN_WORDS.as_bytes()) {
            Ok(words) => debug!(words, "added built-in word list"),
            Err(err) => warn!("built-in word list skipped: {err}"),
        }
        self
    }

    /// Read a plain-text corpus file.
    ///
    /// # Errors
    /// Returns [`Error::CorpusRead`] if the file cannot be read.
    pub fn add_file(&mut self, path: &Path) -> Result<&mut Self> {
        let text = std::fs::read_to_string(path).map_err(|source| Error::CorpusRead {
            path: path.to_path_buf(),
            source,
        })?;

        let before = self.counts.total_words();
        self.add_text(&text);
        info!(
            path = %path.display(),
            words = self.counts.total_words() - before,
            "loaded corpus file"
        );
        Ok(self)
    }

    /// Add a `word [frequency]` list. Blank lines and `#` comments are ignored;
    /// entries that are not plain words are skipped.
    ///
    /// # Errors
    /// Returns an I/O error if the reader fails.
    pub fn add_word_list<R: BufRead>(&mut self, reader: R) -> std::io::Result<usize> {
        let mut loaded = 0usize;

        for line in reader.lines() {
            let line = line?;
            let line = line.trim();

            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let mut parts = line.split_whitespace();
            let Some(word) = parts.next() else {
                continue;
            };
            if !is_lexical(word) {
                continue;
            }

            let frequency = parts
                .next()
                .and_then(|f| f.parse::<u64>().ok())
                .unwrap_or(1);
            if frequency == 0 {
                continue;
            }

            self.counts.record_unigram(&fold_case(word), frequency);
            loaded += 1;
        }

        Ok(loaded)
    }

    /// Read a word-frequency list from disk.
    ///
    /// # Errors
    /// Returns [`Error::CorpusRead`] if the file cannot be opened or read.
    pub fn add_word_list_file(&mut self, path: &Path) -> Result<&mut Self> {
        let read_error = |source| Error::CorpusRead {
            path: path.to_path_buf(),
            source,
        };

        let file = File::open(path).map_err(read_error)?;
        let loaded = self
            .add_word_list(BufReader::new(file))
            .map_err(read_error)?;

        info!(path = %path.display(), words = loaded, "loaded word list");
        Ok(self)
    }

    #[cfg(test)]
    pub(crate) fn into_counts(self) -> NgramCounts {
        self.counts
    }

    /// Finish counting and derive the smoothed language model.
    ///
    /// # Errors
    /// Returns [`Error::EmptyCorpus`] if no word was counted.
    pub fn build(self) -> Result<LanguageModel> {
        if self.counts.total_words() == 0 {
            return Err(Error::EmptyCorpus);
        }

        info!(
            sentences = self.sentences,
            words = self.counts.total_words(),
            vocabulary = self.counts.vocabulary_size(),
            bigram_types = self.counts.bigram_types(),
            "language model built"
        );

        Ok(LanguageModel::new(self.counts, self.weights))
    }
}

/// Build a model from raw text sources with default weights.
///
/// # Errors
/// Returns [`Error::EmptyCorpus`] if the sources contain no words.
pub fn build<I, S>(corpora: I) -> Result<LanguageModel>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut builder = CorpusBuilder::new();
    for corpus in corpora {
        builder.add_text(corpus.as_ref());
    }
    builder.build()
}
