//! Error type shared by the whole engine.

use std::path::PathBuf;

/// Everything that can go wrong while building the model or analyzing text.
///
/// Corpus errors are startup errors: no partially built model is ever handed
/// out. `InvalidSpan` never reaches callers of [`crate::Analyzer::analyze`];
/// it is contained to the sentence that produced it.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to read corpus {}: {source}", path.display())]
    CorpusRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("corpus contains no words; refusing to build an empty language model")]
    EmptyCorpus,

    #[error("input is {length} characters long, the limit is {max}")]
    InputTooLong { length: usize, max: usize },

    #[error("unknown n-gram mode {0:?} (expected \"bigram\" or \"trigram\")")]
    InvalidMode(String),

    #[error("span {start}..{end} does not fall on character boundaries")]
    InvalidSpan { start: usize, end: usize },

    #[error(transparent)]
    Config(#[from] confy::ConfyError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
