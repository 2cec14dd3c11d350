use crate::error::Result;
use crate::model::NgramMode;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::warn;

const APP_NAME: &str = "grammar-check";

/// Thresholds of the correction decisions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorrectionPolicy {
    /// A candidate must be this many times more likely than the original.
    pub probability_ratio: f64,
    /// Grammar flags per sentence may not exceed this share of its words.
    pub max_correction_rate: f64,
    pub max_edit_distance: usize,
    /// Longer tokens are never spell-checked.
    pub max_word_length: usize,
}

impl Default for CorrectionPolicy {
    fn default() -> Self {
        Self {
            probability_ratio: 2.0,
            max_correction_rate: 0.30,
            max_edit_distance: 2,
            max_word_length: 24,
        }
    }
}

impl CorrectionPolicy {
    /// Most grammar flags allowed in a sentence of `word_count` words.
    pub fn max_grammar_corrections(&self, word_count: usize) -> usize {
        // Small epsilon so products like 0.3 * 10 are not rounded down to 2.
        (self.max_correction_rate * word_count as f64 + 1e-9)
            .floor()
            .max(0.0) as usize
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub max_text_length: usize,
    pub default_mode: NgramMode,
    pub use_builtin_corpus: bool,
    pub corpus_paths: Vec<PathBuf>,
    pub word_lists: Vec<PathBuf>,
    pub policy: CorrectionPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_text_length: 10_000,
            default_mode: NgramMode::Trigram,
            use_builtin_corpus: true,
            corpus_paths: Vec::new(),
            word_lists: Vec::new(),
            policy: CorrectionPolicy::default(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        match confy::load(APP_NAME, Some("config")) {
            Ok(config) => Ok(config),
            Err(err) => {
                warn!("Failed to load config, using defaults: {err}");
                Ok(Self::default())
            }
        }
    }

    pub fn save(&self) -> Result<()> {
        confy::store(APP_NAME, Some("config"), self)?;
        Ok(())
    }

    /// Per-user directory scanned for extra `*.txt` corpora.
    pub fn corpus_dir() -> Option<PathBuf> {
        dirs::data_dir().map(|dir| dir.join(APP_NAME).join("corpora"))
    }

    /// Configured corpus files followed by every `*.txt` in [`corpus_dir`](Self::corpus_dir),
    /// sorted by path.
    pub fn discover_corpora(&self) -> Vec<PathBuf> {
        let mut paths = self.corpus_paths.clone();

        let Some(dir) = Self::corpus_dir() else {
            return paths;
        };
        let Ok(entries) = std::fs::read_dir(&dir) else {
            return paths;
        };

        let mut found: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.extension().is_some_and(|ext| ext == "txt"))
            .collect();
        found.sort();
        paths.extend(found);
        paths
    }
}
