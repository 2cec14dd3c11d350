//! Values produced by an analysis and the helpers that move them around.

use crate::error::{Error, Result};
use crate::model::NgramMode;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which pass produced an error. The variant order is the tie-break order
/// when two errors start at the same offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    Spelling,
    Grammar,
    Punctuation,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Spelling => "spelling",
            Self::Grammar => "grammar",
            Self::Punctuation => "punctuation",
        })
    }
}

/// One detected problem with a byte span and a proposed replacement.
///
/// `start == end` is an insertion point. When `suggestion == original` the
/// error is advisory and no fix is ever applied for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrammarError {
    #[serde(rename = "type")]
    pub kind: ErrorKind,
    pub start: usize,
    pub end: usize,
    pub original: String,
    pub suggestion: String,
    pub explanation: String,
    pub sentence_index: usize,
}

impl GrammarError {
    pub fn new(
        kind: ErrorKind,
        start: usize,
        original: impl Into<String>,
        suggestion: impl Into<String>,
        explanation: impl Into<String>,
    ) -> Self {
        let original = original.into();
        Self {
            kind,
            start,
            end: start + original.len(),
            original,
            suggestion: suggestion.into(),
            explanation: explanation.into(),
            sentence_index: 0,
        }
    }

    pub fn in_sentence(mut self, index: usize) -> Self {
        self.sentence_index = index;
        self
    }

    pub fn is_fixable(&self) -> bool {
        self.suggestion != self.original
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Spans share at least one byte, or are the same insertion point.
    pub fn overlaps(&self, other: &Self) -> bool {
        if self.is_empty() && other.is_empty() {
            return self.start == other.start;
        }
        self.start < other.end && other.start < self.end
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SentenceAnalysis {
    pub index: usize,
    pub original: String,
    pub corrected: String,
    /// Offsets relative to the start of the sentence.
    pub errors: Vec<GrammarError>,
    pub fluency_score: f64,
}

impl SentenceAnalysis {
    /// A sentence reported as-is: no errors, full fluency.
    pub fn neutral(index: usize, text: &str) -> Self {
        Self {
            index,
            original: text.to_string(),
            corrected: text.to_string(),
            errors: Vec::new(),
            fluency_score: 100.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub original_text: String,
    pub corrected_text: String,
    /// Offsets relative to the start of `original_text`.
    pub errors: Vec<GrammarError>,
    pub confidence_score: f64,
    pub sentences: Vec<SentenceAnalysis>,
    pub ngram_mode: NgramMode,
    pub processing_time_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelHealth {
    pub model_loaded: bool,
    pub vocabulary_size: usize,
    pub total_words: u64,
}

/// Move every error starting at or after `after_offset` by `delta` bytes.
pub fn shift(errors: &[GrammarError], after_offset: usize, delta: isize) -> Vec<GrammarError> {
    errors
        .iter()
        .map(|error| {
            let mut error = error.clone();
            if error.start >= after_offset {
                error.start = error.start.saturating_add_signed(delta);
                error.end = error.end.saturating_add_signed(delta);
            }
            error
        })
        .collect()
}

/// Order errors by start offset (ties: spelling, grammar, punctuation) and
/// drop every error overlapping one already kept.
pub fn merge_errors(errors: impl IntoIterator<Item = GrammarError>) -> Vec<GrammarError> {
    let mut errors: Vec<GrammarError> = errors.into_iter().collect();
    errors.sort_by_key(|e| (e.start, e.kind));

    let mut kept: Vec<GrammarError> = Vec::with_capacity(errors.len());
    for error in errors {
        let clashes = kept
            .iter()
            .any(|k| k.overlaps(&error) || (k.start == error.start && k.end == error.end));
        if !clashes {
            kept.push(error);
        }
    }
    kept
}

/// Apply every fixable suggestion to `text`, left to right.
///
/// Errors are given in `text` coordinates. Each fix shifts the errors after
/// it by its length change; an error overlapping an earlier fix is skipped.
///
/// # Errors
/// Returns [`Error::InvalidSpan`] if a span does not fall on character
/// boundaries of `text` or does not cover the error's original text.
pub fn apply_corrections(text: &str, errors: &[GrammarError]) -> Result<String> {
    let mut fixes: Vec<GrammarError> = errors.iter().filter(|e| e.is_fixable()).cloned().collect();
    fixes.sort_by_key(|e| (e.start, e.end));

    let mut pending: Vec<GrammarError> = Vec::with_capacity(fixes.len());
    for fix in fixes {
        if pending.last().map_or(true, |prev| !prev.overlaps(&fix)) {
            pending.push(fix);
        }
    }

    let mut corrected = text.to_string();
    let mut index = 0;
    while index < pending.len() {
        let fix = pending[index].clone();
        let invalid = || Error::InvalidSpan {
            start: fix.start,
            end: fix.end,
        };

        let current = corrected.get(fix.start..fix.end).ok_or_else(invalid)?;
        if current != fix.original {
            return Err(invalid());
        }

        corrected.replace_range(fix.start..fix.end, &fix.suggestion);
        let delta = fix.suggestion.len() as isize - fix.len() as isize;
        let rest = shift(&pending[index + 1..], fix.end, delta);
        pending.truncate(index + 1);
        pending.extend(rest);
        index += 1;
    }

    Ok(corrected)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spelling(start: usize, original: &str, suggestion: &str) -> GrammarError {
        GrammarError::new(ErrorKind::Spelling, start, original, suggestion, "")
    }

    fn punctuation(start: usize, original: &str, suggestion: &str) -> GrammarError {
        GrammarError::new(ErrorKind::Punctuation, start, original, suggestion, "")
    }

    #[test]
    fn test_shift_moves_only_later_errors() {
        let errors = vec![spelling(0, "Ths", "This"), spelling(9, "tst", "test")];
        let shifted = shift(&errors, 3, 1);
        assert_eq!((shifted[0].start, shifted[0].end), (0, 3));
        assert_eq!((shifted[1].start, shifted[1].end), (10, 13));

        let back = shift(&shifted, 10, -1);
        assert_eq!(back, errors);
    }

    #[test]
    fn test_apply_corrections_shifts_later_spans() {
        let text = "Ths is a tst";
        let errors = vec![
            spelling(0, "Ths", "This"),
            spelling(9, "tst", "test"),
            punctuation(12, "", "."),
        ];
        assert_eq!(apply_corrections(text, &errors).unwrap(), "This is a test.");
    }

    #[test]
    fn test_apply_corrections_handles_unsorted_and_shrinking_fixes() {
        let text = "Well  done   mate";
        let errors = vec![punctuation(10, "   ", " "), punctuation(4, "  ", " ")];
        assert_eq!(apply_corrections(text, &errors).unwrap(), "Well done mate");
    }

    #[test]
    fn test_advisory_errors_are_not_applied() {
        let text = "He said \"hi";
        let errors = vec![punctuation(8, "\"", "\"")];
        assert!(!errors[0].is_fixable());
        assert_eq!(apply_corrections(text, &errors).unwrap(), text);
    }

    #[test]
    fn test_apply_corrections_rejects_bad_spans() {
        // Starts inside the two-byte "é".
        let errors = vec![spelling(2, "x", "y")];
        assert!(matches!(
            apply_corrections("né", &errors),
            Err(Error::InvalidSpan { start: 2, end: 3 })
        ));

        let errors = vec![spelling(0, "cat", "dog")];
        assert!(apply_corrections("cow", &errors).is_err());
    }

    #[test]
    fn test_merge_prefers_spelling_and_drops_overlaps() {
        let merged = merge_errors(vec![
            punctuation(0, "t", "T"),
            spelling(0, "ths", "this"),
            punctuation(4, "", "."),
            GrammarError::new(ErrorKind::Grammar, 4, "is", "was", ""),
            punctuation(4, "", "."),
        ]);
        let kinds: Vec<ErrorKind> = merged.iter().map(|e| e.kind).collect();
        assert_eq!(kinds, vec![ErrorKind::Spelling, ErrorKind::Grammar, ErrorKind::Punctuation]);
        assert_eq!(merged[2].start, 4);
        assert!(merged[2].is_empty());
    }

    #[test]
    fn test_overlap_of_insertion_points() {
        let insert = punctuation(3, "", ",");
        assert!(!insert.overlaps(&spelling(3, "abc", "x")));
        assert!(insert.overlaps(&spelling(1, "abc", "x")));
        assert!(insert.overlaps(&punctuation(3, "", ".")));
    }

    #[test]
    fn test_serialized_shape() {
        let error = spelling(0, "Ths", "This").in_sentence(2);
        let json = serde_json::to_value(&error).unwrap();
        assert_eq!(json["type"], "spelling");
        assert_eq!(json["sentenceIndex"], 2);
        assert_eq!(json["end"], 3);
    }
}
