// symspell.rs - Symmetric delete candidate index over the model vocabulary.
// Candidates within Damerau-Levenshtein distance 2 are found without scanning
// the vocabulary: a term and an input share at least one delete variant of
// their first `prefix_length` characters.

use crate::model::LanguageModel;
use ahash::{AHashMap, AHashSet, RandomState};
use std::cmp::Ordering;

/// Characters of each word that take part in delete generation.
pub const DEFAULT_PREFIX_LENGTH: usize = 7;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestItem {
    pub term: String,
    pub distance: usize,
    pub frequency: u64,
}

impl SuggestItem {
    fn new(term: String, distance: usize, frequency: u64) -> Self {
        Self {
            term,
            distance,
            frequency,
        }
    }

    /// Ascending distance, then descending frequency, then alphabetical.
    pub fn rank(&self, other: &Self) -> Ordering {
        self.distance
            .cmp(&other.distance)
            .then_with(|| other.frequency.cmp(&self.frequency))
            .then_with(|| self.term.cmp(&other.term))
    }
}

#[derive(Debug, Clone)]
struct Term {
    word: String,
    frequency: u64,
}

#[derive(Debug, Clone)]
pub struct SymSpell {
    terms: Vec<Term>,
    // Main dictionary: word -> index into `terms`
    index: AHashMap<String, u32>,
    // Delete dictionary: hash of a prefix delete variant -> terms. Hash
    // collisions only add candidates, which the distance check removes.
    deletes: AHashMap<u64, Vec<u32>>,
    hasher: RandomState,
    max_edit_distance: usize,
    prefix_length: usize,
}

impl SymSpell {
    pub fn new(max_edit_distance: usize) -> Self {
        Self::with_prefix_length(max_edit_distance, DEFAULT_PREFIX_LENGTH)
    }

    /// `prefix_length` is raised to `max_edit_distance + 1` if needed.
    pub fn with_prefix_length(max_edit_distance: usize, prefix_length: usize) -> Self {
        Self {
            terms: Vec::new(),
            index: AHashMap::new(),
            deletes: AHashMap::new(),
            hasher: RandomState::new(),
            max_edit_distance,
            prefix_length: prefix_length.max(max_edit_distance + 1),
        }
    }

    /// Index every vocabulary word of `model`.
    pub fn from_model(model: &LanguageModel, max_edit_distance: usize) -> Self {
        let mut symspell = Self::new(max_edit_distance);
        for (word, frequency) in model.words() {
            symspell.insert(word, frequency);
        }
        symspell
    }

    /// Add a word, or raise its frequency if it is already indexed.
    pub fn insert(&mut self, word: &str, frequency: u64) {
        if let Some(&i) = self.index.get(word) {
            self.terms[i as usize].frequency += frequency;
            return;
        }

        let i = self.terms.len() as u32;
        self.terms.push(Term {
            word: word.to_string(),
            frequency,
        });
        self.index.insert(word.to_string(), i);

        let prefix = self.prefix(word);
        let mut keys = vec![self.key(prefix)];
        keys.extend(
            Self::generate_deletes(prefix, self.max_edit_distance)
                .iter()
                .map(|delete| self.key(delete)),
        );
        keys.sort_unstable();
        keys.dedup();

        for key in keys {
            self.deletes.entry(key).or_default().push(i);
        }
    }

    pub fn max_edit_distance(&self) -> usize {
        self.max_edit_distance
    }

    /// All indexed words within `max_edit_distance` of `input` (the input
    /// itself included at distance 0), best first.
    ///
    /// The distance is clamped to the one the index was built with.
    pub fn lookup(&self, input: &str, max_edit_distance: usize) -> Vec<SuggestItem> {
        let max_edit_distance = max_edit_distance.min(self.max_edit_distance);
        let input_len = input.chars().count();
        let mut suggestions = Vec::new();
        let mut considered = AHashSet::new();

        let prefix = self.prefix(input);
        let mut keys = Self::generate_deletes(prefix, max_edit_distance);
        keys.push(prefix.to_string());

        for delete in &keys {
            let Some(candidates) = self.deletes.get(&self.key(delete)) else {
                continue;
            };

            for &i in candidates {
                if !considered.insert(i) {
                    continue;
                }

                let term = &self.terms[i as usize];
                if term.word.chars().count().abs_diff(input_len) > max_edit_distance {
                    continue;
                }
                if let Some(distance) =
                    Self::damerau_levenshtein_distance(input, &term.word, max_edit_distance)
                {
                    suggestions.push(SuggestItem::new(term.word.clone(), distance, term.frequency));
                }
            }
        }

        suggestions.sort_by(SuggestItem::rank);
        suggestions
    }

    /// Like [`lookup`](Self::lookup) but without the input itself.
    pub fn candidates(&self, input: &str, max_edit_distance: usize) -> Vec<SuggestItem> {
        let mut suggestions = self.lookup(input, max_edit_distance);
        suggestions.retain(|s| s.distance > 0);
        suggestions
    }

    /// The first `prefix_length` characters of `word`.
    fn prefix<'w>(&self, word: &'w str) -> &'w str {
        match word.char_indices().nth(self.prefix_length) {
            Some((end, _)) => &word[..end],
            None => word,
        }
    }

    fn key(&self, delete: &str) -> u64 {
        self.hasher.hash_one(delete)
    }

    /// Generate all delete strings within max_edit_distance
    fn generate_deletes(word: &str, max_edit_distance: usize) -> Vec<String> {
        let mut deletes = Vec::new();
        let mut queue = vec![(word.to_string(), 0)];
        let mut seen = AHashSet::new();
        seen.insert(word.to_string());

        while let Some((current, depth)) = queue.pop() {
            if depth >= max_edit_distance {
                continue;
            }

            let chars: Vec<char> = current.chars().collect();
            for i in 0..chars.len() {
                let new_word: String = chars
                    .iter()
                    .enumerate()
                    .filter(|&(j, _)| j != i)
                    .map(|(_, &c)| c)
                    .collect();

                if seen.insert(new_word.clone()) {
                    deletes.push(new_word.clone());
                    queue.push((new_word, depth + 1));
                }
            }
        }

        deletes
    }

    /// Damerau-Levenshtein (optimal string alignment) distance, or `None`
    /// once it is certain to exceed `max_distance`.
    pub fn damerau_levenshtein_distance(
        source: &str,
        target: &str,
        max_distance: usize,
    ) -> Option<usize> {
        let source_chars: Vec<char> = source.chars().collect();
        let target_chars: Vec<char> = target.chars().collect();
        let len1 = source_chars.len();
        let len2 = target_chars.len();

        if len1.abs_diff(len2) > max_distance {
            return None;
        }
        if len1 == 0 || len2 == 0 {
            return Some(len1.max(len2));
        }

        let mut matrix = vec![vec![0usize; len2 + 1]; len1 + 1];
        for (i, row) in matrix.iter_mut().enumerate() {
            row[0] = i;
        }
        for j in 0..=len2 {
            matrix[0][j] = j;
        }

        for i in 1..=len1 {
            let mut min_in_row = usize::MAX;

            for j in 1..=len2 {
                let cost = usize::from(source_chars[i - 1] != target_chars[j - 1]);

                let deletion = matrix[i - 1][j] + 1;
                let insertion = matrix[i][j - 1] + 1;
                let substitution = matrix[i - 1][j - 1] + cost;
                matrix[i][j] = deletion.min(insertion).min(substitution);

                if i > 1
                    && j > 1
                    && source_chars[i - 1] == target_chars[j - 2]
                    && source_chars[i - 2] == target_chars[j - 1]
                {
                    matrix[i][j] = matrix[i][j].min(matrix[i - 2][j - 2] + 1);
                }

                min_in_row = min_in_row.min(matrix[i][j]);
            }

            // Row minima never decrease, so the final distance is out of range too.
            if min_in_row > max_distance {
                return None;
            }
        }

        let distance = matrix[len1][len2];
        (distance <= max_distance).then_some(distance)
    }

    pub fn word_count(&self) -> usize {
        self.terms.len()
    }
}
