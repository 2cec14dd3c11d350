//! Rule-based punctuation checks over raw sentence text.
//!
//! Rules never consult the language model. Each one reports exact,
//! sentence-local spans; overlapping reports are resolved when the errors of
//! all passes are merged. Rules run in a fixed order:
//!
//! 1. missing terminal punctuation
//! 2. missing comma before a conjunction joining two clauses
//! 3. doubled whitespace
//! 4. missing capital at the start of the sentence (or after an inner `.`)
//! 5. unmatched quotation marks (advisory)
//! 6. lowercase pronoun `i`
//! 7. missing comma after an introductory word

use crate::tokenizer::{ends_with_abbreviation, tokenize};
use crate::types::{ErrorKind, GrammarError};
use once_cell::sync::Lazy;
use regex::Regex;

/// Sentences shorter than this may be fragments or headings.
const MIN_WORDS_FOR_TERMINAL: usize = 3;

/// Words after which a conjunction does not start a new clause.
const NO_COMMA_AFTER: &[&str] = &[
    "a", "an", "the", "to", "of", "in", "on", "at", "by", "for", "with", "and", "or", "but",
];

/// Words that open an independent clause.
const SUBJECTS: &[&str] = &["i", "you", "he", "she", "it", "we", "they", "there"];

const DETERMINERS: &[&str] = &[
    "the", "a", "an", "this", "that", "these", "those", "my", "your", "his", "her", "its", "our",
    "their",
];

const INTRODUCTORY_WORDS: &[&str] = &[
    "however",
    "therefore",
    "furthermore",
    "moreover",
    "nevertheless",
    "meanwhile",
    "consequently",
    "unfortunately",
    "fortunately",
    "finally",
    "first",
    "secondly",
    "additionally",
    "instead",
    "otherwise",
    "yesterday",
    "today",
    "tomorrow",
    "sometimes",
    "afterwards",
    "suddenly",
    "honestly",
    "surprisingly",
];

static CONJUNCTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(\w+)([ \t]+)(and|but|or|nor|so|yet)([ \t]+)(\w+)")
        .expect("conjunction pattern is valid")
});

static DOUBLE_SPACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[ \t]{2,}").expect("whitespace pattern is valid"));

static INNER_SENTENCE_START: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"[.!?]["')\]]*\s+(\p{Ll})"#).expect("sentence start pattern is valid")
});

static LOWERCASE_I: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bi\b").expect("pronoun pattern is valid"));

static WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\w+").expect("word pattern is valid"));

#[derive(Debug, Default, Clone, Copy)]
pub struct PunctuationChecker;

impl PunctuationChecker {
    pub fn new() -> Self {
        Self
    }

    /// Run every rule on one sentence. Spans are relative to `text`.
    pub fn check(&self, text: &str, sentence_index: usize) -> Vec<GrammarError> {
        let word_count = tokenize(text, 0).iter().filter(|t| t.is_word).count();

        let mut errors = Vec::new();
        errors.extend(missing_terminal(text, word_count));
        errors.extend(missing_conjunction_comma(text));
        errors.extend(double_whitespace(text));
        errors.extend(missing_capital(text));
        errors.extend(unmatched_quotes(text));
        errors.extend(lowercase_pronoun(text));
        errors.extend(missing_introductory_comma(text, word_count));

        for error in &mut errors {
            error.sentence_index = sentence_index;
        }
        errors
    }
}

fn punctuation(start: usize, original: &str, suggestion: &str, explanation: &str) -> GrammarError {
    GrammarError::new(ErrorKind::Punctuation, start, original, suggestion, explanation)
}

fn missing_terminal(text: &str, word_count: usize) -> Option<GrammarError> {
    if word_count < MIN_WORDS_FOR_TERMINAL {
        return None;
    }

    let trimmed = text.trim_end();
    let body = trimmed.trim_end_matches(|c: char| {
        matches!(c, '"' | '\'' | ')' | ']' | '\u{201D}' | '\u{2019}')
    });
    let last = body.chars().last()?;

    if matches!(last, '.' | '!' | '?' | '\u{2026}') {
        return None;
    }

    // A dangling comma, colon or semicolon is replaced rather than followed.
    if matches!(last, ',' | ';' | ':') {
        let start = body.len() - last.len_utf8();
        return Some(punctuation(
            start,
            &body[start..],
            ".",
            "The sentence ends with a separator instead of terminal punctuation.",
        ));
    }

    Some(punctuation(
        trimmed.len(),
        "",
        ".",
        "The sentence is missing terminal punctuation.",
    ))
}

fn missing_conjunction_comma(text: &str) -> Vec<GrammarError> {
    let mut errors = Vec::new();

    for caps in CONJUNCTION.captures_iter(text) {
        let (Some(before), Some(gap), Some(conjunction), Some(next)) =
            (caps.get(1), caps.get(2), caps.get(3), caps.get(5))
        else {
            continue;
        };

        let before_word = before.as_str().to_lowercase();
        if NO_COMMA_AFTER.contains(&before_word.as_str()) {
            continue;
        }

        // Both sides need to look like clauses: two words on the left, a
        // subject and at least one more word on the right.
        let left_words = WORD.find_iter(&text[..gap.start()]).count();
        let right_words = WORD.find_iter(&text[next.start()..]).count();
        let subject = next.as_str().to_lowercase();
        if left_words < 2 || right_words < 2 || !SUBJECTS.contains(&subject.as_str()) {
            continue;
        }

        let explanation = format!(
            "Use a comma before \"{}\" when it joins two independent clauses.",
            conjunction.as_str()
        );
        errors.push(punctuation(gap.start(), gap.as_str(), ", ", &explanation));
    }

    errors
}

fn double_whitespace(text: &str) -> Vec<GrammarError> {
    DOUBLE_SPACE
        .find_iter(text)
        .map(|m| {
            punctuation(
                m.start(),
                m.as_str(),
                " ",
                "Use a single space between words and sentences.",
            )
        })
        .collect()
}

fn missing_capital(text: &str) -> Vec<GrammarError> {
    let mut errors = Vec::new();
    let explanation = "Sentences start with a capital letter.";

    let first_word = text.char_indices().find(|&(_, c)| {
        !c.is_whitespace() && !matches!(c, '"' | '\'' | '(' | '[' | '\u{201C}' | '\u{2018}')
    });
    if let Some((start, c)) = first_word {
        let word = text[start..]
            .split(|c: char| !c.is_alphanumeric())
            .next()
            .unwrap_or_default();
        // Leave deliberate mixed case such as "iPhone" alone.
        let mixed_case = word.chars().skip(1).any(char::is_uppercase);
        if c.is_lowercase() && !mixed_case {
            let letter = &text[start..start + c.len_utf8()];
            errors.push(punctuation(start, letter, &c.to_uppercase().to_string(), explanation));
        }
    }

    for caps in INNER_SENTENCE_START.captures_iter(text) {
        let (Some(whole), Some(letter)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        if ends_with_abbreviation(&text[..whole.start()]) {
            continue;
        }
        let upper = letter.as_str().to_uppercase();
        errors.push(punctuation(letter.start(), letter.as_str(), &upper, explanation));
    }

    errors
}

fn unmatched_quotes(text: &str) -> Vec<GrammarError> {
    let mut errors = Vec::new();

    let straight: Vec<usize> = text.match_indices('"').map(|(i, _)| i).collect();
    if straight.len() % 2 == 1 {
        if let Some(&last) = straight.last() {
            errors.push(punctuation(last, "\"", "\"", "This quotation mark is never closed."));
        }
    }

    let opening: Vec<usize> = text.match_indices('\u{201C}').map(|(i, _)| i).collect();
    let closing: Vec<usize> = text.match_indices('\u{201D}').map(|(i, _)| i).collect();
    if opening.len() > closing.len() {
        if let Some(&last) = opening.last() {
            let explanation = "This quotation mark is never closed.";
            errors.push(punctuation(last, "\u{201C}", "\u{201C}", explanation));
        }
    } else if closing.len() > opening.len() {
        if let Some(&last) = closing.last() {
            let explanation = "This quotation mark is never opened.";
            errors.push(punctuation(last, "\u{201D}", "\u{201D}", explanation));
        }
    }

    errors
}

fn lowercase_pronoun(text: &str) -> Vec<GrammarError> {
    LOWERCASE_I
        .find_iter(text)
        .filter(|m| {
            let before = text[..m.start()].chars().next_back();
            let after = &text[m.end()..];
            // "i.e." and hyphenated fragments are not the pronoun.
            !matches!(before, Some('.' | '-')) && !after.starts_with(".e") && !after.starts_with('-')
        })
        .map(|m| {
            punctuation(
                m.start(),
                "i",
                "I",
                "The pronoun \"I\" is always capitalized.",
            )
        })
        .collect()
}

fn missing_introductory_comma(text: &str, word_count: usize) -> Option<GrammarError> {
    if word_count < 3 {
        return None;
    }

    let mut words = WORD.find_iter(text);
    let first = words.next()?;
    let second = words.next()?;

    let lead = &text[..first.start()];
    if lead.chars().any(|c| c.is_alphanumeric()) {
        return None;
    }

    let introductory = first.as_str().to_lowercase();
    if !INTRODUCTORY_WORDS.contains(&introductory.as_str()) {
        return None;
    }

    let gap = &text[first.end()..second.start()];
    if gap.is_empty() || !gap.chars().all(|c| c == ' ' || c == '\t') {
        return None;
    }

    let next = second.as_str().to_lowercase();
    if !SUBJECTS.contains(&next.as_str()) && !DETERMINERS.contains(&next.as_str()) {
        return None;
    }

    let explanation = format!(
        "Put a comma after the introductory word \"{}\".",
        first.as_str()
    );
    Some(punctuation(first.end(), gap, ", ", &explanation))
}
