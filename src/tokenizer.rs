//! Sentence segmentation and tokenization.
//!
//! Both passes are lossless: every byte of the input lands in exactly one
//! sentence, and every byte of a sentence lands in exactly one token.
//! Whitespace runs and single punctuation characters become non-word tokens,
//! so joining the token texts of a sentence gives back the sentence verbatim.
//!
//! All offsets are byte offsets into the original input string.

/// Words that end with a period without ending the sentence.
const ABBREVIATIONS: &[&str] = &[
    "mr", "mrs", "ms", "dr", "prof", "sr", "jr", "vs", "etc", "inc", "ltd", "co", "st", "ave",
    "blvd", "rd", "jan", "feb", "mar", "apr", "jun", "jul", "aug", "sep", "sept", "oct", "nov",
    "dec", "i.e", "e.g", "cf", "viz", "no", "nos", "vol", "vols", "pp", "pg", "fig", "figs",
    "approx", "dept", "est", "govt",
];

/// A slice of a sentence with its position in the original input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub text: &'a str,
    pub start: usize,
    pub end: usize,
    /// `true` for runs of letters (optionally with digits and internal
    /// apostrophes); `false` for whitespace, punctuation and bare numbers.
    pub is_word: bool,
}

impl<'a> Token<'a> {
    /// Lower-cased form used for every model lookup.
    pub fn folded(&self) -> String {
        fold_case(self.text)
    }

    /// A word made only of letters and apostrophes, i.e. something the
    /// language model can have seen.
    pub fn is_lexical(&self) -> bool {
        self.is_word && is_lexical(self.text)
    }
}

/// One detected sentence, including its trailing whitespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sentence<'a> {
    pub index: usize,
    pub start: usize,
    pub end: usize,
    pub text: &'a str,
    pub tokens: Vec<Token<'a>>,
}

impl<'a> Sentence<'a> {
    pub fn words(&self) -> impl Iterator<Item = &Token<'a>> {
        self.tokens.iter().filter(|t| t.is_word)
    }

    pub fn word_count(&self) -> usize {
        self.words().count()
    }
}

/// Split `text` into sentences.
///
/// A sentence ends after a run of `.`, `!` or `?` (plus any closing quotes or
/// brackets) when whitespace follows and the next visible character looks
/// like the start of a new sentence. Text without such a boundary is a single
/// sentence; blank text has none.
pub fn segment(text: &str) -> Vec<Sentence<'_>> {
    if text.trim().is_empty() {
        return Vec::new();
    }

    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let mut starts = vec![0usize];

    let mut i = 0;
    while i < chars.len() {
        if !is_terminal(chars[i].1) {
            i += 1;
            continue;
        }

        let terminal_at = chars[i].0;
        let mut j = i + 1;
        while j < chars.len() && (is_terminal(chars[j].1) || is_closing(chars[j].1)) {
            j += 1;
        }

        let mut k = j;
        while k < chars.len() && chars[k].1.is_whitespace() {
            k += 1;
        }

        if k > j
            && k < chars.len()
            && opens_sentence(chars[k].1)
            && !(chars[i].1 == '.' && ends_with_abbreviation(&text[..terminal_at]))
        {
            starts.push(chars[k].0);
        }

        i = j;
    }

    let mut sentences = Vec::with_capacity(starts.len());
    for (index, &start) in starts.iter().enumerate() {
        let end = starts.get(index + 1).copied().unwrap_or(text.len());
        let slice = &text[start..end];
        sentences.push(Sentence {
            index,
            start,
            end,
            text: slice,
            tokens: tokenize(slice, start),
        });
    }

    sentences
}

/// Cut `text` into word, whitespace and punctuation tokens.
///
/// `base_offset` is added to every span so tokens of a sentence can carry
/// document positions.
pub fn tokenize(text: &str, base_offset: usize) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut chars = text.char_indices().peekable();

    while let Some((start, c)) = chars.next() {
        let mut end = start + c.len_utf8();
        let mut has_letter = c.is_alphabetic();

        if c.is_alphanumeric() {
            while let Some(&(i, next)) = chars.peek() {
                let next_end = i + next.len_utf8();
                let joins = next.is_alphanumeric()
                    || (is_apostrophe(next)
                        && text[next_end..].chars().next().is_some_and(char::is_alphabetic));
                if !joins {
                    break;
                }
                has_letter |= next.is_alphabetic();
                end = next_end;
                chars.next();
            }
        } else if c.is_whitespace() {
            while let Some(&(i, next)) = chars.peek() {
                if !next.is_whitespace() {
                    break;
                }
                end = i + next.len_utf8();
                chars.next();
            }
        }

        tokens.push(Token {
            text: &text[start..end],
            start: base_offset + start,
            end: base_offset + end,
            is_word: has_letter,
        });
    }

    tokens
}

/// Lower-cased lexical words of each sentence of `text`, for corpus ingestion.
pub fn word_forms(text: &str) -> Vec<Vec<String>> {
    segment(text)
        .iter()
        .map(|sentence| {
            sentence
                .tokens
                .iter()
                .filter(|t| t.is_lexical())
                .map(Token::folded)
                .collect::<Vec<_>>()
        })
        .filter(|words| !words.is_empty())
        .collect()
}

/// Case folding applied before every vocabulary or n-gram lookup. Curly
/// apostrophes are normalized so `don’t` and `don't` are the same word.
pub fn fold_case(word: &str) -> String {
    word.chars()
        .map(|c| if c == '\u{2019}' { '\'' } else { c })
        .flat_map(char::to_lowercase)
        .collect()
}

pub fn is_lexical(word: &str) -> bool {
    word.chars().any(char::is_alphabetic)
        && word.chars().all(|c| c.is_alphabetic() || is_apostrophe(c))
}

fn is_apostrophe(c: char) -> bool {
    c == '\'' || c == '\u{2019}'
}

fn is_terminal(c: char) -> bool {
    matches!(c, '.' | '!' | '?')
}

fn is_closing(c: char) -> bool {
    matches!(c, '"' | '\'' | ')' | ']' | '\u{201D}' | '\u{2019}')
}

fn opens_sentence(c: char) -> bool {
    c.is_uppercase() || c.is_ascii_digit() || matches!(c, '"' | '\'' | '(' | '\u{201C}' | '\u{2018}')
}

/// Whether the text before a period ends in an abbreviation or an initial.
pub(crate) fn ends_with_abbreviation(before: &str) -> bool {
    let mut word: Vec<char> = before
        .chars()
        .rev()
        .take_while(|c| c.is_alphabetic() || *c == '.')
        .collect();
    word.reverse();

    let word: String = word.into_iter().collect();
    let word = word.trim_matches('.');
    if word.is_empty() {
        return false;
    }

    let mut letters = word.chars();
    if let (Some(first), None) = (letters.next(), letters.next()) {
        return first.is_uppercase();
    }

    ABBREVIATIONS.contains(&fold_case(word).as_str())
}
