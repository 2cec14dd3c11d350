//! Rule-based grammar checks over the spelling-resolved words of a sentence.
//!
//! These catch common learner errors that a sparse corpus cannot vouch for
//! on its own. Every rule looks at a word and its immediate neighbours, and
//! two words only count as neighbours when nothing but whitespace separates
//! them. Rules are tried in this order and the first match wins for a word:
//!
//! 1. present verb after a subject in a sentence about the past
//!    (`he go ... yesterday` → `went`)
//! 2. subject-verb agreement (`she go` → `goes`, `they goes` → `go`)
//! 3. `of` after a modal (`could of` → `could have`)
//! 4. `then` after a comparative (`taller then` → `than`)
//! 5. `was` after a plural pronoun (`we was` → `were`)
//! 6. past form after `to` (`to went` → `go`)
//! 7. adjective where an adverb belongs (`talks loud and` → `loudly`)
//! 8. `no enough` → `not enough`
//! 9. wrong preposition after a verb (`depends of` → `depends on`)
//!
//! Every fix replaces exactly one word. Words already flagged by the
//! spelling pass are never targets, but their corrected forms serve as
//! context.

use crate::grammar::ContextWord;
use crate::spelling::match_case;
use crate::types::{ErrorKind, GrammarError};

/// `(base, past, third person singular)`.
const VERB_FORMS: &[(&str, &str, &str)] = &[
    ("ask", "asked", "asks"),
    ("begin", "began", "begins"),
    ("bring", "brought", "brings"),
    ("build", "built", "builds"),
    ("buy", "bought", "buys"),
    ("come", "came", "comes"),
    ("cook", "cooked", "cooks"),
    ("cut", "cut", "cuts"),
    ("do", "did", "does"),
    ("drink", "drank", "drinks"),
    ("drive", "drove", "drives"),
    ("eat", "ate", "eats"),
    ("explain", "explained", "explains"),
    ("fall", "fell", "falls"),
    ("feel", "felt", "feels"),
    ("find", "found", "finds"),
    ("finish", "finished", "finishes"),
    ("forget", "forgot", "forgets"),
    ("get", "got", "gets"),
    ("give", "gave", "gives"),
    ("go", "went", "goes"),
    ("grow", "grew", "grows"),
    ("have", "had", "has"),
    ("hear", "heard", "hears"),
    ("help", "helped", "helps"),
    ("keep", "kept", "keeps"),
    ("know", "knew", "knows"),
    ("learn", "learned", "learns"),
    ("leave", "left", "leaves"),
    ("let", "let", "lets"),
    ("like", "liked", "likes"),
    ("listen", "listened", "listens"),
    ("live", "lived", "lives"),
    ("look", "looked", "looks"),
    ("lose", "lost", "loses"),
    ("love", "loved", "loves"),
    ("make", "made", "makes"),
    ("meet", "met", "meets"),
    ("move", "moved", "moves"),
    ("need", "needed", "needs"),
    ("open", "opened", "opens"),
    ("pay", "paid", "pays"),
    ("play", "played", "plays"),
    ("put", "put", "puts"),
    ("read", "read", "reads"),
    ("run", "ran", "runs"),
    ("see", "saw", "sees"),
    ("send", "sent", "sends"),
    ("show", "showed", "shows"),
    ("sit", "sat", "sits"),
    ("speak", "spoke", "speaks"),
    ("spend", "spent", "spends"),
    ("stand", "stood", "stands"),
    ("start", "started", "starts"),
    ("stay", "stayed", "stays"),
    ("stop", "stopped", "stops"),
    ("study", "studied", "studies"),
    ("take", "took", "takes"),
    ("talk", "talked", "talks"),
    ("tell", "told", "tells"),
    ("think", "thought", "thinks"),
    ("try", "tried", "tries"),
    ("use", "used", "uses"),
    ("visit", "visited", "visits"),
    ("wait", "waited", "waits"),
    ("walk", "walked", "walks"),
    ("want", "wanted", "wants"),
    ("wash", "washed", "washes"),
    ("watch", "watched", "watches"),
    ("wear", "wore", "wears"),
    ("win", "won", "wins"),
    ("work", "worked", "works"),
    ("write", "wrote", "writes"),
];

/// Forms that are never right after infinitive `to`, with their base form.
const BASE_AFTER_TO: &[(&str, &str)] = &[
    ("ate", "eat"),
    ("began", "begin"),
    ("bought", "buy"),
    ("brought", "bring"),
    ("came", "come"),
    ("did", "do"),
    ("drank", "drink"),
    ("drove", "drive"),
    ("forgot", "forget"),
    ("gave", "give"),
    ("goes", "go"),
    ("got", "get"),
    ("grew", "grow"),
    ("heard", "hear"),
    ("kept", "keep"),
    ("knew", "know"),
    ("made", "make"),
    ("meant", "mean"),
    ("met", "meet"),
    ("ran", "run"),
    ("sat", "sit"),
    ("sent", "send"),
    ("spoke", "speak"),
    ("stood", "stand"),
    ("thought", "think"),
    ("told", "tell"),
    ("took", "take"),
    ("understood", "understand"),
    ("went", "go"),
    ("wore", "wear"),
    ("wrote", "write"),
];

const SINGULAR_PRONOUNS: &[&str] = &["he", "she", "it"];
const PLURAL_PRONOUNS: &[&str] = &["i", "you", "we", "they"];

const SINGULAR_NOUNS: &[&str] = &[
    "aunt", "baby", "boy", "brother", "cat", "child", "daughter", "doctor", "dog", "driver",
    "father", "friend", "girl", "husband", "man", "manager", "mother", "neighbor", "neighbour",
    "sister", "son", "student", "teacher", "uncle", "wife", "woman",
];

const PLURAL_NOUNS: &[&str] = &[
    "brothers", "cats", "children", "dogs", "friends", "men", "parents", "people", "sisters",
    "students", "teachers", "women",
];

/// Words that make a noun a subject candidate: `my brother`, `the dog`.
const DETERMINERS: &[&str] = &[
    "a", "an", "her", "his", "my", "our", "the", "their", "that", "this", "your",
];

/// Words after which a bare verb is correct: `can he go`, `let it go`.
const VERB_GOVERNORS: &[&str] = &[
    "can", "could", "will", "would", "shall", "should", "may", "might", "must", "do", "does",
    "did", "to", "don't", "doesn't", "didn't", "won't", "wouldn't", "can't", "couldn't",
    "shouldn't", "mustn't", "help", "helped", "helps", "helping", "make", "made", "makes",
    "making", "let", "lets", "letting", "see", "saw", "sees", "seeing", "watch", "watched",
    "watches", "watching", "hear", "heard", "hears", "hearing", "feel", "felt", "feels",
    "feeling", "have", "has", "had",
];

/// Agreement is not checked for verbs that double as common prepositions.
const AGREEMENT_EXCEPTIONS: &[&str] = &["like"];

const PAST_TIME_WORDS: &[&str] = &["yesterday", "ago", "previously"];

/// Nouns that turn `last` into a past-time marker.
const LAST_NOUNS: &[&str] = &[
    "night", "week", "month", "year", "summer", "winter", "spring", "autumn", "weekend", "time",
    "monday", "tuesday", "wednesday", "thursday", "friday", "saturday", "sunday",
];

const MODALS: &[&str] = &["could", "should", "would", "must", "might"];

const COMPARATIVES: &[&str] = &[
    "better", "bigger", "brighter", "busier", "cheaper", "cleaner", "clearer", "closer", "colder",
    "cooler", "darker", "deeper", "earlier", "easier", "faster", "funnier", "greater", "happier",
    "harder", "heavier", "higher", "hotter", "larger", "later", "lighter", "longer", "louder",
    "lower", "newer", "nicer", "older", "poorer", "prettier", "quicker", "quieter", "richer",
    "safer", "shorter", "simpler", "slower", "smaller", "smarter", "stronger", "taller",
    "warmer", "weaker", "wider", "wiser", "younger",
];

const ADVERBS: &[(&str, &str)] = &[
    ("bad", "badly"),
    ("careful", "carefully"),
    ("easy", "easily"),
    ("loud", "loudly"),
    ("quick", "quickly"),
    ("quiet", "quietly"),
    ("real", "really"),
    ("slow", "slowly"),
];

const ACTION_VERBS: &[&str] = &[
    "run", "runs", "ran", "walk", "walks", "walked", "speak", "speaks", "spoke", "sing", "sings",
    "sang", "eat", "eats", "ate", "talk", "talks", "talked", "drive", "drives", "drove",
];

/// Words that may follow an adverb at the end of a verb phrase.
const CLAUSE_BREAKS: &[&str] = &[
    "and", "but", "or", "so", "to", "in", "at", "on", "because", "when", "than", "then", "for",
    "with",
];

/// `(verb, wrong preposition, right preposition)`.
const PREPOSITIONS: &[(&str, &str, &str)] = &[
    ("depend", "of", "on"),
    ("depends", "of", "on"),
    ("depended", "of", "on"),
    ("depending", "of", "on"),
    ("married", "with", "to"),
];

fn is_in(list: &[&str], word: &str) -> bool {
    list.contains(&word)
}

fn verb_by_base(word: &str) -> Option<(&'static str, &'static str, &'static str)> {
    VERB_FORMS.iter().copied().find(|&(base, _, _)| base == word)
}

fn verb_by_third(word: &str) -> Option<(&'static str, &'static str, &'static str)> {
    VERB_FORMS.iter().copied().find(|&(_, _, third)| third == word)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Number {
    Singular,
    Plural,
}

type Rule = fn(&Words<'_, '_>, usize) -> Option<GrammarError>;

const RULES: &[Rule] = &[
    past_tense,
    agreement,
    have_after_modal,
    than_after_comparative,
    were_after_plural,
    base_after_to,
    adverb_after_verb,
    not_enough,
    preposition_after_verb,
];

#[derive(Debug, Default, Clone, Copy)]
pub struct RuleChecker;

impl RuleChecker {
    pub fn new() -> Self {
        Self
    }

    /// Run every rule on one sentence. `text` is the sentence and starts at
    /// document offset `sentence_start`; the returned spans are relative to
    /// `text` and sorted by position.
    pub fn check(
        &self,
        text: &str,
        words: &[ContextWord<'_>],
        sentence_start: usize,
        sentence_index: usize,
    ) -> Vec<GrammarError> {
        let words = Words::new(text, words, sentence_start);

        let mut errors: Vec<GrammarError> = (0..words.len())
            .filter(|&i| words.words[i].checkable)
            .filter_map(|i| RULES.iter().find_map(|rule| rule(&words, i)))
            .collect();

        errors.sort_by_key(|e| e.start);
        for error in &mut errors {
            error.sentence_index = sentence_index;
        }
        errors
    }
}

/// The sentence as the rules see it.
struct Words<'s, 'w> {
    text: &'s str,
    words: &'w [ContextWord<'s>],
    sentence_start: usize,
    /// Word that places the sentence in the past, if any.
    past_marker: Option<&'w str>,
    /// Whether some verb is already in the past tense.
    has_past_verb: bool,
}

impl<'s, 'w> Words<'s, 'w> {
    fn new(text: &'s str, words: &'w [ContextWord<'s>], sentence_start: usize) -> Self {
        let forms: Vec<&str> = words.iter().map(|w| w.form.as_str()).collect();

        let past_marker = forms.iter().enumerate().find_map(|(i, &form)| {
            let last_noun = form == "last" && forms.get(i + 1).is_some_and(|n| is_in(LAST_NOUNS, n));
            (is_in(PAST_TIME_WORDS, form) || last_noun).then_some(words[i].form.as_str())
        });

        let has_past_verb = forms.iter().any(|&form| {
            matches!(form, "was" | "were" | "had" | "did")
                || VERB_FORMS.iter().any(|&(base, past, _)| past == form && past != base)
                || (form.len() > 4 && form.ends_with("ed"))
        });

        Self {
            text,
            words,
            sentence_start,
            past_marker,
            has_past_verb,
        }
    }

    fn len(&self) -> usize {
        self.words.len()
    }

    fn form(&self, i: usize) -> Option<&'w str> {
        self.words.get(i).map(|w| w.form.as_str())
    }

    fn prev(&self, i: usize) -> Option<&'w str> {
        i.checked_sub(1).and_then(|p| self.form(p))
    }

    /// Word `i - 1` if only whitespace separates it from word `i`.
    fn adjacent_prev(&self, i: usize) -> Option<&'w str> {
        let prev = self.prev(i)?;
        let gap = self.local(self.words[i - 1].token.end)..self.local(self.words[i].token.start);
        self.text[gap].trim().is_empty().then_some(prev)
    }

    /// Word `i + 1` if only whitespace separates it from word `i`.
    fn adjacent_next(&self, i: usize) -> Option<&'w str> {
        self.form(i + 1)?;
        self.adjacent_prev(i + 1)
    }

    fn local(&self, offset: usize) -> usize {
        offset - self.sentence_start
    }

    fn original(&self, i: usize) -> &'s str {
        self.words[i].token.text
    }

    /// Grammar error replacing word `i`.
    fn error(&self, i: usize, suggestion: String, explanation: String) -> GrammarError {
        let start = self.local(self.words[i].token.start);
        GrammarError::new(ErrorKind::Grammar, start, self.original(i), suggestion, explanation)
    }

    /// Number of the subject directly before word `i`, unless something
    /// earlier makes a bare verb correct there.
    fn subject(&self, i: usize) -> Option<(Number, &'w str)> {
        let subject = self.adjacent_prev(i)?;
        let determined = i >= 2 && self.form(i - 2).is_some_and(|d| is_in(DETERMINERS, d));

        let (number, reach) = if is_in(SINGULAR_PRONOUNS, subject) {
            (Number::Singular, 1)
        } else if is_in(PLURAL_PRONOUNS, subject) {
            (Number::Plural, 1)
        } else if determined && is_in(SINGULAR_NOUNS, subject) {
            (Number::Singular, 2)
        } else if determined && is_in(PLURAL_NOUNS, subject) {
            (Number::Plural, 2)
        } else {
            return None;
        };

        // `can he go`, `did my brother go`, `she and her sister go`.
        let governed = (1..=reach)
            .filter_map(|back| i.checked_sub(1 + back).and_then(|j| self.form(j)))
            .any(|w| is_in(VERB_GOVERNORS, w));
        let compound = reach == 2
            && i.checked_sub(3)
                .and_then(|j| self.form(j))
                .is_some_and(|w| w == "and" || w == "or");
        let negated = self.form(i + 1) == Some("not");

        (!governed && !compound && !negated).then_some((number, subject))
    }
}

fn past_tense(words: &Words<'_, '_>, i: usize) -> Option<GrammarError> {
    let marker = words.past_marker?;
    if words.has_past_verb {
        return None;
    }
    words.subject(i)?;

    let form = words.form(i)?;
    let (base, past, _) = verb_by_base(form).or_else(|| verb_by_third(form))?;
    if matches!(base, "have" | "do") || past == base {
        return None;
    }

    let suggestion = match_case(words.original(i), past);
    let explanation = format!("Use the past tense \"{suggestion}\" with \"{marker}\".");
    Some(words.error(i, suggestion, explanation))
}

fn agreement(words: &Words<'_, '_>, i: usize) -> Option<GrammarError> {
    if words.past_marker.is_some() {
        return None;
    }
    let (number, subject) = words.subject(i)?;
    let form = words.form(i)?;

    let replacement = match number {
        Number::Singular => {
            let (base, past, third) = verb_by_base(form)?;
            (past != base && !is_in(AGREEMENT_EXCEPTIONS, base)).then_some(third)?
        }
        Number::Plural => {
            let (base, past, _) = verb_by_third(form)?;
            (past != base && !is_in(AGREEMENT_EXCEPTIONS, base)).then_some(base)?
        }
    };

    let suggestion = match_case(words.original(i), replacement);
    let explanation = format!("\"{subject}\" takes \"{suggestion}\".");
    Some(words.error(i, suggestion, explanation))
}

fn have_after_modal(words: &Words<'_, '_>, i: usize) -> Option<GrammarError> {
    let modal = words.adjacent_prev(i)?;
    if !is_in(MODALS, modal) || words.form(i)? != "of" || words.form(i + 1) == Some("course") {
        return None;
    }

    let suggestion = match_case(words.original(i), "have");
    let explanation = format!("Use \"{modal} have\", not \"{modal} of\".");
    Some(words.error(i, suggestion, explanation))
}

fn than_after_comparative(words: &Words<'_, '_>, i: usize) -> Option<GrammarError> {
    let comparative = words.adjacent_prev(i)?;
    if !is_in(COMPARATIVES, comparative) || words.form(i)? != "then" {
        return None;
    }

    let suggestion = match_case(words.original(i), "than");
    Some(words.error(i, suggestion, "Comparisons use \"than\".".to_string()))
}

fn were_after_plural(words: &Words<'_, '_>, i: usize) -> Option<GrammarError> {
    let (number, subject) = words.subject(i)?;
    if number != Number::Plural || subject == "i" || words.form(i)? != "was" {
        return None;
    }

    let suggestion = match_case(words.original(i), "were");
    let explanation = format!("\"{subject}\" takes \"{suggestion}\".");
    Some(words.error(i, suggestion, explanation))
}

fn base_after_to(words: &Words<'_, '_>, i: usize) -> Option<GrammarError> {
    if words.adjacent_prev(i)? != "to" {
        return None;
    }
    let form = words.form(i)?;
    let &(_, base) = BASE_AFTER_TO.iter().find(|&&(wrong, _)| wrong == form)?;

    let suggestion = match_case(words.original(i), base);
    let explanation = format!("Use the base form \"{suggestion}\" after \"to\".");
    Some(words.error(i, suggestion, explanation))
}

fn adverb_after_verb(words: &Words<'_, '_>, i: usize) -> Option<GrammarError> {
    let verb = words.adjacent_prev(i)?;
    if !is_in(ACTION_VERBS, verb) {
        return None;
    }
    let form = words.form(i)?;
    let &(_, adverb) = ADVERBS.iter().find(|&&(adjective, _)| adjective == form)?;
    if words.form(i + 1).is_some_and(|next| !is_in(CLAUSE_BREAKS, next)) {
        return None;
    }

    let suggestion = match_case(words.original(i), adverb);
    let explanation = format!("Use the adverb \"{suggestion}\" to describe how someone {verb}.");
    Some(words.error(i, suggestion, explanation))
}

fn not_enough(words: &Words<'_, '_>, i: usize) -> Option<GrammarError> {
    if words.form(i)? != "no" || words.adjacent_next(i)? != "enough" {
        return None;
    }

    let suggestion = match_case(words.original(i), "not");
    Some(words.error(i, suggestion, "Use \"not enough\".".to_string()))
}

fn preposition_after_verb(words: &Words<'_, '_>, i: usize) -> Option<GrammarError> {
    let verb = words.adjacent_prev(i)?;
    let form = words.form(i)?;
    let &(_, _, right) = PREPOSITIONS
        .iter()
        .find(|&&(v, wrong, _)| v == verb && wrong == form)?;

    let suggestion = match_case(words.original(i), right);
    let explanation = format!("The usual phrase is \"{verb} {right}\".");
    Some(words.error(i, suggestion, explanation))
}
