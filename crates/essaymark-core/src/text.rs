//! Text normalisation and the per-text token profile shared by every analyzer.

use std::collections::{BTreeMap, BTreeSet};

use once_cell::sync::Lazy;
use regex::Regex;

use crate::lexical::stem;
use crate::lexicon::Lexicon;

static SENTENCE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^.!?\n]+[.!?]*").unwrap());

/// Lower-case, drop apostrophes, replace every other non-alphanumeric character
/// with a space and collapse whitespace.
pub fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_space = false;
    for c in text.chars() {
        if c.is_alphanumeric() {
            if pending_space && !out.is_empty() {
                out.push(' ');
            }
            pending_space = false;
            out.extend(c.to_lowercase());
        } else if c == '\'' || c == '\u{2019}' {
            continue;
        } else {
            pending_space = true;
        }
    }
    out
}

/// Truncate to at most `max_chars` characters on a char boundary.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// One sentence of the original text.
#[derive(Debug, Clone)]
pub struct Sentence {
    /// Trimmed source text including terminal punctuation.
    pub raw: String,
    pub normalized: String,
    pub words: Vec<String>,
    /// Stems of the content tokens, in order.
    pub stems: Vec<String>,
}

impl Sentence {
    pub fn is_terminated(&self) -> bool {
        self.raw.ends_with(['.', '!', '?'])
    }

    pub fn starts_capitalized(&self) -> bool {
        self.raw
            .chars()
            .find(|c| c.is_alphanumeric())
            .map_or(true, |c| !c.is_lowercase())
    }
}

/// Tokens, stems and sentences of a text, computed once per request.
#[derive(Debug, Clone)]
pub struct TextProfile {
    pub raw: String,
    pub normalized: String,
    /// Normalised text wrapped in single spaces, for phrase counting.
    pub padded: String,
    pub words: Vec<String>,
    /// Words that are not stop words, have at least three characters and are not numbers.
    /// Every word when none qualify.
    pub content_tokens: Vec<String>,
    pub stems: Vec<String>,
    pub sentences: Vec<Sentence>,
}

impl TextProfile {
    pub fn new(raw: &str, lexicon: &Lexicon) -> Self {
        let normalized = normalize(raw);
        let words: Vec<String> = normalized.split_whitespace().map(str::to_string).collect();
        // A text made only of short words, numbers or stop words keeps all of them.
        let keep_all = !words.iter().any(|w| is_content_token(w, lexicon));
        let content_tokens: Vec<String> = words
            .iter()
            .filter(|w| keep_all || is_content_token(w, lexicon))
            .cloned()
            .collect();
        let stems = content_tokens.iter().map(|t| stem(t)).collect();

        let sentences = SENTENCE_RE
            .find_iter(raw)
            .filter_map(|m| {
                let raw = m.as_str().trim();
                let normalized = normalize(raw);
                if normalized.is_empty() {
                    return None;
                }
                let words: Vec<String> =
                    normalized.split_whitespace().map(str::to_string).collect();
                let stems = words
                    .iter()
                    .filter(|w| keep_all || is_content_token(w, lexicon))
                    .map(|w| stem(w))
                    .collect();
                Some(Sentence {
                    raw: raw.to_string(),
                    normalized,
                    words,
                    stems,
                })
            })
            .collect();

        Self {
            raw: raw.to_string(),
            padded: format!(" {normalized} "),
            normalized,
            words,
            content_tokens,
            stems,
            sentences,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn word_count(&self) -> usize {
        self.words.len()
    }

    pub fn sentence_count(&self) -> usize {
        self.sentences.len()
    }

    pub fn stem_set(&self) -> BTreeSet<&str> {
        self.stems.iter().map(String::as_str).collect()
    }

    pub fn stem_frequencies(&self) -> BTreeMap<&str, usize> {
        let mut freq = BTreeMap::new();
        for s in &self.stems {
            *freq.entry(s.as_str()).or_insert(0) += 1;
        }
        freq
    }

    /// Adjacent content-stem pairs within each sentence.
    pub fn stem_bigrams(&self) -> BTreeSet<(&str, &str)> {
        self.sentences
            .iter()
            .flat_map(|s| s.stems.windows(2).map(|w| (w[0].as_str(), w[1].as_str())))
            .collect()
    }

    /// Word trigrams over the whole text, in order.
    pub fn word_trigrams(&self) -> Vec<(&str, &str, &str)> {
        self.words
            .windows(3)
            .map(|w| (w[0].as_str(), w[1].as_str(), w[2].as_str()))
            .collect()
    }

    /// Distinct words over total words, or 0 for an empty text.
    pub fn type_token_ratio(&self) -> f64 {
        if self.words.is_empty() {
            return 0.0;
        }
        let distinct: BTreeSet<&String> = self.words.iter().collect();
        distinct.len() as f64 / self.words.len() as f64
    }

    pub fn average_sentence_words(&self) -> f64 {
        if self.sentences.is_empty() {
            return 0.0;
        }
        self.word_count() as f64 / self.sentences.len() as f64
    }
}

fn is_content_token(word: &str, lexicon: &Lexicon) -> bool {
    word.chars().count() >= 3
        && !word.chars().all(|c| c.is_ascii_digit())
        && !lexicon.is_stopword(word)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_punctuation() {
        assert_eq!(normalize("  Hello, World!  "), "hello world");
        assert_eq!(normalize("Object-oriented (OOP)"), "object oriented oop");
        assert_eq!(normalize("don't stop"), "dont stop");
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("?!..."), "");
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars("abc", 0), "");
    }

    #[test]
    fn profile_splits_sentences() {
        let lexicon = Lexicon::builtin().unwrap();
        let profile = TextProfile::new(
            "Encapsulation hides data. Inheritance reuses classes!\nno terminator",
            &lexicon,
        );
        assert_eq!(profile.sentence_count(), 3);
        assert!(profile.sentences[0].is_terminated());
        assert!(!profile.sentences[2].is_terminated());
        assert!(!profile.sentences[2].starts_capitalized());
        assert_eq!(profile.sentences[1].stems, vec!["inheritanc", "reus", "class"]);
        assert!(profile.stem_set().contains("encapsul"));
    }

    #[test]
    fn profile_filters_stopwords_and_numbers() {
        let lexicon = Lexicon::builtin().unwrap();
        let profile = TextProfile::new("It is the 2024 model of an engine", &lexicon);
        assert_eq!(profile.content_tokens, vec!["model", "engine"]);
        assert_eq!(profile.word_count(), 8);
    }

    #[test]
    fn profile_without_content_words_keeps_every_word() {
        let lexicon = Lexicon::builtin().unwrap();
        let profile = TextProfile::new("No, it is not.", &lexicon);
        assert_eq!(profile.content_tokens, vec!["no", "it", "is", "not"]);
        assert_eq!(profile.sentences[0].stems.len(), 4);

        let number = TextProfile::new("1789", &lexicon);
        assert_eq!(number.content_tokens, vec!["1789"]);
        assert_eq!(number.stems, vec!["1789"]);
    }

    #[test]
    fn empty_profile() {
        let lexicon = Lexicon::builtin().unwrap();
        let profile = TextProfile::new("", &lexicon);
        assert!(profile.is_empty());
        assert_eq!(profile.type_token_ratio(), 0.0);
        assert_eq!(profile.average_sentence_words(), 0.0);
        assert!(profile.stem_bigrams().is_empty());
    }
}
