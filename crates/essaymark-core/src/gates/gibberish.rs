//! Gibberish detection.
//!
//! Four signals (noise patterns, invalid words, repetition, structure) are
//! blended into a raw score, then damped for long and sophisticated answers so
//! that an occasional noisy token in a real essay costs little.

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::config::GibberishConfig;
use crate::lexical::has_char_run;
use crate::lexicon::{Lexicon, MarkerKind};
use crate::text::TextProfile;

static LONG_RUN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[a-z]{21,}").unwrap());
static INTERLEAVED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:[a-z]+[0-9]+){2,}|(?:[0-9]+[a-z]+){2,}").unwrap());

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct GibberishReport {
    pub pattern: f64,
    pub invalid_words: f64,
    pub repetition: f64,
    pub structural: f64,
    /// Weighted blend before damping.
    pub raw: f64,
    /// Final score in `[0, 1]`; 0 is coherent text, 1 pure noise.
    pub score: f64,
}

pub struct GibberishDetector<'a> {
    lexicon: &'a Lexicon,
    config: &'a GibberishConfig,
}

impl<'a> GibberishDetector<'a> {
    pub fn new(lexicon: &'a Lexicon, config: &'a GibberishConfig) -> Self {
        Self { lexicon, config }
    }

    pub fn detect(&self, profile: &TextProfile) -> GibberishReport {
        if profile.is_empty() {
            return GibberishReport::default();
        }

        let pattern = self.pattern_signal(profile);
        let invalid_words = self.invalid_word_ratio(profile);
        let repetition = repetition_signal(profile);
        let structural = self.structural_signal(profile);

        let cfg = self.config;
        let raw = (cfg.pattern_weight * pattern
            + cfg.invalid_word_weight * invalid_words
            + cfg.repetition_weight * repetition
            + cfg.structural_weight * structural)
            .clamp(0.0, 1.0);
        let score = (raw * self.length_damping(profile) * self.sophistication_damping(profile))
            .clamp(0.0, 1.0);

        GibberishReport {
            pattern,
            invalid_words,
            repetition,
            structural,
            raw,
            score,
        }
    }

    /// Share of words showing a noise pattern.
    fn pattern_signal(&self, profile: &TextProfile) -> f64 {
        let flagged = profile
            .words
            .iter()
            .filter(|w| {
                LONG_RUN_RE.is_match(w)
                    || INTERLEAVED_RE.is_match(w)
                    || has_char_run(w, 4)
                    || self.lexicon.has_keyboard_sequence(w, 4)
            })
            .count();
        flagged as f64 / profile.word_count() as f64
    }

    fn invalid_word_ratio(&self, profile: &TextProfile) -> f64 {
        let invalid = profile.words.iter().filter(|w| !self.is_valid_word(w)).count();
        invalid as f64 / profile.word_count() as f64
    }

    fn is_valid_word(&self, word: &str) -> bool {
        if self.lexicon.is_common(word) {
            return true;
        }
        let len = word.chars().count();
        if len < 4 || !word.chars().all(|c| c.is_alphabetic()) {
            return false;
        }
        let vowels = word
            .chars()
            .filter(|c| matches!(c, 'a' | 'e' | 'i' | 'o' | 'u' | 'y'))
            .count();
        let vowel_ratio = vowels as f64 / len as f64;
        (self.config.min_vowel_ratio..=self.config.max_vowel_ratio).contains(&vowel_ratio)
            && !has_char_run(word, 3)
            && !self.lexicon.has_keyboard_sequence(word, 4)
    }

    fn length_damping(&self, profile: &TextProfile) -> f64 {
        let chars = profile.raw.chars().count();
        let start = self.config.damping_start_chars;
        let end = self.config.damping_end_chars.max(start + 1);
        if chars <= start {
            return 1.0;
        }
        let progress = ((chars - start) as f64 / (end - start) as f64).min(1.0);
        1.0 - (1.0 - self.config.damping_floor) * progress
    }

    fn sophistication_damping(&self, profile: &TextProfile) -> f64 {
        let markers: usize = [MarkerKind::Academic, MarkerKind::Causal, MarkerKind::Transition]
            .iter()
            .map(|kind| self.lexicon.count_markers(&profile.padded, *kind))
            .sum();
        1.0 - self.config.sophistication_damping * (markers as f64 / 5.0).min(1.0)
    }

    /// Share of failed structural checks: missing sentence punctuation on longer
    /// text, implausibly long tokens, and too little whitespace.
    fn structural_signal(&self, profile: &TextProfile) -> f64 {
        let mut failed = 0;
        if profile.word_count() > 15 && !profile.raw.contains(['.', '!', '?']) {
            failed += 1;
        }
        let letters: usize = profile.words.iter().map(|w| w.chars().count()).sum();
        if letters as f64 / profile.word_count() as f64 > self.config.max_average_word_chars {
            failed += 1;
        }
        let chars = profile.raw.chars().count();
        if chars >= 20 {
            let whitespace = profile.raw.chars().filter(|c| c.is_whitespace()).count();
            if (whitespace as f64 / chars as f64) < self.config.min_whitespace_ratio {
                failed += 1;
            }
        }
        f64::from(failed) / 3.0
    }
}

/// Repeated word trigrams, or a very low type-token ratio on longer texts.
fn repetition_signal(profile: &TextProfile) -> f64 {
    let trigrams = profile.word_trigrams();
    let trigram_repetition = if trigrams.len() >= 3 {
        let distinct: BTreeSet<_> = trigrams.iter().collect();
        1.0 - distinct.len() as f64 / trigrams.len() as f64
    } else {
        0.0
    };
    let token_repetition = if profile.word_count() >= 10 {
        ((0.5 - profile.type_token_ratio()) / 0.5).clamp(0.0, 1.0)
    } else {
        0.0
    };
    trigram_repetition.max(token_repetition)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detect(text: &str) -> GibberishReport {
        let lexicon = Lexicon::builtin().unwrap();
        let config = GibberishConfig::default();
        let profile = TextProfile::new(text, &lexicon);
        GibberishDetector::new(&lexicon, &config).detect(&profile)
    }

    #[test]
    fn keyboard_mashing_scores_high() {
        let text = "asdfghjkl qwertyuiop zxcvbnm ".repeat(7);
        let report = detect(&text);
        assert_eq!(report.pattern, 1.0);
        assert_eq!(report.invalid_words, 1.0);
        assert!(report.score > 0.7, "score was {}", report.score);
    }

    #[test]
    fn coherent_prose_scores_low() {
        let report = detect(
            "Inheritance allows a class to derive attributes and methods from a parent class. \
             Therefore, code can be reused across related types.",
        );
        assert!(report.score < 0.2, "score was {}", report.score);
        assert_eq!(report.pattern, 0.0);
    }

    #[test]
    fn empty_text_is_not_gibberish() {
        assert_eq!(detect("").score, 0.0);
    }

    #[test]
    fn damping_reduces_long_sophisticated_text() {
        let lexicon = Lexicon::builtin().unwrap();
        let config = GibberishConfig::default();
        let detector = GibberishDetector::new(&lexicon, &config);
        let short = TextProfile::new("word", &lexicon);
        let long = TextProfile::new(&"word ".repeat(300), &lexicon);
        assert_eq!(detector.length_damping(&short), 1.0);
        assert!((detector.length_damping(&long) - 0.5).abs() < 1e-9);

        let plain = TextProfile::new("cats sleep", &lexicon);
        let rich = TextProfile::new(
            "therefore thus hence moreover furthermore because however",
            &lexicon,
        );
        assert_eq!(detector.sophistication_damping(&plain), 1.0);
        assert!((detector.sophistication_damping(&rich) - 0.6).abs() < 1e-9);
    }

    #[test]
    fn structural_limits_follow_config() {
        let lexicon = Lexicon::builtin().unwrap();
        let text = "Encapsulation hides state. Inheritance reuses classes.";
        let profile = TextProfile::new(text, &lexicon);

        let config = GibberishConfig::default();
        let detector = GibberishDetector::new(&lexicon, &config);
        assert_eq!(detector.structural_signal(&profile), 0.0);

        let strict = GibberishConfig {
            max_average_word_chars: 5.0,
            min_whitespace_ratio: 0.5,
            ..GibberishConfig::default()
        };
        let detector = GibberishDetector::new(&lexicon, &strict);
        assert!((detector.structural_signal(&profile) - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn vowel_limits_follow_config() {
        let lexicon = Lexicon::builtin().unwrap();
        let config = GibberishConfig::default();
        assert!(GibberishDetector::new(&lexicon, &config).is_valid_word("crypts"));

        let strict = GibberishConfig {
            min_vowel_ratio: 0.3,
            ..GibberishConfig::default()
        };
        assert!(!GibberishDetector::new(&lexicon, &strict).is_valid_word("crypts"));
    }

    #[test]
    fn interleaved_digits_are_flagged() {
        let report = detect("a1b2c3d4 x9y8z7");
        assert_eq!(report.pattern, 1.0);
    }
}
