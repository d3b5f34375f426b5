use crate::context::{relative_count, ScoringContext};
use crate::error::ScoringError;
use crate::lexicon::MarkerKind;
use crate::model::{LayerKind, LayerScore};
use crate::text::TextProfile;

use super::{Blend, LayerScorer};

const IDEAL_SENTENCE_WORDS: (f64, f64) = (8.0, 30.0);
const LONG_SENTENCE_WORDS: usize = 35;

/// Surface writing quality, scaled by grounding so fluent off-topic prose
/// earns nothing.
pub struct WritingQuality;

impl LayerScorer for WritingQuality {
    fn kind(&self) -> LayerKind {
        LayerKind::WritingQuality
    }

    fn score(&self, ctx: &ScoringContext<'_>, max_score: f64) -> Result<LayerScore, ScoringError> {
        let student = &ctx.student;
        if student.is_empty() {
            return Ok(LayerScore::zero(max_score));
        }

        let advanced = relative_count(
            ctx.advanced_word_count(student),
            ctx.advanced_word_count(&ctx.reference),
        );
        let vocabulary = 0.7 * (student.type_token_ratio() / 0.6).min(1.0) + 0.3 * advanced;

        let long_sentences = student
            .sentences
            .iter()
            .filter(|s| s.words.len() > LONG_SENTENCE_WORDS)
            .count();
        let clarity = 1.0 - long_sentences as f64 / student.sentence_count().max(1) as f64;

        let filler = ctx.lexicon.count_markers(&student.padded, MarkerKind::Filler);
        let concision = 1.0 - (filler as f64 / student.word_count() as f64 * 10.0).min(1.0);

        Ok(Blend::new()
            .add("grammar", 0.20, 1.0 - grammar_error_rate(student))
            .add("vocabulary", 0.20, vocabulary)
            .add("structure", 0.15, sentence_structure(student.average_sentence_words()))
            .add("academicStyle", 0.15, ctx.relative(MarkerKind::Academic))
            .add("clarity", 0.10, clarity)
            .add("concision", 0.10, concision)
            .add("flow", 0.10, ctx.relative(MarkerKind::Transition))
            .finish_scaled(ctx.grounding, max_score))
    }
}

/// Grammar-error proxies per sentence, in `[0, 1]`.
///
/// Counts sentences starting lower-case, sentences without terminal
/// punctuation, a lower-case pronoun "i" and immediately doubled words.
pub fn grammar_error_rate(profile: &TextProfile) -> f64 {
    if profile.sentences.is_empty() {
        return 0.0;
    }
    let sentence_errors: usize = profile
        .sentences
        .iter()
        .map(|s| usize::from(!s.starts_capitalized()) + usize::from(!s.is_terminated()))
        .sum();
    let lower_i = profile
        .raw
        .split_whitespace()
        .filter(|w| w.trim_matches(|c: char| !c.is_alphanumeric()) == "i")
        .count();
    let doubled = profile
        .words
        .windows(2)
        .filter(|w| w[0] == w[1] && w[0].chars().all(char::is_alphabetic))
        .count();
    let errors = sentence_errors + lower_i + doubled;
    (errors as f64 / profile.sentence_count() as f64).min(1.0)
}

fn sentence_structure(average_words: f64) -> f64 {
    let (low, high) = IDEAL_SENTENCE_WORDS;
    if average_words <= 0.0 {
        0.0
    } else if average_words < low {
        average_words / low
    } else if average_words <= high {
        1.0
    } else {
        (1.0 - (average_words - high) / high).max(0.0)
    }
}
