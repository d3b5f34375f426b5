//! Off-topic detection.
//!
//! The penalty accrues from shortfalls in similarity, concept alignment and
//! topical coherence below fixed thresholds, plus vocabulary from known
//! unrelated subjects. It is forgiven in part when the answer shares domain
//! terms with the reference and capped so topic mismatch alone never zeroes a
//! score.

use serde::Serialize;

use crate::config::OffTopicConfig;
use crate::context::ScoringContext;
use crate::lexicon::MarkerKind;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct OffTopicReport {
    pub similarity: f64,
    pub alignment: f64,
    pub coherence: f64,
    /// Unrelated-subject signal in `[0, 1]`.
    pub unrelated: f64,
    /// Final penalty in `[0, max_penalty]`.
    pub penalty: f64,
}

pub struct OffTopicDetector<'a> {
    config: &'a OffTopicConfig,
}

impl<'a> OffTopicDetector<'a> {
    pub fn new(config: &'a OffTopicConfig) -> Self {
        Self { config }
    }

    pub fn detect(&self, ctx: &ScoringContext<'_>) -> OffTopicReport {
        if ctx.student.is_empty() {
            return OffTopicReport::default();
        }

        let cfg = self.config;
        let similarity = ctx.similarity.cosine;
        let alignment = ctx.coverage().max(ctx.similarity.jaccard);
        let coherence = topical_coherence(ctx);
        let unrelated = unrelated_signal(ctx, cfg.unrelated_saturation);

        let mut penalty = shortfall(similarity, cfg.similarity_threshold, cfg.similarity_penalty)
            + shortfall(alignment, cfg.alignment_threshold, cfg.alignment_penalty)
            + shortfall(coherence, cfg.coherence_threshold, cfg.coherence_penalty)
            + cfg.unrelated_penalty * unrelated;

        let overlap = ctx.factual_presence();
        penalty *= 1.0 - cfg.overlap_forgiveness * (cfg.overlap_scale * overlap).min(1.0);
        if similarity.max(ctx.coverage()) > cfg.relevance_override {
            penalty *= cfg.relevance_override_factor;
        }

        OffTopicReport {
            similarity,
            alignment,
            coherence,
            unrelated,
            penalty: penalty.clamp(0.0, cfg.max_penalty),
        }
    }
}

/// Linear penalty for falling short of `threshold`, reaching `max` at zero.
fn shortfall(value: f64, threshold: f64, max: f64) -> f64 {
    if threshold <= 0.0 || value >= threshold {
        0.0
    } else {
        max * (threshold - value.max(0.0)) / threshold
    }
}

/// Share of student sentences touching reference vocabulary, plus a small
/// contribution from transitions between them.
fn topical_coherence(ctx: &ScoringContext<'_>) -> f64 {
    let sentences = &ctx.student.sentences;
    if sentences.is_empty() {
        return 0.0;
    }
    let reference = ctx.reference.stem_set();
    let on_topic = sentences
        .iter()
        .filter(|s| s.stems.iter().any(|stem| reference.contains(stem.as_str())))
        .count();
    let transitions = if sentences.len() > 1 {
        let (count, _) = ctx.markers(MarkerKind::Transition);
        (count as f64 / (sentences.len() - 1) as f64).min(1.0)
    } else {
        0.0
    };
    0.8 * on_topic as f64 / sentences.len() as f64 + 0.2 * transitions
}

/// Vocabulary from unrelated subjects that the reference does not use, or an
/// explicit refusal. Saturates at `saturation` hits.
fn unrelated_signal(ctx: &ScoringContext<'_>, saturation: f64) -> f64 {
    if ctx.lexicon.count_refusals(&ctx.student.padded) > 0 {
        return 1.0;
    }
    let reference = ctx.reference.stem_set();
    let student = ctx.student.stem_set();
    let hits = ctx
        .lexicon
        .unrelated_topics()
        .map(|(_, vocabulary)| {
            student
                .iter()
                .filter(|s| vocabulary.contains(**s) && !reference.contains(*s))
                .count()
        })
        .max()
        .unwrap_or(0);
    if saturation <= 0.0 {
        return if hits > 0 { 1.0 } else { 0.0 };
    }
    (hits as f64 / saturation).min(1.0)
}
