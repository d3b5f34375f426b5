use crate::context::{relative_value, ScoringContext};
use crate::error::ScoringError;
use crate::lexicon::MarkerKind;
use crate::model::{LayerKind, LayerScore};

use super::{mean, Blend, LayerScorer};

/// Whether the answer carries the reference's meaning, not just its words.
pub struct SemanticUnderstanding;

impl LayerScorer for SemanticUnderstanding {
    fn kind(&self) -> LayerKind {
        LayerKind::SemanticUnderstanding
    }

    fn score(&self, ctx: &ScoringContext<'_>, max_score: f64) -> Result<LayerScore, ScoringError> {
        // nuance, implication, relationship, abstraction, precision
        let depth = mean(&[
            ctx.grounded(MarkerKind::Counter),
            ctx.grounded(MarkerKind::Causal),
            ctx.grounded(MarkerKind::Relationship),
            ctx.abstraction(),
            ctx.technical_precision(),
        ]);

        let student_coherence = ctx.coherence(&ctx.student);
        let reference_coherence = ctx.coherence(&ctx.reference);
        let coherence = relative_value(student_coherence, reference_coherence) * ctx.grounding;

        Ok(Blend::new()
            .add("conceptAlignment", 0.30, ctx.grounding)
            .add("semanticDepth", 0.20, depth)
            .add("meaningPreservation", 0.20, ctx.similarity.meaning_preservation())
            .add("contextualUnderstanding", 0.15, ctx.similarity.overlap_recall)
            .add("coherence", 0.15, coherence)
            .finish(max_score))
    }
}
