use crate::context::{relative_count, relative_value, ScoringContext};
use crate::error::ScoringError;
use crate::model::{LayerKind, LayerScore};

use super::{Blend, LayerScorer};

/// Bloom level and syntactic complexity relative to the reference.
pub struct CognitiveComplexity;

impl LayerScorer for CognitiveComplexity {
    fn kind(&self) -> LayerKind {
        LayerKind::CognitiveComplexity
    }

    fn score(&self, ctx: &ScoringContext<'_>, max_score: f64) -> Result<LayerScore, ScoringError> {
        let student_level = ctx.bloom_level(&ctx.student);
        let reference_level = ctx.bloom_level(&ctx.reference);
        let bloom = ctx.grounding
            * relative_count(usize::from(student_level), usize::from(reference_level));
        let subordination = ctx.grounding
            * relative_value(ctx.subordination(&ctx.student), ctx.subordination(&ctx.reference));

        Ok(Blend::new()
            .add("bloomLevel", 0.40, bloom)
            .add("subordination", 0.30, subordination)
            .add("conceptMatches", 0.30, ctx.graduated())
            .note("studentBloomLevel", f64::from(student_level))
            .finish(max_score))
    }
}
