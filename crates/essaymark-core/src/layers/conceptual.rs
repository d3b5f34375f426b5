use crate::context::ScoringContext;
use crate::error::ScoringError;
use crate::lexicon::MarkerKind;
use crate::model::{LayerKind, LayerScore};

use super::{Blend, LayerScorer};

pub struct ConceptualDepth;

impl LayerScorer for ConceptualDepth {
    fn kind(&self) -> LayerKind {
        LayerKind::ConceptualDepth
    }

    fn score(&self, ctx: &ScoringContext<'_>, max_score: f64) -> Result<LayerScore, ScoringError> {
        Ok(Blend::new()
            .add("relationships", 1.0, ctx.grounded(MarkerKind::Relationship))
            .add("conceptMatches", 1.0, ctx.graduated())
            .add("abstraction", 1.0, ctx.abstraction())
            .finish(max_score))
    }
}
