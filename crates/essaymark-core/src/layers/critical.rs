use crate::context::ScoringContext;
use crate::error::ScoringError;
use crate::lexicon::MarkerKind;
use crate::model::{LayerKind, LayerScore};

use super::{Blend, LayerScorer};

const COMPONENTS: [(&str, MarkerKind); 8] = [
    ("analyticalDepth", MarkerKind::Causal),
    ("logicalReasoning", MarkerKind::Logic),
    ("evidenceEvaluation", MarkerKind::Evidence),
    ("counterArguments", MarkerKind::Counter),
    ("synthesis", MarkerKind::Synthesis),
    ("evaluation", MarkerKind::Evaluation),
    ("creativity", MarkerKind::Innovation),
    ("metacognition", MarkerKind::Metacognitive),
];

/// Reasoning language relative to the reference, equally weighted.
pub struct CriticalThinking;

impl LayerScorer for CriticalThinking {
    fn kind(&self) -> LayerKind {
        LayerKind::CriticalThinking
    }

    fn score(&self, ctx: &ScoringContext<'_>, max_score: f64) -> Result<LayerScore, ScoringError> {
        let blend = COMPONENTS
            .iter()
            .fold(Blend::new(), |blend, (name, kind)| {
                blend.add(name, 1.0, ctx.grounded(*kind))
            });
        Ok(blend.finish(max_score))
    }
}
