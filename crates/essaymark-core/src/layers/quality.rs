use crate::context::{relative_count, ScoringContext};
use crate::error::ScoringError;
use crate::lexicon::MarkerKind;
use crate::model::{LayerKind, LayerScore};

use super::{Blend, LayerScorer};

/// Separates good answers from excellent ones.
pub struct QualityDifferentiation;

impl LayerScorer for QualityDifferentiation {
    fn kind(&self) -> LayerKind {
        LayerKind::QualityDifferentiation
    }

    fn score(&self, ctx: &ScoringContext<'_>, max_score: f64) -> Result<LayerScore, ScoringError> {
        let structure = relative_count(ctx.student.sentence_count(), ctx.reference.sentence_count());
        let comprehensiveness = 0.6 * ctx.breadth() + 0.4 * structure * ctx.grounding;

        Ok(Blend::new()
            .add("sophistication", 0.25, ctx.sophistication())
            .add("comprehensiveness", 0.25, comprehensiveness)
            .add(
                "insightDepth",
                0.20,
                ctx.grounded_sum(&[MarkerKind::Causal, MarkerKind::Evaluation]),
            )
            .add(
                "argumentation",
                0.15,
                ctx.grounded_sum(&[MarkerKind::Causal, MarkerKind::Evidence]),
            )
            .add("innovation", 0.15, ctx.grounded(MarkerKind::Innovation))
            .finish(max_score))
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::with_context;
    use super::*;

    #[test]
    fn richer_answer_scores_higher() {
        let thin = with_context("OOP uses objects.", |ctx| {
            QualityDifferentiation.score(ctx, 2.0).unwrap()
        });
        let rich = with_context(
            "Object-oriented programming is a paradigm that organises software around objects. \
             Encapsulation hides internal state because objects expose only an interface. \
             Inheritance promotes code reuse, which is essential for maintainable hierarchies. \
             Polymorphism lets different classes share a common interface.",
            |ctx| QualityDifferentiation.score(ctx, 2.0).unwrap(),
        );
        assert!(rich.score > thin.score);
        assert!(rich.metrics["comprehensiveness"] > thin.metrics["comprehensiveness"]);
    }
}
