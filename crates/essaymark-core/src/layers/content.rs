use crate::context::ScoringContext;
use crate::error::ScoringError;
use crate::lexicon::MarkerKind;
use crate::model::{LayerKind, LayerScore};
use crate::text::TextProfile;

use super::{Blend, LayerScorer};

/// Penalty per student term that belongs to an unrelated subject domain.
const WRONG_DOMAIN_PENALTY: f64 = 0.1;
const MAX_WRONG_DOMAIN_PENALTY: f64 = 0.5;

/// How much of the reference's substance the answer reproduces.
///
/// Every component only grows as the student adds text the reference
/// supports, so appending correct material never lowers this layer.
pub struct ContentAccuracy;

impl LayerScorer for ContentAccuracy {
    fn kind(&self) -> LayerKind {
        LayerKind::ContentAccuracy
    }

    fn score(&self, ctx: &ScoringContext<'_>, max_score: f64) -> Result<LayerScore, ScoringError> {
        let g = ctx.grounding;
        let wrong_terms = ctx.wrong_domain_terms();
        let wrong_penalty =
            (WRONG_DOMAIN_PENALTY * wrong_terms as f64).min(MAX_WRONG_DOMAIN_PENALTY);
        let factual = (ctx.factual_presence() - wrong_penalty).max(0.0);

        Ok(Blend::new()
            .add("coverage", 0.40, g)
            .add("factual", 0.15, factual)
            .add("completeness", 0.15, completeness(ctx))
            .add("relevance", 0.10, ctx.similarity.overlap_recall)
            .add("analyticalDepth", 0.05, ctx.grounded(MarkerKind::Causal))
            .add("breadth", 0.10, ctx.breadth())
            .add("precision", 0.03, ctx.technical_precision())
            .add("currency", 0.02, ctx.grounded(MarkerKind::Modern))
            .note("wrongDomainTerms", wrong_terms as f64)
            .finish(max_score))
    }
}

/// Elements of a complete answer, checked on both texts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Checklist {
    definition: bool,
    explanation: bool,
    terminology: bool,
    elaboration: bool,
    example: bool,
}

impl Checklist {
    fn of(ctx: &ScoringContext<'_>, profile: &TextProfile, specialist_terms: usize) -> Self {
        let lexicon = ctx.lexicon;
        Self {
            definition: lexicon.count_markers(&profile.padded, MarkerKind::Definition) > 0,
            explanation: profile.sentence_count() >= 3
                || lexicon.count_markers(&profile.padded, MarkerKind::Causal) > 0,
            terminology: specialist_terms >= 3,
            elaboration: !profile.content_tokens.is_empty()
                && profile.content_tokens.len() * 2 >= ctx.reference.content_tokens.len(),
            example: lexicon.count_markers(&profile.padded, MarkerKind::Example) > 0,
        }
    }

    fn items(&self) -> [bool; 5] {
        [
            self.definition,
            self.explanation,
            self.terminology,
            self.elaboration,
            self.example,
        ]
    }
}

/// Share of the checklist items the reference satisfies that the student
/// also satisfies; full marks when the reference sets no expectations.
fn completeness(ctx: &ScoringContext<'_>) -> f64 {
    if ctx.student.is_empty() {
        return 0.0;
    }
    let expected = Checklist::of(ctx, &ctx.reference, ctx.concepts.specialist_count());
    let achieved = Checklist::of(ctx, &ctx.student, ctx.concepts.matched_specialist_count());

    let required = expected.items().iter().filter(|x| **x).count();
    if required == 0 {
        return 1.0;
    }
    let met = expected
        .items()
        .iter()
        .zip(achieved.items())
        .filter(|(e, a)| **e && *a)
        .count();
    met as f64 / required as f64
}
