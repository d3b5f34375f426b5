use crate::context::{relative_count, ScoringContext};
use crate::error::ScoringError;
use crate::lexicon::MarkerKind;
use crate::model::{LayerKind, LayerScore};
use crate::text::TextProfile;

use super::{Blend, LayerScorer};

/// Domain-aware terminology, methodology and theory.
pub struct TechnicalPrecision;

impl LayerScorer for TechnicalPrecision {
    fn kind(&self) -> LayerKind {
        LayerKind::TechnicalPrecision
    }

    fn score(&self, ctx: &ScoringContext<'_>, max_score: f64) -> Result<LayerScore, ScoringError> {
        let domain_usage = ctx.grounding
            * relative_count(
                domain_term_count(ctx, &ctx.student),
                domain_term_count(ctx, &ctx.reference),
            );
        let terminology = 0.5 * ctx.factual_presence() + 0.5 * domain_usage;

        Ok(Blend::new()
            .add("terminology", 0.40, terminology)
            .add("conceptMatches", 0.30, ctx.graduated())
            .add("methodology", 0.15, ctx.grounded(MarkerKind::Methodology))
            .add("theory", 0.15, ctx.grounded(MarkerKind::Theory))
            .note("domain", ctx.domain as u8 as f64)
            .finish(max_score))
    }
}

/// Distinct stems from the detected domain's dictionary.
fn domain_term_count(ctx: &ScoringContext<'_>, profile: &TextProfile) -> usize {
    match ctx.lexicon.domain_terms(ctx.domain) {
        Some(terms) => profile
            .stem_set()
            .into_iter()
            .filter(|s| terms.contains(*s))
            .count(),
        None => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::with_context;
    use super::*;

    #[test]
    fn graduated_credit_for_partial_terminology() {
        let none = with_context("It is a thing that does stuff.", |ctx| {
            TechnicalPrecision.score(ctx, 0.8).unwrap()
        });
        let some = with_context("Objects, classes and methods.", |ctx| {
            TechnicalPrecision.score(ctx, 0.8).unwrap()
        });
        let many = with_context(
            "Encapsulation, inheritance and polymorphism organise objects, classes, methods, \
             attributes and interfaces in a programming paradigm.",
            |ctx| TechnicalPrecision.score(ctx, 0.8).unwrap(),
        );
        assert_eq!(none.score, 0.0);
        assert!(some.score > none.score);
        assert!(many.score > some.score);
    }
}
