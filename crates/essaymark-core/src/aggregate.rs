//! Score aggregation.
//!
//! The weighted layer total passes through three separately capped stages
//! (intelligence multiplier, bonuses, penalties) and then the gate
//! deductions, in that order. Layers never see any of these adjustments.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::config::AdjustmentConfig;
use crate::context::ScoringContext;
use crate::gates::GateReport;
use crate::layers::{grammar_error_rate, mean};
use crate::lexicon::MarkerKind;
use crate::model::{LayerKind, LayerScore, QuestionType};

/// Every intermediate value of one aggregation, in marks unless noted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Adjustments {
    /// Sum of layer scores.
    pub base: f64,
    /// Mean of the secondary sophistication signals, in `[0, 1]`.
    pub signal: f64,
    pub multiplier: f64,
    pub exceptional_bonus: f64,
    pub creative_bonus: f64,
    pub penalties: f64,
    pub gibberish_deduction: f64,
    pub off_topic_deduction: f64,
    /// Clamped to `[0, max_marks]`, before rounding.
    pub total: f64,
}

impl Adjustments {
    pub fn bonus_points(&self) -> f64 {
        self.exceptional_bonus + self.creative_bonus
    }

    pub fn rounded_total(&self) -> u32 {
        self.total.round() as u32
    }
}

pub struct ScoreAggregator<'a> {
    config: &'a AdjustmentConfig,
}

impl<'a> ScoreAggregator<'a> {
    pub fn new(config: &'a AdjustmentConfig) -> Self {
        Self { config }
    }

    /// Combine layer scores and gate results into an adjusted total.
    ///
    /// A non-finite `base` propagates into `total`; callers must check.
    pub fn aggregate(
        &self,
        ctx: &ScoringContext<'_>,
        layers: &BTreeMap<LayerKind, LayerScore>,
        gates: &GateReport,
        max_marks: f64,
    ) -> Adjustments {
        let cfg = self.config;
        let base: f64 = layers.values().map(|l| l.score).sum();

        let signal = intelligence_signal(ctx);
        let multiplier = (cfg.multiplier_base + cfg.multiplier_slope * signal)
            .clamp(cfg.multiplier_min, cfg.multiplier_max);

        let exceptional_bonus = self.exceptional_bonus(ctx, max_marks);
        let creative_bonus = self.creative_bonus(ctx, max_marks);
        let penalties = self.penalties(ctx, gates, max_marks);

        let adjusted = base * multiplier + exceptional_bonus + creative_bonus - penalties;
        let gibberish_deduction = adjusted.max(0.0) * gates.gibberish.score * cfg.gibberish_deduction;
        let off_topic_deduction = adjusted.max(0.0) * gates.off_topic.penalty * cfg.off_topic_deduction;
        let total = adjusted - gibberish_deduction - off_topic_deduction;

        Adjustments {
            base,
            signal,
            multiplier,
            exceptional_bonus,
            creative_bonus,
            penalties,
            gibberish_deduction,
            off_topic_deduction,
            total: total.clamp(0.0, max_marks),
        }
    }

    /// Rewards answers that both cover nearly every reference concept and
    /// read like the reference.
    fn exceptional_bonus(&self, ctx: &ScoringContext<'_>, max_marks: f64) -> f64 {
        let cfg = self.config;
        let coverage = ramp(ctx.coverage(), cfg.exceptional_coverage_floor);
        let similarity = ramp(ctx.similarity.cosine, cfg.exceptional_similarity_floor);
        (max_marks * cfg.exceptional_bonus_rate * coverage * similarity)
            .min(cfg.exceptional_bonus_cap * max_marks)
    }

    fn creative_bonus(&self, ctx: &ScoringContext<'_>, max_marks: f64) -> f64 {
        let cfg = self.config;
        let (examples, _) = ctx.markers(MarkerKind::Example);
        let (innovation, _) = ctx.markers(MarkerKind::Innovation);
        let raw = ctx.grounding
            * (cfg.example_bonus_rate * examples as f64
                + cfg.innovation_bonus_rate * innovation as f64)
            * max_marks;
        raw.min(cfg.creative_bonus_cap * max_marks)
    }

    fn penalties(&self, ctx: &ScoringContext<'_>, gates: &GateReport, max_marks: f64) -> f64 {
        let cfg = self.config;
        let grammar = cfg.grammar_penalty_rate * max_marks * grammar_error_rate(&ctx.student);

        let short_length = if ctx.question_type == Some(QuestionType::ShortAnswer) {
            0.0
        } else {
            let expected = ctx.reference.word_count() as f64 * cfg.short_length_ratio;
            let words = ctx.student.word_count() as f64;
            if expected > 0.0 && words < expected {
                cfg.short_length_penalty_rate * max_marks * (1.0 - words / expected)
            } else {
                0.0
            }
        };

        let repetition = if gates.gibberish.repetition > cfg.repetition_threshold {
            cfg.repetition_penalty_rate
                * max_marks
                * (gates.gibberish.repetition - cfg.repetition_threshold)
                / (1.0 - cfg.repetition_threshold).max(f64::EPSILON)
        } else {
            0.0
        };

        (grammar + short_length + repetition).min(cfg.penalty_cap * max_marks)
    }
}

/// Mean of the eight secondary signals behind the intelligence multiplier.
fn intelligence_signal(ctx: &ScoringContext<'_>) -> f64 {
    mean(&[
        ctx.coverage(),
        ctx.grounded(MarkerKind::Causal),
        ctx.advanced_vocabulary(),
        ctx.grounded(MarkerKind::Logic),
        ctx.grounded(MarkerKind::Innovation),
        ctx.similarity.cosine,
        ctx.grounded(MarkerKind::Synthesis),
        ctx.grounded(MarkerKind::Metacognitive),
    ])
    .clamp(0.0, 1.0)
}

/// Linear ramp from 0 at `floor` to 1 at 1.0.
fn ramp(value: f64, floor: f64) -> f64 {
    if floor >= 1.0 {
        return if value >= 1.0 { 1.0 } else { 0.0 };
    }
    ((value - floor) / (1.0 - floor)).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScoringConfig;
    use crate::layers::test_support::OOP_REFERENCE;
    use crate::layers::LayerRegistry;
    use crate::lexicon::Lexicon;

    fn aggregate(student: &str, max_marks: f64) -> Adjustments {
        let lexicon = Lexicon::builtin().unwrap();
        let config = ScoringConfig::default();
        let ctx = ScoringContext::build(student, OOP_REFERENCE, None, &lexicon, &config);
        let registry = LayerRegistry::standard(&config.weights);
        let layers: BTreeMap<LayerKind, LayerScore> = registry
            .layers()
            .iter()
            .map(|l| {
                let score = l.scorer.score(&ctx, l.weight * max_marks).unwrap();
                (l.scorer.kind(), score)
            })
            .collect();
        let gates = GateReport::evaluate(&ctx);
        ScoreAggregator::new(&config.adjustments).aggregate(&ctx, &layers, &gates, max_marks)
    }

    #[test]
    fn ramp_edges() {
        assert_eq!(ramp(0.5, 0.8), 0.0);
        assert!((ramp(0.9, 0.8) - 0.5).abs() < 1e-9);
        assert_eq!(ramp(1.0, 0.8), 1.0);
        assert_eq!(ramp(0.99, 1.0), 0.0);
    }

    #[test]
    fn reference_earns_multiplier_and_bonus() {
        let adj = aggregate(OOP_REFERENCE, 10.0);
        assert!(adj.multiplier > 1.4, "multiplier {}", adj.multiplier);
        assert!(adj.exceptional_bonus > 1.0);
        assert_eq!(adj.penalties, 0.0);
        assert_eq!(adj.total, 10.0);
    }

    #[test]
    fn stages_respect_caps() {
        let config = AdjustmentConfig::default();
        for student in ["", "OOP.", OOP_REFERENCE, "asdf asdf asdf asdf asdf asdf asdf asdf"] {
            let adj = aggregate(student, 10.0);
            assert!(adj.multiplier >= config.multiplier_min && adj.multiplier <= config.multiplier_max);
            assert!(adj.exceptional_bonus <= config.exceptional_bonus_cap * 10.0);
            assert!(adj.creative_bonus <= config.creative_bonus_cap * 10.0);
            assert!(adj.penalties <= config.penalty_cap * 10.0 + 1e-9);
            assert!((0.0..=10.0).contains(&adj.total));
        }
    }

    #[test]
    fn empty_answer_scores_zero() {
        let adj = aggregate("", 10.0);
        assert_eq!(adj.base, 0.0);
        assert_eq!(adj.total, 0.0);
        assert_eq!(adj.rounded_total(), 0);
    }
}
