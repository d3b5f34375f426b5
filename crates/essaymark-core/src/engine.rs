//! The scoring engine.
//!
//! A [`Scorer`] owns the validated configuration, the compiled lexicon and
//! the layer registry. Scoring is a pure function of the request: the
//! context is built once, layers fan out over it, gates run alongside, and
//! the aggregator folds everything into a [`ScoringResult`].

use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use rayon::prelude::*;

use crate::aggregate::{Adjustments, ScoreAggregator};
use crate::config::ScoringConfig;
use crate::context::ScoringContext;
use crate::error::ScoringError;
use crate::feedback::FeedbackGenerator;
use crate::gates::GateReport;
use crate::grading::{assessment_for, band_for, grade_for, percentage_of};
use crate::layers::{LayerRegistry, RegisteredLayer};
use crate::lexicon::Lexicon;
use crate::model::{
    DetailedBreakdown, LayerKind, LayerScore, QuestionMetadata, ScoringRequest, ScoringResult,
};

/// Receives scoring events. Used for observability only; nothing it does
/// can influence a score.
pub trait ScoringObserver: Send + Sync {
    fn on_layer_scored(&self, _kind: LayerKind, _score: &LayerScore) {}
    fn on_layer_failed(&self, _error: &ScoringError) {}
    fn on_scored(&self, _result: &ScoringResult) {}
}

/// Observer that ignores every event.
pub struct NoopObserver;

impl ScoringObserver for NoopObserver {}

/// Observer that forwards events to `tracing`.
pub struct TracingObserver;

impl ScoringObserver for TracingObserver {
    fn on_layer_scored(&self, kind: LayerKind, score: &LayerScore) {
        tracing::debug!(layer = %kind, score = score.score, max = score.max_score, "layer scored");
    }

    fn on_layer_failed(&self, error: &ScoringError) {
        tracing::warn!("{error}");
    }

    fn on_scored(&self, result: &ScoringResult) {
        tracing::info!(
            total = result.total_score,
            max = result.max_marks,
            grade = %result.grade,
            "answer scored"
        );
    }
}

pub struct Scorer {
    config: ScoringConfig,
    lexicon: Arc<Lexicon>,
    registry: LayerRegistry,
    observer: Arc<dyn ScoringObserver>,
}

impl Scorer {
    /// Validate `config`, load the lexicon it names (or the built-in one)
    /// and register the standard layers.
    pub fn new(config: ScoringConfig) -> Result<Self, ScoringError> {
        config.validate()?;
        let lexicon = match &config.lexicon_path {
            Some(path) => Lexicon::from_path(path)?,
            None => Lexicon::builtin()?,
        };
        let registry = LayerRegistry::standard(&config.weights);
        Ok(Self {
            config,
            lexicon: Arc::new(lexicon),
            registry,
            observer: Arc::new(NoopObserver),
        })
    }

    pub fn with_defaults() -> Result<Self, ScoringError> {
        Self::new(ScoringConfig::default())
    }

    pub fn with_observer(mut self, observer: Arc<dyn ScoringObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Replace the layer registry. Weights are taken from the registry, not
    /// from the configuration.
    pub fn with_registry(mut self, registry: LayerRegistry) -> Result<Self, ScoringError> {
        registry.validate()?;
        self.registry = registry;
        Ok(self)
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    pub fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }

    pub fn registry(&self) -> &LayerRegistry {
        &self.registry
    }

    pub fn score_answer(
        &self,
        student_answer: &str,
        reference_answer: &str,
        max_marks: u32,
        metadata: Option<QuestionMetadata>,
    ) -> Result<ScoringResult, ScoringError> {
        let mut request = ScoringRequest::new(student_answer, reference_answer, max_marks);
        request.question_metadata = metadata;
        self.score(&request)
    }

    /// Score one answer.
    ///
    /// Layer failures are neutralised to a zero layer score; only invalid
    /// input or a non-finite aggregate is returned as an error.
    pub fn score(&self, request: &ScoringRequest) -> Result<ScoringResult, ScoringError> {
        if request.max_marks == 0 {
            return Err(ScoringError::InvalidInput(
                "max_marks must be greater than zero".into(),
            ));
        }
        let max_marks = f64::from(request.max_marks);

        let ctx = ScoringContext::build(
            &request.student_answer,
            &request.reference_answer,
            request.question_metadata.as_ref(),
            &self.lexicon,
            &self.config,
        );

        if ctx.reference.is_empty() {
            tracing::warn!("reference answer is empty, scoring as zero");
            let layers = self
                .registry
                .layers()
                .iter()
                .map(|l| (l.scorer.kind(), LayerScore::zero(l.weight * max_marks)))
                .collect();
            let result = self.build_result(
                request.max_marks,
                layers,
                &GateReport::default(),
                &Adjustments {
                    multiplier: 1.0,
                    ..Adjustments::default()
                },
                "No reference answer was available to score against.".to_string(),
            );
            self.observer.on_scored(&result);
            return Ok(result);
        }

        let (layers, gates) = if self.config.parallel_layers {
            rayon::join(
                || {
                    self.registry
                        .layers()
                        .par_iter()
                        .map(|layer| self.run_layer(&ctx, layer, max_marks))
                        .collect::<Vec<_>>()
                },
                || GateReport::evaluate(&ctx),
            )
        } else {
            let layers = self
                .registry
                .layers()
                .iter()
                .map(|layer| self.run_layer(&ctx, layer, max_marks))
                .collect::<Vec<_>>();
            (layers, GateReport::evaluate(&ctx))
        };
        let layers: BTreeMap<LayerKind, LayerScore> = layers.into_iter().collect();

        let adjustments =
            ScoreAggregator::new(&self.config.adjustments).aggregate(&ctx, &layers, &gates, max_marks);
        if !adjustments.base.is_finite() || !adjustments.total.is_finite() {
            return Err(ScoringError::ScoringFailure(format!(
                "non-finite aggregate (base {}, total {})",
                adjustments.base, adjustments.total
            )));
        }
        tracing::debug!(
            base = adjustments.base,
            multiplier = adjustments.multiplier,
            bonus = adjustments.bonus_points(),
            penalties = adjustments.penalties,
            gibberish = adjustments.gibberish_deduction,
            off_topic = adjustments.off_topic_deduction,
            total = adjustments.total,
            "aggregated"
        );

        let feedback = FeedbackGenerator::new(&self.config.feedback).generate(
            ctx.student.is_empty(),
            &layers,
            &gates,
        );
        let result = self.build_result(request.max_marks, layers, &gates, &adjustments, feedback);
        self.observer.on_scored(&result);
        Ok(result)
    }

    /// Run one layer, converting panics, errors and non-finite scores into
    /// a zero score.
    fn run_layer(
        &self,
        ctx: &ScoringContext<'_>,
        layer: &RegisteredLayer,
        max_marks: f64,
    ) -> (LayerKind, LayerScore) {
        let kind = layer.scorer.kind();
        let max_score = layer.weight * max_marks;

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| layer.scorer.score(ctx, max_score)));
        let failure = match outcome {
            Ok(Ok(mut score)) if score.score.is_finite() => {
                score.max_score = max_score;
                score.score = score.score.clamp(0.0, max_score);
                tracing::debug!(layer = %kind, score = score.score, max = max_score, "layer scored");
                self.observer.on_layer_scored(kind, &score);
                return (kind, score);
            }
            Ok(Ok(score)) => format!("non-finite score {}", score.score),
            Ok(Err(ScoringError::AnalyzerFailure { message, .. })) => message,
            Ok(Err(e)) => e.to_string(),
            Err(payload) => panic_message(payload.as_ref()),
        };

        let error = ScoringError::AnalyzerFailure {
            layer: kind,
            message: failure,
        };
        tracing::warn!("{error}; using zero for this layer");
        self.observer.on_layer_failed(&error);
        (kind, LayerScore::zero(max_score))
    }

    fn build_result(
        &self,
        max_marks: u32,
        layers: BTreeMap<LayerKind, LayerScore>,
        gates: &GateReport,
        adjustments: &Adjustments,
        feedback: String,
    ) -> ScoringResult {
        let total_score = adjustments.rounded_total().min(max_marks);
        let percentage = percentage_of(total_score, max_marks);
        let pass_mark = self.config.adjustments.pass_ratio * f64::from(max_marks);

        ScoringResult {
            total_score,
            max_marks,
            percentage,
            is_passed: f64::from(total_score) + 1e-9 >= pass_mark,
            grade: grade_for(percentage),
            band: band_for(percentage),
            assessment: assessment_for(percentage).to_string(),
            detailed_breakdown: DetailedBreakdown {
                layers,
                bonus_points: adjustments.bonus_points(),
                penalties: adjustments.penalties,
                gibberish_penalty: gates.gibberish.score,
                off_topic_penalty: gates.off_topic.penalty,
                intelligence_multiplier: adjustments.multiplier,
            },
            feedback,
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panicked: {s}")
    } else {
        "panicked".to_string()
    }
}
