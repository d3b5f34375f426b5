//! Scoring layers.
//!
//! Each layer is an independent [`LayerScorer`] over the shared
//! [`ScoringContext`]. The [`LayerRegistry`] pairs every scorer with its weight;
//! the engine fans the registry out and sums the results.

mod cognitive;
mod conceptual;
mod content;
mod critical;
mod quality;
mod semantic;
mod technical;
mod writing;

use std::collections::BTreeMap;
use std::sync::Arc;

pub use cognitive::CognitiveComplexity;
pub use conceptual::ConceptualDepth;
pub use content::ContentAccuracy;
pub use critical::CriticalThinking;
pub use quality::QualityDifferentiation;
pub use semantic::SemanticUnderstanding;
pub use technical::TechnicalPrecision;
pub use writing::{grammar_error_rate, WritingQuality};

use crate::config::LayerWeights;
use crate::context::ScoringContext;
use crate::error::ScoringError;
use crate::model::{LayerKind, LayerScore};

/// A single scoring layer.
///
/// Implementations must be pure functions of the context: no I/O, no shared
/// mutable state. `max_score` is the layer's allotment in marks.
pub trait LayerScorer: Send + Sync {
    fn kind(&self) -> LayerKind;

    fn score(&self, ctx: &ScoringContext<'_>, max_score: f64) -> Result<LayerScore, ScoringError>;
}

/// A scorer and the share of the total it contributes.
#[derive(Clone)]
pub struct RegisteredLayer {
    pub scorer: Arc<dyn LayerScorer>,
    pub weight: f64,
}

/// Ordered set of layers, at most one per [`LayerKind`].
#[derive(Clone, Default)]
pub struct LayerRegistry {
    layers: Vec<RegisteredLayer>,
}

impl LayerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The eight built-in layers with the given weights.
    pub fn standard(weights: &LayerWeights) -> Self {
        let mut registry = Self::new();
        registry.register(ContentAccuracy, weights.content_accuracy);
        registry.register(SemanticUnderstanding, weights.semantic_understanding);
        registry.register(QualityDifferentiation, weights.quality_differentiation);
        registry.register(WritingQuality, weights.writing_quality);
        registry.register(CriticalThinking, weights.critical_thinking);
        registry.register(TechnicalPrecision, weights.technical_precision);
        registry.register(CognitiveComplexity, weights.cognitive_complexity);
        registry.register(ConceptualDepth, weights.conceptual_depth);
        registry
    }

    /// Add a layer, replacing any existing layer of the same kind.
    pub fn register(&mut self, scorer: impl LayerScorer + 'static, weight: f64) -> &mut Self {
        self.register_arc(Arc::new(scorer), weight)
    }

    pub fn register_arc(&mut self, scorer: Arc<dyn LayerScorer>, weight: f64) -> &mut Self {
        let kind = scorer.kind();
        let entry = RegisteredLayer { scorer, weight };
        match self.layers.iter_mut().find(|l| l.scorer.kind() == kind) {
            Some(existing) => *existing = entry,
            None => self.layers.push(entry),
        }
        self
    }

    pub fn layers(&self) -> &[RegisteredLayer] {
        &self.layers
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn total_weight(&self) -> f64 {
        self.layers.iter().map(|l| l.weight).sum()
    }

    pub fn validate(&self) -> Result<(), ScoringError> {
        if self.layers.is_empty() {
            return Err(ScoringError::InvalidConfiguration(
                "layer registry is empty".into(),
            ));
        }
        if let Some(layer) = self
            .layers
            .iter()
            .find(|l| !l.weight.is_finite() || l.weight < 0.0)
        {
            return Err(ScoringError::InvalidConfiguration(format!(
                "layer '{}' has invalid weight {}",
                layer.scorer.kind(),
                layer.weight
            )));
        }
        let total = self.total_weight();
        if (total - 1.0).abs() > 1e-6 {
            return Err(ScoringError::InvalidConfiguration(format!(
                "layer weights must sum to 1.0, got {total:.6}"
            )));
        }
        Ok(())
    }
}

/// Weighted blend of named `[0, 1]` components.
///
/// Component values are recorded as metrics alongside the layer score.
#[derive(Debug, Default)]
pub(crate) struct Blend {
    metrics: BTreeMap<String, f64>,
    weighted: f64,
    weight: f64,
}

impl Blend {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn add(mut self, name: &str, weight: f64, value: f64) -> Self {
        let value = if value.is_finite() { value.clamp(0.0, 1.0) } else { 0.0 };
        self.metrics.insert(name.to_string(), value);
        self.weighted += weight * value;
        self.weight += weight;
        self
    }

    /// Record a metric without scoring it.
    pub(crate) fn note(mut self, name: &str, value: f64) -> Self {
        self.metrics.insert(name.to_string(), value);
        self
    }

    pub(crate) fn fraction(&self) -> f64 {
        if self.weight > 0.0 {
            self.weighted / self.weight
        } else {
            0.0
        }
    }

    pub(crate) fn finish(self, max_score: f64) -> LayerScore {
        self.finish_scaled(1.0, max_score)
    }

    /// Finish with the blended fraction multiplied by `scale`.
    pub(crate) fn finish_scaled(self, scale: f64, max_score: f64) -> LayerScore {
        let fraction = self.fraction() * scale;
        LayerScore::from_fraction(fraction, max_score, self.metrics)
    }
}

/// Unweighted mean of `values`, or 0 when empty.
pub(crate) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::config::ScoringConfig;
    use crate::context::ScoringContext;
    use crate::lexicon::Lexicon;

    pub const OOP_REFERENCE: &str = "Object-oriented programming (OOP) is a programming paradigm \
        that organises software around objects, which combine data and the methods that act on \
        that data. Encapsulation bundles data with the methods that operate on it and hides the \
        internal state of an object. Inheritance allows a class to derive attributes and methods \
        from a parent class, which promotes code reuse. Polymorphism allows objects of different \
        classes to be treated through a common interface.";

    pub fn with_context<T>(student: &str, f: impl FnOnce(&ScoringContext<'_>) -> T) -> T {
        let lexicon = Lexicon::builtin().unwrap();
        let config = ScoringConfig::default();
        let ctx = ScoringContext::build(student, OOP_REFERENCE, None, &lexicon, &config);
        f(&ctx)
    }
}
