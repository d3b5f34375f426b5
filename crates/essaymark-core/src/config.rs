//! Scoring configuration.
//!
//! Every tunable the engine reads lives here: layer weights, analysis
//! thresholds, the adjustment stages applied after aggregation, gate
//! settings and feedback thresholds. All fields have defaults, so a partial
//! `essaymark.toml` only needs to name what it changes.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::ScoringError;
use crate::model::LayerKind;

/// Ceiling for `off_topic.max_penalty`.
pub const MAX_OFF_TOPIC_PENALTY: f64 = 0.85;

/// Top-level essaymark configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    #[serde(default)]
    pub weights: LayerWeights,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub adjustments: AdjustmentConfig,
    #[serde(default)]
    pub gibberish: GibberishConfig,
    #[serde(default)]
    pub off_topic: OffTopicConfig,
    #[serde(default)]
    pub feedback: FeedbackConfig,
    /// Replaces the embedded lexicon when set.
    #[serde(default)]
    pub lexicon_path: Option<PathBuf>,
    /// Fan layers out on the rayon pool instead of running them in order.
    #[serde(default = "default_true")]
    pub parallel_layers: bool,
}

fn default_true() -> bool {
    true
}

/// Share of the pre-adjustment total allotted to each layer. Must sum to 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayerWeights {
    pub content_accuracy: f64,
    pub semantic_understanding: f64,
    pub quality_differentiation: f64,
    pub writing_quality: f64,
    pub critical_thinking: f64,
    pub technical_precision: f64,
    pub cognitive_complexity: f64,
    pub conceptual_depth: f64,
}

impl Default for LayerWeights {
    fn default() -> Self {
        Self {
            content_accuracy: 0.20,
            semantic_understanding: 0.20,
            quality_differentiation: 0.20,
            writing_quality: 0.15,
            critical_thinking: 0.10,
            technical_precision: 0.08,
            cognitive_complexity: 0.05,
            conceptual_depth: 0.02,
        }
    }
}

impl LayerWeights {
    pub fn weight(&self, kind: LayerKind) -> f64 {
        match kind {
            LayerKind::ContentAccuracy => self.content_accuracy,
            LayerKind::SemanticUnderstanding => self.semantic_understanding,
            LayerKind::QualityDifferentiation => self.quality_differentiation,
            LayerKind::WritingQuality => self.writing_quality,
            LayerKind::CriticalThinking => self.critical_thinking,
            LayerKind::TechnicalPrecision => self.technical_precision,
            LayerKind::CognitiveComplexity => self.cognitive_complexity,
            LayerKind::ConceptualDepth => self.conceptual_depth,
        }
    }

    pub fn sum(&self) -> f64 {
        LayerKind::ALL.iter().map(|k| self.weight(*k)).sum()
    }
}

/// Text handling and concept matching.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Inputs are truncated to this many characters before analysis.
    pub max_chars: usize,
    /// Number of top-weighted reference concepts that count toward coverage.
    pub max_reference_concepts: usize,
    /// Grounding is `coverage ^ coverage_exponent`.
    pub coverage_exponent: f64,
    pub technical_boost: f64,
    pub domain_boost: f64,
    pub context_boost: f64,
    pub exact_factor: f64,
    pub stem_factor: f64,
    pub synonym_factor: f64,
    pub fuzzy_factor: f64,
    /// Minimum normalised edit similarity for a fuzzy match (exclusive).
    pub fuzzy_threshold: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            max_chars: 5000,
            max_reference_concepts: 30,
            coverage_exponent: 0.5,
            technical_boost: 1.5,
            domain_boost: 1.3,
            context_boost: 1.2,
            exact_factor: 1.0,
            stem_factor: 0.9,
            synonym_factor: 0.85,
            fuzzy_factor: 0.7,
            fuzzy_threshold: 0.7,
        }
    }
}

/// Post-aggregation stages: multiplier, bonuses, penalties and gate deductions.
///
/// Each stage has its own cap so the stages can be calibrated independently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdjustmentConfig {
    pub multiplier_base: f64,
    pub multiplier_slope: f64,
    pub multiplier_min: f64,
    pub multiplier_max: f64,
    /// Exceptional bonus at full strength, as a share of max marks.
    pub exceptional_bonus_rate: f64,
    pub exceptional_bonus_cap: f64,
    /// Coverage at which the exceptional bonus starts to accrue.
    pub exceptional_coverage_floor: f64,
    /// Similarity at which the exceptional bonus starts to accrue.
    pub exceptional_similarity_floor: f64,
    pub example_bonus_rate: f64,
    pub innovation_bonus_rate: f64,
    pub creative_bonus_cap: f64,
    pub grammar_penalty_rate: f64,
    /// Answers shorter than this share of the reference length are penalised.
    pub short_length_ratio: f64,
    pub short_length_penalty_rate: f64,
    /// Repeated-trigram share tolerated before the repetition penalty applies.
    pub repetition_threshold: f64,
    pub repetition_penalty_rate: f64,
    pub penalty_cap: f64,
    pub gibberish_deduction: f64,
    pub off_topic_deduction: f64,
    /// Share of max marks required to pass.
    pub pass_ratio: f64,
}

impl Default for AdjustmentConfig {
    fn default() -> Self {
        Self {
            multiplier_base: 0.9,
            multiplier_slope: 0.6,
            multiplier_min: 0.5,
            multiplier_max: 2.0,
            exceptional_bonus_rate: 0.15,
            exceptional_bonus_cap: 0.8,
            exceptional_coverage_floor: 0.8,
            exceptional_similarity_floor: 0.6,
            example_bonus_rate: 0.04,
            innovation_bonus_rate: 0.03,
            creative_bonus_cap: 0.2,
            grammar_penalty_rate: 0.1,
            short_length_ratio: 0.3,
            short_length_penalty_rate: 0.05,
            repetition_threshold: 0.2,
            repetition_penalty_rate: 0.1,
            penalty_cap: 0.3,
            gibberish_deduction: 0.3,
            off_topic_deduction: 0.5,
            pass_ratio: 0.6,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GibberishConfig {
    pub pattern_weight: f64,
    pub invalid_word_weight: f64,
    pub repetition_weight: f64,
    pub structural_weight: f64,
    /// Texts up to this length are not length-damped.
    pub damping_start_chars: usize,
    /// Length at which damping reaches `damping_floor`.
    pub damping_end_chars: usize,
    pub damping_floor: f64,
    /// Largest reduction granted for academic and explanatory connectives.
    pub sophistication_damping: f64,
    /// Unknown words with a vowel ratio outside this range count as invalid.
    pub min_vowel_ratio: f64,
    pub max_vowel_ratio: f64,
    /// Average word length above which the text looks run together.
    pub max_average_word_chars: f64,
    /// Whitespace share below which longer texts look run together.
    pub min_whitespace_ratio: f64,
}

impl Default for GibberishConfig {
    fn default() -> Self {
        Self {
            pattern_weight: 0.3,
            invalid_word_weight: 0.35,
            repetition_weight: 0.15,
            structural_weight: 0.2,
            damping_start_chars: 200,
            damping_end_chars: 1000,
            damping_floor: 0.5,
            sophistication_damping: 0.4,
            min_vowel_ratio: 0.15,
            max_vowel_ratio: 0.75,
            max_average_word_chars: 12.0,
            min_whitespace_ratio: 0.05,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OffTopicConfig {
    pub similarity_threshold: f64,
    pub similarity_penalty: f64,
    pub alignment_threshold: f64,
    pub alignment_penalty: f64,
    pub coherence_threshold: f64,
    pub coherence_penalty: f64,
    pub unrelated_penalty: f64,
    /// Relevance above which the accrued penalty is mostly forgiven.
    pub relevance_override: f64,
    pub relevance_override_factor: f64,
    /// Largest share of the penalty forgiven for specialist overlap.
    pub overlap_forgiveness: f64,
    /// Overlap is multiplied by this before saturating at 1.
    pub overlap_scale: f64,
    /// Unrelated-domain hits at which the unrelated signal saturates.
    pub unrelated_saturation: f64,
    pub max_penalty: f64,
}

impl Default for OffTopicConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.15,
            similarity_penalty: 0.30,
            alignment_threshold: 0.2,
            alignment_penalty: 0.25,
            coherence_threshold: 0.3,
            coherence_penalty: 0.2,
            unrelated_penalty: 0.35,
            relevance_override: 0.7,
            relevance_override_factor: 0.25,
            overlap_forgiveness: 0.5,
            overlap_scale: 3.0,
            unrelated_saturation: 4.0,
            max_penalty: MAX_OFF_TOPIC_PENALTY,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedbackConfig {
    /// Layers earning less than this share of their allotment get a sentence.
    pub layer_threshold: f64,
    pub gibberish_threshold: f64,
    pub off_topic_threshold: f64,
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            layer_threshold: 0.6,
            gibberish_threshold: 0.5,
            off_topic_threshold: 0.5,
        }
    }
}

impl ScoringConfig {
    /// Check the configuration for values the engine cannot work with.
    pub fn validate(&self) -> Result<(), ScoringError> {
        let invalid = |msg: String| Err(ScoringError::InvalidConfiguration(msg));

        for kind in LayerKind::ALL {
            let w = self.weights.weight(kind);
            if !w.is_finite() || w < 0.0 {
                return invalid(format!("weight for '{kind}' must be non-negative, got {w}"));
            }
        }
        let sum = self.weights.sum();
        if (sum - 1.0).abs() > 1e-6 {
            return invalid(format!("layer weights must sum to 1.0, got {sum:.6}"));
        }

        if self.analysis.max_chars == 0 {
            return invalid("analysis.max_chars must be greater than zero".into());
        }

        let adj = &self.adjustments;
        if !(0.5..=2.0).contains(&adj.multiplier_min)
            || !(0.5..=2.0).contains(&adj.multiplier_max)
            || adj.multiplier_min > adj.multiplier_max
        {
            return invalid(format!(
                "multiplier bounds must lie within [0.5, 2.0], got [{}, {}]",
                adj.multiplier_min, adj.multiplier_max
            ));
        }

        let caps = [
            ("adjustments.exceptional_bonus_cap", adj.exceptional_bonus_cap),
            ("adjustments.creative_bonus_cap", adj.creative_bonus_cap),
            ("adjustments.penalty_cap", adj.penalty_cap),
            ("adjustments.gibberish_deduction", adj.gibberish_deduction),
            ("adjustments.off_topic_deduction", adj.off_topic_deduction),
            ("off_topic.max_penalty", self.off_topic.max_penalty),
        ];
        for (name, cap) in caps {
            if !cap.is_finite() || cap < 0.0 {
                return invalid(format!("{name} must be non-negative, got {cap}"));
            }
        }

        if self.off_topic.max_penalty > MAX_OFF_TOPIC_PENALTY {
            return invalid(format!(
                "off_topic.max_penalty must not exceed {MAX_OFF_TOPIC_PENALTY}, got {}",
                self.off_topic.max_penalty
            ));
        }

        if !(0.0..=1.0).contains(&adj.pass_ratio) {
            return invalid(format!(
                "adjustments.pass_ratio must lie within [0, 1], got {}",
                adj.pass_ratio
            ));
        }

        Ok(())
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `essaymark.toml` in the current directory
/// 2. `~/.config/essaymark/config.toml`
pub fn load_config() -> Result<ScoringConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<ScoringConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("essaymark.toml");
        if local.exists() {
            Some(local)
        } else {
            config_dir()
                .map(|dir| dir.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            let config = toml::from_str::<ScoringConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?;
            tracing::debug!("loaded config from {}", path.display());
            config
        }
        None => ScoringConfig::default(),
    };

    config.validate()?;
    Ok(config)
}

fn config_dir() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("essaymark"))
}
