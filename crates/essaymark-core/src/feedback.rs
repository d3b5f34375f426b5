use std::collections::BTreeMap;

use crate::config::FeedbackConfig;
use crate::gates::GateReport;
use crate::model::{LayerKind, LayerScore};

/// Builds the feedback paragraph from gate results and weak layers.
pub struct FeedbackGenerator<'a> {
    config: &'a FeedbackConfig,
}

impl<'a> FeedbackGenerator<'a> {
    pub fn new(config: &'a FeedbackConfig) -> Self {
        Self { config }
    }

    /// Gate messages first, then one sentence per layer below the
    /// threshold in registry order.
    pub fn generate(
        &self,
        student_is_empty: bool,
        layers: &BTreeMap<LayerKind, LayerScore>,
        gates: &GateReport,
    ) -> String {
        if student_is_empty {
            return "No answer was provided.".to_string();
        }

        let mut sentences = Vec::new();
        if gates.gibberish.score > self.config.gibberish_threshold {
            sentences.push(
                "Much of the answer does not read as meaningful text; write in complete sentences."
                    .to_string(),
            );
        }
        if gates.off_topic.penalty >= self.config.off_topic_threshold {
            sentences.push(
                "The answer appears unrelated to the question; focus on the topic asked about."
                    .to_string(),
            );
        }
        for (kind, score) in layers {
            if score.fraction() < self.config.layer_threshold {
                sentences.push(format!(
                    "{} ({:.0}%): {}",
                    capitalize(kind.label()),
                    score.percentage(),
                    advice(*kind)
                ));
            }
        }

        if sentences.is_empty() {
            "Excellent work across all assessed dimensions.".to_string()
        } else {
            sentences.join(" ")
        }
    }
}

fn advice(kind: LayerKind) -> &'static str {
    match kind {
        LayerKind::ContentAccuracy => "cover more of the key concepts from the expected answer.",
        LayerKind::SemanticUnderstanding => {
            "explain how the ideas relate to each other, not just what they are."
        }
        LayerKind::QualityDifferentiation => {
            "develop the answer with more detail, argument and insight."
        }
        LayerKind::WritingQuality => {
            "improve sentence structure, punctuation and vocabulary variety."
        }
        LayerKind::CriticalThinking => "support claims with reasons, evidence or evaluation.",
        LayerKind::TechnicalPrecision => "use the correct subject terminology more precisely.",
        LayerKind::CognitiveComplexity => {
            "go beyond recall by analysing, comparing or evaluating."
        }
        LayerKind::ConceptualDepth => "show the relationships between the underlying concepts.",
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layers(fraction: f64) -> BTreeMap<LayerKind, LayerScore> {
        LayerKind::ALL
            .iter()
            .map(|k| (*k, LayerScore::from_fraction(fraction, 1.0, BTreeMap::new())))
            .collect()
    }

    #[test]
    fn strong_answer_gets_praise() {
        let config = FeedbackConfig::default();
        let text = FeedbackGenerator::new(&config).generate(false, &layers(0.9), &GateReport::default());
        assert_eq!(text, "Excellent work across all assessed dimensions.");
    }

    #[test]
    fn one_sentence_per_weak_layer() {
        let config = FeedbackConfig::default();
        let mut scores = layers(0.9);
        scores.insert(
            LayerKind::CriticalThinking,
            LayerScore::from_fraction(0.25, 1.0, BTreeMap::new()),
        );
        scores.insert(
            LayerKind::ContentAccuracy,
            LayerScore::from_fraction(0.5, 1.0, BTreeMap::new()),
        );
        let text = FeedbackGenerator::new(&config).generate(false, &scores, &GateReport::default());
        assert!(text.starts_with("Content accuracy (50%)"));
        assert!(text.contains("Critical thinking (25%)"));
        assert_eq!(text.matches("%)").count(), 2);
    }

    #[test]
    fn gate_messages_come_first() {
        let config = FeedbackConfig::default();
        let mut gates = GateReport::default();
        gates.off_topic.penalty = 0.8;
        let text = FeedbackGenerator::new(&config).generate(false, &layers(0.1), &gates);
        assert!(text.starts_with("The answer appears unrelated"));
    }

    #[test]
    fn empty_answer() {
        let config = FeedbackConfig::default();
        let text = FeedbackGenerator::new(&config).generate(true, &layers(0.0), &GateReport::default());
        assert_eq!(text, "No answer was provided.");
    }
}
