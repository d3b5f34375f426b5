//! Aggregate statistics over a batch of scored submissions.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::Grade;
use crate::results::SubmissionOutcome;

/// Aggregate statistics across all outcomes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchStats {
    /// Submissions that produced a result.
    pub scored: usize,
    /// Submissions whose scoring failed.
    pub failed: usize,
    pub mean_percentage: f64,
    pub median_percentage: f64,
    /// Population standard deviation of percentages.
    pub stdev_percentage: f64,
    /// Share of scored submissions that passed.
    pub pass_rate: f64,
    /// Count of scored submissions per grade, best grade first.
    pub grade_distribution: BTreeMap<Grade, usize>,
    /// Present when at least one scored submission carries an expected range.
    #[serde(default)]
    pub calibration: Option<CalibrationStats>,
    /// Per-question statistics, keyed by question ID.
    pub per_question: BTreeMap<String, QuestionStats>,
}

/// How many submissions landed inside their expected score range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CalibrationStats {
    pub checked: usize,
    pub within: usize,
    pub hit_rate: f64,
}

/// Statistics for a single question across its submissions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuestionStats {
    pub submissions: usize,
    pub mean_percentage: f64,
    pub pass_rate: f64,
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Population standard deviation.
pub fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Compute aggregate statistics from all outcomes.
pub fn compute_batch_stats(outcomes: &[SubmissionOutcome]) -> BatchStats {
    let scored: Vec<&SubmissionOutcome> = outcomes.iter().filter(|o| o.is_scored()).collect();
    let percentages: Vec<f64> = scored
        .iter()
        .filter_map(|o| o.percentage())
        .map(f64::from)
        .collect();

    let mut grade_distribution = BTreeMap::new();
    for grade in scored.iter().filter_map(|o| o.grade()) {
        *grade_distribution.entry(grade).or_insert(0) += 1;
    }

    let checks: Vec<bool> = scored.iter().filter_map(|o| o.within_expectation()).collect();
    let calibration = if checks.is_empty() {
        None
    } else {
        let within = checks.iter().filter(|c| **c).count();
        Some(CalibrationStats {
            checked: checks.len(),
            within,
            hit_rate: within as f64 / checks.len() as f64,
        })
    };

    let mut by_question: BTreeMap<String, Vec<&SubmissionOutcome>> = BTreeMap::new();
    for outcome in &scored {
        by_question
            .entry(outcome.question_id.clone())
            .or_default()
            .push(outcome);
    }
    let per_question = by_question
        .into_iter()
        .map(|(id, group)| {
            let pcts: Vec<f64> = group
                .iter()
                .filter_map(|o| o.percentage())
                .map(f64::from)
                .collect();
            let stats = QuestionStats {
                submissions: group.len(),
                mean_percentage: mean(&pcts),
                pass_rate: pass_rate(&group),
            };
            (id, stats)
        })
        .collect();

    BatchStats {
        scored: scored.len(),
        failed: outcomes.len() - scored.len(),
        mean_percentage: mean(&percentages),
        median_percentage: median(&percentages),
        stdev_percentage: std_dev(&percentages),
        pass_rate: pass_rate(&scored),
        grade_distribution,
        calibration,
        per_question,
    }
}

fn pass_rate(outcomes: &[&SubmissionOutcome]) -> f64 {
    let passed = outcomes
        .iter()
        .filter(|o| o.result.as_ref().is_some_and(|r| r.is_passed))
        .count();
    passed as f64 / outcomes.len().max(1) as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Submission;
    use crate::Scorer;

    fn outcome(id: &str, question: &str, answer: &str, range: Option<(u32, u32)>) -> SubmissionOutcome {
        let reference = "Photosynthesis converts light energy into chemical energy stored in glucose. \
                         Chlorophyll in the chloroplasts absorbs the light.";
        let submission = Submission {
            id: id.into(),
            question_id: question.into(),
            answer: answer.into(),
            expected_min: range.map(|r| r.0),
            expected_max: range.map(|r| r.1),
        };
        let scorer = Scorer::with_defaults().unwrap();
        let result = scorer.score_answer(answer, reference, 10, None).unwrap();
        SubmissionOutcome::scored(&submission, result, 1)
    }

    #[test]
    fn basic_descriptive_stats() {
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(mean(&[1.0, 2.0, 3.0]), 2.0);
        assert_eq!(median(&[3.0, 1.0, 2.0]), 2.0);
        assert_eq!(median(&[4.0, 1.0, 2.0, 3.0]), 2.5);
        assert_eq!(std_dev(&[5.0]), 0.0);
        assert!((std_dev(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn batch_stats_count_failures_and_calibration() {
        let failed = SubmissionOutcome::failed(
            &Submission {
                id: "broken".into(),
                question_id: "q2".into(),
                answer: "x".into(),
                expected_min: Some(0),
                expected_max: Some(1),
            },
            "invalid input",
            0,
        );
        let outcomes = vec![
            outcome("blank", "q1", "", Some((0, 1))),
            outcome("noise", "q1", "apple car tree house", Some((5, 10))),
            outcome("free", "q1", "Plants use light.", None),
            failed,
        ];
        let stats = compute_batch_stats(&outcomes);
        assert_eq!(stats.scored, 3);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.grade_distribution.values().sum::<usize>(), 3);
        assert_eq!(stats.per_question.len(), 1);
        assert_eq!(stats.per_question["q1"].submissions, 3);

        let calibration = stats.calibration.unwrap();
        assert_eq!(calibration.checked, 2);
        assert_eq!(calibration.within, 1);
        assert_eq!(calibration.hit_rate, 0.5);
    }

    #[test]
    fn empty_batch() {
        let stats = compute_batch_stats(&[]);
        assert_eq!(stats, BatchStats::default());
    }

    #[test]
    fn stats_serialize_grade_keys_as_labels() {
        let mut stats = BatchStats::default();
        stats.grade_distribution.insert(Grade::B, 2);
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["grade_distribution"]["B (Above Average)"], 2);
        let back: BatchStats = serde_json::from_value(json).unwrap();
        assert_eq!(back, stats);
    }
}
