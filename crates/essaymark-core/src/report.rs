//! Batch report types with JSON persistence and regression detection.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::results::SubmissionOutcome;
use crate::statistics::BatchStats;

/// A complete batch report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    /// Unique report identifier.
    pub id: Uuid,
    /// When the report was created.
    pub created_at: DateTime<Utc>,
    /// Summary of the scoring set.
    pub scoring_set: ScoringSetSummary,
    /// Individual outcomes, in submission order.
    pub outcomes: Vec<SubmissionOutcome>,
    /// Aggregate statistics.
    pub stats: BatchStats,
    /// Total wall-clock duration in milliseconds.
    pub duration_ms: u64,
}

/// Summary of a scoring set (without the answers themselves).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringSetSummary {
    pub id: String,
    pub name: String,
    pub question_count: usize,
    pub submission_count: usize,
}

impl BatchReport {
    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: BatchReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }

    /// Compare this report against a baseline to detect regressions.
    ///
    /// Submissions are matched by ID. A regression is a percentage drop larger
    /// than `threshold` percentage points, or a submission that used to fall
    /// inside its expected range and no longer does.
    pub fn compare(&self, baseline: &BatchReport, threshold: f64) -> RegressionReport {
        let index = |report: &BatchReport| -> BTreeMap<String, (u32, Option<bool>)> {
            report
                .outcomes
                .iter()
                .filter_map(|o| {
                    o.percentage()
                        .map(|pct| (o.submission_id.clone(), (pct, o.within_expectation())))
                })
                .collect()
        };

        let baseline_scores = index(baseline);
        let current_scores = index(self);

        let mut regressions = Vec::new();
        let mut improvements = Vec::new();
        let mut unchanged = 0usize;
        let mut new_submissions = 0usize;

        for (id, &(current, current_within)) in &current_scores {
            let Some(&(previous, previous_within)) = baseline_scores.get(id) else {
                new_submissions += 1;
                continue;
            };
            let change = ScoreChange {
                submission_id: id.clone(),
                baseline_percentage: previous,
                current_percentage: current,
                delta: f64::from(current) - f64::from(previous),
                left_expected_range: previous_within == Some(true) && current_within == Some(false),
            };
            if change.delta < -threshold || change.left_expected_range {
                regressions.push(change);
            } else if change.delta > threshold {
                improvements.push(change);
            } else {
                unchanged += 1;
            }
        }

        let removed_submissions = baseline_scores
            .keys()
            .filter(|k| !current_scores.contains_key(*k))
            .count();

        RegressionReport {
            regressions,
            improvements,
            unchanged,
            new_submissions,
            removed_submissions,
        }
    }
}

/// Result of comparing two reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegressionReport {
    /// Submissions whose score went down.
    pub regressions: Vec<ScoreChange>,
    /// Submissions whose score went up.
    pub improvements: Vec<ScoreChange>,
    /// Submissions with no significant change.
    pub unchanged: usize,
    /// Submissions in current but not baseline.
    pub new_submissions: usize,
    /// Submissions in baseline but not current.
    pub removed_submissions: usize,
}

/// A score change for one submission, in percentage points.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreChange {
    pub submission_id: String,
    pub baseline_percentage: u32,
    pub current_percentage: u32,
    pub delta: f64,
    /// The submission was inside its expected range in the baseline only.
    #[serde(default)]
    pub left_expected_range: bool,
}

impl RegressionReport {
    /// Format the regression report as markdown.
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();

        md.push_str(&format!(
            "**Summary:** {} regressions, {} improvements, {} unchanged\n\n",
            self.regressions.len(),
            self.improvements.len(),
            self.unchanged
        ));

        if !self.regressions.is_empty() {
            md.push_str("### Regressions\n\n");
            push_table(&mut md, &self.regressions);
            md.push('\n');
        }

        if !self.improvements.is_empty() {
            md.push_str("### Improvements\n\n");
            push_table(&mut md, &self.improvements);
        }

        md
    }

    /// Returns true if there are any regressions.
    pub fn has_regressions(&self) -> bool {
        !self.regressions.is_empty()
    }
}

fn push_table(md: &mut String, changes: &[ScoreChange]) {
    md.push_str("| Submission | Baseline | Current | Delta | Note |\n");
    md.push_str("|------------|----------|---------|-------|------|\n");
    for c in changes {
        let note = if c.left_expected_range {
            "left expected range"
        } else {
            ""
        };
        md.push_str(&format!(
            "| {} | {}% | {}% | {:+.0} | {} |\n",
            c.submission_id, c.baseline_percentage, c.current_percentage, c.delta, note
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ScoringResult, Submission};
    use crate::statistics::compute_batch_stats;
    use crate::Scorer;

    const REFERENCE: &str = "Encapsulation bundles data with the methods that operate on it. \
        Inheritance lets a class reuse methods from a parent class.";

    fn result(answer: &str) -> ScoringResult {
        Scorer::with_defaults()
            .unwrap()
            .score_answer(answer, REFERENCE, 10, None)
            .unwrap()
    }

    fn outcome(id: &str, result: ScoringResult, range: Option<(u32, u32)>) -> SubmissionOutcome {
        let submission = Submission {
            id: id.into(),
            question_id: "q".into(),
            answer: String::new(),
            expected_min: range.map(|r| r.0),
            expected_max: range.map(|r| r.1),
        };
        SubmissionOutcome::scored(&submission, result, 2)
    }

    fn make_report(outcomes: Vec<SubmissionOutcome>) -> BatchReport {
        BatchReport {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            scoring_set: ScoringSetSummary {
                id: "set".into(),
                name: "Set".into(),
                question_count: 1,
                submission_count: outcomes.len(),
            },
            stats: compute_batch_stats(&outcomes),
            outcomes,
            duration_ms: 10,
        }
    }

    fn with_percentage(mut result: ScoringResult, total: u32) -> ScoringResult {
        result.total_score = total;
        result.percentage = total * 10;
        result
    }

    #[test]
    fn compare_identical_reports() {
        let base = result(REFERENCE);
        let report = make_report(vec![outcome("a", base.clone(), None), outcome("b", base, None)]);
        let diff = report.compare(&report, 5.0);
        assert_eq!(diff.unchanged, 2);
        assert!(!diff.has_regressions());
        assert!(diff.improvements.is_empty());
    }

    #[test]
    fn compare_with_regression_and_improvement() {
        let base = result(REFERENCE);
        let baseline = make_report(vec![
            outcome("down", with_percentage(base.clone(), 8), None),
            outcome("up", with_percentage(base.clone(), 3), None),
        ]);
        let current = make_report(vec![
            outcome("down", with_percentage(base.clone(), 5), None),
            outcome("up", with_percentage(base, 6), None),
        ]);
        let diff = current.compare(&baseline, 5.0);
        assert_eq!(diff.regressions.len(), 1);
        assert_eq!(diff.regressions[0].submission_id, "down");
        assert_eq!(diff.regressions[0].delta, -30.0);
        assert_eq!(diff.improvements.len(), 1);
    }

    #[test]
    fn leaving_expected_range_is_a_regression() {
        let base = result(REFERENCE);
        let baseline = make_report(vec![outcome("s", with_percentage(base.clone(), 4), Some((2, 4)))]);
        let current = make_report(vec![outcome("s", with_percentage(base, 5), Some((2, 4)))]);
        let diff = current.compare(&baseline, 20.0);
        assert!(diff.has_regressions());
        assert!(diff.regressions[0].left_expected_range);
    }

    #[test]
    fn compare_with_new_and_removed() {
        let base = result("Encapsulation bundles data.");
        let baseline = make_report(vec![outcome("old", base.clone(), None)]);
        let current = make_report(vec![outcome("new", base, None)]);
        let diff = current.compare(&baseline, 5.0);
        assert_eq!(diff.new_submissions, 1);
        assert_eq!(diff.removed_submissions, 1);
    }

    #[test]
    fn json_roundtrip() {
        let report = make_report(vec![outcome("a", result(REFERENCE), Some((8, 10)))]);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reports").join("run.json");
        report.save_json(&path).unwrap();
        let loaded = BatchReport::load_json(&path).unwrap();
        assert_eq!(loaded.id, report.id);
        assert_eq!(loaded.outcomes.len(), 1);
        assert_eq!(loaded.outcomes[0].total_score(), report.outcomes[0].total_score());
        assert_eq!(loaded.outcomes[0].grade(), report.outcomes[0].grade());
        assert_eq!(loaded.stats.scored, 1);
        assert_eq!(loaded.stats.calibration, report.stats.calibration);
    }

    #[test]
    fn markdown_output() {
        let base = result(REFERENCE);
        let baseline = make_report(vec![outcome("a", with_percentage(base.clone(), 9), None)]);
        let current = make_report(vec![outcome("a", with_percentage(base, 6), None)]);
        let md = current.compare(&baseline, 5.0).to_markdown();
        assert!(md.contains("1 regressions"));
        assert!(md.contains("| a | 90% | 60% | -30 |"));
    }
}
