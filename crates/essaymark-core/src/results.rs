//! Per-submission outcomes of a batch run.

use serde::{Deserialize, Serialize};

use crate::model::{within_range, Grade, ScoringResult, Submission};

/// The outcome of scoring one submission in a batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionOutcome {
    pub submission_id: String,
    pub question_id: String,
    /// The scoring result, absent when scoring failed.
    #[serde(default)]
    pub result: Option<ScoringResult>,
    /// Error message when scoring failed.
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub expected_min: Option<u32>,
    #[serde(default)]
    pub expected_max: Option<u32>,
    /// Wall-clock scoring time in milliseconds.
    pub duration_ms: u64,
}

impl SubmissionOutcome {
    pub fn scored(submission: &Submission, result: ScoringResult, duration_ms: u64) -> Self {
        Self {
            result: Some(result),
            ..Self::pending(submission, duration_ms)
        }
    }

    pub fn failed(submission: &Submission, error: impl Into<String>, duration_ms: u64) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::pending(submission, duration_ms)
        }
    }

    fn pending(submission: &Submission, duration_ms: u64) -> Self {
        Self {
            submission_id: submission.id.clone(),
            question_id: submission.question_id.clone(),
            result: None,
            error: None,
            expected_min: submission.expected_min,
            expected_max: submission.expected_max,
            duration_ms,
        }
    }

    pub fn is_scored(&self) -> bool {
        self.result.is_some()
    }

    pub fn total_score(&self) -> Option<u32> {
        self.result.as_ref().map(|r| r.total_score)
    }

    pub fn percentage(&self) -> Option<u32> {
        self.result.as_ref().map(|r| r.percentage)
    }

    pub fn grade(&self) -> Option<Grade> {
        self.result.as_ref().map(|r| r.grade)
    }

    /// Whether the total lies in the calibration range. `None` when the
    /// submission has no range or was not scored.
    pub fn within_expectation(&self) -> Option<bool> {
        within_range(self.total_score()?, self.expected_min, self.expected_max)
    }
}
