//! Concurrent scoring of a whole scoring set.
//!
//! Scoring is CPU-bound, so each submission runs on the blocking pool while a
//! semaphore bounds how many run at once. Failures are recorded per
//! submission and never abort the batch.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::Semaphore;
use uuid::Uuid;

use crate::engine::Scorer;
use crate::model::ScoringSet;
use crate::report::{BatchReport, ScoringSetSummary};
use crate::results::SubmissionOutcome;
use crate::statistics::compute_batch_stats;

/// Configuration for batch scoring.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Maximum submissions scored concurrently.
    pub parallelism: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self { parallelism: 4 }
    }
}

/// Progress reporting trait.
pub trait BatchProgress: Send + Sync {
    fn on_submission_complete(&self, outcome: &SubmissionOutcome);
    fn on_submission_error(&self, submission_id: &str, error: &str);
    fn on_batch_complete(&self, total: usize, scored: usize, failed: usize, elapsed: Duration);
}

/// No-op progress reporter.
pub struct NoopProgress;

impl BatchProgress for NoopProgress {
    fn on_submission_complete(&self, _: &SubmissionOutcome) {}
    fn on_submission_error(&self, _: &str, _: &str) {}
    fn on_batch_complete(&self, _: usize, _: usize, _: usize, _: Duration) {}
}

pub struct BatchScorer {
    scorer: Arc<Scorer>,
    config: BatchConfig,
}

impl BatchScorer {
    pub fn new(scorer: Arc<Scorer>, config: BatchConfig) -> Self {
        Self { scorer, config }
    }

    /// Score every submission in `set`.
    pub async fn run(&self, set: &ScoringSet, progress: &dyn BatchProgress) -> BatchReport {
        let start = Instant::now();
        let semaphore = Arc::new(Semaphore::new(self.config.parallelism.max(1)));

        let mut futures = FuturesUnordered::new();

        for (index, submission) in set.submissions.iter().enumerate() {
            let scorer = Arc::clone(&self.scorer);
            let semaphore = Arc::clone(&semaphore);
            let submission = submission.clone();
            let request = set.request_for(&submission);

            futures.push(async move {
                let Some(request) = request else {
                    let message = format!("unknown question: {}", submission.question_id);
                    return (index, SubmissionOutcome::failed(&submission, message, 0));
                };
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return (index, SubmissionOutcome::failed(&submission, "semaphore closed", 0));
                };

                let started = Instant::now();
                let scored = tokio::task::spawn_blocking(move || scorer.score(&request)).await;
                let elapsed_ms = started.elapsed().as_millis() as u64;

                let outcome = match scored {
                    Ok(Ok(result)) => SubmissionOutcome::scored(&submission, result, elapsed_ms),
                    Ok(Err(e)) => SubmissionOutcome::failed(&submission, e.to_string(), elapsed_ms),
                    Err(e) => SubmissionOutcome::failed(
                        &submission,
                        format!("scoring task failed: {e}"),
                        elapsed_ms,
                    ),
                };
                (index, outcome)
            });
        }

        let total = futures.len();
        let mut slots: Vec<Option<SubmissionOutcome>> = vec![None; total];
        let mut scored = 0usize;
        let mut failed = 0usize;

        while let Some((index, outcome)) = futures.next().await {
            match &outcome.error {
                None => {
                    progress.on_submission_complete(&outcome);
                    scored += 1;
                }
                Some(e) => {
                    tracing::error!("scoring failed for {}: {e}", outcome.submission_id);
                    progress.on_submission_error(&outcome.submission_id, e);
                    failed += 1;
                }
            }
            slots[index] = Some(outcome);
        }

        let elapsed = start.elapsed();
        progress.on_batch_complete(total, scored, failed, elapsed);

        let outcomes: Vec<SubmissionOutcome> = slots.into_iter().flatten().collect();
        let stats = compute_batch_stats(&outcomes);

        BatchReport {
            id: Uuid::new_v4(),
            created_at: chrono::Utc::now(),
            scoring_set: ScoringSetSummary {
                id: set.id.clone(),
                name: set.name.clone(),
                question_count: set.questions.len(),
                submission_count: set.submissions.len(),
            },
            outcomes,
            stats,
            duration_ms: elapsed.as_millis() as u64,
        }
    }
}
