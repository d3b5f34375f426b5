//! The `essaymark batch` command.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use comfy_table::{Cell, Table};

use essaymark_core::batch::{BatchConfig, BatchProgress, BatchScorer};
use essaymark_core::config::load_config_from;
use essaymark_core::parser;
use essaymark_core::report::BatchReport;
use essaymark_core::results::SubmissionOutcome;
use essaymark_core::Scorer;

/// Console progress reporter.
struct ConsoleReporter;

impl BatchProgress for ConsoleReporter {
    fn on_submission_complete(&self, outcome: &SubmissionOutcome) {
        let Some(result) = &outcome.result else {
            return;
        };
        let expectation = match outcome.within_expectation() {
            Some(true) => " (as expected)",
            Some(false) => " (OUTSIDE expected range)",
            None => "",
        };
        eprintln!(
            "  Done: {} :: {} {}/{} {}{} ({}ms)",
            outcome.question_id,
            outcome.submission_id,
            result.total_score,
            result.max_marks,
            result.grade,
            expectation,
            outcome.duration_ms,
        );
    }

    fn on_submission_error(&self, submission_id: &str, error: &str) {
        eprintln!("  ERROR: {submission_id}: {error}");
    }

    fn on_batch_complete(&self, total: usize, scored: usize, failed: usize, elapsed: Duration) {
        eprintln!(
            "\nComplete: {scored}/{total} scored, {failed} failed ({:.1}s)",
            elapsed.as_secs_f64()
        );
    }
}

pub async fn execute(
    set_path: PathBuf,
    parallelism: usize,
    output: PathBuf,
    config_path: Option<PathBuf>,
) -> Result<()> {
    anyhow::ensure!(parallelism >= 1, "parallelism must be at least 1");

    let config = load_config_from(config_path.as_deref())?;
    let scorer = Arc::new(Scorer::new(config)?);
    let sets = parser::load_sets(&set_path)?;
    anyhow::ensure!(!sets.is_empty(), "no scoring sets found in {}", set_path.display());
    tracing::debug!("loaded {} scoring set(s) from {}", sets.len(), set_path.display());

    let batch = BatchScorer::new(scorer, BatchConfig { parallelism });
    let reporter = ConsoleReporter;

    for set in &sets {
        eprintln!(
            "essaymark v{}: scoring {} submissions across {} questions ({})",
            env!("CARGO_PKG_VERSION"),
            set.submissions.len(),
            set.questions.len(),
            set.name
        );
        eprintln!();

        let report = batch.run(set, &reporter).await;

        print_summary(&report);

        std::fs::create_dir_all(&output)?;
        let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H%M%S");
        let path = output.join(format!("report-{}-{timestamp}.json", set.id));
        report.save_json(&path)?;
        eprintln!("Results saved to: {}", path.display());
    }

    Ok(())
}

fn print_summary(report: &BatchReport) {
    let stats = &report.stats;

    let mut table = Table::new();
    table.set_header(vec!["Question", "Submissions", "Mean %", "Pass rate"]);
    for (question, q) in &stats.per_question {
        table.add_row(vec![
            Cell::new(question),
            Cell::new(q.submissions),
            Cell::new(format!("{:.1}%", q.mean_percentage)),
            Cell::new(format!("{:.1}%", q.pass_rate * 100.0)),
        ]);
    }
    eprintln!("\n{table}");

    eprintln!(
        "Overall: mean {:.1}%, median {:.1}%, stdev {:.1}, pass rate {:.1}%",
        stats.mean_percentage,
        stats.median_percentage,
        stats.stdev_percentage,
        stats.pass_rate * 100.0
    );

    if !stats.grade_distribution.is_empty() {
        let grades: Vec<String> = stats
            .grade_distribution
            .iter()
            .map(|(grade, count)| format!("{grade}: {count}"))
            .collect();
        eprintln!("Grades: {}", grades.join(", "));
    }

    if let Some(calibration) = &stats.calibration {
        eprintln!(
            "Calibration: {}/{} within expected range ({:.1}%)",
            calibration.within,
            calibration.checked,
            calibration.hit_rate * 100.0
        );
    }
}
