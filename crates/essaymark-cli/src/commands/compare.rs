//! The `essaymark compare` command.

use std::path::PathBuf;

use anyhow::Result;

use essaymark_core::report::BatchReport;

pub fn execute(
    baseline_path: PathBuf,
    current_path: PathBuf,
    threshold: f64,
    fail_on_regression: bool,
    format: String,
) -> Result<()> {
    anyhow::ensure!(threshold >= 0.0, "threshold must not be negative");

    let baseline = BatchReport::load_json(&baseline_path)?;
    let current = BatchReport::load_json(&current_path)?;

    let report = current.compare(&baseline, threshold);

    match format.as_str() {
        "markdown" | "md" => {
            println!("{}", report.to_markdown());
        }
        "json" => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        _ => {
            println!(
                "Comparison: {} regressions, {} improvements, {} unchanged",
                report.regressions.len(),
                report.improvements.len(),
                report.unchanged
            );

            if !report.regressions.is_empty() {
                println!("\nRegressions:");
                for r in &report.regressions {
                    let note = if r.left_expected_range {
                        " [left expected range]"
                    } else {
                        ""
                    };
                    println!(
                        "  {} {}% -> {}% ({:+.0}){note}",
                        r.submission_id, r.baseline_percentage, r.current_percentage, r.delta
                    );
                }
            }

            if !report.improvements.is_empty() {
                println!("\nImprovements:");
                for i in &report.improvements {
                    println!(
                        "  {} {}% -> {}% ({:+.0})",
                        i.submission_id, i.baseline_percentage, i.current_percentage, i.delta
                    );
                }
            }

            if report.new_submissions > 0 {
                println!("\n{} new submission(s)", report.new_submissions);
            }
            if report.removed_submissions > 0 {
                println!("{} removed submission(s)", report.removed_submissions);
            }
        }
    }

    if fail_on_regression && report.has_regressions() {
        std::process::exit(1);
    }

    Ok(())
}
