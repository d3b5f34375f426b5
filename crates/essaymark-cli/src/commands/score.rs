//! The `essaymark score` command.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use comfy_table::{Cell, Table};

use essaymark_core::config::load_config_from;
use essaymark_core::model::{QuestionMetadata, QuestionType, ScoringRequest};
use essaymark_core::{Scorer, ScoringResult, TracingObserver};

pub struct ScoreArgs {
    pub student: PathBuf,
    pub reference: PathBuf,
    pub max_marks: u32,
    pub question: Option<String>,
    pub question_type: Option<String>,
    pub config: Option<PathBuf>,
    pub format: String,
}

pub fn execute(args: ScoreArgs) -> Result<()> {
    anyhow::ensure!(args.max_marks >= 1, "max-marks must be at least 1");
    anyhow::ensure!(
        matches!(args.format.as_str(), "text" | "json"),
        "unknown format '{}', expected text or json",
        args.format
    );

    let config = load_config_from(args.config.as_deref())?;
    let scorer = Scorer::new(config)?.with_observer(Arc::new(TracingObserver));

    let student = read_answer(&args.student)?;
    let reference = std::fs::read_to_string(&args.reference)
        .with_context(|| format!("failed to read reference: {}", args.reference.display()))?;

    let question_type = args
        .question_type
        .as_deref()
        .map(|t| t.parse::<QuestionType>().map_err(|e| anyhow::anyhow!("{e}")))
        .transpose()?;

    let mut request = ScoringRequest::new(student, reference, args.max_marks);
    if args.question.is_some() || question_type.is_some() {
        request = request.with_metadata(QuestionMetadata {
            text: args.question,
            question_type,
            ..QuestionMetadata::default()
        });
    }

    let result = scorer.score(&request)?;

    match args.format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&result)?),
        _ => print_result(&result),
    }

    Ok(())
}

/// Read an answer from a file, or from stdin when the path is `-`.
fn read_answer(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut answer = String::new();
        std::io::stdin()
            .read_to_string(&mut answer)
            .context("failed to read answer from stdin")?;
        return Ok(answer);
    }
    std::fs::read_to_string(path)
        .with_context(|| format!("failed to read answer: {}", path.display()))
}

fn print_result(result: &ScoringResult) {
    println!(
        "Score: {}/{} ({}%), grade {}",
        result.total_score, result.max_marks, result.percentage, result.grade
    );
    println!("Band: {}", result.band);
    println!(
        "Result: {}",
        if result.is_passed { "PASS" } else { "FAIL" }
    );
    println!("Assessment: {}", result.assessment);

    let breakdown = &result.detailed_breakdown;
    let mut table = Table::new();
    table.set_header(vec!["Layer", "Score", "Max", "%"]);
    for (kind, layer) in &breakdown.layers {
        table.add_row(vec![
            Cell::new(kind.label()),
            Cell::new(format!("{:.2}", layer.score)),
            Cell::new(format!("{:.2}", layer.max_score)),
            Cell::new(format!("{:.0}%", layer.percentage())),
        ]);
    }
    println!("\n{table}");

    println!(
        "\nMultiplier x{:.2}, bonus +{:.2}, penalties -{:.2}",
        breakdown.intelligence_multiplier, breakdown.bonus_points, breakdown.penalties
    );
    println!(
        "Gibberish {:.2}, off-topic {:.2}",
        breakdown.gibberish_penalty, breakdown.off_topic_penalty
    );
    println!("\nFeedback: {}", result.feedback);
}
