//! essaymark CLI: score answers, run calibration batches and compare reports.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "essaymark", version, about = "Heuristic essay-scoring engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score one answer against a reference answer
    Score {
        /// Student answer file, or "-" for stdin
        #[arg(long)]
        student: PathBuf,

        /// Reference answer file
        #[arg(long)]
        reference: PathBuf,

        /// Marks available for the question
        #[arg(long, default_value = "10")]
        max_marks: u32,

        /// Question prompt, used for subject-domain detection
        #[arg(long)]
        question: Option<String>,

        /// Question type: essay, short_answer, explanation, definition
        #[arg(long)]
        question_type: Option<String>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output format: text, json
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Score every submission in a scoring set
    Batch {
        /// Path to .toml scoring set or directory
        #[arg(long)]
        set: PathBuf,

        /// Max submissions scored concurrently
        #[arg(long, default_value = "4")]
        parallelism: usize,

        /// Output directory
        #[arg(long, default_value = "./essaymark-results")]
        output: PathBuf,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Compare two batch reports
    Compare {
        /// Baseline report JSON
        #[arg(long)]
        baseline: PathBuf,

        /// Current report JSON
        #[arg(long)]
        current: PathBuf,

        /// Regression threshold in percentage points
        #[arg(long, default_value = "5")]
        threshold: f64,

        /// Exit code 1 if regressions found
        #[arg(long)]
        fail_on_regression: bool,

        /// Output format: text, json, markdown
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Validate scoring set TOML files
    Validate {
        /// Path to scoring set file or directory
        #[arg(long)]
        set: PathBuf,
    },

    /// Create starter config and example scoring set
    Init,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("essaymark=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Score {
            student,
            reference,
            max_marks,
            question,
            question_type,
            config,
            format,
        } => commands::score::execute(commands::score::ScoreArgs {
            student,
            reference,
            max_marks,
            question,
            question_type,
            config,
            format,
        }),
        Commands::Batch {
            set,
            parallelism,
            output,
            config,
        } => commands::batch::execute(set, parallelism, output, config).await,
        Commands::Compare {
            baseline,
            current,
            threshold,
            fail_on_regression,
            format,
        } => commands::compare::execute(baseline, current, threshold, fail_on_regression, format),
        Commands::Validate { set } => commands::validate::execute(set),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
