//! The `essaymark validate` command.

use std::path::PathBuf;

use anyhow::Result;

use essaymark_core::parser;

pub fn execute(set_path: PathBuf) -> Result<()> {
    let sets = if set_path.is_dir() {
        parser::load_set_directory(&set_path)?
    } else {
        vec![parser::parse_scoring_set(&set_path)?]
    };

    let mut total_warnings = 0;

    for set in &sets {
        println!(
            "Scoring set: {} ({} questions, {} submissions)",
            set.name,
            set.questions.len(),
            set.submissions.len()
        );

        let warnings = parser::validate_scoring_set(set);
        for w in &warnings {
            let prefix = w
                .item_id
                .as_ref()
                .map(|id| format!("  [{id}]"))
                .unwrap_or_else(|| "  ".to_string());
            println!("{prefix} WARNING: {}", w.message);
        }
        total_warnings += warnings.len();
    }

    if total_warnings == 0 {
        println!("All scoring sets valid.");
    } else {
        println!("\n{total_warnings} warning(s) found.");
    }

    Ok(())
}
