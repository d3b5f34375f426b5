//! TOML scoring set parser.
//!
//! Loads scoring sets from TOML files and directories, and validates them.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::model::{Difficulty, Question, QuestionType, ScoringSet, Submission};

/// Intermediate TOML structure for parsing scoring set files.
#[derive(Debug, Deserialize)]
struct TomlScoringFile {
    scoring_set: TomlScoringSetHeader,
    #[serde(default)]
    questions: Vec<TomlQuestion>,
    #[serde(default)]
    submissions: Vec<TomlSubmission>,
}

#[derive(Debug, Deserialize)]
struct TomlScoringSetHeader {
    id: String,
    name: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct TomlQuestion {
    id: String,
    #[serde(default)]
    text: Option<String>,
    #[serde(default, rename = "type")]
    question_type: Option<String>,
    #[serde(default)]
    difficulty: Option<String>,
    max_marks: u32,
    reference_answer: String,
}

#[derive(Debug, Deserialize)]
struct TomlSubmission {
    id: String,
    question: String,
    answer: String,
    #[serde(default)]
    expected_min: Option<u32>,
    #[serde(default)]
    expected_max: Option<u32>,
}

/// Parse a single TOML file into a `ScoringSet`.
pub fn parse_scoring_set(path: &Path) -> Result<ScoringSet> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read scoring set file: {}", path.display()))?;

    parse_scoring_set_str(&content, path)
}

/// Parse a TOML string into a `ScoringSet` (useful for testing).
pub fn parse_scoring_set_str(content: &str, source_path: &Path) -> Result<ScoringSet> {
    let parsed: TomlScoringFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    let questions = parsed
        .questions
        .into_iter()
        .map(|q| {
            let question_type = q
                .question_type
                .map(|t| t.parse::<QuestionType>().map_err(|e| anyhow::anyhow!("{}", e)))
                .transpose()
                .with_context(|| format!("question '{}'", q.id))?;
            let difficulty = q
                .difficulty
                .map(|d| d.parse::<Difficulty>().map_err(|e| anyhow::anyhow!("{}", e)))
                .transpose()
                .with_context(|| format!("question '{}'", q.id))?;

            Ok(Question {
                id: q.id,
                text: q.text,
                question_type,
                difficulty,
                max_marks: q.max_marks,
                reference_answer: q.reference_answer,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let submissions = parsed
        .submissions
        .into_iter()
        .map(|s| Submission {
            id: s.id,
            question_id: s.question,
            answer: s.answer,
            expected_min: s.expected_min,
            expected_max: s.expected_max,
        })
        .collect();

    Ok(ScoringSet {
        id: parsed.scoring_set.id,
        name: parsed.scoring_set.name,
        description: parsed.scoring_set.description,
        questions,
        submissions,
    })
}

/// Recursively load all `.toml` scoring set files from a directory, in
/// file-name order.
pub fn load_set_directory(dir: &Path) -> Result<Vec<ScoringSet>> {
    let mut sets = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    let mut paths = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<Vec<_>>>()?;
    paths.sort();

    for path in paths {
        if path.is_dir() {
            sets.extend(load_set_directory(&path)?);
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            match parse_scoring_set(&path) {
                Ok(set) => sets.push(set),
                Err(e) => {
                    tracing::warn!("skipping {}: {:#}", path.display(), e);
                }
            }
        }
    }

    Ok(sets)
}

/// Load a single file or every set under a directory.
pub fn load_sets(path: &Path) -> Result<Vec<ScoringSet>> {
    if path.is_dir() {
        load_set_directory(path)
    } else {
        Ok(vec![parse_scoring_set(path)?])
    }
}

/// A warning from scoring set validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The question or submission ID (if applicable).
    pub item_id: Option<String>,
    /// Warning message.
    pub message: String,
}

impl ValidationWarning {
    fn new(item_id: &str, message: impl Into<String>) -> Self {
        Self {
            item_id: Some(item_id.to_string()),
            message: message.into(),
        }
    }
}

/// Validate a scoring set for common issues.
pub fn validate_scoring_set(set: &ScoringSet) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    if set.submissions.is_empty() {
        warnings.push(ValidationWarning {
            item_id: None,
            message: "scoring set has no submissions".into(),
        });
    }

    let mut seen_questions = HashSet::new();
    for question in &set.questions {
        if !seen_questions.insert(&question.id) {
            warnings.push(ValidationWarning::new(
                &question.id,
                format!("duplicate question ID: {}", question.id),
            ));
        }
        if question.max_marks == 0 {
            warnings.push(ValidationWarning::new(&question.id, "max_marks must be positive"));
        }
        if question.reference_answer.trim().is_empty() {
            warnings.push(ValidationWarning::new(&question.id, "reference answer is empty"));
        }
    }

    let mut seen_submissions = HashSet::new();
    for submission in &set.submissions {
        if !seen_submissions.insert(&submission.id) {
            warnings.push(ValidationWarning::new(
                &submission.id,
                format!("duplicate submission ID: {}", submission.id),
            ));
        }
        if submission.answer.trim().is_empty() {
            warnings.push(ValidationWarning::new(&submission.id, "answer is empty"));
        }

        let Some(question) = set.question(&submission.question_id) else {
            warnings.push(ValidationWarning::new(
                &submission.id,
                format!("unknown question: {}", submission.question_id),
            ));
            continue;
        };

        if let (Some(min), Some(max)) = (submission.expected_min, submission.expected_max) {
            if min > max {
                warnings.push(ValidationWarning::new(
                    &submission.id,
                    format!("expected_min {min} is greater than expected_max {max}"),
                ));
            }
        }
        let limit = question.max_marks;
        if let Some(bound) = submission
            .expected_min
            .into_iter()
            .chain(submission.expected_max)
            .find(|b| *b > limit)
        {
            warnings.push(ValidationWarning::new(
                &submission.id,
                format!("expected score {bound} exceeds max_marks {limit}"),
            ));
        }
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const VALID_TOML: &str = r#"
[scoring_set]
id = "oop"
name = "OOP principles"
description = "Calibration answers for the OOP question"

[[questions]]
id = "principles"
text = "Explain the four principles of object-oriented programming."
type = "essay"
difficulty = "medium"
max_marks = 10
reference_answer = """
Encapsulation bundles data with the methods that operate on it.
Inheritance lets a class derive behaviour from a parent class.
"""

[[submissions]]
id = "weak"
question = "principles"
answer = "OOP is programming. It has objects."
expected_min = 2
expected_max = 4
"#;

    #[test]
    fn parse_valid_toml() {
        let set = parse_scoring_set_str(VALID_TOML, &PathBuf::from("test.toml")).unwrap();
        assert_eq!(set.id, "oop");
        assert_eq!(set.questions.len(), 1);
        assert_eq!(set.questions[0].question_type, Some(QuestionType::Essay));
        assert_eq!(set.questions[0].difficulty, Some(Difficulty::Medium));
        assert_eq!(set.submissions[0].question_id, "principles");
        assert_eq!(set.submissions[0].expected_max, Some(4));
        assert!(validate_scoring_set(&set).is_empty());

        let request = set.request_for(&set.submissions[0]).unwrap();
        assert_eq!(request.max_marks, 10);
        assert_eq!(
            request.question_metadata.unwrap().id.as_deref(),
            Some("principles")
        );
    }

    #[test]
    fn parse_missing_optional_fields() {
        let toml = r#"
[scoring_set]
id = "minimal"
name = "Minimal"

[[questions]]
id = "q"
max_marks = 5
reference_answer = "Water boils at one hundred degrees."

[[submissions]]
id = "s"
question = "q"
answer = "It boils at 100."
"#;
        let set = parse_scoring_set_str(toml, &PathBuf::from("test.toml")).unwrap();
        assert!(set.description.is_empty());
        assert_eq!(set.questions[0].question_type, None);
        assert!(!set.submissions[0].has_expectation());
    }

    #[test]
    fn rejects_unknown_question_type() {
        let toml = r#"
[scoring_set]
id = "bad"
name = "Bad"

[[questions]]
id = "q"
type = "poem"
max_marks = 5
reference_answer = "text"
"#;
        let err = parse_scoring_set_str(toml, &PathBuf::from("bad.toml")).unwrap_err();
        assert!(format!("{err:#}").contains("unknown question type"));
    }

    #[test]
    fn validate_reports_problems() {
        let toml = r#"
[scoring_set]
id = "problems"
name = "Problems"

[[questions]]
id = "q"
max_marks = 0
reference_answer = " "

[[submissions]]
id = "s"
question = "q"
answer = ""
expected_min = 3
expected_max = 1

[[submissions]]
id = "s"
question = "missing"
answer = "text"
"#;
        let set = parse_scoring_set_str(toml, &PathBuf::from("test.toml")).unwrap();
        let messages: Vec<String> = validate_scoring_set(&set)
            .into_iter()
            .map(|w| w.message)
            .collect();
        for expected in [
            "max_marks must be positive",
            "reference answer is empty",
            "answer is empty",
            "greater than expected_max",
            "exceeds max_marks",
            "duplicate submission ID",
            "unknown question: missing",
        ] {
            assert!(
                messages.iter().any(|m| m.contains(expected)),
                "missing warning '{expected}' in {messages:?}"
            );
        }
    }

    #[test]
    fn parse_malformed_toml() {
        let bad = "this is not [valid toml }{";
        let result = parse_scoring_set_str(bad, &PathBuf::from("bad.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn load_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.toml"), VALID_TOML.replace("\"oop\"", "\"b\"")).unwrap();
        std::fs::write(dir.path().join("a.toml"), VALID_TOML.replace("\"oop\"", "\"a\"")).unwrap();
        std::fs::write(dir.path().join("broken.toml"), "not toml [").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let sets = load_set_directory(dir.path()).unwrap();
        let ids: Vec<&str> = sets.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }
}
