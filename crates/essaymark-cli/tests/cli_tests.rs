//! CLI integration tests using assert_cmd.

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const REFERENCE: &str = "Object-oriented programming (OOP) is a programming paradigm that \
    organises software around objects, which combine data and the methods that act on that data. \
    Encapsulation bundles data with the methods that operate on it and hides the internal state \
    of an object. Abstraction exposes only the essential features of an object and hides \
    unnecessary detail. Inheritance allows a class to derive attributes and methods from a parent \
    class, which promotes code reuse. Polymorphism allows objects of different classes to be \
    treated through a common interface.";

fn essaymark() -> Command {
    #[allow(deprecated)]
    Command::cargo_bin("essaymark").unwrap()
}

fn write_answers(dir: &TempDir, student: &str) -> (PathBuf, PathBuf) {
    let student_path = dir.path().join("student.txt");
    let reference_path = dir.path().join("reference.txt");
    std::fs::write(&student_path, student).unwrap();
    std::fs::write(&reference_path, REFERENCE).unwrap();
    (student_path, reference_path)
}

/// Run `batch` on the OOP set and return the path of the written report.
fn run_batch(output: &Path) -> PathBuf {
    essaymark()
        .arg("batch")
        .arg("--set")
        .arg("../../scoring-sets/oop.toml")
        .arg("--output")
        .arg(output)
        .assert()
        .success()
        .stderr(predicate::str::contains("Results saved to"));

    let mut reports: Vec<PathBuf> = std::fs::read_dir(output)
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .filter(|p| p.extension().is_some_and(|e| e == "json"))
        .collect();
    assert_eq!(reports.len(), 1, "expected one report in {}", output.display());
    reports.remove(0)
}

#[test]
fn validate_oop_set() {
    essaymark()
        .arg("validate")
        .arg("--set")
        .arg("../../scoring-sets/oop.toml")
        .assert()
        .success()
        .stdout(predicate::str::contains("5 submissions"))
        .stdout(predicate::str::contains("All scoring sets valid"));
}

#[test]
fn validate_directory() {
    essaymark()
        .arg("validate")
        .arg("--set")
        .arg("../../scoring-sets")
        .assert()
        .success()
        .stdout(predicate::str::contains("OOP Principles"))
        .stdout(predicate::str::contains("Science and Economics"));
}

#[test]
fn validate_reports_warnings() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.toml");
    std::fs::write(
        &path,
        r#"
[scoring_set]
id = "broken"
name = "Broken"

[[questions]]
id = "q1"
max_marks = 5
reference_answer = "Encapsulation hides internal state."

[[submissions]]
id = "s1"
question = "missing"
answer = "Something."
"#,
    )
    .unwrap();

    essaymark()
        .arg("validate")
        .arg("--set")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("[s1] WARNING: unknown question: missing"))
        .stdout(predicate::str::contains("1 warning(s) found"));
}

#[test]
fn validate_nonexistent_file() {
    essaymark()
        .arg("validate")
        .arg("--set")
        .arg("nonexistent.toml")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn init_creates_files() {
    let dir = TempDir::new().unwrap();

    essaymark()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created essaymark.toml"))
        .stdout(predicate::str::contains("Created scoring-sets/example.toml"));

    assert!(dir.path().join("essaymark.toml").exists());
    assert!(dir.path().join("scoring-sets/example.toml").exists());

    // The generated files must be usable straight away.
    essaymark()
        .current_dir(dir.path())
        .arg("validate")
        .arg("--set")
        .arg("scoring-sets/example.toml")
        .assert()
        .success()
        .stdout(predicate::str::contains("All scoring sets valid"));
}

#[test]
fn init_skips_existing() {
    let dir = TempDir::new().unwrap();

    essaymark()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success();

    essaymark()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
}

#[test]
fn score_text_output() {
    let dir = TempDir::new().unwrap();
    let (student, reference) = write_answers(&dir, REFERENCE);

    essaymark()
        .current_dir(dir.path())
        .arg("score")
        .arg("--student")
        .arg(&student)
        .arg("--reference")
        .arg(&reference)
        .assert()
        .success()
        .stdout(predicate::str::contains("Score: 10/10 (100%), grade A+"))
        .stdout(predicate::str::contains("Result: PASS"))
        .stdout(predicate::str::contains("content accuracy"))
        .stdout(predicate::str::contains("Feedback:"));
}

#[test]
fn score_json_output() {
    let dir = TempDir::new().unwrap();
    let (student, reference) = write_answers(&dir, "OOP is programming. It has objects.");

    let output = essaymark()
        .current_dir(dir.path())
        .arg("score")
        .arg("--student")
        .arg(&student)
        .arg("--reference")
        .arg(&reference)
        .arg("--format")
        .arg("json")
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["maxMarks"], 10);
    assert_eq!(json["isPassed"], false);
    let total = json["totalScore"].as_u64().unwrap();
    assert!((2..=4).contains(&total), "scored {total}");
    assert!(json["detailedBreakdown"]["contentAccuracy"]["maxScore"].is_number());
}

#[test]
fn score_reads_answer_from_stdin() {
    let dir = TempDir::new().unwrap();
    let (_, reference) = write_answers(&dir, "");

    essaymark()
        .current_dir(dir.path())
        .arg("score")
        .arg("--student")
        .arg("-")
        .arg("--reference")
        .arg(&reference)
        .arg("--max-marks")
        .arg("5")
        .write_stdin("apple, car, tree, house, river, blue, seven, happy.")
        .assert()
        .success()
        .stdout(predicate::str::contains("/5"))
        .stdout(predicate::str::contains("Result: FAIL"));
}

#[test]
fn score_rejects_zero_max_marks() {
    let dir = TempDir::new().unwrap();
    let (student, reference) = write_answers(&dir, REFERENCE);

    essaymark()
        .current_dir(dir.path())
        .arg("score")
        .arg("--student")
        .arg(&student)
        .arg("--reference")
        .arg(&reference)
        .arg("--max-marks")
        .arg("0")
        .assert()
        .failure()
        .stderr(predicate::str::contains("max-marks"));
}

#[test]
fn score_rejects_invalid_config() {
    let dir = TempDir::new().unwrap();
    let (student, reference) = write_answers(&dir, REFERENCE);
    let config = dir.path().join("bad.toml");
    std::fs::write(&config, "[weights]\nconceptual_depth = 0.5\n").unwrap();

    essaymark()
        .current_dir(dir.path())
        .arg("score")
        .arg("--student")
        .arg(&student)
        .arg("--reference")
        .arg(&reference)
        .arg("--config")
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("sum to 1.0"));
}

#[test]
fn batch_writes_report() {
    let dir = TempDir::new().unwrap();
    let report_path = run_batch(dir.path());

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&report_path).unwrap()).unwrap();
    assert_eq!(json["scoring_set"]["id"], "oop");
    assert_eq!(json["outcomes"].as_array().unwrap().len(), 5);
    assert_eq!(json["stats"]["scored"], 5);
    assert_eq!(json["stats"]["failed"], 0);
}

#[test]
fn compare_identical_runs() {
    let baseline_dir = TempDir::new().unwrap();
    let current_dir = TempDir::new().unwrap();
    let baseline = run_batch(baseline_dir.path());
    let current = run_batch(current_dir.path());

    essaymark()
        .arg("compare")
        .arg("--baseline")
        .arg(&baseline)
        .arg("--current")
        .arg(&current)
        .arg("--fail-on-regression")
        .assert()
        .success()
        .stdout(predicate::str::contains("0 regressions"))
        .stdout(predicate::str::contains("5 unchanged"));
}

#[test]
fn compare_detects_regression() {
    let dir = TempDir::new().unwrap();
    let baseline = run_batch(&dir.path().join("baseline"));

    let mut json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&baseline).unwrap()).unwrap();
    for outcome in json["outcomes"].as_array_mut().unwrap() {
        if outcome["submission_id"] == "oop_near_verbatim" {
            outcome["result"]["totalScore"] = 0.into();
            outcome["result"]["percentage"] = 0.into();
        }
    }
    let current = dir.path().join("current.json");
    std::fs::write(&current, serde_json::to_string_pretty(&json).unwrap()).unwrap();

    essaymark()
        .arg("compare")
        .arg("--baseline")
        .arg(&baseline)
        .arg("--current")
        .arg(&current)
        .assert()
        .success()
        .stdout(predicate::str::contains("1 regressions"))
        .stdout(predicate::str::contains("oop_near_verbatim"));

    essaymark()
        .arg("compare")
        .arg("--baseline")
        .arg(&baseline)
        .arg("--current")
        .arg(&current)
        .arg("--fail-on-regression")
        .assert()
        .failure();

    essaymark()
        .arg("compare")
        .arg("--baseline")
        .arg(&baseline)
        .arg("--current")
        .arg(&current)
        .arg("--format")
        .arg("markdown")
        .assert()
        .success()
        .stdout(predicate::str::contains("oop_near_verbatim"));
}

#[test]
fn compare_nonexistent_report() {
    essaymark()
        .arg("compare")
        .arg("--baseline")
        .arg("no_such_file.json")
        .arg("--current")
        .arg("also_no_file.json")
        .assert()
        .failure();
}

#[test]
fn help_output() {
    essaymark()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Heuristic essay-scoring engine"));
}

#[test]
fn version_output() {
    essaymark()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("essaymark"));
}
