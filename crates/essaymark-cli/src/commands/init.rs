//! The `essaymark init` command.

use std::path::Path;

use anyhow::Result;

pub fn execute() -> Result<()> {
    if Path::new("essaymark.toml").exists() {
        println!("essaymark.toml already exists, skipping.");
    } else {
        std::fs::write("essaymark.toml", SAMPLE_CONFIG)?;
        println!("Created essaymark.toml");
    }

    std::fs::create_dir_all("scoring-sets")?;
    let example_path = Path::new("scoring-sets/example.toml");
    if example_path.exists() {
        println!("scoring-sets/example.toml already exists, skipping.");
    } else {
        std::fs::write(example_path, EXAMPLE_SCORING_SET)?;
        println!("Created scoring-sets/example.toml");
    }

    println!("\nNext steps:");
    println!("  1. Tune essaymark.toml if the defaults do not suit your marking");
    println!("  2. Run: essaymark validate --set scoring-sets/example.toml");
    println!("  3. Run: essaymark batch --set scoring-sets/example.toml");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# essaymark configuration
# Every key is optional; omitted keys keep their defaults.

parallel_layers = true

# Share of the total allotted to each layer. Must sum to 1.0.
[weights]
content_accuracy = 0.20
semantic_understanding = 0.20
quality_differentiation = 0.20
writing_quality = 0.15
critical_thinking = 0.10
technical_precision = 0.08
cognitive_complexity = 0.05
conceptual_depth = 0.02

[analysis]
max_chars = 5000
max_reference_concepts = 30

[adjustments]
multiplier_min = 0.5
multiplier_max = 2.0
exceptional_bonus_cap = 0.8
creative_bonus_cap = 0.2
penalty_cap = 0.3
gibberish_deduction = 0.3
off_topic_deduction = 0.5
pass_ratio = 0.6

[feedback]
layer_threshold = 0.6
"#;

const EXAMPLE_SCORING_SET: &str = r#"[scoring_set]
id = "example"
name = "Example Scoring Set"
description = "A single OOP question with answers of increasing quality"

[[questions]]
id = "oop_principles"
text = "Explain the main principles of object-oriented programming."
type = "explanation"
max_marks = 10
reference_answer = """
Object-oriented programming (OOP) is a programming paradigm that organises software around \
objects, which combine data and the methods that act on that data. Encapsulation bundles data \
with the methods that operate on it and hides the internal state of an object. Abstraction \
exposes only the essential features of an object and hides unnecessary detail. Inheritance \
allows a class to derive attributes and methods from a parent class, which promotes code reuse. \
Polymorphism allows objects of different classes to be treated through a common interface.
"""

[[submissions]]
id = "unrelated_words"
question = "oop_principles"
answer = "apple, car, tree, house, river, blue, seven, happy."
expected_min = 0
expected_max = 2

[[submissions]]
id = "one_liner"
question = "oop_principles"
answer = "OOP is programming. It has objects."
expected_min = 1
expected_max = 5

[[submissions]]
id = "four_principles"
question = "oop_principles"
answer = """
Encapsulation hides data in an object. Abstraction shows only important features. \
Inheritance lets a class reuse a parent class. Polymorphism lets objects take many forms.
"""
expected_min = 5
expected_max = 9
"#;
