//! essaymark-core: deterministic heuristic essay scoring.
//!
//! Scores a free-text answer against a reference answer through eight
//! weighted analysis layers, two gate checks (gibberish and off-topic) and a
//! capped bonus/penalty stage, producing marks, grade, band and feedback.
//! Batch scoring, scoring-set parsing and calibration reports build on top.
//!
//! ```no_run
//! use essaymark_core::Scorer;
//!
//! let scorer = Scorer::with_defaults()?;
//! let result = scorer.score_answer(
//!     "Encapsulation hides an object's internal state.",
//!     "Encapsulation bundles data with methods and hides internal state.",
//!     10,
//!     None,
//! )?;
//! println!("{} / {} ({})", result.total_score, result.max_marks, result.grade);
//! # Ok::<(), essaymark_core::ScoringError>(())
//! ```

pub mod aggregate;
pub mod batch;
pub mod concepts;
pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod feedback;
pub mod gates;
pub mod grading;
pub mod layers;
pub mod lexical;
pub mod lexicon;
pub mod model;
pub mod parser;
pub mod report;
pub mod results;
pub mod similarity;
pub mod statistics;
pub mod text;

pub use config::ScoringConfig;
pub use engine::{NoopObserver, Scorer, ScoringObserver, TracingObserver};
pub use error::ScoringError;
pub use model::{ScoringRequest, ScoringResult};
