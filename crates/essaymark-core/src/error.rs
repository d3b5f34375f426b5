//! Scoring error types.
//!
//! Only [`ScoringError::InvalidInput`], [`ScoringError::InvalidConfiguration`] and
//! [`ScoringError::ScoringFailure`] ever reach the caller of
//! [`Scorer::score`](crate::engine::Scorer::score). Analyzer failures are neutralised
//! inside the pipeline so that a result is always produced.

use thiserror::Error;

use crate::model::LayerKind;

/// Errors that can occur while scoring an answer.
#[derive(Debug, Clone, Error)]
pub enum ScoringError {
    /// The request itself is unusable (e.g. `max_marks` is zero).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The scoring configuration or lexicon is inconsistent.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A single scoring layer panicked or produced a non-finite value.
    #[error("analyzer '{layer}' failed: {message}")]
    AnalyzerFailure { layer: LayerKind, message: String },

    /// The pipeline could not produce a trustworthy result.
    #[error("scoring failed: {0}")]
    ScoringFailure(String),
}

impl ScoringError {
    /// Returns `true` if the caller may retry the same request.
    ///
    /// Input and configuration errors are deterministic and never succeed on retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ScoringError::ScoringFailure(_))
    }

    /// The layer that failed, for analyzer failures.
    pub fn layer(&self) -> Option<LayerKind> {
        match self {
            ScoringError::AnalyzerFailure { layer, .. } => Some(*layer),
            _ => None,
        }
    }
}
