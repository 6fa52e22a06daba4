//! Error taxonomy shared by every analysis component.
//!
//! None of these are fatal to a pipeline run: callers degrade a failed stage
//! to "no result" and keep going.

use thiserror::Error;

/// Errors raised by analysis components.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    /// Not enough observations to produce a result.
    #[error("insufficient data for {stage}: need at least {required}, found {found}")]
    InsufficientData {
        /// Component or computation that ran out of data.
        stage: &'static str,
        /// Minimum observation count required.
        required: usize,
        /// Observation count actually available.
        found: usize,
    },

    /// A zero denominator or singular system made the statistic undefined.
    #[error("{stage} is undefined: {reason}")]
    Degenerate {
        /// Component or computation that hit the degenerate case.
        stage: &'static str,
        /// Human-readable description.
        reason: String,
    },

    /// A structural invariant of produced records does not hold.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    /// Configuration values are out of range or inconsistent.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl AnalysisError {
    /// Shorthand for [`AnalysisError::InsufficientData`].
    #[must_use]
    pub fn insufficient(stage: &'static str, required: usize, found: usize) -> Self {
        Self::InsufficientData {
            stage,
            required,
            found,
        }
    }

    /// Shorthand for [`AnalysisError::Degenerate`].
    #[must_use]
    pub fn degenerate(stage: &'static str, reason: impl Into<String>) -> Self {
        Self::Degenerate {
            stage,
            reason: reason.into(),
        }
    }

    /// Returns true for the "insufficient data" condition.
    #[must_use]
    pub fn is_insufficient_data(&self) -> bool {
        matches!(self, Self::InsufficientData { .. })
    }
}

/// Result alias used throughout the analysis crates.
pub type AnalysisResult<T> = Result<T, AnalysisError>;
