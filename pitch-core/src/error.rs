//! # Error Module
//!
//! Precondition faults raised by the analysis pipeline.
//!
//! Only structural violations are errors here. A frame without a usable peak,
//! or a peak too flat to interpolate, is a normal analysis outcome and is
//! reported through `Option`/`Refinement` instead.

use thiserror::Error;

/// Errors returned by the pitch analysis pipeline.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    /// A frame (or buffer) length does not match the configured length.
    #[error("dimension mismatch: expected {expected} samples, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// The transform size is zero or not a power of two.
    #[error("invalid transform size {0}: must be a non-zero power of two")]
    InvalidSize(usize),

    /// A frequency that must be strictly positive and finite was not.
    #[error("invalid frequency {0} Hz: must be positive and finite")]
    InvalidFrequency(f64),

    /// The sample rate is non-positive or not finite.
    #[error("invalid sample rate {0} Hz")]
    InvalidSampleRate(f64),

    /// A configuration field is out of its valid range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, AnalysisError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offending_values() {
        let err = AnalysisError::DimensionMismatch {
            expected: 4096,
            actual: 4000,
        };
        assert_eq!(
            err.to_string(),
            "dimension mismatch: expected 4096 samples, got 4000"
        );
        assert!(AnalysisError::InvalidSize(12).to_string().contains("12"));
        assert!(AnalysisError::InvalidFrequency(-1.0).to_string().contains("-1"));
    }
}
