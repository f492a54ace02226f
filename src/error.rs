//! Error types for the claim scoring pipeline

use thiserror::Error;

/// Failures raised while fitting or applying the isolation forest.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnomalyError {
    /// The batch is too small to build isolation trees from
    #[error("cannot fit isolation forest on {0} sample(s); at least 2 are required")]
    InsufficientSamples(usize),

    /// No numeric feature column was available
    #[error("feature matrix has no columns")]
    EmptyFeatureMatrix,

    #[error("contamination must be in (0, 0.5], got {0}")]
    InvalidContamination(f64),

    #[error("ensemble size must be at least 1")]
    EmptyEnsemble,

    #[error("max_samples must be at least 1")]
    InvalidMaxSamples,

    #[error("isolation forest has not been fitted")]
    NotFitted,

    #[error("feature dimension mismatch: fitted on {expected} column(s), got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

/// Errors surfaced to callers of [`crate::pipeline::ScoringPipeline`].
///
/// Missing columns and malformed timestamps never appear here; they are
/// resolved to documented defaults during feature derivation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PipelineError {
    /// The batch could not be scored because the anomaly stage failed.
    #[error("batch could not be scored: anomaly detection failed: {0}")]
    AnomalyDetection(#[from] AnomalyError),
}

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anomaly_error_converts_into_pipeline_error() {
        let err: PipelineError = AnomalyError::InsufficientSamples(1).into();
        assert_eq!(
            err,
            PipelineError::AnomalyDetection(AnomalyError::InsufficientSamples(1))
        );
        assert!(err.to_string().contains("could not be scored"));
    }
}
