//! Error types for temporal reconciliation.

use thiserror::Error;

/// Result type alias for reconciliation operations.
pub type Result<T> = std::result::Result<T, ReconcileError>;

/// Errors that can occur while building hierarchies, forecasting or reconciling.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReconcileError {
    /// Input data is empty.
    #[error("empty input data")]
    EmptyData,

    /// Insufficient data points for the operation.
    #[error("insufficient data: need at least {needed}, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// Invalid parameter value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Inconsistent or incomplete configuration.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Reconciliation method that is unknown or not implemented.
    #[error("unsupported reconciliation method: {0}")]
    UnsupportedMethod(String),

    /// Dimension mismatch between data structures.
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// The GLS system could not be solved.
    #[error("singular matrix: {0}")]
    SingularMatrix(String),

    /// A key present in one table is missing after a reshape or join.
    #[error("data integrity error: {0}")]
    DataIntegrity(String),

    /// Timestamp-related error.
    #[error("timestamp error: {0}")]
    TimestampError(String),

    /// A stage was invoked before the stage it depends on.
    #[error("model must be fitted before prediction")]
    FitRequired,
}

/// Broad classes of failure, used by callers that only care about the kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Bad or missing input data.
    Input,
    /// Caller supplied an inconsistent configuration.
    Configuration,
    /// Linear algebra failed.
    Numerical,
    /// Reshape/join lost or duplicated a key.
    DataIntegrity,
}

impl ReconcileError {
    /// Classify the error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::EmptyData
            | Self::InsufficientData { .. }
            | Self::DimensionMismatch { .. }
            | Self::TimestampError(_) => ErrorCategory::Input,
            Self::InvalidParameter(_)
            | Self::Configuration(_)
            | Self::UnsupportedMethod(_)
            | Self::FitRequired => ErrorCategory::Configuration,
            Self::SingularMatrix(_) => ErrorCategory::Numerical,
            Self::DataIntegrity(_) => ErrorCategory::DataIntegrity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages_are_descriptive() {
        let err = ReconcileError::EmptyData;
        assert_eq!(err.to_string(), "empty input data");

        let err = ReconcileError::InsufficientData { needed: 14, got: 5 };
        assert_eq!(
            err.to_string(),
            "insufficient data: need at least 14, got 5"
        );

        let err = ReconcileError::UnsupportedMethod("variance".to_string());
        assert_eq!(
            err.to_string(),
            "unsupported reconciliation method: variance"
        );

        let err = ReconcileError::DimensionMismatch {
            expected: 28,
            got: 27,
        };
        assert_eq!(err.to_string(), "dimension mismatch: expected 28, got 27");

        let err = ReconcileError::FitRequired;
        assert_eq!(err.to_string(), "model must be fitted before prediction");
    }

    #[test]
    fn errors_are_classified() {
        assert_eq!(
            ReconcileError::Configuration("x".into()).category(),
            ErrorCategory::Configuration
        );
        assert_eq!(
            ReconcileError::UnsupportedMethod("variance".into()).category(),
            ErrorCategory::Configuration
        );
        assert_eq!(
            ReconcileError::SingularMatrix("x".into()).category(),
            ErrorCategory::Numerical
        );
        assert_eq!(
            ReconcileError::DataIntegrity("x".into()).category(),
            ErrorCategory::DataIntegrity
        );
        assert_eq!(ReconcileError::EmptyData.category(), ErrorCategory::Input);
    }

    #[test]
    fn errors_are_clonable_and_comparable() {
        let err1 = ReconcileError::SingularMatrix("StWS".into());
        let err2 = err1.clone();
        assert_eq!(err1, err2);
    }
}
