//! Error types for the predictor-search library.
//!
//! Two families live here. [`SearchError`] is fatal and is only returned
//! before a search starts (malformed input, bad configuration).
//! [`NotEvaluable`] and [`Rejection`] are local to one candidate predictor
//! set: the search records them and moves on.

use thiserror::Error;

/// Result type alias for search operations.
pub type Result<T> = std::result::Result<T, SearchError>;

/// Errors that abort a search or a bootstrap before any work is done.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SearchError {
    /// Input data is empty.
    #[error("empty input data")]
    EmptyData,

    /// No predictor columns were supplied, or none survived preprocessing.
    #[error("empty predictor pool")]
    EmptyPredictorPool,

    /// Dimension mismatch between data structures.
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// The same predictor id appears twice in the pool.
    #[error("duplicate predictor id: {0}")]
    DuplicatePredictor(String),

    /// The same sample key (water year) appears twice.
    #[error("duplicate sample key: {0}")]
    DuplicateSample(i32),

    /// A referenced predictor id does not exist in the dataset.
    #[error("unknown predictor id: {0}")]
    UnknownPredictor(String),

    /// Invalid parameter value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Configuration could not be read or is inconsistent.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The lognormal transform needs a strictly positive predictand.
    #[error("predictand must be positive for the lognormal transform (sample {year})")]
    NonPositivePredictand { year: i32 },

    /// The worker pool could not be created.
    #[error("worker pool error: {0}")]
    WorkerPool(String),

    /// A model could not be fitted where a fit was required.
    #[error("model cannot be evaluated: {0}")]
    NotEvaluable(#[from] NotEvaluable),

    /// Computation error (e.g., every bootstrap run failed).
    #[error("computation error: {0}")]
    ComputationError(String),
}

/// Why a regression could not be fitted to a candidate predictor set.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotEvaluable {
    /// The normal-equation matrix is singular or numerically rank deficient.
    #[error("design matrix is singular")]
    SingularMatrix,

    /// The candidate set is empty.
    #[error("empty predictor set")]
    EmptyPredictorSet,

    /// The regression kind needs more predictors than the set holds.
    #[error("{kind} needs at least {needed} predictors, got {got}")]
    TooFewPredictors {
        kind: &'static str,
        needed: usize,
        got: usize,
    },

    /// A predictor id in the set is not part of the dataset.
    #[error("predictor set references an unknown predictor")]
    UnknownPredictor,

    /// Predictors and predictand share no complete sample.
    #[error("no samples where predictors and predictand overlap")]
    NoOverlap,

    /// Not enough samples for the cross-validation scheme.
    #[error("insufficient samples: need at least {needed}, got {got}")]
    InsufficientSamples { needed: usize, got: usize },

    /// A Z-score predictor explains too little of the predictand on its own.
    #[error("predictor {index} is too weakly related to the predictand")]
    WeakPredictor { index: usize },

    /// A predictor column has zero variance.
    #[error("predictor {index} is constant")]
    ConstantPredictor { index: usize },

    /// No candidate within the model produced finite scores.
    #[error("no finite score")]
    NonFinite,
}

/// Local, recoverable reasons a candidate model is discarded.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Rejection {
    /// The regression could not be fitted.
    #[error("not evaluable: {0}")]
    NotEvaluable(#[from] NotEvaluable),

    /// A coefficient falls inside the critical region of the t-test.
    #[error("coefficients are not statistically significant")]
    InsignificantCoefficients,

    /// A coefficient rounds to zero, or a SWE coefficient is not positive.
    #[error("coefficient for predictor {predictor} violates a domain constraint")]
    DomainConstraintViolation { predictor: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages_are_descriptive() {
        let err = SearchError::EmptyPredictorPool;
        assert_eq!(err.to_string(), "empty predictor pool");

        let err = SearchError::DimensionMismatch {
            expected: 3,
            got: 2,
        };
        assert_eq!(err.to_string(), "dimension mismatch: expected 3, got 2");

        let err = NotEvaluable::TooFewPredictors {
            kind: "PCAR",
            needed: 2,
            got: 1,
        };
        assert_eq!(err.to_string(), "PCAR needs at least 2 predictors, got 1");

        let err = Rejection::DomainConstraintViolation {
            predictor: "9001".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "coefficient for predictor 9001 violates a domain constraint"
        );
    }

    #[test]
    fn not_evaluable_converts_into_both_families() {
        let rejection: Rejection = NotEvaluable::SingularMatrix.into();
        assert_eq!(rejection, Rejection::NotEvaluable(NotEvaluable::SingularMatrix));

        let fatal: SearchError = NotEvaluable::NoOverlap.into();
        assert_eq!(fatal, SearchError::NotEvaluable(NotEvaluable::NoOverlap));
    }
}
