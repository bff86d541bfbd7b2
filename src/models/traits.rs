//! RegressionModel trait defining the common interface for all regression
//! variants.

use crate::core::MissingPolicy;
use crate::error::NotEvaluable;
use crate::models::pcar::PcaArtifacts;
use crate::models::zscore::CompositeArtifacts;
use crate::models::RegressionKind;
use crate::utils::cross_validation::CrossValidator;
use crate::utils::linalg::Matrix;
use crate::utils::metrics::{Metric, ModelMetrics};

/// Variant-specific state needed to reproduce a fit.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ModelArtifacts {
    #[default]
    None,
    /// Principal-component basis and component-space regression.
    PrincipalComponents(PcaArtifacts),
    /// Z-score composite weights and composite-space regression.
    Composite(CompositeArtifacts),
}

/// A fitted regression in the original predictor space.
#[derive(Debug, Clone)]
pub struct Fit {
    /// One coefficient per predictor column.
    pub coefficients: Vec<f64>,
    pub intercept: f64,
    /// In-sample fitted values.
    pub fitted: Vec<f64>,
    /// `y - fitted`.
    pub residuals: Vec<f64>,
    /// Outcome of the coefficient t-test.
    pub all_significant: bool,
    pub artifacts: ModelArtifacts,
}

impl Fit {
    /// Predict one row of predictor values.
    ///
    /// Composite models tolerate NaN entries; the others propagate them.
    pub fn predict_row(&self, row: &[f64]) -> f64 {
        match &self.artifacts {
            ModelArtifacts::Composite(composite) => composite.predict_row(row),
            _ => {
                self.intercept
                    + self
                        .coefficients
                        .iter()
                        .zip(row)
                        .map(|(b, x)| b * x)
                        .sum::<f64>()
            }
        }
    }

    /// Predict every row of `x`.
    pub fn predict(&self, x: &Matrix) -> Vec<f64> {
        x.iter_rows().map(|row| self.predict_row(row)).collect()
    }

    pub fn residuals(&self) -> &[f64] {
        &self.residuals
    }
}

/// Fit plus its cross-validated predictions and score.
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub fit: Fit,
    /// One out-of-fold prediction per sample, in sample order.
    pub cv_predictions: Vec<f64>,
    pub metrics: ModelMetrics,
}

/// Common interface for all regression variants.
///
/// This trait is object-safe and can be used with `Box<dyn RegressionModel>`.
pub trait RegressionModel: Send + Sync {
    /// Which variant this is.
    fn kind(&self) -> RegressionKind;

    /// Get the model name.
    fn name(&self) -> &'static str {
        self.kind().name()
    }

    /// Smallest number of predictor columns the variant accepts.
    fn min_predictors(&self) -> usize {
        1
    }

    /// How rows with missing predictor values are handled.
    fn missing_policy(&self) -> MissingPolicy {
        MissingPolicy::CompleteRows
    }

    /// Fit the model to the full sample.
    fn fit(&self, x: &Matrix, y: &[f64]) -> Result<Fit, NotEvaluable>;

    /// Fit, cross-validate and score.
    fn evaluate(
        &self,
        x: &Matrix,
        y: &[f64],
        cv: CrossValidator,
        measure: Metric,
    ) -> Result<Evaluation, NotEvaluable>;

    /// Check the predictor count against [`RegressionModel::min_predictors`].
    fn check_predictor_count(&self, x: &Matrix) -> Result<(), NotEvaluable> {
        let got = x.cols();
        if got == 0 {
            return Err(NotEvaluable::EmptyPredictorSet);
        }
        let needed = self.min_predictors();
        if got < needed {
            return Err(NotEvaluable::TooFewPredictors {
                kind: self.kind().code(),
                needed,
                got,
            });
        }
        Ok(())
    }
}

/// Type alias for boxed regression trait objects.
pub type BoxedRegression = Box<dyn RegressionModel>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boxed_regressions_report_their_kind() {
        for kind in [RegressionKind::Mlr, RegressionKind::Pcar, RegressionKind::Zscr] {
            let model: BoxedRegression = kind.regressor();
            assert_eq!(model.kind(), kind);
            assert_eq!(model.name(), kind.name());
        }
    }

    #[test]
    fn predictor_count_is_checked() {
        let one_column = Matrix::zeros(5, 1);
        let pcar = RegressionKind::Pcar.regressor();
        assert_eq!(
            pcar.check_predictor_count(&one_column),
            Err(NotEvaluable::TooFewPredictors {
                kind: "PCAR",
                needed: 2,
                got: 1
            })
        );
        let mlr = RegressionKind::Mlr.regressor();
        assert!(mlr.check_predictor_count(&one_column).is_ok());
        assert_eq!(
            mlr.check_predictor_count(&Matrix::zeros(5, 0)),
            Err(NotEvaluable::EmptyPredictorSet)
        );
    }

    #[test]
    fn linear_prediction_from_fit() {
        let fit = Fit {
            coefficients: vec![2.0, -1.0],
            intercept: 0.5,
            fitted: vec![],
            residuals: vec![],
            all_significant: true,
            artifacts: ModelArtifacts::None,
        };
        assert_eq!(fit.predict_row(&[1.0, 3.0]), -0.5);
    }
}
