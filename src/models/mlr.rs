//! Multiple linear regression.

use crate::error::NotEvaluable;
use crate::models::traits::{Evaluation, Fit, ModelArtifacts, RegressionModel};
use crate::models::RegressionKind;
use crate::utils::cross_validation::{cross_val_predict, CrossValidator};
use crate::utils::linalg::Matrix;
use crate::utils::metrics::{compute_metrics, Metric};
use crate::utils::ols::{ols_fit, OlsFit, SIGNIFICANCE_LEVEL};

/// OLS with an intercept on the raw predictor columns.
#[derive(Debug, Clone, Copy, Default)]
pub struct MultipleLinearRegression;

impl MultipleLinearRegression {
    pub fn new() -> Self {
        Self
    }
}

/// Full-sample OLS fit plus out-of-fold predictions for `x`.
///
/// Shared by every variant: PCAR and ZSCR run it on their transformed
/// columns.
pub(crate) fn fit_and_cross_validate(
    x: &Matrix,
    y: &[f64],
    cv: CrossValidator,
) -> Result<(OlsFit, Vec<f64>), NotEvaluable> {
    let full = ols_fit(x, y)?;
    let cv_predictions = cross_val_predict(cv, y.len(), |train, test| {
        let train_y: Vec<f64> = train.iter().map(|&i| y[i]).collect();
        let fold = ols_fit(&x.select_rows(train), &train_y)?;
        Ok(test.iter().map(|&i| fold.predict_row(x.row(i))).collect())
    })?;
    Ok((full, cv_predictions))
}

impl RegressionModel for MultipleLinearRegression {
    fn kind(&self) -> RegressionKind {
        RegressionKind::Mlr
    }

    fn fit(&self, x: &Matrix, y: &[f64]) -> Result<Fit, NotEvaluable> {
        self.check_predictor_count(x)?;
        let ols = ols_fit(x, y)?;
        Ok(Fit {
            all_significant: ols.all_significant(SIGNIFICANCE_LEVEL),
            coefficients: ols.coefficients,
            intercept: ols.intercept,
            fitted: ols.fitted,
            residuals: ols.residuals,
            artifacts: ModelArtifacts::None,
        })
    }

    fn evaluate(
        &self,
        x: &Matrix,
        y: &[f64],
        cv: CrossValidator,
        _measure: Metric,
    ) -> Result<Evaluation, NotEvaluable> {
        self.check_predictor_count(x)?;
        let (ols, cv_predictions) = fit_and_cross_validate(x, y, cv)?;
        let metrics = compute_metrics(&cv_predictions, &ols.fitted, y, x.cols());
        Ok(Evaluation {
            fit: Fit {
                all_significant: ols.all_significant(SIGNIFICANCE_LEVEL),
                coefficients: ols.coefficients,
                intercept: ols.intercept,
                fitted: ols.fitted,
                residuals: ols.residuals,
                artifacts: ModelArtifacts::None,
            },
            cv_predictions,
            metrics,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn closed_form_single_predictor() {
        let x = Matrix::column_vector(&[1.0, 2.0, 1.0, 3.0, 2.0]);
        let y = [10.0, 12.0, 9.0, 14.0, 11.0];

        let fit = MultipleLinearRegression.fit(&x, &y).unwrap();

        let x_mean = 1.8;
        let y_mean = 11.2;
        let sxy: f64 = [1.0, 2.0, 1.0, 3.0, 2.0]
            .iter()
            .zip(&y)
            .map(|(a, b)| (a - x_mean) * (b - y_mean))
            .sum();
        let sxx: f64 = [1.0, 2.0, 1.0, 3.0, 2.0]
            .iter()
            .map(|a| (a - x_mean).powi(2))
            .sum();
        let slope = sxy / sxx;
        assert_relative_eq!(fit.coefficients[0], slope, epsilon = 1e-9);
        assert_relative_eq!(fit.intercept, y_mean - slope * x_mean, epsilon = 1e-9);
    }

    #[test]
    fn loo_evaluation_scores_out_of_fold() {
        let xs: Vec<f64> = (0..12).map(|i| i as f64).collect();
        let y: Vec<f64> = xs
            .iter()
            .enumerate()
            .map(|(i, x)| 1.0 + 0.5 * x + if i % 2 == 0 { 0.2 } else { -0.2 })
            .collect();
        let x = Matrix::column_vector(&xs);

        let eval = MultipleLinearRegression
            .evaluate(&x, &y, CrossValidator::LeaveOneOut, Metric::CvAdjR2)
            .unwrap();

        assert_eq!(eval.cv_predictions.len(), 12);
        assert!(eval.metrics.cv_adj_r2 <= eval.metrics.adj_r2);
        assert!(eval.metrics.cv_rmse >= eval.metrics.rmse);
        assert!(eval.fit.all_significant);
    }

    #[test]
    fn evaluation_is_deterministic() {
        let a: Vec<f64> = (0..20).map(|i| (i as f64 * 0.7).sin()).collect();
        let b: Vec<f64> = (0..20).map(|i| (i as f64 * 1.3).cos()).collect();
        let y: Vec<f64> = (0..20).map(|i| 3.0 + 2.0 * a[i] - b[i]).collect();
        let x = Matrix::from_columns(&[&a, &b]).unwrap();

        let first = MultipleLinearRegression
            .evaluate(&x, &y, CrossValidator::KFold(5), Metric::CvAdjR2)
            .unwrap();
        let second = MultipleLinearRegression
            .evaluate(&x, &y, CrossValidator::KFold(5), Metric::CvAdjR2)
            .unwrap();
        assert_eq!(first.metrics, second.metrics);
        assert_eq!(first.fit.coefficients, second.fit.coefficients);
    }

    #[test]
    fn too_few_samples_for_cv() {
        let x = Matrix::column_vector(&[1.0, 2.0, 3.0, 4.0]);
        let y = [1.0, 2.0, 2.5, 4.0];
        let err = MultipleLinearRegression
            .evaluate(&x, &y, CrossValidator::KFold(10), Metric::CvAdjR2)
            .unwrap_err();
        assert_eq!(err, NotEvaluable::InsufficientSamples { needed: 10, got: 4 });
    }
}
