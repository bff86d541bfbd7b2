//! Z-score (composite index) regression.
//!
//! Each predictor is z-scored and weighted by how much of the predictand it
//! explains on its own; the weighted mean of a row's z-scores forms a single
//! composite index, which is then regressed on the predictand. Missing
//! predictor values are skipped when the composite is formed, so rows only
//! need one observed predictor.

use crate::core::MissingPolicy;
use crate::error::NotEvaluable;
use crate::models::mlr::fit_and_cross_validate;
use crate::models::traits::{Evaluation, Fit, ModelArtifacts, RegressionModel};
use crate::models::RegressionKind;
use crate::utils::cross_validation::CrossValidator;
use crate::utils::linalg::Matrix;
use crate::utils::metrics::{compute_metrics, Metric};
use crate::utils::ols::{ols_fit, simple_regression, OlsFit, SIGNIFICANCE_LEVEL};
use crate::utils::stats::{nan_mean, nan_std};

/// Univariate R² a predictor must exceed to receive a weight.
pub const R2_THRESHOLD: f64 = 0.09;

/// Composite weights and the composite-space regression.
#[derive(Debug, Clone, PartialEq)]
pub struct CompositeArtifacts {
    /// Univariate R² of each predictor, used as its composite weight.
    pub weights: Vec<f64>,
    /// `false` where the predictor's z-score was sign-flipped.
    pub positive: Vec<bool>,
    pub x_mean: Vec<f64>,
    pub x_std: Vec<f64>,
    pub composite_coefficient: f64,
    pub composite_intercept: f64,
}

impl CompositeArtifacts {
    /// Composite index of one row, ignoring missing values.
    pub fn composite(&self, row: &[f64]) -> f64 {
        let mut weighted = 0.0;
        let mut total = 0.0;
        for (j, &v) in row.iter().enumerate().take(self.weights.len()) {
            if v.is_nan() {
                continue;
            }
            let mut z = (v - self.x_mean[j]) / self.x_std[j];
            if !self.positive[j] {
                z = -z;
            }
            weighted += z * self.weights[j];
            total += self.weights[j];
        }
        if total > 0.0 {
            weighted / total
        } else {
            f64::NAN
        }
    }

    pub fn predict_row(&self, row: &[f64]) -> f64 {
        self.composite_intercept + self.composite_coefficient * self.composite(row)
    }

    fn back_transform(&self) -> (Vec<f64>, f64) {
        let total: f64 = self.weights.iter().sum();
        let mut intercept = self.composite_intercept;
        let coefficients = self
            .weights
            .iter()
            .enumerate()
            .map(|(j, w)| {
                let mut coef = self.composite_coefficient * w / (total * self.x_std[j]);
                if !self.positive[j] {
                    coef = -coef;
                }
                intercept -= coef * self.x_mean[j];
                coef
            })
            .collect();
        (coefficients, intercept)
    }
}

/// Z-score regression.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZScoreRegression;

impl ZScoreRegression {
    pub fn new() -> Self {
        Self
    }

    /// Standardize, orient and weight each predictor, then build the
    /// composite column.
    fn composite(x: &Matrix, y: &[f64]) -> Result<(CompositeArtifacts, Matrix), NotEvaluable> {
        let p = x.cols();
        let mut weights = Vec::with_capacity(p);
        let mut positive = Vec::with_capacity(p);
        let mut x_mean = Vec::with_capacity(p);
        let mut x_std = Vec::with_capacity(p);

        for j in 0..p {
            let column = x.column(j);
            let m = nan_mean(&column);
            let sd = nan_std(&column);
            if !(sd > 0.0) || !sd.is_finite() {
                return Err(NotEvaluable::ConstantPredictor { index: j });
            }
            let mut z: Vec<f64> = column.iter().map(|v| (v - m) / sd).collect();

            let (slope, _, mut r2) = simple_regression(&z, y)?;
            let is_positive = slope >= 0.0;
            if !is_positive {
                z.iter_mut().for_each(|v| *v = -*v);
                r2 = simple_regression(&z, y)?.2;
            }

            let weight = if r2 > R2_THRESHOLD { r2 } else { 0.0 };
            if weight == 0.0 {
                return Err(NotEvaluable::WeakPredictor { index: j });
            }

            weights.push(weight);
            positive.push(is_positive);
            x_mean.push(m);
            x_std.push(sd);
        }

        let artifacts = CompositeArtifacts {
            weights,
            positive,
            x_mean,
            x_std,
            composite_coefficient: 0.0,
            composite_intercept: 0.0,
        };
        let column: Vec<f64> = x.iter_rows().map(|row| artifacts.composite(row)).collect();
        if column.iter().any(|c| !c.is_finite()) {
            return Err(NotEvaluable::NonFinite);
        }
        Ok((artifacts, Matrix::column_vector(&column)))
    }

    fn assemble(mut artifacts: CompositeArtifacts, ols: OlsFit) -> Fit {
        artifacts.composite_coefficient = ols.coefficients[0];
        artifacts.composite_intercept = ols.intercept;
        let (coefficients, intercept) = artifacts.back_transform();
        Fit {
            coefficients,
            intercept,
            all_significant: ols.all_significant(SIGNIFICANCE_LEVEL),
            fitted: ols.fitted,
            residuals: ols.residuals,
            artifacts: ModelArtifacts::Composite(artifacts),
        }
    }
}

impl RegressionModel for ZScoreRegression {
    fn kind(&self) -> RegressionKind {
        RegressionKind::Zscr
    }

    fn min_predictors(&self) -> usize {
        2
    }

    fn missing_policy(&self) -> MissingPolicy {
        MissingPolicy::AnyObserved
    }

    fn fit(&self, x: &Matrix, y: &[f64]) -> Result<Fit, NotEvaluable> {
        self.check_predictor_count(x)?;
        let (artifacts, composite) = Self::composite(x, y)?;
        let ols = ols_fit(&composite, y)?;
        Ok(Self::assemble(artifacts, ols))
    }

    fn evaluate(
        &self,
        x: &Matrix,
        y: &[f64],
        cv: CrossValidator,
        _measure: Metric,
    ) -> Result<Evaluation, NotEvaluable> {
        self.check_predictor_count(x)?;
        let (artifacts, composite) = Self::composite(x, y)?;
        let (ols, cv_predictions) = fit_and_cross_validate(&composite, y, cv)?;
        let metrics = compute_metrics(&cv_predictions, &ols.fitted, y, 1);
        Ok(Evaluation {
            fit: Self::assemble(artifacts, ols),
            cv_predictions,
            metrics,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sign_flip_data(n: usize) -> (Matrix, Vec<f64>) {
        let xa: Vec<f64> = (0..n).map(|i| 2.0 * (0.9 * i as f64).sin()).collect();
        let xb: Vec<f64> = (0..n).map(|i| 2.0 * (1.7 * i as f64).cos()).collect();
        let y: Vec<f64> = (0..n).map(|i| 10.0 + 2.0 * xa[i] - 3.0 * xb[i]).collect();
        (Matrix::from_columns(&[&xa, &xb]).unwrap(), y)
    }

    #[test]
    fn negative_relationship_is_flipped() {
        let (x, y) = sign_flip_data(30);
        let fit = ZScoreRegression.fit(&x, &y).unwrap();

        let ModelArtifacts::Composite(composite) = &fit.artifacts else {
            panic!("expected composite artifacts");
        };
        assert_eq!(composite.positive, vec![true, false]);
        assert!(composite.composite_coefficient > 0.0);
        assert!(fit.coefficients[0] > 0.0);
        assert!(fit.coefficients[1] < 0.0);
        assert!(composite.weights.iter().all(|w| *w > R2_THRESHOLD));
    }

    #[test]
    fn original_space_coefficients_match_composite_predictions() {
        let (x, y) = sign_flip_data(30);
        let fit = ZScoreRegression.fit(&x, &y).unwrap();
        let ModelArtifacts::Composite(composite) = &fit.artifacts else {
            panic!("expected composite artifacts");
        };
        for (i, row) in x.iter_rows().enumerate() {
            let linear = fit.intercept
                + fit
                    .coefficients
                    .iter()
                    .zip(row)
                    .map(|(b, v)| b * v)
                    .sum::<f64>();
            assert_relative_eq!(linear, fit.fitted[i], epsilon = 1e-8);
            assert_relative_eq!(composite.predict_row(row), fit.fitted[i], epsilon = 1e-8);
        }
    }

    #[test]
    fn weak_predictor_is_not_evaluable() {
        let n = 30;
        let strong: Vec<f64> = (0..n).map(|i| i as f64).collect();
        // alternating sign, orthogonal to the trend's structure
        let weak: Vec<f64> = (0..n).map(|i| if i % 2 == 0 { 1.0 } else { -1.0 }).collect();
        let y: Vec<f64> = strong.iter().map(|s| 2.0 * s + 1.0).collect();
        let x = Matrix::from_columns(&[&strong, &weak]).unwrap();
        assert_eq!(
            ZScoreRegression.fit(&x, &y).unwrap_err(),
            NotEvaluable::WeakPredictor { index: 1 }
        );
    }

    #[test]
    fn missing_values_are_skipped_in_composite() {
        let (mut x, y) = sign_flip_data(30);
        x.set(3, 0, f64::NAN);
        x.set(7, 1, f64::NAN);
        let eval = ZScoreRegression
            .evaluate(&x, &y, CrossValidator::KFold(5), Metric::CvAdjR2)
            .unwrap();
        assert!(eval.fit.fitted.iter().all(|v| v.is_finite()));
        assert!(eval.fit.predict_row(x.row(3)).is_finite());
        assert_relative_eq!(eval.fit.predict_row(x.row(3)), eval.fit.fitted[3], epsilon = 1e-8);
    }
}
