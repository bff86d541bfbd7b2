//! Principal components regression.
//!
//! Predictors are standardized, rotated onto the eigenvectors of their
//! correlation matrix, and the predictand is regressed on the leading
//! components. Coefficients are mapped back to the original predictor
//! space so that a PCAR model predicts like any other linear model.

use crate::error::NotEvaluable;
use crate::models::mlr::fit_and_cross_validate;
use crate::models::traits::{Evaluation, Fit, ModelArtifacts, RegressionModel};
use crate::models::RegressionKind;
use crate::utils::cross_validation::CrossValidator;
use crate::utils::linalg::{symmetric_eigen, Matrix};
use crate::utils::metrics::{compute_metrics, Metric, ModelMetrics};
use crate::utils::ols::{ols_fit, OlsFit, SIGNIFICANCE_LEVEL};
use crate::utils::scoring::is_better;
use crate::utils::stats::{mean, std_dev};

/// Principal-component basis and the component-space regression.
#[derive(Debug, Clone, PartialEq)]
pub struct PcaArtifacts {
    /// Eigenvalues in descending order.
    pub eigenvalues: Vec<f64>,
    /// Eigenvectors as columns, matching `eigenvalues`.
    pub eigenvectors: Matrix,
    /// Number of leading components retained.
    pub components: usize,
    /// Regression weights of the retained components.
    pub component_coefficients: Vec<f64>,
    pub component_intercept: f64,
    pub x_mean: Vec<f64>,
    pub x_std: Vec<f64>,
}

impl PcaArtifacts {
    /// Scores of every component for one row of raw predictor values.
    pub fn project(&self, row: &[f64]) -> Vec<f64> {
        let p = self.x_mean.len();
        let z: Vec<f64> = (0..p)
            .map(|j| (row[j] - self.x_mean[j]) / self.x_std[j])
            .collect();
        (0..p)
            .map(|k| (0..p).map(|j| z[j] * self.eigenvectors.get(j, k)).sum())
            .collect()
    }

    /// Prediction computed in component space.
    pub fn predict_row(&self, row: &[f64]) -> f64 {
        let scores = self.project(row);
        self.component_intercept
            + self
                .component_coefficients
                .iter()
                .zip(&scores)
                .map(|(b, s)| b * s)
                .sum::<f64>()
    }

    /// Original-space coefficients and intercept.
    fn back_transform(&self) -> (Vec<f64>, f64) {
        let p = self.x_mean.len();
        let mut intercept = self.component_intercept;
        let mut coefficients = vec![0.0; p];
        for j in 0..p {
            for (k, b) in self.component_coefficients.iter().enumerate() {
                let loading = b * self.eigenvectors.get(j, k) / self.x_std[j];
                coefficients[j] += loading;
                intercept -= loading * self.x_mean[j];
            }
        }
        (coefficients, intercept)
    }
}

/// Principal components regression.
///
/// With `components` unset, [`RegressionModel::evaluate`] tries every
/// component count and keeps the best under the performance measure, and
/// [`RegressionModel::fit`] keeps all components.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrincipalComponentsRegression {
    components: Option<usize>,
}

/// Standardized predictors and their eigen-decomposition.
struct Rotation {
    scores: Matrix,
    eigenvalues: Vec<f64>,
    eigenvectors: Matrix,
    x_mean: Vec<f64>,
    x_std: Vec<f64>,
}

impl PrincipalComponentsRegression {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a fixed number of leading components.
    pub fn with_components(mut self, k: usize) -> Self {
        self.components = Some(k);
        self
    }

    pub fn components(&self) -> Option<usize> {
        self.components
    }

    fn rotate(x: &Matrix) -> Result<Rotation, NotEvaluable> {
        let n = x.rows();
        let p = x.cols();
        if n < 2 {
            return Err(NotEvaluable::InsufficientSamples { needed: 2, got: n });
        }

        let mut x_mean = Vec::with_capacity(p);
        let mut x_std = Vec::with_capacity(p);
        for j in 0..p {
            let column = x.column(j);
            let sd = std_dev(&column);
            if !(sd > 0.0) || !sd.is_finite() {
                return Err(NotEvaluable::ConstantPredictor { index: j });
            }
            x_mean.push(mean(&column));
            x_std.push(sd);
        }

        let mut z = Matrix::zeros(n, p);
        for i in 0..n {
            for j in 0..p {
                z.set(i, j, (x.get(i, j) - x_mean[j]) / x_std[j]);
            }
        }

        let mut corr = Matrix::zeros(p, p);
        for a in 0..p {
            for b in a..p {
                let s: f64 = (0..n).map(|i| z.get(i, a) * z.get(i, b)).sum::<f64>() / (n - 1) as f64;
                corr.set(a, b, s);
                corr.set(b, a, s);
            }
        }

        let (eigenvalues, eigenvectors) =
            symmetric_eigen(&corr).ok_or(NotEvaluable::SingularMatrix)?;
        let scores = z.matmul(&eigenvectors).ok_or(NotEvaluable::SingularMatrix)?;

        Ok(Rotation {
            scores,
            eigenvalues,
            eigenvectors,
            x_mean,
            x_std,
        })
    }

    fn assemble(rotation: &Rotation, k: usize, ols: OlsFit) -> Fit {
        let artifacts = PcaArtifacts {
            eigenvalues: rotation.eigenvalues.clone(),
            eigenvectors: rotation.eigenvectors.clone(),
            components: k,
            component_coefficients: ols.coefficients.clone(),
            component_intercept: ols.intercept,
            x_mean: rotation.x_mean.clone(),
            x_std: rotation.x_std.clone(),
        };
        let (coefficients, intercept) = artifacts.back_transform();
        Fit {
            coefficients,
            intercept,
            all_significant: ols.all_significant(SIGNIFICANCE_LEVEL),
            fitted: ols.fitted,
            residuals: ols.residuals,
            artifacts: ModelArtifacts::PrincipalComponents(artifacts),
        }
    }
}

impl RegressionModel for PrincipalComponentsRegression {
    fn kind(&self) -> RegressionKind {
        RegressionKind::Pcar
    }

    fn min_predictors(&self) -> usize {
        2
    }

    fn fit(&self, x: &Matrix, y: &[f64]) -> Result<Fit, NotEvaluable> {
        self.check_predictor_count(x)?;
        let rotation = Self::rotate(x)?;
        let k = self.components.unwrap_or(x.cols()).clamp(1, x.cols());
        let ols = ols_fit(&rotation.scores.first_columns(k), y)?;
        Ok(Self::assemble(&rotation, k, ols))
    }

    fn evaluate(
        &self,
        x: &Matrix,
        y: &[f64],
        cv: CrossValidator,
        measure: Metric,
    ) -> Result<Evaluation, NotEvaluable> {
        self.check_predictor_count(x)?;
        let rotation = Self::rotate(x)?;
        let p = x.cols();
        let candidates: Vec<usize> = match self.components {
            Some(k) => vec![k.clamp(1, p)],
            None => (1..=p).collect(),
        };

        let mut best: Option<(usize, OlsFit, Vec<f64>, ModelMetrics)> = None;
        let mut last_error = NotEvaluable::NonFinite;
        for k in candidates {
            let (ols, cv_predictions) =
                match fit_and_cross_validate(&rotation.scores.first_columns(k), y, cv) {
                    Ok(result) => result,
                    Err(e) => {
                        last_error = e;
                        continue;
                    }
                };
            let metrics = compute_metrics(&cv_predictions, &ols.fitted, y, k);
            let current = best
                .as_ref()
                .map_or(ModelMetrics::sentinel(), |(_, _, _, m)| *m);
            if is_better(metrics.get(measure), current.get(measure), measure) {
                best = Some((k, ols, cv_predictions, metrics));
            }
        }

        let (k, ols, cv_predictions, metrics) = best.ok_or(last_error)?;
        Ok(Evaluation {
            fit: Self::assemble(&rotation, k, ols),
            cv_predictions,
            metrics,
        })
    }
}
