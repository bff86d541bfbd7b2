//! Ordinary Least Squares (OLS) regression with coefficient inference.
//!
//! The normal equations `XᵀX β = Xᵀy` are assembled with the intercept at
//! index 0 and solved by Cholesky decomposition. The diagonal of `(XᵀX)⁻¹`
//! is kept so that standard errors and t-statistics can be derived without
//! refitting.

use crate::error::NotEvaluable;
use crate::utils::linalg::{Cholesky, Matrix};
use crate::utils::stats::student_t_critical;

/// One-sided probability used by the coefficient significance test.
pub const SIGNIFICANCE_LEVEL: f64 = 0.95;

/// Result of an OLS fit.
#[derive(Debug, Clone)]
pub struct OlsFit {
    /// Slope coefficients, one per column of `x`.
    pub coefficients: Vec<f64>,
    /// Intercept term.
    pub intercept: f64,
    /// In-sample fitted values.
    pub fitted: Vec<f64>,
    /// Residuals `y - fitted`.
    pub residuals: Vec<f64>,
    /// Diagonal of `(XᵀX)⁻¹`, intercept first.
    pub inverse_diagonal: Vec<f64>,
}

impl OlsFit {
    /// Predict one row.
    pub fn predict_row(&self, row: &[f64]) -> f64 {
        self.intercept
            + self
                .coefficients
                .iter()
                .zip(row)
                .map(|(b, x)| b * x)
                .sum::<f64>()
    }

    /// Predict every row of `x`.
    pub fn predict(&self, x: &Matrix) -> Vec<f64> {
        x.iter_rows().map(|row| self.predict_row(row)).collect()
    }

    pub fn n_samples(&self) -> usize {
        self.residuals.len()
    }

    /// Residual degrees of freedom `n - (p + 1)`, saturating at zero.
    pub fn residual_dof(&self) -> usize {
        self.n_samples().saturating_sub(self.coefficients.len() + 1)
    }

    /// Residual variance `SSE / (n - p - 1)`, or NaN without residual degrees
    /// of freedom.
    pub fn residual_variance(&self) -> f64 {
        let dof = self.residual_dof();
        if dof == 0 {
            return f64::NAN;
        }
        let sse: f64 = self.residuals.iter().map(|r| r * r).sum();
        sse / dof as f64
    }

    /// Standard errors of the slope coefficients.
    pub fn standard_errors(&self) -> Vec<f64> {
        let s2 = self.residual_variance();
        self.inverse_diagonal[1..]
            .iter()
            .map(|d| (s2 * d).sqrt())
            .collect()
    }

    /// t-statistics of the slope coefficients.
    pub fn t_statistics(&self) -> Vec<f64> {
        self.coefficients
            .iter()
            .zip(self.standard_errors())
            .map(|(b, se)| if se > 0.0 { b / se } else if *b == 0.0 { 0.0 } else { f64::INFINITY })
            .collect()
    }

    /// True when every slope's `|t|` reaches the one-sided Student-t critical
    /// value at `probability` with `n - (p + 1)` degrees of freedom.
    pub fn all_significant(&self, probability: f64) -> bool {
        let dof = self.residual_dof();
        let Some(critical) = student_t_critical(probability, dof as f64) else {
            return false;
        };
        self.t_statistics()
            .iter()
            .all(|t| !t.is_nan() && t.abs() >= critical)
    }
}

/// Fit `y = intercept + x β` by ordinary least squares.
///
/// Every row of `x` is one sample. Fails with [`NotEvaluable::SingularMatrix`]
/// when the design is rank deficient, and with
/// [`NotEvaluable::InsufficientSamples`] when there are fewer samples than
/// parameters.
pub fn ols_fit(x: &Matrix, y: &[f64]) -> Result<OlsFit, NotEvaluable> {
    let n = y.len();
    let k = x.cols();

    if x.rows() != n {
        return Err(NotEvaluable::InsufficientSamples {
            needed: x.rows(),
            got: n,
        });
    }
    let num_params = k + 1;
    if n < num_params {
        return Err(NotEvaluable::InsufficientSamples {
            needed: num_params,
            got: n,
        });
    }
    if !x.is_finite() || y.iter().any(|v| !v.is_finite()) {
        return Err(NotEvaluable::NonFinite);
    }

    // X'X and X'y with design row [1, x1, x2, ...]
    let mut xtx = Matrix::zeros(num_params, num_params);
    let mut xty = vec![0.0; num_params];

    for (row, &y_obs) in x.iter_rows().zip(y) {
        xtx.set(0, 0, xtx.get(0, 0) + 1.0);
        for j in 0..k {
            let xj = row[j];
            xtx.set(0, j + 1, xtx.get(0, j + 1) + xj);
            xtx.set(j + 1, 0, xtx.get(j + 1, 0) + xj);
        }
        for i in 0..k {
            let xi = row[i];
            for j in 0..k {
                xtx.set(i + 1, j + 1, xtx.get(i + 1, j + 1) + xi * row[j]);
            }
        }

        xty[0] += y_obs;
        for i in 0..k {
            xty[i + 1] += row[i] * y_obs;
        }
    }

    let chol = Cholesky::decompose(&xtx).ok_or(NotEvaluable::SingularMatrix)?;
    let beta = chol.solve(&xty);
    if beta.iter().any(|b| !b.is_finite()) {
        return Err(NotEvaluable::SingularMatrix);
    }

    let inverse = chol.inverse();
    let inverse_diagonal = (0..num_params).map(|i| inverse.get(i, i)).collect();

    let mut fit = OlsFit {
        intercept: beta[0],
        coefficients: beta[1..].to_vec(),
        fitted: Vec::new(),
        residuals: Vec::new(),
        inverse_diagonal,
    };
    fit.fitted = fit.predict(x);
    fit.residuals = y.iter().zip(&fit.fitted).map(|(o, f)| o - f).collect();

    Ok(fit)
}

/// Univariate OLS of `y` on `x`, returning `(slope, intercept, r2)`.
///
/// Pairs where either value is NaN are dropped first.
pub fn simple_regression(x: &[f64], y: &[f64]) -> Result<(f64, f64, f64), NotEvaluable> {
    let (xs, ys): (Vec<f64>, Vec<f64>) = x
        .iter()
        .zip(y)
        .filter(|(a, b)| !a.is_nan() && !b.is_nan())
        .map(|(a, b)| (*a, *b))
        .unzip();

    if xs.len() < 2 {
        return Err(NotEvaluable::InsufficientSamples {
            needed: 2,
            got: xs.len(),
        });
    }

    let fit = ols_fit(&Matrix::column_vector(&xs), &ys)?;
    let ss_tot = crate::utils::stats::sum_squares_about_mean(&ys);
    let ss_res: f64 = fit.residuals.iter().map(|r| r * r).sum();
    let r2 = if ss_tot > 0.0 { 1.0 - ss_res / ss_tot } else { f64::NAN };

    Ok((fit.coefficients[0], fit.intercept, r2))
}
