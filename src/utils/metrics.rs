//! Skill metrics for fitted regression models.
//!
//! Every function here is total: degenerate input yields `NaN` or `±∞`
//! instead of an error, so a bad candidate simply loses every comparison.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Performance measure used to rank models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Metric {
    /// In-sample coefficient of determination.
    R2,
    /// In-sample adjusted R².
    AdjR2,
    /// Adjusted R² of the cross-validated predictions.
    #[serde(alias = "CV_ADJUSTED_R2")]
    CvAdjR2,
    /// In-sample root mean squared error.
    Rmse,
    /// Root mean squared prediction error (cross-validated).
    #[serde(alias = "RMSPE")]
    CvRmse,
    /// In-sample Nash-Sutcliffe efficiency.
    Nse,
    /// Nash-Sutcliffe efficiency of the cross-validated predictions.
    CvNse,
    /// Mean absolute error.
    Mae,
    /// Predictand sample variance `SS_total / (n - p - 1)`.
    SampleVariance,
    /// Akaike information criterion.
    Aic,
    /// Small-sample corrected AIC.
    #[serde(alias = "AIC_C")]
    Aicc,
}

impl Metric {
    pub const ALL: [Metric; 11] = [
        Metric::R2,
        Metric::AdjR2,
        Metric::CvAdjR2,
        Metric::Rmse,
        Metric::CvRmse,
        Metric::Nse,
        Metric::CvNse,
        Metric::Mae,
        Metric::SampleVariance,
        Metric::Aic,
        Metric::Aicc,
    ];

    /// Whether larger values indicate a better model.
    pub fn higher_is_better(self) -> bool {
        matches!(
            self,
            Metric::R2 | Metric::AdjR2 | Metric::CvAdjR2 | Metric::Nse | Metric::CvNse
        )
    }

    /// Short machine-readable code.
    pub fn code(self) -> &'static str {
        match self {
            Metric::R2 => "R2",
            Metric::AdjR2 => "ADJ_R2",
            Metric::CvAdjR2 => "CV_ADJ_R2",
            Metric::Rmse => "RMSE",
            Metric::CvRmse => "CV_RMSE",
            Metric::Nse => "NSE",
            Metric::CvNse => "CV_NSE",
            Metric::Mae => "MAE",
            Metric::SampleVariance => "SAMPLE_VARIANCE",
            Metric::Aic => "AIC",
            Metric::Aicc => "AICC",
        }
    }

    /// Human-readable name.
    pub fn name(self) -> &'static str {
        match self {
            Metric::R2 => "R2",
            Metric::AdjR2 => "Adjusted R2",
            Metric::CvAdjR2 => "Cross Validated Adjusted R2",
            Metric::Rmse => "Root Mean Squared Error",
            Metric::CvRmse => "Root Mean Squared Prediction Error",
            Metric::Nse => "Nash-Sutcliffe",
            Metric::CvNse => "Cross Validated Nash-Sutcliffe",
            Metric::Mae => "Mean Absolute Error",
            Metric::SampleVariance => "Sample Variance",
            Metric::Aic => "Akaike Information Criterion",
            Metric::Aicc => "Akaike Information Criterion (Small sample size)",
        }
    }

    /// The value that every real score beats.
    pub fn worst_value(self) -> f64 {
        if self.higher_is_better() {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Metric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let normalized = trimmed.to_ascii_uppercase().replace(['-', ' '], "_");
        let alias = match normalized.as_str() {
            "RMSPE" => Some(Metric::CvRmse),
            "AIC_C" => Some(Metric::Aicc),
            _ => None,
        };
        alias
            .or_else(|| {
                Metric::ALL.into_iter().find(|m| {
                    m.code() == normalized || m.name().eq_ignore_ascii_case(trimmed)
                })
            })
            .ok_or_else(|| format!("unknown performance metric: {s}"))
    }
}

/// Full metric set of one model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelMetrics {
    pub r2: f64,
    pub adj_r2: f64,
    pub cv_adj_r2: f64,
    pub rmse: f64,
    pub cv_rmse: f64,
    pub nse: f64,
    pub cv_nse: f64,
    pub mae: f64,
    pub sample_variance: f64,
    pub aic: f64,
    pub aicc: f64,
}

impl ModelMetrics {
    /// Metrics that lose against any real model under every measure.
    pub fn sentinel() -> Self {
        Self {
            r2: Metric::R2.worst_value(),
            adj_r2: Metric::AdjR2.worst_value(),
            cv_adj_r2: Metric::CvAdjR2.worst_value(),
            rmse: Metric::Rmse.worst_value(),
            cv_rmse: Metric::CvRmse.worst_value(),
            nse: Metric::Nse.worst_value(),
            cv_nse: Metric::CvNse.worst_value(),
            mae: Metric::Mae.worst_value(),
            sample_variance: Metric::SampleVariance.worst_value(),
            aic: Metric::Aic.worst_value(),
            aicc: Metric::Aicc.worst_value(),
        }
    }

    pub fn get(&self, metric: Metric) -> f64 {
        match metric {
            Metric::R2 => self.r2,
            Metric::AdjR2 => self.adj_r2,
            Metric::CvAdjR2 => self.cv_adj_r2,
            Metric::Rmse => self.rmse,
            Metric::CvRmse => self.cv_rmse,
            Metric::Nse => self.nse,
            Metric::CvNse => self.cv_nse,
            Metric::Mae => self.mae,
            Metric::SampleVariance => self.sample_variance,
            Metric::Aic => self.aic,
            Metric::Aicc => self.aicc,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Metric, f64)> + '_ {
        Metric::ALL.into_iter().map(move |m| (m, self.get(m)))
    }

    /// Metrics keyed by their human-readable names.
    pub fn to_map(&self) -> BTreeMap<&'static str, f64> {
        self.iter().map(|(m, v)| (m.name(), v)).collect()
    }
}

fn sum_sq_diff(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum()
}

fn sum_sq_total(observed: &[f64]) -> f64 {
    let mean = observed.iter().sum::<f64>() / observed.len() as f64;
    observed.iter().map(|o| (o - mean).powi(2)).sum()
}

/// Sample size with the exact-fit nudge applied: `n == p + 1` becomes
/// `p + 1 + 1e-8` so that `n - (p + 1)` never divides to NaN.
fn effective_n(n: usize, p: usize) -> f64 {
    if n == p + 1 {
        (p + 1) as f64 + 1e-8
    } else {
        n as f64
    }
}

/// Coefficient of determination.
pub fn r_squared(observed: &[f64], predicted: &[f64]) -> f64 {
    if observed.is_empty() || observed.len() != predicted.len() {
        return f64::NAN;
    }
    1.0 - sum_sq_diff(observed, predicted) / sum_sq_total(observed)
}

/// Adjusted R² for `p` predictors.
pub fn adjusted_r2(observed: &[f64], predicted: &[f64], p: usize) -> f64 {
    let r2 = r_squared(observed, predicted);
    let n = effective_n(observed.len(), p);
    1.0 - ((n - 1.0) / (n - (p + 1) as f64)) * (1.0 - r2)
}

/// Root mean squared error with `n - (p + 1)` degrees of freedom.
pub fn rmse(observed: &[f64], predicted: &[f64], p: usize) -> f64 {
    if observed.is_empty() || observed.len() != predicted.len() {
        return f64::NAN;
    }
    let n = effective_n(observed.len(), p);
    (sum_sq_diff(observed, predicted) / (n - (p + 1) as f64)).sqrt()
}

/// Mean absolute error with `n - (p + 1)` degrees of freedom.
pub fn mae(observed: &[f64], predicted: &[f64], p: usize) -> f64 {
    if observed.is_empty() || observed.len() != predicted.len() {
        return f64::NAN;
    }
    let n = effective_n(observed.len(), p);
    let abs: f64 = observed.iter().zip(predicted).map(|(o, e)| (o - e).abs()).sum();
    abs / (n - (p + 1) as f64)
}

/// Nash-Sutcliffe model efficiency.
pub fn nash_sutcliffe(observed: &[f64], predicted: &[f64]) -> f64 {
    if observed.is_empty() || observed.len() != predicted.len() {
        return f64::NAN;
    }
    1.0 - sum_sq_diff(predicted, observed) / sum_sq_total(observed)
}

/// Predictand variance `SS_total / (n - p - 1)`.
pub fn sample_variance(observed: &[f64], p: usize) -> f64 {
    if observed.is_empty() {
        return f64::NAN;
    }
    let n = effective_n(observed.len(), p);
    sum_sq_total(observed) / (n - (p + 1) as f64)
}

/// Akaike information criterion `2p + n ln(SSE)`.
pub fn aic(observed: &[f64], predicted: &[f64], p: usize) -> f64 {
    if observed.is_empty() || observed.len() != predicted.len() {
        return f64::NAN;
    }
    let n = observed.len() as f64;
    2.0 * p as f64 + n * sum_sq_diff(observed, predicted).ln()
}

/// Small-sample corrected AIC `AIC + (2p² + 2p) / (n - p - 1)`.
pub fn aicc(observed: &[f64], predicted: &[f64], p: usize) -> f64 {
    let p_f = p as f64;
    let n = effective_n(observed.len(), p);
    aic(observed, predicted, p) + (2.0 * p_f * p_f + 2.0 * p_f) / (n - p_f - 1.0)
}

/// Compute the full metric set from cross-validated predictions,
/// in-sample predictions and observations for a model with `p` predictors.
pub fn compute_metrics(
    cv_predicted: &[f64],
    predicted: &[f64],
    observed: &[f64],
    p: usize,
) -> ModelMetrics {
    ModelMetrics {
        r2: r_squared(observed, predicted),
        adj_r2: adjusted_r2(observed, predicted, p),
        cv_adj_r2: adjusted_r2(observed, cv_predicted, p),
        rmse: rmse(observed, predicted, p),
        cv_rmse: rmse(observed, cv_predicted, p),
        nse: nash_sutcliffe(observed, predicted),
        cv_nse: nash_sutcliffe(observed, cv_predicted),
        mae: mae(observed, predicted, p),
        sample_variance: sample_variance(observed, p),
        aic: aic(observed, predicted, p),
        aicc: aicc(observed, predicted, p),
    }
}
