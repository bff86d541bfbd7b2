//! Bootstrap prediction intervals.
//!
//! Resamples the training rows of a fitted candidate model, refits, and
//! turns the spread of the refitted predictions and residuals into an
//! empirical forecast distribution. No error distribution is assumed.

use crate::config::Distribution;
use crate::core::Dataset;
use crate::error::{Result, SearchError};
use crate::models::CandidateModel;
use crate::search::build_worker_pool;
use crate::utils::linalg::Matrix;
use crate::utils::stats::percentile_sorted;
use rand::prelude::*;
use rand::SeedableRng;
use rayon::prelude::*;
use std::collections::HashSet;

/// Configuration for bootstrap interval estimation.
#[derive(Debug, Clone)]
pub struct BootstrapConfig {
    /// Number of resample-and-refit runs.
    pub n_runs: usize,
    /// Base seed; run `i` uses `seed + i`. `None` draws from entropy.
    pub seed: Option<u64>,
    /// A resample is redrawn until at least this fraction of its rows are
    /// distinct.
    pub min_unique_fraction: f64,
    /// Worker pool size; `None` uses rayon's default.
    pub worker_threads: Option<usize>,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            n_runs: 1000,
            seed: None,
            min_unique_fraction: 0.2,
            worker_threads: None,
        }
    }
}

impl BootstrapConfig {
    /// Create a new bootstrap config with the given number of runs.
    pub fn new(n_runs: usize) -> Self {
        Self {
            n_runs,
            ..Default::default()
        }
    }

    /// Set random seed for reproducibility.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_min_unique_fraction(mut self, fraction: f64) -> Self {
        self.min_unique_fraction = fraction;
        self
    }

    pub fn with_worker_threads(mut self, threads: usize) -> Self {
        self.worker_threads = Some(threads);
        self
    }

    fn validate(&self) -> Result<()> {
        if self.n_runs == 0 {
            return Err(SearchError::InvalidParameter(
                "n_runs must be at least 1".into(),
            ));
        }
        if !(self.min_unique_fraction > 0.0 && self.min_unique_fraction <= 1.0) {
            return Err(SearchError::InvalidParameter(format!(
                "min_unique_fraction must be in (0, 1], got {}",
                self.min_unique_fraction
            )));
        }
        if self.worker_threads == Some(0) {
            return Err(SearchError::InvalidParameter(
                "worker_threads must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Empirical forecast distribution for one new observation.
#[derive(Debug, Clone)]
pub struct PredictionDistribution {
    /// Prediction of the model fitted to all training rows, in predictand
    /// units.
    pub point: f64,
    /// Simulated forecasts in predictand units, ascending.
    pub values: Vec<f64>,
    /// Runs whose refit succeeded.
    pub n_runs: usize,
}

impl PredictionDistribution {
    /// Value at percentile `q` in `[0, 100]`.
    pub fn percentile(&self, q: f64) -> f64 {
        percentile_sorted(&self.values, q)
    }

    pub fn median(&self) -> f64 {
        self.percentile(50.0)
    }

    /// `(lower, upper)` bounds of the central interval at `level` (e.g. 0.8
    /// for the 10th to 90th percentile).
    pub fn interval(&self, level: f64) -> (f64, f64) {
        let tail = (1.0 - level) / 2.0 * 100.0;
        (self.percentile(tail), self.percentile(100.0 - tail))
    }
}

/// Draw `n` row indices with replacement, redrawing until at least
/// `min_unique` of them are distinct.
fn resample_indices(n: usize, min_unique: usize, rng: &mut impl Rng) -> Vec<usize> {
    loop {
        let indices: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
        let unique: HashSet<usize> = indices.iter().copied().collect();
        if unique.len() >= min_unique {
            return indices;
        }
    }
}

/// Simulated prediction errors from one bootstrap run, or `None` if the
/// refit failed.
fn bootstrap_run(
    model: &CandidateModel,
    x: &Matrix,
    y: &[f64],
    new_row: &[f64],
    point: f64,
    min_unique: usize,
    seed: u64,
) -> Option<Vec<f64>> {
    let mut rng = StdRng::seed_from_u64(seed);
    let indices = resample_indices(y.len(), min_unique, &mut rng);
    let bx = x.select_rows(&indices);
    let by: Vec<f64> = indices.iter().map(|&i| y[i]).collect();

    let fit = model.regressor().fit(&bx, &by).ok()?;
    let prediction = fit.predict_row(new_row);
    if !prediction.is_finite() {
        return None;
    }
    Some(
        fit.residuals()
            .iter()
            .filter(|r| r.is_finite())
            .map(|r| r + point - prediction)
            .collect(),
    )
}

/// Build the forecast distribution of `model` at `new_row`.
///
/// `dataset` must be the one the model was searched on (predictand already
/// in fitting space); `new_row` holds one value per model predictor, in set
/// order. The distribution is mapped back to predictand units through
/// `distribution`.
pub fn compute_prediction_interval(
    model: &CandidateModel,
    dataset: &Dataset,
    distribution: Distribution,
    new_row: &[f64],
    config: &BootstrapConfig,
) -> Result<PredictionDistribution> {
    config.validate()?;
    if new_row.len() != model.n_predictors() {
        return Err(SearchError::DimensionMismatch {
            expected: model.n_predictors(),
            got: new_row.len(),
        });
    }

    let regressor = model.regressor();
    let design = dataset.design(&model.predictors, regressor.missing_policy())?;
    let full = regressor.fit(&design.x, &design.y)?;
    let point = full.predict_row(new_row);
    if !point.is_finite() {
        return Err(SearchError::ComputationError(
            "point prediction is not finite".into(),
        ));
    }

    let n = design.n_samples();
    let min_unique = ((config.min_unique_fraction * n as f64).ceil() as usize).clamp(1, n);
    let base_seed = config.seed.unwrap_or_else(|| thread_rng().gen());
    let threads = config
        .worker_threads
        .unwrap_or_else(rayon::current_num_threads);
    let workers = build_worker_pool(threads)?;

    let runs: Vec<Option<Vec<f64>>> = workers.install(|| {
        (0..config.n_runs)
            .into_par_iter()
            .map(|run| {
                bootstrap_run(
                    model,
                    &design.x,
                    &design.y,
                    new_row,
                    point,
                    min_unique,
                    base_seed.wrapping_add(run as u64),
                )
            })
            .collect()
    });

    let succeeded = runs.iter().filter(|r| r.is_some()).count();
    if succeeded == 0 {
        return Err(SearchError::ComputationError(
            "every bootstrap refit failed".into(),
        ));
    }
    if succeeded < config.n_runs {
        tracing::debug!(
            failed = config.n_runs - succeeded,
            runs = config.n_runs,
            "skipped failed bootstrap refits"
        );
    }

    let mut values: Vec<f64> = runs
        .into_iter()
        .flatten()
        .flatten()
        .map(|error| distribution.inverse(point + error))
        .collect();
    values.sort_by(f64::total_cmp);

    tracing::debug!(
        model = %model.model_id,
        runs = succeeded,
        samples = values.len(),
        "bootstrap distribution built"
    );

    Ok(PredictionDistribution {
        point: distribution.inverse(point),
        values,
        n_runs: succeeded,
    })
}
