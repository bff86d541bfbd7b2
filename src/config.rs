//! Search configuration.
//!
//! A [`SearchConfig`] can be assembled in code with the `with_*` builders or
//! read from TOML:
//!
//! ```toml
//! objective = "PCAR"
//! cross_validation = "KFOLD_5"
//! selection_scheme = "SFFS"
//! performance_metric = "CV_ADJ_R2"
//! num_models = 5
//! forced_predictors = ["9001"]
//! distribution = "LOGNORMAL"
//! ```

use crate::core::PredictorId;
use crate::error::{Result, SearchError};
use crate::models::RegressionKind;
use crate::selection::SelectionScheme;
use crate::utils::cross_validation::CrossValidator;
use crate::utils::metrics::Metric;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Distribution assumed for the predictand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Distribution {
    #[default]
    #[serde(alias = "Normal", alias = "normal")]
    Normal,
    /// Fitting happens on `ln(y)`; forecasts are exponentiated back.
    #[serde(alias = "Lognormal", alias = "lognormal")]
    Lognormal,
}

impl Distribution {
    /// Map a predictand value into fitting space.
    pub fn transform(self, value: f64) -> f64 {
        match self {
            Distribution::Normal => value,
            Distribution::Lognormal => value.ln(),
        }
    }

    /// Map a fitting-space value back to predictand units.
    pub fn inverse(self, value: f64) -> f64 {
        match self {
            Distribution::Normal => value,
            Distribution::Lognormal => value.exp(),
        }
    }
}

/// Everything a model search needs besides the data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Regression variant fitted to each candidate.
    pub objective: RegressionKind,
    pub cross_validation: CrossValidator,
    pub selection_scheme: SelectionScheme,
    /// Measure used to rank models.
    pub performance_metric: Metric,
    /// Pool capacity.
    pub num_models: usize,
    /// Predictors every SFFS/SFBS model must contain. Brute force ignores
    /// them and enumerates every non-empty subset of the pool.
    pub forced_predictors: Vec<PredictorId>,
    /// Accept models whose coefficients fail the significance or domain
    /// checks.
    pub allow_insignificant_override: bool,
    pub distribution: Distribution,
    /// Worker pool size; defaults to available cores minus one.
    pub worker_threads: Option<usize>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            objective: RegressionKind::Mlr,
            cross_validation: CrossValidator::KFold(10),
            selection_scheme: SelectionScheme::Sffs,
            performance_metric: Metric::CvAdjR2,
            num_models: 10,
            forced_predictors: Vec::new(),
            allow_insignificant_override: false,
            distribution: Distribution::Normal,
            worker_threads: None,
        }
    }
}

impl SearchConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_objective(mut self, objective: RegressionKind) -> Self {
        self.objective = objective;
        self
    }

    pub fn with_cross_validation(mut self, cv: CrossValidator) -> Self {
        self.cross_validation = cv;
        self
    }

    pub fn with_selection_scheme(mut self, scheme: SelectionScheme) -> Self {
        self.selection_scheme = scheme;
        self
    }

    pub fn with_performance_metric(mut self, metric: Metric) -> Self {
        self.performance_metric = metric;
        self
    }

    pub fn with_num_models(mut self, num_models: usize) -> Self {
        self.num_models = num_models;
        self
    }

    pub fn with_forced_predictors<I, P>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PredictorId>,
    {
        self.forced_predictors = ids.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_insignificant_override(mut self, allow: bool) -> Self {
        self.allow_insignificant_override = allow;
        self
    }

    pub fn with_distribution(mut self, distribution: Distribution) -> Self {
        self.distribution = distribution;
        self
    }

    pub fn with_worker_threads(mut self, threads: usize) -> Self {
        self.worker_threads = Some(threads);
        self
    }

    /// Check values that do not depend on the data.
    pub fn validate(&self) -> Result<()> {
        if self.num_models == 0 {
            return Err(SearchError::InvalidParameter(
                "num_models must be at least 1".into(),
            ));
        }
        if let CrossValidator::KFold(k) = self.cross_validation {
            if k < 2 {
                return Err(SearchError::InvalidParameter(format!(
                    "k-fold cross-validation needs at least 2 folds, got {k}"
                )));
            }
        }
        if self.worker_threads == Some(0) {
            return Err(SearchError::InvalidParameter(
                "worker_threads must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Worker pool size: the configured value, or available cores minus one.
    pub fn resolved_worker_threads(&self) -> usize {
        self.worker_threads.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get().saturating_sub(1))
                .unwrap_or(1)
                .max(1)
        })
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(toml_str: &str) -> Result<Self> {
        let config: SearchConfig = toml::from_str(toml_str)
            .map_err(|e| SearchError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            SearchError::InvalidConfig(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&text)
    }
}
