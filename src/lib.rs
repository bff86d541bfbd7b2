//! # predictor-search
//!
//! Regression model search for seasonal water-supply forecasting.
//!
//! Given a predictand series (e.g. April-July streamflow volume) and a pool
//! of candidate predictor series (snow water equivalent, precipitation,
//! climate indices), the crate searches predictor subsets with sequential
//! floating forward/backward selection or brute force. It fits multiple
//! linear, principal-components or Z-score regressions to each subset,
//! cross-validates and vets them, and keeps a ranked pool of the best
//! models. Any pool model can then be bootstrapped into an empirical
//! forecast distribution.
//!
//! ```no_run
//! use predictor_search::prelude::*;
//!
//! # fn main() -> predictor_search::Result<()> {
//! let years: Vec<i32> = (1991..2021).collect();
//! let swe: Vec<f64> = (0..30).map(|i| 20.0 + (i as f64).sin() * 4.0).collect();
//! let flow: Vec<f64> = swe.iter().map(|s| 100.0 + 5.0 * s).collect();
//! let dataset = Dataset::new(years, flow, vec![(PredictorId::from("9001"), swe)])?;
//!
//! let output = run_search(dataset, SearchConfig::default())?;
//! for model in &output.models {
//!     println!("{} {} {:.3}", model.model_id, model.predictors, model.metrics.cv_adj_r2);
//! }
//! # Ok(())
//! # }
//! ```

#![allow(clippy::needless_range_loop)]

pub mod config;
pub mod core;
pub mod error;
pub mod models;
pub mod search;
pub mod selection;
pub mod utils;

pub use error::{NotEvaluable, Rejection, Result, SearchError};

pub mod prelude {
    pub use crate::config::{Distribution, SearchConfig};
    pub use crate::core::{Dataset, PredictorId, PredictorSet};
    pub use crate::error::{Result, SearchError};
    pub use crate::models::{CandidateModel, RegressionKind};
    pub use crate::search::{run_search, ModelSearchCoordinator, SearchOutput, SearchProgress};
    pub use crate::selection::SelectionScheme;
    pub use crate::utils::bootstrap::{
        compute_prediction_interval, BootstrapConfig, PredictionDistribution,
    };
    pub use crate::utils::cross_validation::CrossValidator;
    pub use crate::utils::metrics::Metric;
}
