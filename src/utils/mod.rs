//! Numerical building blocks: linear algebra, least squares, statistics,
//! metrics, cross-validation and the bootstrap.

pub mod bootstrap;
pub mod cross_validation;
pub mod linalg;
pub mod metrics;
pub mod ols;
pub mod scoring;
pub mod stats;

pub use bootstrap::{compute_prediction_interval, BootstrapConfig, PredictionDistribution};
pub use cross_validation::{cross_val_predict, CrossValidator, Split};
pub use metrics::{compute_metrics, Metric, ModelMetrics};
pub use ols::{ols_fit, simple_regression, OlsFit};
pub use scoring::{compare, is_better, is_better_model};
