//! Core data structures: predictor identifiers and the aligned dataset.

mod dataset;
mod predictor;

pub use dataset::{water_year, Dataset, Design, MissingPolicy};
pub use predictor::{PredictorId, PredictorSet, SWE_ID_FLOOR};
