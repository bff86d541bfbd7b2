//! Regression models.

mod candidate;
mod traits;

pub mod mlr;
pub mod pcar;
pub mod zscore;

pub use candidate::{derive_model_id, CandidateModel};
pub use mlr::MultipleLinearRegression;
pub use pcar::{PcaArtifacts, PrincipalComponentsRegression};
pub use traits::{BoxedRegression, Evaluation, Fit, ModelArtifacts, RegressionModel};
pub use zscore::{CompositeArtifacts, ZScoreRegression, R2_THRESHOLD};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Regression variant fitted to each candidate predictor set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RegressionKind {
    /// Multiple linear regression.
    #[default]
    #[serde(rename = "MLR", alias = "mlr", alias = "Regression")]
    Mlr,
    /// Principal components regression.
    #[serde(rename = "PCAR", alias = "pcar", alias = "PCA")]
    Pcar,
    /// Z-score (composite index) regression.
    #[serde(rename = "ZSCR", alias = "zscr", alias = "ZSCORE")]
    Zscr,
}

impl RegressionKind {
    pub const ALL: [RegressionKind; 3] = [RegressionKind::Mlr, RegressionKind::Pcar, RegressionKind::Zscr];

    pub fn code(self) -> &'static str {
        match self {
            RegressionKind::Mlr => "MLR",
            RegressionKind::Pcar => "PCAR",
            RegressionKind::Zscr => "ZSCR",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            RegressionKind::Mlr => "Multiple Linear Regression",
            RegressionKind::Pcar => "Principal Components Regression",
            RegressionKind::Zscr => "Z-Score Regression",
        }
    }

    /// A fresh regressor of this kind.
    pub fn regressor(self) -> BoxedRegression {
        match self {
            RegressionKind::Mlr => Box::new(MultipleLinearRegression::new()),
            RegressionKind::Pcar => Box::new(PrincipalComponentsRegression::new()),
            RegressionKind::Zscr => Box::new(ZScoreRegression::new()),
        }
    }
}

impl fmt::Display for RegressionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for RegressionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        match upper.as_str() {
            "MLR" | "REGRESSION" => Ok(RegressionKind::Mlr),
            "PCAR" | "PCA" => Ok(RegressionKind::Pcar),
            "ZSCR" | "ZSCORE" => Ok(RegressionKind::Zscr),
            _ => Err(format!("unknown regression kind: {s}")),
        }
    }
}
