//! Scored candidate models.

use crate::core::{Design, PredictorId, PredictorSet};
use crate::models::pcar::PrincipalComponentsRegression;
use crate::models::traits::{BoxedRegression, Evaluation, ModelArtifacts};
use crate::models::RegressionKind;
use crate::utils::metrics::{Metric, ModelMetrics};

/// A regression fitted to one predictor set, with its scores.
///
/// Immutable once built; the pool and the memoization cache share it.
#[derive(Debug, Clone)]
pub struct CandidateModel {
    pub predictors: PredictorSet,
    pub kind: RegressionKind,
    /// One coefficient per predictor, in set order.
    pub coefficients: Vec<f64>,
    pub intercept: f64,
    pub metrics: ModelMetrics,
    pub fitted: Vec<f64>,
    pub cross_validated: Vec<f64>,
    /// Predictand values of the fitted rows.
    pub observed: Vec<f64>,
    /// Water years of the fitted rows.
    pub years: Vec<i32>,
    pub artifacts: ModelArtifacts,
    pub all_significant: bool,
    pub model_id: String,
}

impl CandidateModel {
    pub fn from_evaluation(
        predictors: PredictorSet,
        kind: RegressionKind,
        design: Design,
        evaluation: Evaluation,
    ) -> Self {
        let model_id = derive_model_id(kind, &predictors);
        let Evaluation {
            fit,
            cv_predictions,
            metrics,
        } = evaluation;
        Self {
            predictors,
            kind,
            coefficients: fit.coefficients,
            intercept: fit.intercept,
            metrics,
            fitted: fit.fitted,
            cross_validated: cv_predictions,
            observed: design.y,
            years: design.years,
            artifacts: fit.artifacts,
            all_significant: fit.all_significant,
            model_id,
        }
    }

    pub fn score(&self, metric: Metric) -> f64 {
        self.metrics.get(metric)
    }

    pub fn n_predictors(&self) -> usize {
        self.predictors.len()
    }

    pub fn coefficient_for(&self, id: &PredictorId) -> Option<f64> {
        self.predictors
            .iter()
            .position(|p| p == id)
            .map(|i| self.coefficients[i])
    }

    /// Predict from one row of predictor values given in set order.
    pub fn predict_row(&self, row: &[f64]) -> f64 {
        match &self.artifacts {
            ModelArtifacts::Composite(composite) => composite.predict_row(row),
            _ => {
                self.intercept
                    + self
                        .coefficients
                        .iter()
                        .zip(row)
                        .map(|(b, x)| b * x)
                        .sum::<f64>()
            }
        }
    }

    /// A regressor that refits this model's structure on new rows.
    ///
    /// PCAR keeps the chosen component count instead of searching again.
    pub fn regressor(&self) -> BoxedRegression {
        match (&self.kind, &self.artifacts) {
            (RegressionKind::Pcar, ModelArtifacts::PrincipalComponents(pca)) => {
                Box::new(PrincipalComponentsRegression::new().with_components(pca.components))
            }
            (kind, _) => kind.regressor(),
        }
    }
}

const ID_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for &b in bytes {
        hash ^= u64::from(b);
        hash = hash.wrapping_mul(0x0100_0000_01b3);
    }
    hash
}

/// Deterministic short id for a model: the tail of the kind code, the tail
/// of the last predictor id, then four hash-derived characters.
pub fn derive_model_id(kind: RegressionKind, predictors: &PredictorSet) -> String {
    let mut key = String::from(kind.code());
    for id in predictors {
        key.push('|');
        key.push_str(id.as_str());
    }
    let hash = fnv1a(key.as_bytes());

    let code = kind.code();
    let kind_tail = &code[code.len().saturating_sub(2)..];
    let last = predictors
        .as_slice()
        .last()
        .map(|id| id.as_str())
        .unwrap_or("");
    let predictor_tail: String = last
        .chars()
        .rev()
        .take(4)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();

    let number = hash % 100;
    let c1 = ID_ALPHABET[((hash >> 8) % ID_ALPHABET.len() as u64) as usize] as char;
    let c2 = ID_ALPHABET[((hash >> 16) % ID_ALPHABET.len() as u64) as usize] as char;

    format!("{kind_tail}{predictor_tail}{number:02}{c1}{c2}")
}
