//! Fits and vets a single candidate predictor set.

use crate::config::SearchConfig;
use crate::core::{Dataset, PredictorSet};
use crate::error::Rejection;
use crate::models::{BoxedRegression, CandidateModel, RegressionKind};
use crate::utils::cross_validation::CrossValidator;
use crate::utils::metrics::Metric;

/// Coefficients are compared after rounding to this many decimals.
const COEFFICIENT_DECIMALS: i32 = 3;

fn round_coefficient(value: f64) -> f64 {
    let scale = 10f64.powi(COEFFICIENT_DECIMALS);
    (value * scale).round() / scale
}

/// Turns a predictor set into a scored [`CandidateModel`] or a
/// [`Rejection`].
///
/// Holds only shared references and immutable settings, so one evaluator
/// serves every worker thread.
pub struct CandidateEvaluator<'a> {
    dataset: &'a Dataset,
    regressor: BoxedRegression,
    kind: RegressionKind,
    cross_validation: CrossValidator,
    measure: Metric,
    allow_override: bool,
}

impl<'a> CandidateEvaluator<'a> {
    pub fn new(dataset: &'a Dataset, config: &SearchConfig) -> Self {
        Self {
            dataset,
            regressor: config.objective.regressor(),
            kind: config.objective,
            cross_validation: config.cross_validation,
            measure: config.performance_metric,
            allow_override: config.allow_insignificant_override,
        }
    }

    pub fn measure(&self) -> Metric {
        self.measure
    }

    /// Fit, cross-validate, score and vet one candidate.
    ///
    /// Unless the override is set, a model is rejected when a coefficient
    /// fails the t-test, rounds to zero, or belongs to a snow-water-equivalent
    /// predictor and is not positive.
    pub fn evaluate(&self, set: &PredictorSet) -> Result<CandidateModel, Rejection> {
        let design = self
            .dataset
            .design(set, self.regressor.missing_policy())?;
        let evaluation = self.regressor.evaluate(
            &design.x,
            &design.y,
            self.cross_validation,
            self.measure,
        )?;

        if !self.allow_override {
            if !evaluation.fit.all_significant {
                return Err(Rejection::InsignificantCoefficients);
            }
            for (id, &coefficient) in set.iter().zip(&evaluation.fit.coefficients) {
                let rounded = round_coefficient(coefficient);
                if rounded == 0.0 || (id.is_snow_water_equivalent() && rounded <= 0.0) {
                    return Err(Rejection::DomainConstraintViolation {
                        predictor: id.to_string(),
                    });
                }
            }
        }

        let mut model = CandidateModel::from_evaluation(set.clone(), self.kind, design, evaluation);
        if self.allow_override {
            model.all_significant = true;
        }
        Ok(model)
    }
}
