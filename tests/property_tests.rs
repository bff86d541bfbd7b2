//! Property-based tests for the regression and selection building blocks.
//!
//! These tests check invariants that should hold for all valid inputs,
//! using randomly generated predictor columns.

use predictor_search::core::{Dataset, PredictorId, PredictorSet};
use predictor_search::models::{
    derive_model_id, CandidateModel, ModelArtifacts, MultipleLinearRegression,
    PrincipalComponentsRegression, RegressionKind, RegressionModel,
};
use predictor_search::search::ModelPool;
use predictor_search::utils::cross_validation::CrossValidator;
use predictor_search::utils::linalg::Matrix;
use predictor_search::utils::metrics::{Metric, ModelMetrics};
use predictor_search::utils::scoring::{compare, is_better};
use predictor_search::SearchError;
use proptest::prelude::*;
use std::cmp::Ordering;
use std::sync::Arc;

/// Strategy for a design with `cols` predictor columns and a predictand
/// that depends linearly on them plus bounded noise.
fn linear_design(
    rows: std::ops::Range<usize>,
    cols: usize,
) -> impl Strategy<Value = (Matrix, Vec<f64>)> {
    rows.prop_flat_map(move |n| {
        (
            prop::collection::vec(prop::collection::vec(-10.0..10.0_f64, cols), n),
            prop::collection::vec(-5.0..5.0_f64, cols),
            prop::collection::vec(-0.5..0.5_f64, n),
        )
            .prop_map(|(rows, beta, noise)| {
                let y = rows
                    .iter()
                    .zip(&noise)
                    .map(|(r, e)| 3.0 + r.iter().zip(&beta).map(|(x, b)| x * b).sum::<f64>() + e)
                    .collect();
                (Matrix::from_rows(&rows).unwrap(), y)
            })
    })
}

/// A candidate carrying only a predictor set and a CV adjusted R².
fn scored_model(predictors: PredictorSet, score: f64) -> CandidateModel {
    let mut metrics = ModelMetrics::sentinel();
    metrics.cv_adj_r2 = score;
    CandidateModel {
        model_id: derive_model_id(RegressionKind::Mlr, &predictors),
        coefficients: vec![1.0; predictors.len()],
        predictors,
        kind: RegressionKind::Mlr,
        intercept: 0.0,
        metrics,
        fitted: Vec::new(),
        cross_validated: Vec::new(),
        observed: Vec::new(),
        years: Vec::new(),
        artifacts: ModelArtifacts::None,
        all_significant: true,
    }
}

// =============================================================================
// Property: fitting is pure
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    #[test]
    fn mlr_fit_is_deterministic((x, y) in linear_design(12..30, 3)) {
        let model = MultipleLinearRegression;
        let a = model.evaluate(&x, &y, CrossValidator::KFold(5), Metric::CvAdjR2);
        let b = model.evaluate(&x, &y, CrossValidator::KFold(5), Metric::CvAdjR2);
        match (a, b) {
            (Ok(a), Ok(b)) => {
                prop_assert_eq!(a.fit.coefficients, b.fit.coefficients);
                prop_assert_eq!(a.metrics, b.metrics);
            }
            (Err(a), Err(b)) => prop_assert_eq!(a, b),
            _ => prop_assert!(false, "outcomes differ"),
        }
    }

    #[test]
    fn mlr_residuals_sum_to_zero((x, y) in linear_design(10..40, 2)) {
        if let Ok(fit) = MultipleLinearRegression.fit(&x, &y) {
            let sum: f64 = fit.residuals.iter().sum();
            prop_assert!(sum.abs() < 1e-6, "residual sum {}", sum);
            for (i, row) in x.iter_rows().enumerate() {
                prop_assert!((fit.predict_row(row) - fit.fitted[i]).abs() < 1e-8);
            }
        }
    }

    #[test]
    fn pcar_back_transform_reproduces_fitted((x, y) in linear_design(15..40, 3)) {
        if let Ok(fit) = PrincipalComponentsRegression::new().fit(&x, &y) {
            for (i, row) in x.iter_rows().enumerate() {
                let raw = fit.intercept
                    + fit.coefficients.iter().zip(row).map(|(b, v)| b * v).sum::<f64>();
                prop_assert!((raw - fit.fitted[i]).abs() < 1e-6 * (1.0 + fit.fitted[i].abs()));
            }
        }
    }
}

// =============================================================================
// Property: scoring is a consistent order
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    #[test]
    fn is_better_is_antisymmetric(a in -1e3..1e3_f64, b in -1e3..1e3_f64) {
        for metric in Metric::ALL {
            prop_assert!(!(is_better(a, b, metric) && is_better(b, a, metric)));
            prop_assert!(!is_better(a, a, metric));
            if is_better(a, b, metric) {
                prop_assert_eq!(compare(a, b, metric), Ordering::Less);
            }
        }
    }

    #[test]
    fn pool_keeps_distinct_best_models(
        scores in prop::collection::vec(0.0..1.0_f64, 1..40),
        capacity in 1usize..8,
    ) {
        let mut pool = ModelPool::new(capacity, Metric::CvAdjR2);
        for (i, score) in scores.iter().enumerate() {
            let set: PredictorSet = [PredictorId::new(format!("{}", 1000 + i % 12))]
                .into_iter()
                .collect();
            pool.offer(Arc::new(scored_model(set, *score)));
        }
        let ranked = pool.into_ranked();
        prop_assert!(ranked.len() <= capacity);
        let mut sets: Vec<_> = ranked.iter().map(|m| m.predictors.clone()).collect();
        sets.sort();
        sets.dedup();
        prop_assert_eq!(sets.len(), ranked.len());
        for pair in ranked.windows(2) {
            prop_assert!(pair[0].metrics.cv_adj_r2 >= pair[1].metrics.cv_adj_r2);
        }
    }
}

// =============================================================================
// Property: datasets reject malformed input
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    #[test]
    fn misaligned_columns_are_rejected(n in 3usize..30, extra in 1usize..5) {
        let years: Vec<i32> = (0..n as i32).collect();
        let y = vec![1.0; n];
        let column = vec![0.5; n + extra];
        let err = Dataset::new(years, y, vec![(PredictorId::from("1"), column)]).unwrap_err();
        prop_assert_eq!(err, SearchError::DimensionMismatch { expected: n, got: n + extra });
    }

    #[test]
    fn predictor_sets_are_canonical(ids in prop::collection::vec(0u16..50, 0..12)) {
        let forward: PredictorSet = ids.iter().map(|i| PredictorId::new(i.to_string())).collect();
        let backward: PredictorSet = ids.iter().rev().map(|i| PredictorId::new(i.to_string())).collect();
        prop_assert_eq!(&forward, &backward);
        let slice = forward.as_slice();
        prop_assert!(slice.windows(2).all(|w| w[0] < w[1]));
    }
}
