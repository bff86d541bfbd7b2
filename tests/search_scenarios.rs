//! End-to-end model searches on a synthetic water-supply dataset.
//!
//! The predictand is driven by two climate predictors and one snow water
//! equivalent (SWE) predictor; a fourth predictor is unrelated noise.

use approx::assert_relative_eq;
use predictor_search::prelude::*;
use predictor_search::models::RegressionModel;
use predictor_search::selection::CandidateEvaluator;
use predictor_search::utils::scoring::is_better;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

const N: usize = 30;

fn series() -> (Vec<i32>, Vec<f64>, Vec<(PredictorId, Vec<f64>)>) {
    let years: Vec<i32> = (1991..1991 + N as i32).collect();
    let x1: Vec<f64> = (0..N)
        .map(|i| 10.0 + 3.0 * (0.7 * i as f64).sin() + 0.1 * i as f64)
        .collect();
    let x2: Vec<f64> = (0..N).map(|i| 5.0 + 2.0 * (1.3 * i as f64).cos()).collect();
    let x3: Vec<f64> = (0..N).map(|i| ((i * 37) % 11) as f64 / 3.0).collect();
    let swe: Vec<f64> = (0..N)
        .map(|i| 20.0 + 4.0 * (0.4 * i as f64 + 1.0).sin())
        .collect();
    let y: Vec<f64> = (0..N)
        .map(|i| 50.0 + 2.5 * x1[i] + 1.5 * x2[i] + 1.2 * swe[i] + 0.8 * (2.9 * i as f64).sin())
        .collect();
    let predictors = vec![
        (PredictorId::from("1001"), x1),
        (PredictorId::from("1002"), x2),
        (PredictorId::from("1003"), x3),
        (PredictorId::from("9001"), swe),
    ];
    (years, y, predictors)
}

fn dataset() -> Dataset {
    let (years, y, predictors) = series();
    Dataset::new(years, y, predictors).unwrap()
}

fn config() -> SearchConfig {
    SearchConfig::default()
        .with_cross_validation(CrossValidator::KFold(5))
        .with_num_models(4)
        .with_worker_threads(2)
}

fn id(s: &str) -> PredictorId {
    PredictorId::from(s)
}

fn assert_pool_invariants(output: &SearchOutput, config: &SearchConfig) {
    assert!(output.models.len() <= config.num_models);
    let distinct: HashSet<&PredictorSet> = output.models.iter().map(|m| &m.predictors).collect();
    assert_eq!(distinct.len(), output.models.len(), "duplicate predictor sets");
    let metric = config.performance_metric;
    for pair in output.models.windows(2) {
        assert!(
            !is_better(pair[1].score(metric), pair[0].score(metric), metric),
            "models are not ranked best first"
        );
    }
    for model in &output.models {
        assert_eq!(model.kind, config.objective);
        assert_eq!(model.coefficients.len(), model.predictors.len());
        assert_eq!(model.fitted.len(), model.observed.len());
        assert_eq!(model.cross_validated.len(), model.observed.len());
    }
}

#[test]
fn sffs_recovers_the_driving_predictors() {
    let config = config();
    let output = run_search(dataset(), config.clone()).unwrap();
    assert_pool_invariants(&output, &config);

    let best = output.best().unwrap();
    for driver in ["1001", "1002", "9001"] {
        assert!(best.predictors.contains(&id(driver)), "{driver} missing");
    }
    assert!(best.metrics.cv_adj_r2 > 0.9);
    assert!(best.coefficient_for(&id("9001")).unwrap() > 0.0);
    assert!(output.iterations <= 4 + 1);
}

#[test]
fn sfbs_recovers_the_driving_predictors() {
    let config = config().with_selection_scheme(SelectionScheme::Sfbs);
    let output = run_search(dataset(), config.clone()).unwrap();
    assert_pool_invariants(&output, &config);

    let best = output.best().unwrap();
    for driver in ["1001", "1002", "9001"] {
        assert!(best.predictors.contains(&id(driver)), "{driver} missing");
    }
}

#[test]
fn brute_force_best_is_the_exhaustive_optimum() {
    let config = config().with_selection_scheme(SelectionScheme::BruteForce);
    let ds = dataset();
    let output = run_search(ds.clone(), config.clone()).unwrap();
    assert_pool_invariants(&output, &config);
    assert_eq!(output.iterations, 15);
    assert_eq!(output.distinct_fits, 15);

    let evaluator = CandidateEvaluator::new(&ds, &config);
    let ids = ds.predictor_ids().to_vec();
    let mut best: Option<(f64, PredictorSet)> = None;
    for mask in 1u32..(1 << ids.len()) {
        let set: PredictorSet = ids
            .iter()
            .enumerate()
            .filter(|(i, _)| mask & (1 << i) != 0)
            .map(|(_, id)| id.clone())
            .collect();
        if let Ok(model) = evaluator.evaluate(&set) {
            let score = model.metrics.cv_adj_r2;
            if best.as_ref().map_or(true, |(b, _)| score > *b) {
                best = Some((score, set));
            }
        }
    }
    let (score, set) = best.unwrap();
    let top = output.best().unwrap();
    assert_eq!(top.predictors, set);
    assert_relative_eq!(top.metrics.cv_adj_r2, score, epsilon = 1e-12);
}

#[test]
fn forced_predictor_is_in_every_floating_model() {
    for scheme in [SelectionScheme::Sffs, SelectionScheme::Sfbs] {
        let config = config()
            .with_selection_scheme(scheme)
            .with_forced_predictors(["1003"])
            .with_insignificant_override(true);
        let output = run_search(dataset(), config.clone()).unwrap();
        assert!(!output.models.is_empty(), "{scheme}");
        for model in &output.models {
            assert!(model.predictors.contains(&id("1003")), "{scheme}: {}", model.predictors);
        }
    }
}

#[test]
fn brute_force_ignores_forced_predictors() {
    let forced_config = config()
        .with_selection_scheme(SelectionScheme::BruteForce)
        .with_forced_predictors(["1003"]);
    let output = run_search(dataset(), forced_config.clone()).unwrap();
    assert_pool_invariants(&output, &forced_config);
    assert_eq!(output.iterations, 15);
    assert_eq!(output.distinct_fits, 15);

    let unforced = run_search(
        dataset(),
        config().with_selection_scheme(SelectionScheme::BruteForce),
    )
    .unwrap();
    assert_eq!(output.best().unwrap().predictors, unforced.best().unwrap().predictors);
    assert!(output
        .models
        .iter()
        .any(|m| !m.predictors.contains(&id("1003"))));
}

#[test]
fn searches_are_deterministic() {
    let a = run_search(dataset(), config()).unwrap();
    let b = run_search(dataset(), config().with_worker_threads(3)).unwrap();
    assert_eq!(a.models.len(), b.models.len());
    for (x, y) in a.models.iter().zip(&b.models) {
        assert_eq!(x.predictors, y.predictors);
        assert_eq!(x.model_id, y.model_id);
        assert_eq!(x.coefficients, y.coefficients);
        assert_eq!(x.metrics, y.metrics);
    }
    assert_eq!(a.models_analyzed, b.models_analyzed);
}

#[test]
fn every_objective_produces_models() {
    for objective in RegressionKind::ALL {
        let config = config().with_objective(objective);
        let output = run_search(dataset(), config.clone()).unwrap();
        assert!(!output.models.is_empty(), "{objective}");
        assert_pool_invariants(&output, &config);
        for model in &output.models {
            assert!(model.predictors.len() >= objective.regressor().min_predictors());
        }
    }
}

#[test]
fn error_measures_rank_lowest_first() {
    let config = config().with_performance_metric(Metric::CvRmse);
    let output = run_search(dataset(), config.clone()).unwrap();
    assert_pool_invariants(&output, &config);
    let best = output.best().unwrap();
    assert!(output
        .models
        .iter()
        .all(|m| m.metrics.cv_rmse >= best.metrics.cv_rmse));
}

#[test]
fn malformed_input_is_fatal() {
    let (years, mut y, predictors) = series();
    y.pop();
    assert!(matches!(
        Dataset::new(years.clone(), y, predictors.clone()),
        Err(SearchError::DimensionMismatch { .. })
    ));

    let (_, y, _) = series();
    assert_eq!(
        Dataset::new(years, y, Vec::new()).unwrap_err(),
        SearchError::EmptyPredictorPool
    );
}

#[test]
fn sparse_predictors_are_dropped_before_searching() {
    let (years, y, mut predictors) = series();
    let sparse: Vec<f64> = (0..N)
        .map(|i| if i % 3 == 0 { i as f64 } else { f64::NAN })
        .collect();
    predictors.push((id("1004"), sparse));
    let ds = Dataset::new(years, y, predictors).unwrap();

    let output = run_search(ds, config()).unwrap();
    assert_eq!(output.dropped_predictors, vec![id("1004")]);
    assert!(output
        .models
        .iter()
        .all(|m| !m.predictors.contains(&id("1004"))));
}

#[test]
fn progress_is_monotone_and_completes() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let output = ModelSearchCoordinator::new(dataset(), config())
        .unwrap()
        .with_progress(move |p: SearchProgress| sink.lock().unwrap().push(p))
        .run()
        .unwrap();

    let seen = seen.lock().unwrap();
    assert!(!seen.is_empty());
    for pair in seen.windows(2) {
        assert!(pair[0].models_analyzed <= pair[1].models_analyzed);
    }
    let last = seen.last().unwrap();
    assert_eq!(last.percent_complete, 100.0);
    assert_eq!(last.models_analyzed, output.models_analyzed);
}

#[test]
fn lognormal_search_and_bootstrap() {
    let config = config().with_distribution(Distribution::Lognormal);
    let coordinator = ModelSearchCoordinator::new(dataset(), config).unwrap();
    let output = coordinator.run().unwrap();
    let best = output.best().unwrap();

    // The searched dataset holds ln(y); the bootstrap maps back.
    let row: Vec<f64> = best
        .predictors
        .iter()
        .map(|p| coordinator.dataset().column(p).unwrap()[10])
        .collect();
    let dist = compute_prediction_interval(
        best,
        coordinator.dataset(),
        output.distribution,
        &row,
        &BootstrapConfig::new(100).with_seed(42).with_worker_threads(2),
    )
    .unwrap();

    let observed = coordinator.dataset().predictand()[10].exp();
    assert!((dist.point - observed).abs() / observed < 0.05);
    assert!(dist.percentile(10.0) <= dist.median());
    assert!(dist.median() <= dist.percentile(90.0));
    assert!(dist.values.iter().all(|v| *v > 0.0));
}

#[test]
fn config_from_toml_drives_a_search() {
    let config = SearchConfig::from_toml_str(
        r#"
        objective = "MLR"
        cross_validation = "LOO"
        selection_scheme = "SFBS"
        performance_metric = "CV_NSE"
        num_models = 2
        worker_threads = 1
        "#,
    )
    .unwrap();
    let output = run_search(dataset(), config.clone()).unwrap();
    assert_pool_invariants(&output, &config);
    assert!(output.best().unwrap().metrics.cv_nse > 0.9);
}
