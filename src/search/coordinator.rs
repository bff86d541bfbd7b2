//! Top-level model search.

use crate::config::{Distribution, SearchConfig};
use crate::core::{Dataset, PredictorId, PredictorSet};
use crate::error::{Result, SearchError};
use crate::models::CandidateModel;
use crate::search::engine::{build_worker_pool, BatchEngine};
use crate::search::pool::ModelPool;
use crate::search::progress::ProgressObserver;
use crate::selection::{
    brute_force_subset_count, run_brute_force, run_floating, CandidateBatch, CandidateEvaluator,
    Direction, SelectionScheme, MAX_BRUTE_FORCE_PREDICTORS,
};
use std::sync::Arc;

/// Sets handed to the worker pool per brute-force batch.
const BRUTE_FORCE_CHUNK: usize = 512;

/// What a finished search hands back.
#[derive(Debug, Clone)]
pub struct SearchOutput {
    /// Best models first, at most `num_models` of them.
    pub models: Vec<Arc<CandidateModel>>,
    /// Candidates that reached a fit, cache hits included.
    pub models_analyzed: usize,
    /// Distinct predictor sets fitted.
    pub distinct_fits: usize,
    /// Floating iterations, or candidate sets enumerated for brute force.
    pub iterations: usize,
    /// Distribution the models were fitted under.
    pub distribution: Distribution,
    /// Predictors removed for having too many missing values.
    pub dropped_predictors: Vec<PredictorId>,
}

impl SearchOutput {
    pub fn best(&self) -> Option<&Arc<CandidateModel>> {
        self.models.first()
    }
}

/// Runs one model search over a prepared dataset.
///
/// Construction does all fatal validation: configuration values, the
/// predictor pool, forced predictors and brute-force feasibility. Once
/// [`run`](Self::run) starts, failures are local to candidate sets.
pub struct ModelSearchCoordinator {
    dataset: Dataset,
    config: SearchConfig,
    forced: PredictorSet,
    dropped: Vec<PredictorId>,
    observer: Option<Arc<dyn ProgressObserver>>,
}

impl ModelSearchCoordinator {
    pub fn new(mut dataset: Dataset, config: SearchConfig) -> Result<Self> {
        config.validate()?;

        let dropped = dataset.drop_sparse_predictors();
        if dataset.n_predictors() == 0 {
            return Err(SearchError::EmptyPredictorPool);
        }

        let forced: PredictorSet = config.forced_predictors.iter().collect();
        if let Some(unknown) = forced.iter().find(|id| !dataset.contains(id)) {
            return Err(SearchError::UnknownPredictor(unknown.to_string()));
        }

        if config.distribution == Distribution::Lognormal {
            dataset.log_transform_predictand()?;
        }

        if config.selection_scheme == SelectionScheme::BruteForce {
            let p = dataset.n_predictors();
            if p > MAX_BRUTE_FORCE_PREDICTORS {
                return Err(SearchError::InvalidConfig(format!(
                    "brute force over {p} predictors is infeasible (limit {MAX_BRUTE_FORCE_PREDICTORS})"
                )));
            }
        }

        Ok(Self {
            dataset,
            config,
            forced,
            dropped,
            observer: None,
        })
    }

    pub fn with_progress(mut self, observer: impl ProgressObserver + 'static) -> Self {
        self.observer = Some(Arc::new(observer));
        self
    }

    /// The dataset as searched: sparse predictors dropped, predictand
    /// log-transformed under [`Distribution::Lognormal`].
    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn run(&self) -> Result<SearchOutput> {
        let config = &self.config;
        let all = self.dataset.all_predictors();
        let threads = config.resolved_worker_threads();
        let workers = build_worker_pool(threads)?;

        tracing::info!(
            scheme = %config.selection_scheme,
            objective = %config.objective,
            metric = %config.performance_metric,
            cv = %config.cross_validation,
            predictors = all.len(),
            samples = self.dataset.n_samples(),
            threads,
            "starting model search"
        );

        let evaluator = CandidateEvaluator::new(&self.dataset, config);
        let mut engine =
            BatchEngine::new(evaluator, &workers).with_observer(self.observer.as_deref());

        let (pool, iterations) = match config.selection_scheme {
            SelectionScheme::Sffs | SelectionScheme::Sfbs => {
                let direction = if config.selection_scheme == SelectionScheme::Sffs {
                    Direction::Forward
                } else {
                    Direction::Backward
                };
                let mut pool = ModelPool::new(config.num_models, config.performance_metric);
                let iterations =
                    run_floating(direction, &all, &self.forced, &mut pool, &mut engine);
                (pool, iterations)
            }
            SelectionScheme::BruteForce => {
                if !self.forced.is_empty() {
                    tracing::debug!(
                        forced = self.forced.len(),
                        "forced predictors are ignored by brute force"
                    );
                }
                let total = brute_force_subset_count(all.len());
                let capacity = usize::try_from(total)
                    .map_or(config.num_models, |t| t.min(config.num_models));
                let mut pool = ModelPool::new(capacity, config.performance_metric);
                let processed = run_brute_force(&all, &mut pool, &mut engine, BRUTE_FORCE_CHUNK);
                (pool, processed as usize)
            }
        };
        engine.report(100.0);

        let models = pool.into_ranked();
        let output = SearchOutput {
            models,
            models_analyzed: engine.models_analyzed(),
            distinct_fits: engine.fits(),
            iterations,
            distribution: config.distribution,
            dropped_predictors: self.dropped.clone(),
        };

        match output.best() {
            Some(best) => tracing::info!(
                models = output.models.len(),
                models_analyzed = output.models_analyzed,
                best = %best.model_id,
                predictors = %best.predictors,
                score = best.score(config.performance_metric),
                "model search finished"
            ),
            None => tracing::warn!(
                models_analyzed = output.models_analyzed,
                "model search finished without an acceptable model"
            ),
        }
        Ok(output)
    }
}

/// Validate, search, and return the ranked models.
pub fn run_search(dataset: Dataset, config: SearchConfig) -> Result<SearchOutput> {
    ModelSearchCoordinator::new(dataset, config)?.run()
}
