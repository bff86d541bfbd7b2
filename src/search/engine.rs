//! Parallel, memoized evaluation of candidate batches.

use crate::core::PredictorSet;
use crate::error::{Rejection, Result, SearchError};
use crate::search::cache::{CachedOutcome, EvaluationCache};
use crate::search::progress::{ProgressObserver, SearchProgress};
use crate::selection::{CandidateBatch, CandidateEvaluator, Outcome};
use rayon::prelude::*;
use std::collections::HashSet;
use std::sync::Arc;

/// Build the worker pool candidate fits run on.
pub fn build_worker_pool(threads: usize) -> Result<rayon::ThreadPool> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(|i| format!("predictor-search-{i}"))
        .build()
        .map_err(|e| SearchError::WorkerPool(e.to_string()))
}

/// Whether an outcome involved fitting a regression.
fn was_fitted(outcome: &CachedOutcome) -> bool {
    !matches!(outcome, Err(Rejection::NotEvaluable(_)))
}

/// [`CandidateBatch`] backed by a rayon pool and an [`EvaluationCache`].
///
/// Each batch is split into sets not seen before, which are fitted in
/// parallel, and sets answered from the cache. Outcomes come back in the
/// order the selector proposed them.
pub struct BatchEngine<'a> {
    evaluator: CandidateEvaluator<'a>,
    workers: &'a rayon::ThreadPool,
    cache: EvaluationCache,
    models_analyzed: usize,
    fits: usize,
    observer: Option<&'a dyn ProgressObserver>,
}

impl<'a> BatchEngine<'a> {
    pub fn new(evaluator: CandidateEvaluator<'a>, workers: &'a rayon::ThreadPool) -> Self {
        Self {
            evaluator,
            workers,
            cache: EvaluationCache::new(),
            models_analyzed: 0,
            fits: 0,
            observer: None,
        }
    }

    pub fn with_observer(mut self, observer: Option<&'a dyn ProgressObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Candidates whose evaluation involved a fit, cache hits included.
    pub fn models_analyzed(&self) -> usize {
        self.models_analyzed
    }

    /// Distinct predictor sets actually evaluated.
    pub fn fits(&self) -> usize {
        self.fits
    }

    pub fn cache(&self) -> &EvaluationCache {
        &self.cache
    }

    fn evaluate_pending(&mut self, pending: Vec<PredictorSet>) {
        if pending.is_empty() {
            return;
        }
        let evaluator = &self.evaluator;
        let results: Vec<_> = self.workers.install(|| {
            pending
                .into_par_iter()
                .map(|set| {
                    let outcome = evaluator.evaluate(&set).map(Arc::new);
                    (set, outcome)
                })
                .collect()
        });
        self.fits += results.len();
        for (set, outcome) in results {
            if let Err(rejection) = &outcome {
                tracing::trace!(predictors = %set, %rejection, "candidate rejected");
            }
            self.cache.insert(set, outcome);
        }
    }
}

impl CandidateBatch for BatchEngine<'_> {
    fn evaluate(&mut self, candidates: &[PredictorSet], held: &[PredictorSet]) -> Vec<Outcome> {
        let mut seen = HashSet::new();
        let pending: Vec<PredictorSet> = candidates
            .iter()
            .filter(|set| !held.contains(*set) && !self.cache.contains(set))
            .filter(|set| seen.insert(*set))
            .cloned()
            .collect();
        self.evaluate_pending(pending);

        let mut outcomes = Vec::with_capacity(candidates.len());
        for set in candidates {
            if held.contains(set) {
                outcomes.push(Outcome::AlreadyEvaluated);
                continue;
            }
            let Some(cached) = self.cache.get(set) else {
                // Unreachable: every unheld set was evaluated above.
                outcomes.push(Outcome::AlreadyEvaluated);
                continue;
            };
            if was_fitted(cached) {
                self.models_analyzed += 1;
            }
            outcomes.push(match cached {
                Ok(model) => Outcome::Scored(Arc::clone(model)),
                Err(rejection) => Outcome::Rejected(rejection.clone()),
            });
        }
        outcomes
    }

    fn report(&mut self, percent_complete: f64) {
        let progress = SearchProgress {
            models_analyzed: self.models_analyzed,
            percent_complete,
        };
        tracing::debug!(
            models_analyzed = progress.models_analyzed,
            percent_complete = progress.percent_complete,
            "search progress"
        );
        if let Some(observer) = self.observer {
            observer.on_progress(progress);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SearchConfig;
    use crate::core::{Dataset, PredictorId};
    use crate::utils::cross_validation::CrossValidator;
    use std::sync::Mutex;

    fn dataset() -> Dataset {
        let n = 20;
        let years: Vec<i32> = (2000..2000 + n as i32).collect();
        let a: Vec<f64> = (0..n).map(|i| (i as f64 * 0.9).sin() * 4.0 + 10.0).collect();
        let b: Vec<f64> = (0..n).map(|i| (i as f64 * 0.4).cos() * 2.0).collect();
        let y: Vec<f64> = (0..n)
            .map(|i| 3.0 * a[i] + 2.0 * b[i] + ((i * 5) % 7) as f64 * 0.1)
            .collect();
        Dataset::new(
            years,
            y,
            vec![(PredictorId::from("a"), a), (PredictorId::from("b"), b)],
        )
        .unwrap()
    }

    fn set(ids: &[&str]) -> PredictorSet {
        ids.iter().map(|s| PredictorId::from(*s)).collect()
    }

    #[test]
    fn each_distinct_set_is_fitted_once() {
        let ds = dataset();
        let config = SearchConfig::default().with_cross_validation(CrossValidator::KFold(4));
        let workers = build_worker_pool(2).unwrap();
        let mut engine = BatchEngine::new(CandidateEvaluator::new(&ds, &config), &workers);

        let batch = vec![set(&["a"]), set(&["b"]), set(&["a"]), set(&["a", "b"])];
        let first = engine.evaluate(&batch, &[]);
        assert_eq!(first.len(), 4);
        assert_eq!(engine.fits(), 3);

        let second = engine.evaluate(&batch, &[]);
        assert_eq!(second.len(), 4);
        assert_eq!(engine.fits(), 3);
        assert_eq!(engine.cache().len(), 3);
        assert_eq!(engine.models_analyzed(), 8);
    }

    #[test]
    fn held_sets_are_not_evaluated() {
        let ds = dataset();
        let config = SearchConfig::default().with_cross_validation(CrossValidator::KFold(4));
        let workers = build_worker_pool(1).unwrap();
        let mut engine = BatchEngine::new(CandidateEvaluator::new(&ds, &config), &workers);

        let outcomes = engine.evaluate(&[set(&["a"]), set(&["b"])], &[set(&["a"])]);
        assert!(matches!(outcomes[0], Outcome::AlreadyEvaluated));
        assert!(!matches!(outcomes[1], Outcome::AlreadyEvaluated));
        assert_eq!(engine.fits(), 1);
    }

    #[test]
    fn unknown_predictors_are_not_counted() {
        let ds = dataset();
        let config = SearchConfig::default().with_cross_validation(CrossValidator::KFold(4));
        let workers = build_worker_pool(1).unwrap();
        let mut engine = BatchEngine::new(CandidateEvaluator::new(&ds, &config), &workers);

        let outcomes = engine.evaluate(&[set(&["zzz"])], &[]);
        assert!(matches!(outcomes[0], Outcome::Rejected(Rejection::NotEvaluable(_))));
        assert_eq!(engine.models_analyzed(), 0);
    }

    #[test]
    fn observer_receives_reports() {
        let ds = dataset();
        let config = SearchConfig::default();
        let workers = build_worker_pool(1).unwrap();
        let seen = Mutex::new(Vec::new());
        let observer = |p: SearchProgress| seen.lock().unwrap().push(p.percent_complete);
        let mut engine = BatchEngine::new(CandidateEvaluator::new(&ds, &config), &workers)
            .with_observer(Some(&observer as &dyn ProgressObserver));
        engine.report(50.0);
        engine.report(100.0);
        drop(engine);
        assert_eq!(*seen.lock().unwrap(), vec![50.0, 100.0]);
    }
}
