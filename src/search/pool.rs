//! Fixed-capacity pool of the best models found so far.

use crate::core::PredictorSet;
use crate::models::CandidateModel;
use crate::selection::SlotState;
use crate::utils::metrics::Metric;
use crate::utils::scoring::{compare, is_better};
use std::sync::Arc;

/// One position in the pool.
///
/// `predictors` is the slot's working set. It differs from the model's set
/// only between seeding and the first accepted model.
#[derive(Debug, Clone, Default)]
pub struct PoolSlot {
    pub predictors: PredictorSet,
    pub state: SlotState,
    pub model: Option<Arc<CandidateModel>>,
}

impl PoolSlot {
    /// Score of the held model, or the metric's worst value when empty.
    pub fn score(&self, measure: Metric) -> f64 {
        self.model
            .as_ref()
            .map_or_else(|| measure.worst_value(), |m| m.score(measure))
    }
}

#[derive(Debug, Clone)]
pub struct ModelPool {
    measure: Metric,
    slots: Vec<PoolSlot>,
}

impl ModelPool {
    pub fn new(capacity: usize, measure: Metric) -> Self {
        Self {
            measure,
            slots: vec![PoolSlot::default(); capacity],
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn measure(&self) -> Metric {
        self.measure
    }

    pub fn slot(&self, index: usize) -> &PoolSlot {
        &self.slots[index]
    }

    pub fn slot_mut(&mut self, index: usize) -> &mut PoolSlot {
        &mut self.slots[index]
    }

    pub fn slots(&self) -> &[PoolSlot] {
        &self.slots
    }

    /// Reset a slot to a working set without a model.
    pub fn seed(&mut self, index: usize, predictors: PredictorSet) {
        self.slots[index] = PoolSlot {
            predictors,
            state: SlotState::Seeded,
            model: None,
        };
    }

    /// Predictor sets of the models currently held.
    pub fn held_sets(&self) -> Vec<PredictorSet> {
        self.slots
            .iter()
            .filter_map(|s| s.model.as_ref().map(|m| m.predictors.clone()))
            .collect()
    }

    pub fn contains(&self, set: &PredictorSet) -> bool {
        self.slots
            .iter()
            .any(|s| s.model.as_ref().is_some_and(|m| &m.predictors == set))
    }

    /// Put `model` into slot `index` unconditionally.
    pub fn accept(&mut self, index: usize, model: Arc<CandidateModel>) {
        let slot = &mut self.slots[index];
        slot.predictors = model.predictors.clone();
        slot.model = Some(model);
    }

    /// Index of the slot to replace next: an empty slot if there is one,
    /// otherwise the worst-scoring model.
    pub fn worst_index(&self) -> Option<usize> {
        if let Some(empty) = self.slots.iter().position(|s| s.model.is_none()) {
            return Some(empty);
        }
        let measure = self.measure;
        (0..self.slots.len()).max_by(|&a, &b| {
            compare(
                self.slots[a].score(measure),
                self.slots[b].score(measure),
                measure,
            )
        })
    }

    /// Insert `model` if there is room or it beats the worst held model.
    /// Sets already in the pool are ignored. Returns whether it went in.
    pub fn offer(&mut self, model: Arc<CandidateModel>) -> bool {
        if self.contains(&model.predictors) {
            return false;
        }
        let Some(index) = self.worst_index() else {
            return false;
        };
        let measure = self.measure;
        let incumbent = &self.slots[index];
        let admit = match &incumbent.model {
            None => true,
            Some(old) => {
                let (new_score, old_score) = (model.score(measure), old.score(measure));
                (old_score.is_nan() && !new_score.is_nan())
                    || is_better(new_score, old_score, measure)
            }
        };
        if admit {
            self.accept(index, model);
        }
        admit
    }

    pub fn converged_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|s| s.state == SlotState::Converged)
            .count()
    }

    /// Held models, best first. Empty slots are dropped.
    pub fn into_ranked(self) -> Vec<Arc<CandidateModel>> {
        let measure = self.measure;
        let mut models: Vec<Arc<CandidateModel>> =
            self.slots.into_iter().filter_map(|s| s.model).collect();
        models.sort_by(|a, b| compare(a.score(measure), b.score(measure), measure));
        models
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::testing::{ids, model};

    fn scored(names: &[&str], score: f64) -> Arc<CandidateModel> {
        Arc::new(model(&ids(names), score))
    }

    #[test]
    fn fills_then_replaces_worst() {
        let mut pool = ModelPool::new(2, Metric::CvAdjR2);
        assert!(pool.offer(scored(&["a"], 0.5)));
        assert!(pool.offer(scored(&["b"], 0.2)));
        assert!(!pool.offer(scored(&["c"], 0.1)));
        assert!(pool.offer(scored(&["d"], 0.6)));

        let ranked = pool.into_ranked();
        let sets: Vec<_> = ranked.iter().map(|m| m.predictors.clone()).collect();
        assert_eq!(sets, vec![ids(&["d"]), ids(&["a"])]);
    }

    #[test]
    fn duplicates_are_ignored() {
        let mut pool = ModelPool::new(3, Metric::CvAdjR2);
        assert!(pool.offer(scored(&["a"], 0.5)));
        assert!(!pool.offer(scored(&["a"], 0.9)));
        assert_eq!(pool.held_sets(), vec![ids(&["a"])]);
    }

    #[test]
    fn nan_scored_model_is_evicted_first() {
        let mut pool = ModelPool::new(2, Metric::CvAdjR2);
        pool.offer(scored(&["a"], f64::NAN));
        pool.offer(scored(&["b"], 0.4));
        assert!(pool.offer(scored(&["c"], 0.1)));
        assert!(!pool.contains(&ids(&["a"])));
    }

    #[test]
    fn nan_does_not_displace_nan() {
        let mut pool = ModelPool::new(1, Metric::CvAdjR2);
        assert!(pool.offer(scored(&["a"], f64::NAN)));
        assert!(!pool.offer(scored(&["b"], f64::NAN)));
        assert!(pool.contains(&ids(&["a"])));
        assert!(pool.offer(scored(&["c"], 2.0)));
    }

    #[test]
    fn ranking_respects_metric_direction() {
        let mut pool = ModelPool::new(3, Metric::CvRmse);
        let mut low = model(&ids(&["a"]), 0.0);
        low.metrics.cv_rmse = 1.0;
        let mut high = model(&ids(&["b"]), 0.0);
        high.metrics.cv_rmse = 3.0;
        pool.offer(Arc::new(high));
        pool.offer(Arc::new(low));
        let ranked = pool.into_ranked();
        assert_eq!(ranked[0].predictors, ids(&["a"]));
    }

    #[test]
    fn seeding_clears_the_model() {
        let mut pool = ModelPool::new(1, Metric::CvAdjR2);
        pool.accept(0, scored(&["a"], 0.3));
        pool.slot_mut(0).state = SlotState::Converged;
        pool.seed(0, ids(&["b"]));
        assert!(pool.slot(0).model.is_none());
        assert_eq!(pool.slot(0).state, SlotState::Seeded);
        assert_eq!(pool.slot(0).score(Metric::CvAdjR2), f64::NEG_INFINITY);
        assert_eq!(pool.converged_count(), 0);
    }
}
