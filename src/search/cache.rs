//! Memoization of evaluated predictor sets.

use crate::core::PredictorSet;
use crate::error::Rejection;
use crate::models::CandidateModel;
use std::collections::HashMap;
use std::sync::Arc;

/// Result of evaluating one predictor set.
pub type CachedOutcome = std::result::Result<Arc<CandidateModel>, Rejection>;

/// Every predictor set evaluated during one search, keyed by the
/// canonical (sorted) set. Rejections are cached as well so that a set is
/// fitted at most once.
#[derive(Debug, Default)]
pub struct EvaluationCache {
    entries: HashMap<PredictorSet, CachedOutcome>,
}

impl EvaluationCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, set: &PredictorSet) -> Option<&CachedOutcome> {
        self.entries.get(set)
    }

    pub fn contains(&self, set: &PredictorSet) -> bool {
        self.entries.contains_key(set)
    }

    pub fn insert(&mut self, set: PredictorSet, outcome: CachedOutcome) {
        self.entries.insert(set, outcome);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of cached sets that produced a model.
    pub fn scored(&self) -> usize {
        self.entries.values().filter(|o| o.is_ok()).count()
    }
}
