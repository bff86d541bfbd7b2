//! Exhaustive subset enumeration.

use crate::core::{PredictorId, PredictorSet};
use crate::search::ModelPool;
use crate::selection::{CandidateBatch, Outcome};

/// Largest predictor pool brute force will take on.
pub const MAX_BRUTE_FORCE_PREDICTORS: usize = 20;

/// Number of non-empty subsets of a pool of `p` predictors.
pub fn brute_force_subset_count(p: usize) -> u64 {
    (1u64 << p.min(63)) - 1
}

/// Lexicographic `k`-combinations of indices `0..n`.
struct Combinations {
    n: usize,
    indices: Vec<usize>,
    done: bool,
}

impl Combinations {
    fn new(n: usize, k: usize) -> Self {
        Self {
            n,
            indices: (0..k).collect(),
            done: k > n,
        }
    }
}

impl Iterator for Combinations {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let out = self.indices.clone();
        let k = self.indices.len();
        // Rightmost index that can still move.
        match (0..k).rev().find(|&i| self.indices[i] < self.n - k + i) {
            Some(i) => {
                self.indices[i] += 1;
                for j in (i + 1)..k {
                    self.indices[j] = self.indices[j - 1] + 1;
                }
            }
            None => self.done = true,
        }
        Some(out)
    }
}

/// Evaluate every non-empty subset of `all`, smallest first, in chunks of
/// `chunk_size`. Forced predictors play no part here. Each scored model is
/// offered to the pool, which keeps the best `capacity` of them. Returns
/// the number of sets proposed.
pub fn run_brute_force(
    all: &PredictorSet,
    pool: &mut ModelPool,
    batch: &mut dyn CandidateBatch,
    chunk_size: usize,
) -> u64 {
    let ids: &[PredictorId] = all.as_slice();
    let total = brute_force_subset_count(ids.len());
    let chunk_size = chunk_size.max(1);

    let subsets = (1..=ids.len()).flat_map(|k| Combinations::new(ids.len(), k));
    let mut processed = 0u64;
    let mut chunk: Vec<PredictorSet> = Vec::with_capacity(chunk_size);

    let mut flush = |chunk: &mut Vec<PredictorSet>, pool: &mut ModelPool, processed: &mut u64| {
        if chunk.is_empty() {
            return;
        }
        for outcome in batch.evaluate(chunk, &[]) {
            if let Outcome::Scored(model) = outcome {
                pool.offer(model);
            }
        }
        *processed += chunk.len() as u64;
        chunk.clear();
        batch.report(100.0 * *processed as f64 / total as f64);
    };

    for combination in subsets {
        let set: PredictorSet = combination.iter().map(|&i| &ids[i]).collect();
        chunk.push(set);
        if chunk.len() == chunk_size {
            flush(&mut chunk, pool, &mut processed);
            tracing::debug!(processed, total, "brute force chunk evaluated");
        }
    }
    flush(&mut chunk, pool, &mut processed);

    processed
}
