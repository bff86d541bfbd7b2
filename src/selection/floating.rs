//! Sequential floating forward and backward selection.
//!
//! Every pool slot runs its own floating search. Slots are processed in
//! order within an iteration, and a set held by one slot is off limits to
//! the others, which pushes later slots towards different models.

use crate::core::{PredictorId, PredictorSet};
use crate::search::ModelPool;
use crate::selection::{CandidateBatch, Outcome, SlotState};
use crate::utils::scoring::is_better;

/// Which way the primary step moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Start from the forced predictors and add.
    Forward,
    /// Start from the whole pool and remove.
    Backward,
}

/// Single additions of every id in `from` to `base`.
fn single_additions(base: &PredictorSet, from: &[PredictorId]) -> Vec<PredictorSet> {
    from.iter().map(|id| base.with(id)).collect()
}

/// Additions of every unordered pair of ids in `from` to `base`.
fn pair_additions(base: &PredictorSet, from: &[PredictorId]) -> Vec<PredictorSet> {
    let mut out = Vec::new();
    for (i, a) in from.iter().enumerate() {
        for b in &from[i + 1..] {
            out.push(base.with(a).with(b));
        }
    }
    out
}

/// Single removals of every id in `from` from `base`, skipping empty sets.
fn single_removals(base: &PredictorSet, from: &[PredictorId]) -> Vec<PredictorSet> {
    from.iter()
        .map(|id| base.without(id))
        .filter(|s| !s.is_empty())
        .collect()
}

/// Removals of every unordered pair of ids in `from`, skipping empty sets.
fn pair_removals(base: &PredictorSet, from: &[PredictorId]) -> Vec<PredictorSet> {
    let mut out = Vec::new();
    for (i, a) in from.iter().enumerate() {
        for b in &from[i + 1..] {
            let set = base.without(a).without(b);
            if !set.is_empty() {
                out.push(set);
            }
        }
    }
    out
}

/// Fold a batch's outcomes into slot `slot`, in proposal order. A model
/// replaces the slot's current one only if it scores strictly better.
/// Returns whether the slot changed.
fn absorb(pool: &mut ModelPool, slot: usize, outcomes: Vec<Outcome>) -> bool {
    let measure = pool.measure();
    let mut changed = false;
    for outcome in outcomes {
        let Outcome::Scored(model) = outcome else {
            continue;
        };
        let current = pool.slot(slot).score(measure);
        if is_better(model.score(measure), current, measure) {
            pool.accept(slot, model);
            changed = true;
        }
    }
    changed
}

/// Run one floating search per pool slot until every slot converges or the
/// iteration bound (`pool size + 1`) is reached. Returns the number of
/// iterations performed.
pub fn run_floating(
    direction: Direction,
    all: &PredictorSet,
    forced: &PredictorSet,
    pool: &mut ModelPool,
    batch: &mut dyn CandidateBatch,
) -> usize {
    let max_iterations = all.len() + 1;
    let n_slots = pool.capacity();
    let mut iteration = 0;

    while iteration < max_iterations {
        iteration += 1;

        for slot in 0..n_slots {
            if pool.slot(slot).state == SlotState::Converged {
                continue;
            }
            if iteration == 1 {
                let seed = match direction {
                    Direction::Forward => forced.clone(),
                    Direction::Backward => all.clone(),
                };
                pool.seed(slot, seed.clone());
                if !seed.is_empty() {
                    let held = pool.held_sets();
                    absorb(pool, slot, batch.evaluate(&[seed], &held));
                }
            }
            pool.slot_mut(slot).state = SlotState::Searching;

            let before = pool.slot(slot).predictors.clone();

            // Primary step, with a two-predictor lookahead when no single
            // move helps.
            let movable: Vec<PredictorId> = match direction {
                Direction::Forward => all.difference(&before).cloned().collect(),
                Direction::Backward => before.difference(forced).cloned().collect(),
            };
            let singles = match direction {
                Direction::Forward => single_additions(&before, &movable),
                Direction::Backward => single_removals(&before, &movable),
            };
            let held = pool.held_sets();
            let mut changed = absorb(pool, slot, batch.evaluate(&singles, &held));

            if !changed {
                let pairs = match direction {
                    Direction::Forward => pair_additions(&before, &movable),
                    Direction::Backward => pair_removals(&before, &movable),
                };
                if !pairs.is_empty() {
                    let held = pool.held_sets();
                    changed = absorb(pool, slot, batch.evaluate(&pairs, &held));
                }
            }

            // Floating step in the opposite direction, never undoing the
            // predictors the primary step just moved.
            let current = pool.slot(slot).predictors.clone();
            let just_moved: PredictorSet = if changed {
                match direction {
                    Direction::Forward => current.difference(&before).collect(),
                    Direction::Backward => before.difference(&current).collect(),
                }
            } else {
                PredictorSet::new()
            };
            let floating = match direction {
                Direction::Forward => {
                    let removable: Vec<PredictorId> = current
                        .iter()
                        .filter(|id| !forced.contains(id) && !just_moved.contains(id))
                        .cloned()
                        .collect();
                    single_removals(&current, &removable)
                }
                Direction::Backward => {
                    let addable: Vec<PredictorId> = all
                        .difference(&current)
                        .filter(|id| !just_moved.contains(id))
                        .cloned()
                        .collect();
                    single_additions(&current, &addable)
                }
            };
            if !floating.is_empty() {
                let held = pool.held_sets();
                changed |= absorb(pool, slot, batch.evaluate(&floating, &held));
            }

            let settled = !pool.slot(slot).predictors.is_empty();
            if !changed && settled {
                pool.slot_mut(slot).state = SlotState::Converged;
                tracing::debug!(
                    iteration,
                    slot,
                    predictors = %pool.slot(slot).predictors,
                    "slot converged"
                );
                let converged = pool.converged_count();
                batch.report(100.0 * converged as f64 / n_slots as f64);
            }
        }

        tracing::debug!(
            iteration,
            converged = pool.converged_count(),
            slots = n_slots,
            "floating iteration complete"
        );
        if pool.converged_count() == n_slots {
            break;
        }
    }

    iteration
}
