//! Feature selection: which predictor subsets get evaluated, and in what
//! order.
//!
//! The selectors never fit anything themselves. They propose batches of
//! candidate sets to a [`CandidateBatch`], which owns fitting, caching and
//! parallelism, and then fold the outcomes into the model pool one at a
//! time, in proposal order.

mod brute_force;
mod evaluator;
mod floating;

pub use brute_force::{brute_force_subset_count, run_brute_force, MAX_BRUTE_FORCE_PREDICTORS};
pub use evaluator::CandidateEvaluator;
pub use floating::{run_floating, Direction};

use crate::core::PredictorSet;
use crate::error::Rejection;
use crate::models::CandidateModel;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Search strategy over predictor subsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SelectionScheme {
    /// Sequential floating forward selection.
    #[default]
    #[serde(rename = "SFFS", alias = "sffs")]
    Sffs,
    /// Sequential floating backward selection.
    #[serde(rename = "SFBS", alias = "sfbs")]
    Sfbs,
    /// Exhaustive enumeration of every subset.
    #[serde(rename = "BRUTE_FORCE", alias = "brute_force", alias = "BruteForce")]
    BruteForce,
}

impl fmt::Display for SelectionScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SelectionScheme::Sffs => "SFFS",
            SelectionScheme::Sfbs => "SFBS",
            SelectionScheme::BruteForce => "BRUTE_FORCE",
        })
    }
}

impl FromStr for SelectionScheme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().replace(['-', ' '], "_").as_str() {
            "SFFS" | "SEQUENTIAL_FLOATING_FORWARD_SELECTION" => Ok(SelectionScheme::Sffs),
            "SFBS" | "SEQUENTIAL_FLOATING_BACKWARDS_SELECTION"
            | "SEQUENTIAL_FLOATING_BACKWARD_SELECTION" => Ok(SelectionScheme::Sfbs),
            "BRUTE_FORCE" | "BRUTEFORCE" => Ok(SelectionScheme::BruteForce),
            _ => Err(format!("unknown selection scheme: {s}")),
        }
    }
}

/// Lifecycle of one pool slot during a floating search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SlotState {
    /// Holds its seed set; no iteration has run yet.
    #[default]
    Seeded,
    Searching,
    /// An iteration left a non-empty set unchanged.
    Converged,
}

/// What happened to one proposed candidate.
#[derive(Debug, Clone)]
pub enum Outcome {
    /// The set is currently held by a pool slot.
    AlreadyEvaluated,
    Scored(Arc<CandidateModel>),
    Rejected(Rejection),
}

impl Outcome {
    pub fn model(&self) -> Option<&Arc<CandidateModel>> {
        match self {
            Outcome::Scored(model) => Some(model),
            _ => None,
        }
    }
}

/// Evaluates batches of candidate sets on behalf of a selector.
pub trait CandidateBatch {
    /// One outcome per candidate, in the same order. Candidates equal to a
    /// set in `held` come back as [`Outcome::AlreadyEvaluated`].
    fn evaluate(&mut self, candidates: &[PredictorSet], held: &[PredictorSet]) -> Vec<Outcome>;

    /// Publish search progress in percent.
    fn report(&mut self, percent_complete: f64);
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scheme_names() {
        assert_eq!("SFFS".parse::<SelectionScheme>().unwrap(), SelectionScheme::Sffs);
        assert_eq!(
            "Sequential Floating Backwards Selection"
                .parse::<SelectionScheme>()
                .unwrap(),
            SelectionScheme::Sfbs
        );
        assert_eq!(
            "brute-force".parse::<SelectionScheme>().unwrap(),
            SelectionScheme::BruteForce
        );
        assert_eq!(SelectionScheme::BruteForce.to_string(), "BRUTE_FORCE");
    }
}
