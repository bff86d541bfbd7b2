//! Cross-validation splitters and cross-validated prediction.
//!
//! Splits are deterministic: K-fold uses contiguous, unshuffled folds in
//! sample order, so repeated searches over the same data produce the same
//! scores.

use crate::error::NotEvaluable;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Cross-validation scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum CrossValidator {
    /// Each sample is held out on its own.
    LeaveOneOut,
    /// `k` contiguous folds; the first `n % k` folds hold one extra sample.
    KFold(usize),
}

impl Default for CrossValidator {
    fn default() -> Self {
        Self::KFold(10)
    }
}

/// One train/test partition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Restartable iterator over the splits of `n` samples.
#[derive(Debug, Clone)]
pub struct Splits {
    n_samples: usize,
    fold_sizes: Vec<usize>,
    next_fold: usize,
    start: usize,
}

impl Iterator for Splits {
    type Item = Split;

    fn next(&mut self) -> Option<Split> {
        let size = *self.fold_sizes.get(self.next_fold)?;
        let end = self.start + size;
        let test: Vec<usize> = (self.start..end).collect();
        let train: Vec<usize> = (0..self.start).chain(end..self.n_samples).collect();
        self.start = end;
        self.next_fold += 1;
        Some(Split { train, test })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.fold_sizes.len() - self.next_fold;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Splits {}

impl CrossValidator {
    /// Number of folds for `n` samples, or zero if the scheme cannot split.
    pub fn n_splits(&self, n_samples: usize) -> usize {
        match *self {
            CrossValidator::LeaveOneOut => {
                if n_samples >= 2 {
                    n_samples
                } else {
                    0
                }
            }
            CrossValidator::KFold(k) => {
                if k >= 2 && n_samples >= k {
                    k
                } else {
                    0
                }
            }
        }
    }

    /// Smallest sample count the scheme can split.
    pub fn min_samples(&self) -> usize {
        match *self {
            CrossValidator::LeaveOneOut => 2,
            CrossValidator::KFold(k) => k.max(2),
        }
    }

    /// Produce the splits of `n_samples` samples.
    pub fn split(&self, n_samples: usize) -> Splits {
        let folds = self.n_splits(n_samples);
        let fold_sizes = if folds == 0 {
            Vec::new()
        } else {
            let base = n_samples / folds;
            let extra = n_samples % folds;
            (0..folds).map(|i| base + usize::from(i < extra)).collect()
        };
        Splits {
            n_samples,
            fold_sizes,
            next_fold: 0,
            start: 0,
        }
    }
}

impl fmt::Display for CrossValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CrossValidator::LeaveOneOut => f.write_str("LOO"),
            CrossValidator::KFold(k) => write!(f, "KFOLD_{k}"),
        }
    }
}

impl FromStr for CrossValidator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "LOO" | "LEAVE_ONE_OUT" | "LEAVEONEOUT" => return Ok(CrossValidator::LeaveOneOut),
            _ => {}
        }
        let k = normalized
            .strip_prefix("KFOLD_")
            .or_else(|| normalized.strip_prefix("KFOLD"))
            .or_else(|| normalized.strip_prefix("K_FOLD_"))
            .map(|rest| rest.trim_start_matches('(').trim_end_matches(')'))
            .and_then(|k| k.parse::<usize>().ok())
            .ok_or_else(|| format!("unknown cross-validation scheme: {s}"))?;
        if k < 2 {
            return Err(format!("k-fold needs at least 2 folds, got {k}"));
        }
        Ok(CrossValidator::KFold(k))
    }
}

impl TryFrom<String> for CrossValidator {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CrossValidator> for String {
    fn from(cv: CrossValidator) -> Self {
        cv.to_string()
    }
}

/// Cross-validated predictions in sample order.
///
/// `fit_predict(train, test)` fits on the training indices and returns one
/// prediction per test index. Every sample is predicted exactly once.
pub fn cross_val_predict<F>(
    cv: CrossValidator,
    n_samples: usize,
    mut fit_predict: F,
) -> Result<Vec<f64>, NotEvaluable>
where
    F: FnMut(&[usize], &[usize]) -> Result<Vec<f64>, NotEvaluable>,
{
    let splits = cv.split(n_samples);
    if splits.len() == 0 {
        return Err(NotEvaluable::InsufficientSamples {
            needed: cv.min_samples(),
            got: n_samples,
        });
    }

    let mut predictions = vec![f64::NAN; n_samples];
    for split in splits {
        let fold = fit_predict(&split.train, &split.test)?;
        for (&idx, value) in split.test.iter().zip(fold) {
            predictions[idx] = value;
        }
    }
    Ok(predictions)
}
