//! Comparison rules for performance measures.

use crate::utils::metrics::{Metric, ModelMetrics};
use std::cmp::Ordering;

/// Whether `new` is strictly better than `old` under `measure`.
///
/// A NaN on either side is never an improvement, and ties are not
/// improvements either. Two NaNs compare as a tie (see [`compare`]), so
/// `is_better(NaN, NaN, _)` is `false` as well and a NaN model never
/// displaces another NaN model.
pub fn is_better(new: f64, old: f64, measure: Metric) -> bool {
    if new.is_nan() || old.is_nan() {
        return false;
    }
    if measure.higher_is_better() {
        new > old
    } else {
        new < old
    }
}

/// Whether the metric set `new` beats `old` on `measure`.
pub fn is_better_model(new: &ModelMetrics, old: &ModelMetrics, measure: Metric) -> bool {
    is_better(new.get(measure), old.get(measure), measure)
}

/// Total order placing the better value first and NaN last.
pub fn compare(a: f64, b: f64, measure: Metric) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => {
            if measure.higher_is_better() {
                b.total_cmp(&a)
            } else {
                a.total_cmp(&b)
            }
        }
    }
}
