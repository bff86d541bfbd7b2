//! Statistical utility functions.

use statrs::distribution::{ContinuousCDF, StudentsT};

/// Calculate the mean of a slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Calculate the variance of a slice (sample variance with n-1 denominator).
pub fn variance(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return f64::NAN;
    }
    let m = mean(values);
    let sum_sq: f64 = values.iter().map(|x| (x - m).powi(2)).sum();
    sum_sq / (values.len() - 1) as f64
}

/// Calculate the standard deviation of a slice.
pub fn std_dev(values: &[f64]) -> f64 {
    variance(values).sqrt()
}

/// Calculate the median of a slice.
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let n = sorted.len();
    if n % 2 == 0 {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    } else {
        sorted[n / 2]
    }
}

/// Mean over the non-NaN entries.
pub fn nan_mean(values: &[f64]) -> f64 {
    let (sum, count) = values
        .iter()
        .filter(|v| !v.is_nan())
        .fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    if count == 0 {
        f64::NAN
    } else {
        sum / count as f64
    }
}

/// Sample standard deviation (n-1) over the non-NaN entries.
pub fn nan_std(values: &[f64]) -> f64 {
    let observed: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    std_dev(&observed)
}

/// Sum of squared deviations from the mean.
pub fn sum_squares_about_mean(values: &[f64]) -> f64 {
    let m = mean(values);
    values.iter().map(|v| (v - m).powi(2)).sum()
}

/// Linear-interpolated percentile of already sorted data, `q` in `[0, 100]`.
pub fn percentile_sorted(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() || !q.is_finite() {
        return f64::NAN;
    }
    let q = q.clamp(0.0, 100.0);
    let pos = q / 100.0 * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

/// One-sided critical value of Student's t at probability `p`.
///
/// Returns `None` when the degrees of freedom are not positive.
pub fn student_t_critical(p: f64, dof: f64) -> Option<f64> {
    if !(dof > 0.0) || !(0.0..1.0).contains(&p) {
        return None;
    }
    StudentsT::new(0.0, 1.0, dof)
        .ok()
        .map(|dist| dist.inverse_cdf(p))
}
