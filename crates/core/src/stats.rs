//! Small descriptive-statistics helpers shared by the analysis components.

use std::cmp::Ordering;

/// Arithmetic mean, or `None` for an empty slice.
#[must_use]
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Statistical median (average of the two middle values for even lengths).
#[must_use]
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sort_floats(&mut sorted);

    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Percentage change from `previous` to `current`, in percent.
///
/// Returns `None` when either side is missing or `previous` is zero.
#[must_use]
pub fn pct_change(current: Option<f64>, previous: Option<f64>) -> Option<f64> {
    match (current, previous) {
        (Some(current), Some(previous)) if previous != 0.0 => {
            Some((current - previous) / previous * 100.0)
        }
        _ => None,
    }
}

/// Sorts floats ascending, treating incomparable values as equal.
pub fn sort_floats(values: &mut [f64]) {
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
}

/// Linearly interpolated percentile of a sorted slice, `q` in `[0, 100]`.
#[must_use]
pub fn percentile(sorted: &[f64], q: f64) -> Option<f64> {
    match sorted.len() {
        0 => None,
        1 => Some(sorted[0]),
        n => {
            let rank = (q.clamp(0.0, 100.0) / 100.0) * (n - 1) as f64;
            let lower = rank.floor() as usize;
            let upper = rank.ceil() as usize;
            let weight = rank - lower as f64;
            Some(sorted[lower] + (sorted[upper] - sorted[lower]) * weight)
        }
    }
}

/// Extracts a two-sided percentile interval from a sorted distribution.
///
/// # Returns
/// `(lower, upper)`, or `None` for an empty distribution.
#[must_use]
pub fn percentile_ci(sorted: &[f64], confidence_level: f64) -> Option<(f64, f64)> {
    let alpha = 1.0 - confidence_level;
    let lower = percentile(sorted, alpha / 2.0 * 100.0)?;
    let upper = percentile(sorted, (1.0 - alpha / 2.0) * 100.0)?;
    Some((lower, upper))
}
