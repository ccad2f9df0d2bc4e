//! Rolling-window statistics shared by the analyzers.
//!
//! Every function is causal: the value at index i only reads `values[..=i]`.
//! NaN inputs are skipped (percentile) or poison the window (std, max, min),
//! matching the NaN conventions of the moving averages.

/// Fraction of the trailing window (current value included) that is `<=` the
/// current value.
///
/// Fewer than `min_observations` finite values in the window, or a NaN current
/// value, yield the neutral 0.5.
pub fn percentile_rank(values: &[f64], window: usize, min_observations: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![0.5; n];
    if window == 0 {
        return result;
    }

    for i in 0..n {
        let current = values[i];
        if !current.is_finite() {
            continue;
        }
        let start = (i + 1).saturating_sub(window);
        let mut observed = 0usize;
        let mut at_or_below = 0usize;
        for &v in &values[start..=i] {
            if v.is_finite() {
                observed += 1;
                if v <= current {
                    at_or_below += 1;
                }
            }
        }
        if observed >= min_observations.max(1) {
            result[i] = at_or_below as f64 / observed as f64;
        }
    }

    result
}

/// Population standard deviation over a trailing window.
pub fn rolling_std(values: &[f64], window: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];
    if window == 0 || n < window {
        return result;
    }

    for i in (window - 1)..n {
        let slice = &values[i + 1 - window..=i];
        if slice.iter().any(|v| !v.is_finite()) {
            continue;
        }
        let mean = slice.iter().sum::<f64>() / window as f64;
        let var = slice.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / window as f64;
        result[i] = var.sqrt();
    }

    result
}

/// Highest value over a trailing window.
pub fn rolling_max(values: &[f64], window: usize) -> Vec<f64> {
    rolling_fold(values, window, f64::NEG_INFINITY, f64::max)
}

/// Lowest value over a trailing window.
pub fn rolling_min(values: &[f64], window: usize) -> Vec<f64> {
    rolling_fold(values, window, f64::INFINITY, f64::min)
}

fn rolling_fold(values: &[f64], window: usize, init: f64, f: fn(f64, f64) -> f64) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];
    if window == 0 || n < window {
        return result;
    }

    for i in (window - 1)..n {
        let slice = &values[i + 1 - window..=i];
        if slice.iter().any(|v| v.is_nan()) {
            continue;
        }
        result[i] = slice.iter().copied().fold(init, f);
    }

    result
}

/// Pearson correlation of two equal-length slices.
///
/// `None` when there are fewer than two points, any value is non-finite, or
/// either side has zero variance.
pub fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    let n = x.len();
    if n < 2 || n != y.len() {
        return None;
    }
    if x.iter().chain(y).any(|v| !v.is_finite()) {
        return None;
    }

    let mean_x = x.iter().sum::<f64>() / n as f64;
    let mean_y = y.iter().sum::<f64>() / n as f64;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (a, b) in x.iter().zip(y) {
        let dx = a - mean_x;
        let dy = b - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x <= f64::EPSILON || var_y <= f64::EPSILON {
        return None;
    }

    Some((cov / (var_x.sqrt() * var_y.sqrt())).clamp(-1.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, DEFAULT_EPSILON};

    #[test]
    fn percentile_rank_of_rising_series_is_one() {
        let values: Vec<f64> = (0..30).map(|i| i as f64).collect();
        let rank = percentile_rank(&values, 10, 5);
        for v in &rank[4..] {
            assert_approx(*v, 1.0, DEFAULT_EPSILON);
        }
    }

    #[test]
    fn percentile_rank_neutral_below_min_observations() {
        let values = [3.0, 1.0, 2.0];
        let rank = percentile_rank(&values, 10, 5);
        assert!(rank.iter().all(|&v| v == 0.5));
    }

    #[test]
    fn percentile_rank_counts_ties_and_skips_nan() {
        // Window [1, NaN, 2, 2]: finite = 3, at-or-below 2 = 3.
        let values = [1.0, f64::NAN, 2.0, 2.0];
        let rank = percentile_rank(&values, 4, 2);
        assert_approx(rank[3], 1.0, DEFAULT_EPSILON);
        // Window [1, NaN, 2]: at-or-below 2 = 2 of 2.
        assert_approx(rank[2], 1.0, DEFAULT_EPSILON);
        assert_eq!(rank[1], 0.5);
    }

    #[test]
    fn percentile_rank_bounds() {
        let values = [5.0, 1.0, 9.0, 3.0, 7.0, 2.0, 8.0];
        for v in percentile_rank(&values, 4, 1) {
            assert!((0.0..=1.0).contains(&v));
        }
    }

    #[test]
    fn rolling_std_known_value() {
        // Population std of [2, 4, 4, 4, 5, 5, 7, 9] = 2
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let std = rolling_std(&values, 8);
        assert!(std[6].is_nan());
        assert_approx(std[7], 2.0, DEFAULT_EPSILON);
    }

    #[test]
    fn rolling_extremes() {
        let values = [3.0, 1.0, 4.0, 1.0, 5.0];
        let max = rolling_max(&values, 3);
        let min = rolling_min(&values, 3);
        assert!(max[1].is_nan());
        assert_eq!(max[2], 4.0);
        assert_eq!(max[4], 5.0);
        assert_eq!(min[2], 1.0);
        assert_eq!(min[4], 1.0);
    }

    #[test]
    fn pearson_perfect_and_inverse() {
        let x = [1.0, 2.0, 3.0, 4.0];
        let y = [2.0, 4.0, 6.0, 8.0];
        let z = [8.0, 6.0, 4.0, 2.0];
        assert_approx(pearson(&x, &y).unwrap(), 1.0, 1e-12);
        assert_approx(pearson(&x, &z).unwrap(), -1.0, 1e-12);
    }

    #[test]
    fn pearson_zero_variance_is_none() {
        assert!(pearson(&[1.0, 1.0, 1.0], &[1.0, 2.0, 3.0]).is_none());
        assert!(pearson(&[1.0], &[1.0]).is_none());
        assert!(pearson(&[1.0, f64::NAN], &[1.0, 2.0]).is_none());
    }
}
