//! Small-Sample Statistics
//!
//! ## Overview
//!
//! Shared arithmetic for the calibration engine, the measurement sampler
//! and the history trend check. Everything works on slices of `f32` with no
//! allocation, so callers collect into `heapless::Vec` first.
//!
//! ## Conventions
//!
//! ### Population Standard Deviation
//! The calibration gate compares the spread of the samples it actually took
//! against a fixed threshold; it does not estimate the spread of a wider
//! population. So we divide by `n`, not `n − 1`:
//!
//! ```text
//! σ = sqrt( Σ (xᵢ − x̄)² / n )
//! ```
//!
//! For the reference calibration `[19.8, 20.1, 19.9, 20.0, 20.2]` this gives
//! σ ≈ 0.141 °C.
//!
//! ### Empty Input
//! Functions return `None` instead of NaN so the caller has to decide what
//! an empty window means.
//!
//! ### Two-Pass Mean
//! The variance is computed around the already known mean rather than with
//! the `Σx² − n·x̄²` shortcut, which cancels catastrophically in `f32` for
//! pressure-sized values.

use libm::sqrtf;

use crate::constants::buffers::MAX_READINGS;

/// Arithmetic mean
pub fn mean(values: &[f32]) -> Option<f32> {
    if values.is_empty() {
        return None;
    }
    let sum: f32 = values.iter().sum();
    Some(sum / values.len() as f32)
}

/// Population standard deviation (divide by n)
pub fn population_std_dev(values: &[f32]) -> Option<f32> {
    let mean = mean(values)?;
    let squares: f32 = values.iter().map(|v| (v - mean) * (v - mean)).sum();
    Some(sqrtf(squares / values.len() as f32))
}

/// Median of up to `MAX_READINGS` values. Averages the middle pair for even
/// counts.
pub fn median(values: &[f32]) -> Option<f32> {
    if values.is_empty() || values.len() > MAX_READINGS {
        return None;
    }

    let mut sorted: heapless::Vec<f32, MAX_READINGS> = heapless::Vec::new();
    for &v in values {
        // Capacity checked above
        let _ = sorted.push(v);
    }
    sorted.sort_unstable_by(|a, b| a.total_cmp(b));

    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Least-squares slope of `y` over `x`. `None` with fewer than two points or
/// when every `x` is equal.
pub fn linear_slope(points: &[(f32, f32)]) -> Option<f32> {
    if points.len() < 2 {
        return None;
    }
    let n = points.len() as f32;
    let mean_x = points.iter().map(|p| p.0).sum::<f32>() / n;
    let mean_y = points.iter().map(|p| p.1).sum::<f32>() / n;

    let mut num = 0.0;
    let mut den = 0.0;
    for &(x, y) in points {
        num += (x - mean_x) * (y - mean_y);
        den += (x - mean_x) * (x - mean_x);
    }

    if den == 0.0 {
        None
    } else {
        Some(num / den)
    }
}

/// Check if a value is within the specified range
pub fn in_range(value: f32, min: f32, max: f32) -> bool {
    value >= min && value <= max
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_and_spread() {
        let temps = [19.8, 20.1, 19.9, 20.0, 20.2];
        let m = mean(&temps).unwrap();
        assert!((m - 20.0).abs() < 1e-5);

        let sd = population_std_dev(&temps).unwrap();
        assert!((sd - 0.141_42).abs() < 1e-3, "sd = {}", sd);
    }

    #[test]
    fn constant_series_has_zero_spread() {
        assert!(population_std_dev(&[101.6; 10]).unwrap() < 1e-4);
        assert_eq!(population_std_dev(&[2.0; 4]), Some(0.0));
    }

    #[test]
    fn empty_inputs() {
        assert_eq!(mean(&[]), None);
        assert_eq!(population_std_dev(&[]), None);
        assert_eq!(median(&[]), None);
    }

    #[test]
    fn median_odd_and_even() {
        assert_eq!(median(&[3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), Some(2.5));
        // Robust against one wild echo
        assert_eq!(median(&[1.0, 1.0, 1.0, 9.0, 1.0]), Some(1.0));
    }

    #[test]
    fn slope_of_a_line() {
        let points = [(0.0, 1.0), (1.0, 3.0), (2.0, 5.0)];
        assert!((linear_slope(&points).unwrap() - 2.0).abs() < 1e-6);
        assert_eq!(linear_slope(&[(1.0, 1.0)]), None);
        assert_eq!(linear_slope(&[(1.0, 1.0), (1.0, 2.0)]), None);
    }

    #[test]
    fn range_check() {
        assert!(in_range(5.0, 0.0, 10.0));
        assert!(!in_range(-1.0, 0.0, 10.0));
        assert!(!in_range(f32::NAN, 0.0, 10.0));
    }
}
