//! Statistics kernel: small, total numeric helpers.
//!
//! RULE: nothing in here returns an error or panics. Degenerate input
//! (empty slices, zero spread, non-finite values) resolves to 0 or to
//! the nearest bound.

/// Scale factor that makes MAD comparable to a standard deviation
/// under normality (0.6745 ≈ Φ⁻¹(0.75)).
pub const MAD_SCALE: f64 = 0.6745;

/// Spread at or below this is treated as "no spread".
pub const DEGENERATE_SPREAD: f64 = 1e-8;

/// Median. Even-length input averages the two middle values; empty → 0.
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Population standard deviation. Fewer than two samples → 0.
pub fn stddev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    variance.sqrt()
}

/// Median absolute deviation. Returns `(median, mad)`.
pub fn mad(values: &[f64]) -> (f64, f64) {
    let med = median(values);
    let deviations: Vec<f64> = values.iter().map(|v| (v - med).abs()).collect();
    (med, median(&deviations))
}

/// Robust z-score for every value in the sample, in input order.
///
/// Uses `MAD_SCALE * (x - median) / MAD` while the MAD has spread, falls
/// back to the classic `(x - median) / stddev` when it does not, and
/// returns 0 for every member of a sample with no spread at all.
pub fn robust_z_scores(values: &[f64]) -> Vec<f64> {
    let (med, mad) = mad(values);
    if mad > DEGENERATE_SPREAD {
        return values.iter().map(|v| MAD_SCALE * (v - med) / mad).collect();
    }

    let sd = stddev(values);
    if sd > DEGENERATE_SPREAD {
        return values.iter().map(|v| (v - med) / sd).collect();
    }

    vec![0.0; values.len()]
}

/// Clamp to [0, 100]. Non-finite input maps to 0.
pub fn clamp_percent(value: f64) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    value.clamp(0.0, 100.0)
}

/// Clamp to [0, 1]. Non-finite input maps to 0.
pub fn clamp01(value: f64) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    value.clamp(0.0, 1.0)
}

pub fn clamp_range(value: f64, min: f64, max: f64) -> f64 {
    value.max(min).min(max)
}

/// `log10(max(x, 1))`, so zero and negative magnitudes sit at 0.
pub fn safe_log10(value: f64) -> f64 {
    value.max(1.0).log10()
}

/// Round half away from zero to `digits` decimal places.
pub fn round_to(value: f64, digits: i32) -> f64 {
    let factor = 10f64.powi(digits);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn median_handles_even_odd_and_empty() {
        assert_eq!(median(&[]), 0.0);
        assert_eq!(median(&[3.0, 1.0, 2.0]), 2.0);
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), 2.5);
    }

    #[test]
    fn stddev_is_population_form() {
        assert_eq!(stddev(&[5.0]), 0.0);
        let sd = stddev(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert!((sd - 2.0).abs() < 1e-12, "got {sd}");
    }

    #[test]
    fn robust_z_falls_back_to_stddev_when_mad_collapses() {
        // Four equal values and one outlier: MAD is 0, stddev is not.
        let z = robust_z_scores(&[1.0, 1.0, 1.0, 1.0, 6.0]);
        assert_eq!(z[0], 0.0);
        assert!(z[4] > 1.8, "outlier z should be large, got {}", z[4]);
    }

    #[test]
    fn robust_z_is_zero_without_spread() {
        assert_eq!(robust_z_scores(&[2.5, 2.5, 2.5]), vec![0.0; 3]);
        assert_eq!(robust_z_scores(&[7.0]), vec![0.0]);
    }

    #[test]
    fn clamps_reject_non_finite() {
        assert_eq!(clamp_percent(f64::NAN), 0.0);
        assert_eq!(clamp_percent(f64::INFINITY), 0.0);
        assert_eq!(clamp_percent(140.0), 100.0);
        assert_eq!(clamp01(-0.3), 0.0);
        assert_eq!(clamp01(0.4), 0.4);
    }

    #[test]
    fn rounding_and_safe_log() {
        assert_eq!(round_to(12.3456, 2), 12.35);
        assert_eq!(round_to(-0.125, 1), -0.1);
        assert_eq!(safe_log10(0.0), 0.0);
        assert_eq!(safe_log10(1000.0), 3.0);
    }
}
