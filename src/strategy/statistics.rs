// src/strategy/statistics.rs

//! Statistical helpers shared by the reorder policies.
//!
//! Sample statistics follow the usual estimator conventions: standard
//! deviation with Bessel's correction, quantiles with linear interpolation
//! between order statistics.

/// Arithmetic mean, `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (divisor N - 1).
///
/// `None` when fewer than two values are available.
pub fn sample_std_dev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let mu = mean(values)?;
    let sum_sq: f64 = values.iter().map(|v| (v - mu).powi(2)).sum();
    Some((sum_sq / (values.len() - 1) as f64).sqrt())
}

/// Empirical `p`-quantile with linear interpolation.
///
/// The position is `p * (n - 1)` in the sorted sample; values between two
/// order statistics are interpolated. `p` is clamped to [0, 1].
pub fn quantile(values: &[f64], p: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let position = p.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;

    Some(sorted[lower] + fraction * (sorted[upper] - sorted[lower]))
}

/// Approximate inverse CDF (quantile function) of the standard normal.
///
/// Acklam's rational approximation, relative error below 1.2e-9 on (0, 1).
/// Saturates at ±8 outside the open interval.
pub fn inverse_normal_cdf(p: f64) -> f64 {
    // Handle edge cases
    if p >= 1.0 {
        return 8.0;
    }
    if p <= 0.0 {
        return -8.0;
    }
    if p == 0.5 {
        return 0.0;
    }

    const A: [f64; 6] = [
        -3.969_683_028_665_376e1,
        2.209_460_984_245_205e2,
        -2.759_285_104_469_687e2,
        1.383_577_518_672_690e2,
        -3.066_479_806_614_716e1,
        2.506_628_277_459_239,
    ];
    const B: [f64; 5] = [
        -5.447_609_879_822_406e1,
        1.615_858_368_580_409e2,
        -1.556_989_798_598_866e2,
        6.680_131_188_771_972e1,
        -1.328_068_155_288_572e1,
    ];
    const C: [f64; 6] = [
        -7.784_894_002_430_293e-3,
        -3.223_964_580_411_365e-1,
        -2.400_758_277_161_838,
        -2.549_732_539_343_734,
        4.374_664_141_464_968,
        2.938_163_982_698_783,
    ];
    const D: [f64; 4] = [
        7.784_695_709_041_462e-3,
        3.224_671_290_700_398e-1,
        2.445_134_137_142_996,
        3.754_408_661_907_416,
    ];
    const P_LOW: f64 = 0.02425;

    let tail = |q: f64| {
        (((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
    };

    if p < P_LOW {
        tail((-2.0 * p.ln()).sqrt())
    } else if p <= 1.0 - P_LOW {
        let q = p - 0.5;
        let r = q * q;
        (((((A[0] * r + A[1]) * r + A[2]) * r + A[3]) * r + A[4]) * r + A[5]) * q
            / (((((B[0] * r + B[1]) * r + B[2]) * r + B[3]) * r + B[4]) * r + 1.0)
    } else {
        -tail((-2.0 * (1.0 - p).ln()).sqrt())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_mean_and_sample_std() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_eq!(mean(&values), Some(5.0));
        // population std is 2.0, sample std is sqrt(32 / 7)
        let std = sample_std_dev(&values).unwrap();
        assert!((std - (32.0f64 / 7.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_degenerate_inputs() {
        assert_eq!(mean(&[]), None);
        assert_eq!(sample_std_dev(&[3.0]), None);
        assert_eq!(sample_std_dev(&[3.0, 3.0, 3.0]), Some(0.0));
        assert_eq!(quantile(&[], 0.5), None);
    }

    #[test]
    fn test_quantile_interpolates_linearly() {
        let values = [4.0, 1.0, 3.0, 2.0, 5.0];
        assert_eq!(quantile(&values, 0.0), Some(1.0));
        assert_eq!(quantile(&values, 1.0), Some(5.0));
        assert_eq!(quantile(&values, 0.5), Some(3.0));
        // position 0.95 * 4 = 3.8 -> 4 + 0.8 * (5 - 4)
        assert!((quantile(&values, 0.95).unwrap() - 4.8).abs() < 1e-12);
    }

    #[test]
    fn test_inverse_normal_known_values() {
        assert!((inverse_normal_cdf(0.95) - 1.644_853_626_951_472).abs() < 1e-8);
        assert!((inverse_normal_cdf(0.975) - 1.959_963_984_540_054).abs() < 1e-8);
        assert!((inverse_normal_cdf(0.99) - 2.326_347_874_040_841).abs() < 1e-8);
        assert!((inverse_normal_cdf(0.01) + 2.326_347_874_040_841).abs() < 1e-8);
        assert_eq!(inverse_normal_cdf(0.5), 0.0);
    }

    proptest! {
        #[test]
        fn prop_inverse_normal_is_odd_and_monotone(p in 0.001f64..0.999) {
            let z = inverse_normal_cdf(p);
            prop_assert!((z + inverse_normal_cdf(1.0 - p)).abs() < 1e-7);
            prop_assert!(inverse_normal_cdf(p + 0.0005) > z);
        }

        #[test]
        fn prop_quantile_stays_within_sample_range(
            values in proptest::collection::vec(0.0f64..1000.0, 1..100),
            p in 0.0f64..=1.0,
        ) {
            let q = quantile(&values, p).unwrap();
            let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
            let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            prop_assert!(q >= min && q <= max);
        }
    }
}
