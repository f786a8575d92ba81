//! Shapiro-Wilk test of normality.
//!
//! Implements Royston's (1992, 1995) approximation of the Shapiro-Wilk
//! coefficients and of the null distribution of W. The p-value is exact for
//! n = 3 and approximated by a normalizing transformation of `ln(1 - W)` for
//! 4 <= n <= 5000. Larger samples are still computed, but the approximation
//! is not validated there; [`ShapiroWilk::is_extrapolated`] flags this case.

use statrs::distribution::{ContinuousCDF, Normal};

use crate::StatsError;

/// Upper sample size for which Royston's approximation is validated.
pub const MAX_VALIDATED_N: usize = 5000;

const RANGE_EPSILON: f64 = 1e-19;

// Polynomial coefficients, constant term first.
const G: [f64; 2] = [-2.273, 0.459];
const C1: [f64; 6] = [0.0, 0.221_157, -0.147_981, -2.071_19, 4.434_685, -2.706_056];
const C2: [f64; 6] = [0.0, 0.042_981, -0.293_762, -1.752_461, 5.682_633, -3.582_633];
const C3: [f64; 4] = [0.544, -0.399_78, 0.025_054, -6.714e-4];
const C4: [f64; 4] = [1.3822, -0.778_57, 0.062_767, -0.002_032_2];
const C5: [f64; 4] = [-1.5861, -0.310_82, -0.083_751, 0.003_891_5];
const C6: [f64; 3] = [-0.4803, -0.082_676, 0.003_030_2];

/// Result of a Shapiro-Wilk test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapiroWilk {
    /// Sample size.
    pub n: usize,
    /// The W statistic, in `(0, 1]`.
    pub w: f64,
    /// Probability of observing a W this small under normality.
    pub p_value: f64,
}

impl ShapiroWilk {
    /// Runs the test on unsorted values.
    ///
    /// # Errors
    ///
    /// * [`StatsError::InsufficientData`] - fewer than 3 values
    /// * [`StatsError::ZeroVariance`] - all values are identical
    ///
    /// # Examples
    ///
    /// ```
    /// use sternlab_stats::shapiro::ShapiroWilk;
    ///
    /// let result = ShapiroWilk::test(&[1.0, 2.0, 3.0]).unwrap();
    /// assert!((result.w - 1.0).abs() < 1e-12);
    /// assert!((result.p_value - 1.0).abs() < 1e-9);
    /// ```
    pub fn test(values: &[f64]) -> Result<Self, StatsError> {
        let n = values.len();
        if n < 3 {
            return Err(StatsError::InsufficientData {
                required: 3,
                actual: n,
            });
        }

        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);
        let range = sorted[n - 1] - sorted[0];
        if range < RANGE_EPSILON {
            return Err(StatsError::ZeroVariance);
        }

        let weights = full_coefficients(n)?;
        let scaled = sorted.iter().map(|x| x / range).collect::<Vec<_>>();
        let w = squared_correlation(&weights, &scaled).min(1.0);
        let p_value = p_value(n, w)?;

        Ok(Self { n, w, p_value })
    }

    /// Whether the sample is larger than the validated range of the approximation.
    #[must_use]
    pub fn is_extrapolated(&self) -> bool {
        self.n > MAX_VALIDATED_N
    }
}

/// Coefficients `a_1..a_{n/2}` for the upper half of the order statistics.
#[expect(clippy::cast_precision_loss)]
fn half_coefficients(n: usize) -> Result<Vec<f64>, StatsError> {
    let half = n / 2;
    if n == 3 {
        return Ok(vec![std::f64::consts::FRAC_1_SQRT_2]);
    }

    let standard = Normal::new(0.0, 1.0).map_err(StatsError::distribution)?;
    let an = n as f64;
    let m = (1..=half)
        .map(|i| standard.inverse_cdf((i as f64 - 0.375) / (an + 0.25)))
        .collect::<Vec<_>>();
    let summ2 = 2.0 * m.iter().map(|mi| mi * mi).sum::<f64>();
    let ssumm2 = summ2.sqrt();
    let rsn = 1.0 / an.sqrt();

    // m[i] is negative for the lower half; coefficients are reported for the
    // upper half, hence the sign flip.
    let a1 = poly(&C1, rsn) - m[0] / ssumm2;
    let mut a = vec![0.0; half];
    a[0] = a1;
    let (first_rest, fac) = if n > 5 {
        let a2 = -m[1] / ssumm2 + poly(&C2, rsn);
        a[1] = a2;
        let fac = ((summ2 - 2.0 * m[0].powi(2) - 2.0 * m[1].powi(2))
            / (1.0 - 2.0 * a1.powi(2) - 2.0 * a2.powi(2)))
        .sqrt();
        (2, fac)
    } else {
        let fac = ((summ2 - 2.0 * m[0].powi(2)) / (1.0 - 2.0 * a1.powi(2))).sqrt();
        (1, fac)
    };
    for (a_i, m_i) in a.iter_mut().zip(&m).skip(first_rest) {
        *a_i = -m_i / fac;
    }
    Ok(a)
}

/// Antisymmetric coefficient vector aligned with ascending order statistics.
fn full_coefficients(n: usize) -> Result<Vec<f64>, StatsError> {
    let half = half_coefficients(n)?;
    let mut weights = vec![0.0; n];
    for (i, a) in half.iter().enumerate() {
        weights[i] = -a;
        weights[n - 1 - i] = *a;
    }
    Ok(weights)
}

/// Squared Pearson correlation between coefficients and ordered data.
fn squared_correlation(weights: &[f64], sorted: &[f64]) -> f64 {
    let (Some(mean_w), Some(mean_x)) = (
        crate::descriptive::mean(weights),
        crate::descriptive::mean(sorted),
    ) else {
        return f64::NAN;
    };
    let mut sww = 0.0;
    let mut sxx = 0.0;
    let mut swx = 0.0;
    for (w, x) in weights.iter().zip(sorted) {
        let dw = w - mean_w;
        let dx = x - mean_x;
        sww += dw * dw;
        sxx += dx * dx;
        swx += dw * dx;
    }
    swx * swx / (sww * sxx)
}

#[expect(clippy::cast_precision_loss)]
fn p_value(n: usize, w: f64) -> Result<f64, StatsError> {
    if n == 3 {
        // Exact distribution for three observations.
        let six_over_pi = 6.0 / std::f64::consts::PI;
        let p = six_over_pi * (w.sqrt().asin() - std::f64::consts::FRAC_PI_3);
        return Ok(p.clamp(0.0, 1.0));
    }

    let w1 = 1.0 - w;
    if w1 <= 0.0 {
        return Ok(1.0);
    }
    let an = n as f64;
    let mut y = w1.ln();
    let (mean, sd) = if n <= 11 {
        let gamma = poly(&G, an);
        if y >= gamma {
            return Ok(1e-99);
        }
        y = -(gamma - y).ln();
        (poly(&C3, an), poly(&C4, an).exp())
    } else {
        let ln_n = an.ln();
        (poly(&C5, ln_n), poly(&C6, ln_n).exp())
    };
    let normal = Normal::new(mean, sd).map_err(StatsError::distribution)?;
    Ok(normal.sf(y))
}

/// Evaluates `c[0] + c[1] x + c[2] x^2 + ...`.
fn poly(coefficients: &[f64], x: f64) -> f64 {
    coefficients.iter().rev().fold(0.0, |acc, c| acc * x + c)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normal_scores(n: usize) -> Vec<f64> {
        let standard = Normal::new(0.0, 1.0).unwrap();
        #[expect(clippy::cast_precision_loss)]
        let scores = (1..=n)
            .map(|i| standard.inverse_cdf((i as f64 - 0.375) / (n as f64 + 0.25)))
            .collect();
        scores
    }

    #[test]
    fn test_insufficient_data() {
        assert_eq!(
            ShapiroWilk::test(&[1.0, 2.0]),
            Err(StatsError::InsufficientData {
                required: 3,
                actual: 2
            })
        );
    }

    #[test]
    fn test_zero_range() {
        assert_eq!(
            ShapiroWilk::test(&[5.0, 5.0, 5.0, 5.0]),
            Err(StatsError::ZeroVariance)
        );
    }

    #[test]
    fn test_coefficients_are_normalized() {
        for n in [3, 4, 5, 6, 10, 11, 12, 50, 200] {
            let weights = full_coefficients(n).unwrap();
            let norm = weights.iter().map(|w| w * w).sum::<f64>();
            assert!((norm - 1.0).abs() < 1e-9, "n={n}: sum of squares {norm}");
        }
    }

    #[test]
    fn test_three_points_exact() {
        let result = ShapiroWilk::test(&[1.0, 2.0, 10.0]).unwrap();
        // a = (-1/sqrt(2), 0, 1/sqrt(2)); W = 40.5 / (146/3)
        assert!((result.w - 40.5 / (146.0 / 3.0)).abs() < 1e-12);
        assert!(result.p_value > 0.15 && result.p_value < 0.25);
    }

    #[test]
    fn test_normal_scores_look_normal() {
        for n in [8, 20, 100] {
            let result = ShapiroWilk::test(&normal_scores(n)).unwrap();
            assert!(result.w > 0.95, "n={n}: W={}", result.w);
            assert!(result.p_value > 0.5, "n={n}: p={}", result.p_value);
        }
    }

    #[test]
    fn test_heavy_outlier_is_not_normal() {
        let mut values = vec![1.0, 1.1, 0.9, 1.05, 0.95, 1.02, 0.98, 1.01, 0.99, 1.03, 0.97, 1.04];
        values.push(50.0);
        let result = ShapiroWilk::test(&values).unwrap();
        assert!(result.w < 0.6);
        assert!(result.p_value < 0.001);
    }

    #[test]
    fn test_order_does_not_matter() {
        let a = ShapiroWilk::test(&[3.2, 1.5, 4.8, 2.2, 9.1, 5.0]).unwrap();
        let b = ShapiroWilk::test(&[9.1, 5.0, 4.8, 3.2, 2.2, 1.5]).unwrap();
        assert_eq!(a, b);
        assert!(!a.is_extrapolated());
    }
}
