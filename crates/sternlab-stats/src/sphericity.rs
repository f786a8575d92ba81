//! Mauchly's test of sphericity.
//!
//! The repeated measures are projected onto `k - 1` orthonormal Helmert
//! contrasts; sphericity holds when the covariance matrix of the projected
//! data is proportional to the identity. Mauchly's W compares the
//! determinant of that covariance matrix to the power of its mean
//! eigenvalue, and `-(n - 1) d ln W` is approximately chi-squared.

use statrs::distribution::{ChiSquared, ContinuousCDF};

use crate::{StatsError, repeated::RepeatedMeasures};

/// Result of Mauchly's test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mauchly {
    /// Number of complete subjects entering the test.
    pub subjects: usize,
    /// Mauchly's W, in `[0, 1]`.
    pub w: f64,
    /// Chi-squared approximation of the test statistic.
    pub chi_square: f64,
    /// Degrees of freedom of the chi-squared approximation.
    pub dof: f64,
    /// p-value; small values reject sphericity.
    pub p_value: f64,
    /// Greenhouse-Geisser epsilon, in `[1 / (k - 1), 1]`.
    pub epsilon_gg: f64,
}

/// Runs Mauchly's test on complete subjects.
///
/// With only two conditions sphericity holds trivially (W = 1, p = 1).
///
/// # Errors
///
/// * [`StatsError::InsufficientConditions`] - fewer than 2 conditions
/// * [`StatsError::InsufficientData`] - fewer complete subjects than conditions
/// * [`StatsError::ZeroVariance`] - the contrasts carry no variance
/// * [`StatsError::SingularMatrix`] - the contrast covariance matrix is singular
#[expect(clippy::cast_precision_loss)]
pub fn mauchly<L>(measures: &RepeatedMeasures<L>) -> Result<Mauchly, StatsError> {
    let k = measures.num_levels();
    let n = measures.num_subjects();
    if k < 2 {
        return Err(StatsError::InsufficientConditions {
            required: 2,
            actual: k,
        });
    }
    if n < k {
        return Err(StatsError::InsufficientData {
            required: k,
            actual: n,
        });
    }
    if k == 2 {
        return Ok(Mauchly {
            subjects: n,
            w: 1.0,
            chi_square: 0.0,
            dof: 0.0,
            p_value: 1.0,
            epsilon_gg: 1.0,
        });
    }

    let p = k - 1;
    let contrasts = helmert_contrasts(k);
    let projected = measures
        .rows()
        .iter()
        .map(|row| {
            contrasts
                .iter()
                .map(|c| c.iter().zip(row).map(|(ci, x)| ci * x).sum::<f64>())
                .collect::<Vec<_>>()
        })
        .collect::<Vec<_>>();
    let cov = covariance(&projected, p);

    let trace = (0..p).map(|i| cov[i][i]).sum::<f64>();
    if trace <= 0.0 {
        return Err(StatsError::ZeroVariance);
    }
    let det = determinant(cov.clone());
    let pf = p as f64;
    let mean_eigenvalue = trace / pf;
    let w = det / mean_eigenvalue.powf(pf);
    if !w.is_finite() || w <= SINGULAR_TOLERANCE {
        return Err(StatsError::SingularMatrix);
    }
    let w = w.min(1.0);

    let nf = n as f64;
    let d = 1.0 - (2.0 * pf * pf + pf + 2.0) / (6.0 * pf * (nf - 1.0));
    let chi_square = -(nf - 1.0) * d * w.ln();
    let dof = pf * (pf + 1.0) / 2.0 - 1.0;
    let dist = ChiSquared::new(dof).map_err(StatsError::distribution)?;
    let p_value = dist.sf(chi_square.max(0.0));

    let trace_sq = cov.iter().flatten().map(|v| v * v).sum::<f64>();
    let epsilon_gg = (trace * trace / (pf * trace_sq)).clamp(1.0 / pf, 1.0);

    Ok(Mauchly {
        subjects: n,
        w,
        chi_square,
        dof,
        p_value,
        epsilon_gg,
    })
}

const SINGULAR_TOLERANCE: f64 = 1e-12;

/// Orthonormal Helmert contrasts: `k - 1` vectors of length `k`, orthogonal
/// to each other and to the constant vector.
#[expect(clippy::cast_precision_loss)]
fn helmert_contrasts(k: usize) -> Vec<Vec<f64>> {
    (1..k)
        .map(|j| {
            let norm = ((j * (j + 1)) as f64).sqrt();
            (0..k)
                .map(|i| match i.cmp(&j) {
                    std::cmp::Ordering::Less => 1.0 / norm,
                    std::cmp::Ordering::Equal => -(j as f64) / norm,
                    std::cmp::Ordering::Greater => 0.0,
                })
                .collect()
        })
        .collect()
}

/// Sample covariance matrix (n - 1 denominator) of `p`-column rows.
#[expect(clippy::cast_precision_loss)]
fn covariance(rows: &[Vec<f64>], p: usize) -> Vec<Vec<f64>> {
    let n = rows.len() as f64;
    let means = (0..p)
        .map(|j| rows.iter().map(|row| row[j]).sum::<f64>() / n)
        .collect::<Vec<_>>();
    (0..p)
        .map(|a| {
            (0..p)
                .map(|b| {
                    rows.iter()
                        .map(|row| (row[a] - means[a]) * (row[b] - means[b]))
                        .sum::<f64>()
                        / (n - 1.0)
                })
                .collect()
        })
        .collect()
}

/// Determinant by Gaussian elimination with partial pivoting.
fn determinant(mut m: Vec<Vec<f64>>) -> f64 {
    let size = m.len();
    let mut det = 1.0;
    for col in 0..size {
        let pivot = (col..size)
            .max_by(|&a, &b| m[a][col].abs().total_cmp(&m[b][col].abs()))
            .unwrap_or(col);
        if m[pivot][col] == 0.0 {
            return 0.0;
        }
        if pivot != col {
            m.swap(pivot, col);
            det = -det;
        }
        det *= m[col][col];
        for row in col + 1..size {
            let factor = m[row][col] / m[col][col];
            for c in col..size {
                m[row][c] -= factor * m[col][c];
            }
        }
    }
    det
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64, tolerance: f64) {
        assert!(
            (actual - expected).abs() < tolerance,
            "expected {expected}, got {actual}"
        );
    }

    fn reference_measures() -> RepeatedMeasures<&'static str> {
        RepeatedMeasures::from_long([
            ("s1", "T0", 1.0),
            ("s1", "T1", 2.0),
            ("s1", "T2", 3.0),
            ("s2", "T0", 2.0),
            ("s2", "T1", 3.0),
            ("s2", "T2", 5.0),
            ("s3", "T0", 3.0),
            ("s3", "T1", 3.0),
            ("s3", "T2", 4.0),
            ("s4", "T0", 2.0),
            ("s4", "T1", 4.0),
            ("s4", "T2", 6.0),
        ])
    }

    #[test]
    fn test_contrasts_are_orthonormal() {
        let contrasts = helmert_contrasts(4);
        for (i, a) in contrasts.iter().enumerate() {
            assert_close(a.iter().sum::<f64>(), 0.0, 1e-12);
            for (j, b) in contrasts.iter().enumerate() {
                let dot = a.iter().zip(b).map(|(x, y)| x * y).sum::<f64>();
                assert_close(dot, if i == j { 1.0 } else { 0.0 }, 1e-12);
            }
        }
    }

    #[test]
    fn test_determinant() {
        let m = vec![
            vec![0.0, 2.0, 1.0],
            vec![1.0, 1.0, 0.0],
            vec![3.0, 0.0, 1.0],
        ];
        assert_close(determinant(m), -5.0, 1e-12);
    }

    #[test]
    fn test_reference_values() {
        // Contrast covariance [[1/3, c], [c, 5/9]] with c^2 = 4/27:
        // det = 1/27, (trace / 2)^2 = 16/81, W = 3/16.
        let result = mauchly(&reference_measures()).unwrap();
        assert_eq!(result.subjects, 4);
        assert_close(result.w, 3.0 / 16.0, 1e-12);
        assert_eq!(result.dof, 2.0);
        // d = 2/3, chi2 = -2 ln W, chi2(2) survival = exp(-chi2 / 2) = W
        assert_close(result.chi_square, -2.0 * (3.0_f64 / 16.0).ln(), 1e-9);
        assert_close(result.p_value, 3.0 / 16.0, 1e-9);
        assert_close(result.epsilon_gg, 64.0 / 116.0, 1e-9);
    }

    #[test]
    fn test_two_conditions_are_spherical() {
        let measures = RepeatedMeasures::from_long([
            ("a", 0, 1.0),
            ("a", 1, 2.0),
            ("b", 0, 2.0),
            ("b", 1, 5.0),
        ]);
        let result = mauchly(&measures).unwrap();
        assert_eq!(result.w, 1.0);
        assert_eq!(result.p_value, 1.0);
    }

    #[test]
    fn test_too_few_subjects() {
        let measures = RepeatedMeasures::from_long([
            ("a", 0, 1.0),
            ("a", 1, 2.0),
            ("a", 2, 4.0),
            ("b", 0, 2.0),
            ("b", 1, 5.0),
            ("b", 2, 3.0),
        ]);
        assert_eq!(
            mauchly(&measures),
            Err(StatsError::InsufficientData {
                required: 3,
                actual: 2
            })
        );
    }

    #[test]
    fn test_constant_data() {
        let measures = RepeatedMeasures::from_long([
            ("a", 0, 1.0),
            ("a", 1, 1.0),
            ("a", 2, 1.0),
            ("b", 0, 1.0),
            ("b", 1, 1.0),
            ("b", 2, 1.0),
            ("c", 0, 1.0),
            ("c", 1, 1.0),
            ("c", 2, 1.0),
        ]);
        assert_eq!(mauchly(&measures), Err(StatsError::ZeroVariance));
    }
}
