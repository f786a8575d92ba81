//! One-way repeated-measures analysis of variance.

use statrs::distribution::{ContinuousCDF, FisherSnedecor};

use crate::{StatsError, repeated::RepeatedMeasures};

const RELATIVE_TOLERANCE: f64 = 1e-12;

/// ANOVA table row for the within-subject factor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RmAnova {
    /// Number of complete subjects entering the analysis.
    pub subjects: usize,
    /// Sum of squares of the within-subject factor.
    pub ss_effect: f64,
    /// Sum of squares between subjects.
    pub ss_subjects: f64,
    /// Residual (factor x subject) sum of squares.
    pub ss_error: f64,
    /// Numerator degrees of freedom (`k - 1`).
    pub df1: f64,
    /// Denominator degrees of freedom (`(k - 1)(n - 1)`).
    pub df2: f64,
    /// F statistic.
    pub f: f64,
    /// Uncorrected p-value.
    pub p_value: f64,
    /// Generalized eta-squared, `None` when the total sum of squares is zero.
    pub generalized_eta_squared: Option<f64>,
}

impl RmAnova {
    /// Partial eta-squared derived from F and the degrees of freedom.
    #[must_use]
    pub fn partial_eta_squared(&self) -> f64 {
        partial_eta_squared(self.f, self.df1, self.df2)
    }
}

/// `(F * df1) / (F * df1 + df2)`.
///
/// # Examples
///
/// ```
/// use sternlab_stats::rm_anova::partial_eta_squared;
///
/// assert_eq!(partial_eta_squared(3.0, 2.0, 18.0), 0.25);
/// ```
#[must_use]
pub fn partial_eta_squared(f: f64, df1: f64, df2: f64) -> f64 {
    (f * df1) / (f * df1 + df2)
}

/// Runs a one-way repeated-measures ANOVA on complete subjects.
///
/// # Errors
///
/// * [`StatsError::InsufficientConditions`] - fewer than 2 conditions
/// * [`StatsError::InsufficientData`] - fewer than 2 complete subjects
/// * [`StatsError::ZeroVariance`] - the residual variance is zero
#[expect(clippy::cast_precision_loss)]
pub fn rm_anova<L>(measures: &RepeatedMeasures<L>) -> Result<RmAnova, StatsError> {
    let k = measures.num_levels();
    let n = measures.num_subjects();
    if k < 2 {
        return Err(StatsError::InsufficientConditions {
            required: 2,
            actual: k,
        });
    }
    if n < 2 {
        return Err(StatsError::InsufficientData {
            required: 2,
            actual: n,
        });
    }

    let (kf, nf) = (k as f64, n as f64);
    let grand_mean = measures.values().sum::<f64>() / (kf * nf);
    let ss_total = measures
        .values()
        .map(|v| (v - grand_mean).powi(2))
        .sum::<f64>();
    let ss_effect = (0..k)
        .map(|j| {
            let level_mean = measures.rows().iter().map(|row| row[j]).sum::<f64>() / nf;
            nf * (level_mean - grand_mean).powi(2)
        })
        .sum::<f64>();
    let ss_subjects = measures
        .rows()
        .iter()
        .map(|row| {
            let subject_mean = row.iter().sum::<f64>() / kf;
            kf * (subject_mean - grand_mean).powi(2)
        })
        .sum::<f64>();
    let ss_error = (ss_total - ss_effect - ss_subjects).max(0.0);

    let df1 = kf - 1.0;
    let df2 = (kf - 1.0) * (nf - 1.0);
    // Residuals below rounding noise of the total sum of squares count as zero.
    if ss_error <= RELATIVE_TOLERANCE * ss_total {
        return Err(StatsError::ZeroVariance);
    }
    let f = (ss_effect / df1) / (ss_error / df2);
    let dist = FisherSnedecor::new(df1, df2).map_err(StatsError::distribution)?;
    let p_value = dist.sf(f);
    let generalized_eta_squared = (ss_total > 0.0).then(|| ss_effect / ss_total);

    Ok(RmAnova {
        subjects: n,
        ss_effect,
        ss_subjects,
        ss_error,
        df1,
        df2,
        f,
        p_value,
        generalized_eta_squared,
    })
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
    fn test_reference_table() {
        let table = rm_anova(&reference_measures()).unwrap();
        assert_eq!(table.subjects, 4);
        assert_close(table.ss_effect, 38.0 / 3.0, 1e-9);
        assert_close(table.ss_subjects, 19.0 / 3.0, 1e-9);
        assert_close(table.ss_error, 8.0 / 3.0, 1e-9);
        assert_eq!(table.df1, 2.0);
        assert_eq!(table.df2, 6.0);
        assert_close(table.f, 14.25, 1e-9);
        // F(2, 6) survival: (1 + 2F/6)^-3
        assert_close(table.p_value, 5.75_f64.powi(-3), 1e-9);
        assert_close(table.generalized_eta_squared.unwrap(), 38.0 / 65.0, 1e-9);
        assert_close(table.partial_eta_squared(), 38.0 / 46.0, 1e-9);
    }

    #[test]
    fn test_incomplete_subjects_are_dropped() {
        let mut observations = vec![
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
        ];
        observations.push(("s5", "T0", 100.0));
        let table = rm_anova(&RepeatedMeasures::from_long(observations)).unwrap();
        assert_eq!(table.subjects, 4);
        assert_close(table.f, 14.25, 1e-9);
    }

    #[test]
    fn test_single_condition() {
        let measures = RepeatedMeasures::from_long([("a", 0, 1.0), ("b", 0, 2.0)]);
        assert_eq!(
            rm_anova(&measures),
            Err(StatsError::InsufficientConditions {
                required: 2,
                actual: 1
            })
        );
    }

    #[test]
    fn test_zero_residual_variance() {
        // Every subject changes by exactly the same amount.
        let measures = RepeatedMeasures::from_long([
            ("a", 0, 1.0),
            ("a", 1, 2.0),
            ("b", 0, 5.0),
            ("b", 1, 6.0),
            ("c", 0, 3.0),
            ("c", 1, 4.0),
        ]);
        assert_eq!(rm_anova(&measures), Err(StatsError::ZeroVariance));
    }
}
