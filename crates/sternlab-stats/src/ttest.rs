//! Paired Student's t-test and paired-difference summaries.

use statrs::distribution::{ContinuousCDF, StudentsT};

use crate::{StatsError, descriptive};

/// Result of a t-test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TTest {
    /// The t statistic.
    pub t: f64,
    /// Degrees of freedom.
    pub dof: f64,
    /// Two-sided p-value.
    pub p_value: f64,
}

/// Summary of per-subject differences `a - b` between two paired samples.
#[derive(Debug, Clone, PartialEq)]
pub struct PairedDifferences {
    differences: Vec<f64>,
    /// Mean of the differences (equals `mean(a) - mean(b)`).
    pub mean: f64,
    /// Sample standard deviation of the differences.
    pub std_dev: f64,
}

impl PairedDifferences {
    /// Builds the difference summary.
    ///
    /// # Errors
    ///
    /// * [`StatsError::LengthMismatch`] - the samples are not paired
    /// * [`StatsError::InsufficientData`] - fewer than 2 pairs
    ///
    /// # Examples
    ///
    /// ```
    /// use sternlab_stats::ttest::PairedDifferences;
    ///
    /// let diffs = PairedDifferences::new(&[5.0, 6.0, 9.0], &[4.0, 4.0, 6.0]).unwrap();
    /// assert_eq!(diffs.mean, 2.0);
    /// assert_eq!(diffs.std_dev, 1.0);
    /// ```
    pub fn new(a: &[f64], b: &[f64]) -> Result<Self, StatsError> {
        if a.len() != b.len() {
            return Err(StatsError::LengthMismatch {
                left: a.len(),
                right: b.len(),
            });
        }
        let differences = a.iter().zip(b).map(|(x, y)| x - y).collect::<Vec<_>>();
        let insufficient = StatsError::InsufficientData {
            required: 2,
            actual: differences.len(),
        };
        let mean = descriptive::mean(&differences).ok_or_else(|| insufficient.clone())?;
        let std_dev = descriptive::sample_std_dev(&differences).ok_or(insufficient)?;
        Ok(Self {
            differences,
            mean,
            std_dev,
        })
    }

    /// Number of pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.differences.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.differences.is_empty()
    }

    /// The individual differences.
    #[must_use]
    pub fn differences(&self) -> &[f64] {
        &self.differences
    }

    /// Standard error of the mean difference.
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn std_err(&self) -> f64 {
        self.std_dev / (self.len() as f64).sqrt()
    }

    /// Degrees of freedom of the paired test (`n - 1`).
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn dof(&self) -> f64 {
        (self.len() - 1) as f64
    }

    /// Paired t-test of the hypothesis that the mean difference is zero.
    ///
    /// Zero spread of the differences gives an infinite statistic (p = 0)
    /// when the mean differs from zero, and `NaN` otherwise.
    pub fn t_test(&self) -> Result<TTest, StatsError> {
        let t = self.mean / self.std_err();
        let dof = self.dof();
        Ok(TTest {
            t,
            dof,
            p_value: two_sided_p_value(t, dof)?,
        })
    }

    /// Two-sided confidence interval for the mean difference.
    ///
    /// # Examples
    ///
    /// ```
    /// use sternlab_stats::ttest::PairedDifferences;
    ///
    /// let diffs = PairedDifferences::new(&[5.0, 6.0, 9.0], &[4.0, 4.0, 6.0]).unwrap();
    /// let (lower, upper) = diffs.confidence_interval(0.95).unwrap();
    /// assert!(lower < 2.0 && 2.0 < upper);
    /// ```
    pub fn confidence_interval(&self, level: f64) -> Result<(f64, f64), StatsError> {
        let margin = t_critical(level, self.dof())? * self.std_err();
        Ok((self.mean - margin, self.mean + margin))
    }

    /// Cohen's d for paired samples (d_z): mean difference over its standard
    /// deviation, using only finite differences. Zero when the spread is zero
    /// or fewer than two finite differences exist.
    #[must_use]
    pub fn cohens_dz(&self) -> f64 {
        let finite = self
            .differences
            .iter()
            .copied()
            .filter(|d| d.is_finite())
            .collect::<Vec<_>>();
        match (
            descriptive::mean(&finite),
            descriptive::sample_std_dev(&finite),
        ) {
            (Some(mean), Some(sd)) if sd > 0.0 => mean / sd,
            _ => 0.0,
        }
    }
}

/// Paired t-test on two samples of equal length.
///
/// # Examples
///
/// ```
/// use sternlab_stats::ttest::paired_t_test;
///
/// let result = paired_t_test(&[5.0, 6.0, 9.0], &[4.0, 4.0, 6.0]).unwrap();
/// assert!((result.t - 2.0 * 3.0_f64.sqrt()).abs() < 1e-12);
/// assert_eq!(result.dof, 2.0);
/// ```
pub fn paired_t_test(a: &[f64], b: &[f64]) -> Result<TTest, StatsError> {
    PairedDifferences::new(a, b)?.t_test()
}

/// Two-sided p-value of a t statistic.
pub fn two_sided_p_value(t: f64, dof: f64) -> Result<f64, StatsError> {
    if t.is_nan() {
        return Ok(f64::NAN);
    }
    if t.is_infinite() {
        return Ok(0.0);
    }
    let dist = StudentsT::new(0.0, 1.0, dof).map_err(StatsError::distribution)?;
    Ok((2.0 * dist.sf(t.abs())).min(1.0))
}

/// Critical value `t` such that a two-sided interval at `level` covers
/// `[-t, t]`.
///
/// # Examples
///
/// ```
/// use sternlab_stats::ttest::t_critical;
///
/// let t = t_critical(0.95, 9.0).unwrap();
/// assert!((t - 2.262_157).abs() < 1e-5);
/// ```
pub fn t_critical(level: f64, dof: f64) -> Result<f64, StatsError> {
    let dist = StudentsT::new(0.0, 1.0, dof).map_err(StatsError::distribution)?;
    Ok(dist.inverse_cdf(0.5 + level / 2.0))
}
