//! Pairwise paired t-tests between the conditions of a within-subject factor.

use crate::{StatsError, descriptive, repeated::RepeatedMeasures, ttest::PairedDifferences};

/// Multiple-comparison adjustment applied to the raw p-values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PAdjust {
    /// Raw p-values are reported unchanged.
    None,
    /// `min(p * m, 1)` where `m` is the number of comparisons.
    #[default]
    Bonferroni,
}

impl PAdjust {
    /// Adjusts one raw p-value from a family of `comparisons` tests.
    ///
    /// An undefined (`NaN`) p-value stays undefined.
    ///
    /// # Examples
    ///
    /// ```
    /// use sternlab_stats::pairwise::PAdjust;
    ///
    /// assert!((PAdjust::Bonferroni.adjust(0.02, 3) - 0.06).abs() < 1e-12);
    /// assert_eq!(PAdjust::Bonferroni.adjust(0.5, 3), 1.0);
    /// assert_eq!(PAdjust::None.adjust(0.02, 3), 0.02);
    /// ```
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn adjust(self, p_value: f64, comparisons: usize) -> f64 {
        if p_value.is_nan() {
            return p_value;
        }
        match self {
            Self::None => p_value,
            Self::Bonferroni => (p_value * comparisons as f64).min(1.0),
        }
    }
}

/// One row of the pairwise comparison table.
#[derive(Debug, Clone, PartialEq)]
pub struct PairwiseRow<L> {
    /// First condition.
    pub a: L,
    /// Second condition.
    pub b: L,
    /// Paired t statistic of `a - b`.
    pub t: f64,
    /// Degrees of freedom.
    pub dof: f64,
    /// Uncorrected two-sided p-value.
    pub p_unc: f64,
    /// Adjusted p-value; `None` when no adjustment was requested.
    pub p_corr: Option<f64>,
    /// Hedges' g of `a` against `b`; `None` when it is not defined.
    pub hedges: Option<f64>,
}

/// Runs a paired t-test for every unordered pair of conditions.
///
/// Conditions are compared in column order (`levels[i]` against
/// `levels[j]` for `i < j`) on the complete subjects of `measures`.
///
/// # Errors
///
/// * [`StatsError::InsufficientConditions`] - fewer than 2 conditions
/// * [`StatsError::InsufficientData`] - fewer than 2 complete subjects
///
/// # Examples
///
/// ```
/// use sternlab_stats::{pairwise::{PAdjust, pairwise_paired_t_tests}, repeated::RepeatedMeasures};
///
/// let measures = RepeatedMeasures::from_long([
///     ("a", "T0", 1.0), ("a", "T1", 2.0), ("a", "T2", 3.0),
///     ("b", "T0", 2.0), ("b", "T1", 3.0), ("b", "T2", 5.0),
///     ("c", "T0", 3.0), ("c", "T1", 3.0), ("c", "T2", 4.0),
/// ]);
/// let rows = pairwise_paired_t_tests(&measures, PAdjust::Bonferroni).unwrap();
/// let pairs = rows.iter().map(|row| (row.a, row.b)).collect::<Vec<_>>();
/// assert_eq!(pairs, vec![("T0", "T1"), ("T0", "T2"), ("T1", "T2")]);
/// ```
pub fn pairwise_paired_t_tests<L>(
    measures: &RepeatedMeasures<L>,
    adjust: PAdjust,
) -> Result<Vec<PairwiseRow<L>>, StatsError>
where
    L: Clone,
{
    let k = measures.num_levels();
    if k < 2 {
        return Err(StatsError::InsufficientConditions {
            required: 2,
            actual: k,
        });
    }
    let columns = (0..k).map(|j| measures.column(j)).collect::<Vec<_>>();
    let comparisons = k * (k - 1) / 2;
    let mut rows = Vec::with_capacity(comparisons);
    for i in 0..k {
        for j in i + 1..k {
            let diffs = PairedDifferences::new(&columns[i], &columns[j])?;
            let test = diffs.t_test()?;
            let p_corr = match adjust {
                PAdjust::None => None,
                PAdjust::Bonferroni => Some(adjust.adjust(test.p_value, comparisons)),
            };
            rows.push(PairwiseRow {
                a: measures.levels()[i].clone(),
                b: measures.levels()[j].clone(),
                t: test.t,
                dof: test.dof,
                p_unc: test.p_value,
                p_corr,
                hedges: hedges_g(&columns[i], &columns[j]),
            });
        }
    }
    Ok(rows)
}

/// Hedges' g between two paired samples.
///
/// The standardizer is the root of the averaged sample variances, and the
/// small-sample correction `1 - 3 / (4 (n_a + n_b) - 9)` is applied to the
/// resulting d. Returns `None` for degenerate input (fewer than two values
/// per sample, or zero pooled spread).
///
/// # Examples
///
/// ```
/// use sternlab_stats::pairwise::hedges_g;
///
/// // d = -1 / sqrt((1 + 1) / 2) = -1, correction 1 - 3 / 15
/// let g = hedges_g(&[1.0, 2.0, 3.0], &[2.0, 3.0, 4.0]).unwrap();
/// assert!((g + 0.8).abs() < 1e-12);
/// ```
#[expect(clippy::cast_precision_loss)]
#[must_use]
pub fn hedges_g(a: &[f64], b: &[f64]) -> Option<f64> {
    let mean_a = descriptive::mean(a)?;
    let mean_b = descriptive::mean(b)?;
    let var_a = descriptive::sample_variance(a)?;
    let var_b = descriptive::sample_variance(b)?;
    let pooled = f64::midpoint(var_a, var_b).sqrt();
    if pooled <= 0.0 || !pooled.is_finite() {
        return None;
    }
    let d = (mean_a - mean_b) / pooled;
    let total = (a.len() + b.len()) as f64;
    Some(d * (1.0 - 3.0 / (4.0 * total - 9.0)))
}
