/// Precomputed percentile values for a dataset.
///
/// This structure stores percentile-value pairs for efficient lookup
/// of commonly used percentile points.
///
/// # Examples
///
/// ```
/// use sternlab_stats::quantile::Percentiles;
///
/// let values = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0];
/// let percentiles = Percentiles::new(&values, &[25.0, 50.0, 75.0]);
///
/// assert_eq!(percentiles.get(50.0), Some(5.5));
/// assert_eq!(percentiles.get(25.0), Some(3.25));
/// ```
#[derive(Debug, Clone)]
pub struct Percentiles {
    /// Percentile-value pairs, in the order they were requested.
    /// Each tuple contains (percentile, value) where percentile is 0.0-100.0.
    values: Vec<(f64, f64)>,
}

impl Percentiles {
    /// Computes percentiles from sorted values.
    ///
    /// # Panics
    ///
    /// Panics if `sorted_values` is not sorted in ascending order.
    #[must_use]
    pub fn from_sorted(sorted_values: &[f64], percentile_points: &[f64]) -> Self {
        assert!(
            sorted_values.is_sorted_by(|a, b| a <= b),
            "values must be sorted in ascending order"
        );

        let values = percentile_points
            .iter()
            .map(|&p| (p, compute_percentile(sorted_values, p)))
            .collect();
        Self { values }
    }

    /// Computes percentiles from unsorted values.
    ///
    /// This method will sort the values internally before computing percentiles.
    ///
    /// # Examples
    ///
    /// ```
    /// use sternlab_stats::quantile::Percentiles;
    ///
    /// let values = vec![5.0, 2.0, 8.0, 1.0, 9.0];
    /// let percentiles = Percentiles::new(&values, &[25.0, 50.0, 75.0]);
    ///
    /// assert_eq!(percentiles.get(50.0), Some(5.0));
    /// ```
    #[must_use]
    pub fn new(values: &[f64], percentile_points: &[f64]) -> Self {
        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);
        Self::from_sorted(&sorted, percentile_points)
    }

    /// Gets the value at a specific percentile.
    ///
    /// Returns `None` if the percentile was not precomputed.
    #[must_use]
    pub fn get(&self, percentile: f64) -> Option<f64> {
        self.values.iter().find_map(|(p, value)| {
            if (*p - percentile).abs() < f64::EPSILON {
                Some(*value)
            } else {
                None
            }
        })
    }

    /// Returns an iterator over all (percentile, value) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.values.iter().copied()
    }
}

/// Computes a single percentile value from sorted data.
///
/// Uses linear interpolation between the two closest order statistics: the
/// k-th percentile sits at fractional rank `(n - 1) * k / 100`. This matches
/// the default quantile definition of numpy and pandas.
///
/// Returns `f64::NAN` if the input is empty.
///
/// # Examples
///
/// ```
/// use sternlab_stats::quantile::compute_percentile;
///
/// let values = [1.0, 2.0, 3.0, 4.0, 5.0, 100.0];
/// assert_eq!(compute_percentile(&values, 25.0), 2.25);
/// assert_eq!(compute_percentile(&values, 75.0), 4.75);
/// assert_eq!(compute_percentile(&values, 100.0), 100.0);
/// ```
#[expect(
    clippy::cast_sign_loss,
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss
)]
#[must_use]
pub fn compute_percentile(sorted_values: &[f64], percentile: f64) -> f64 {
    if sorted_values.is_empty() {
        return f64::NAN;
    }
    let rank = (sorted_values.len() - 1) as f64 * percentile.clamp(0.0, 100.0) / 100.0;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let frac = rank - lower as f64;
    sorted_values[lower] + (sorted_values[upper] - sorted_values[lower]) * frac
}

/// Tukey fences: `[Q1 - k * IQR, Q3 + k * IQR]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IqrFences {
    pub q1: f64,
    pub q3: f64,
    pub lower: f64,
    pub upper: f64,
}

impl IqrFences {
    /// Computes fences from unsorted values, or `None` for an empty dataset.
    ///
    /// # Examples
    ///
    /// ```
    /// use sternlab_stats::quantile::IqrFences;
    ///
    /// let fences = IqrFences::new(&[1.0, 2.0, 3.0, 4.0, 5.0, 100.0], 1.5).unwrap();
    /// assert_eq!(fences.lower, -1.5);
    /// assert_eq!(fences.upper, 8.5);
    /// assert_eq!(fences.count_outside(&[1.0, 2.0, 3.0, 4.0, 5.0, 100.0]), 1);
    /// ```
    #[must_use]
    pub fn new(values: &[f64], multiplier: f64) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let percentiles = Percentiles::new(values, &[25.0, 75.0]);
        let q1 = percentiles.get(25.0)?;
        let q3 = percentiles.get(75.0)?;
        let iqr = q3 - q1;
        Some(Self {
            q1,
            q3,
            lower: q1 - multiplier * iqr,
            upper: q3 + multiplier * iqr,
        })
    }

    /// Number of values strictly outside the fences.
    #[must_use]
    pub fn count_outside(&self, values: &[f64]) -> usize {
        values
            .iter()
            .filter(|&&v| v < self.lower || v > self.upper)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_values() {
        assert!(compute_percentile(&[], 50.0).is_nan());
        assert!(IqrFences::new(&[], 1.5).is_none());
    }

    #[test]
    fn test_single_value() {
        assert_eq!(compute_percentile(&[42.0], 25.0), 42.0);
        let fences = IqrFences::new(&[42.0], 1.5).unwrap();
        assert_eq!(fences.lower, 42.0);
        assert_eq!(fences.count_outside(&[42.0]), 0);
    }

    #[test]
    fn test_iqr_fences() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0, 100.0];
        let fences = IqrFences::new(&values, 1.5).unwrap();
        assert!((fences.q1 - 2.25).abs() < 1e-12);
        assert!((fences.q3 - 4.75).abs() < 1e-12);
        assert!((fences.lower + 1.5).abs() < 1e-12);
        assert!((fences.upper - 8.5).abs() < 1e-12);
        assert_eq!(fences.count_outside(&values), 1);
    }

    #[test]
    fn test_unsorted_input_is_sorted() {
        let percentiles = Percentiles::new(&[100.0, 3.0, 1.0, 5.0, 2.0, 4.0], &[25.0]);
        assert_eq!(percentiles.get(25.0), Some(2.25));
        assert_eq!(percentiles.iter().count(), 1);
    }
}
