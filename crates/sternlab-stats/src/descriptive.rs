use crate::quantile;

/// Descriptive statistics summarizing a dataset.
///
/// This structure contains common measures of central tendency, dispersion,
/// and spread for a dataset of `f64` values. Variance and standard deviation
/// use the sample (n - 1) denominator and are `NaN` for a single value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DescriptiveStats {
    /// The number of values in the dataset.
    pub count: usize,
    /// The minimum value in the dataset.
    pub min: f64,
    /// The maximum value in the dataset.
    pub max: f64,
    /// The arithmetic mean (average) of the dataset.
    pub mean: f64,
    /// The median value of the dataset (linear interpolation for even counts).
    pub median: f64,
    /// The sample variance of the dataset.
    pub variance: f64,
    /// The sample standard deviation of the dataset.
    pub std_dev: f64,
}

impl DescriptiveStats {
    /// Computes descriptive statistics from unsorted values.
    ///
    /// This method will sort the values internally before computing statistics.
    ///
    /// # Returns
    ///
    /// * `Some(DescriptiveStats)` - if the dataset contains at least one value
    /// * `None` - if the dataset is empty
    ///
    /// # Examples
    ///
    /// ```
    /// # use sternlab_stats::descriptive::DescriptiveStats;
    /// let values = [5.0, 2.0, 4.0, 1.0, 3.0];
    /// let stats = DescriptiveStats::new(values).unwrap();
    /// assert_eq!(stats.min, 1.0);
    /// assert_eq!(stats.max, 5.0);
    /// assert_eq!(stats.mean, 3.0);
    /// assert_eq!(stats.median, 3.0);
    /// ```
    #[must_use]
    pub fn new<I>(values: I) -> Option<Self>
    where
        I: IntoIterator<Item = f64>,
    {
        let mut values = values.into_iter().collect::<Vec<_>>();
        values.sort_by(f64::total_cmp);
        Self::from_sorted(&values)
    }

    /// Computes descriptive statistics from pre-sorted values.
    ///
    /// This is an optimized version that skips the sorting step.
    ///
    /// # Panics
    ///
    /// Panics if `sorted_values` is not sorted in ascending order.
    ///
    /// # Examples
    ///
    /// ```
    /// # use sternlab_stats::descriptive::DescriptiveStats;
    /// let stats = DescriptiveStats::from_sorted(&[7.0]).unwrap();
    /// assert_eq!(stats.mean, 7.0);
    /// assert!(stats.std_dev.is_nan());
    /// ```
    #[must_use]
    pub fn from_sorted(sorted_values: &[f64]) -> Option<Self> {
        assert!(
            sorted_values.is_sorted_by(|a, b| a <= b),
            "values must be sorted in ascending order"
        );

        let min = *sorted_values.first()?;
        let max = *sorted_values.last()?;
        let mean = mean(sorted_values)?;
        let median = quantile::compute_percentile(sorted_values, 50.0);
        let variance = sample_variance(sorted_values).unwrap_or(f64::NAN);

        Some(Self {
            count: sorted_values.len(),
            min,
            max,
            mean,
            median,
            variance,
            std_dev: variance.sqrt(),
        })
    }
}

/// Arithmetic mean, or `None` for an empty slice.
#[expect(clippy::cast_precision_loss)]
#[must_use]
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample variance (n - 1 denominator), or `None` with fewer than two values.
///
/// # Examples
///
/// ```
/// # use sternlab_stats::descriptive::sample_variance;
/// assert_eq!(sample_variance(&[2.0, 4.0, 6.0]), Some(4.0));
/// assert_eq!(sample_variance(&[2.0]), None);
/// ```
#[expect(clippy::cast_precision_loss)]
#[must_use]
pub fn sample_variance(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let mean = mean(values)?;
    let ss = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>();
    Some(ss / (values.len() - 1) as f64)
}

/// Sample standard deviation (n - 1 denominator).
#[must_use]
pub fn sample_std_dev(values: &[f64]) -> Option<f64> {
    sample_variance(values).map(f64::sqrt)
}

/// Population standard deviation (n denominator), or `None` for an empty slice.
#[expect(clippy::cast_precision_loss)]
#[must_use]
pub fn population_std_dev(values: &[f64]) -> Option<f64> {
    let mean = mean(values)?;
    let ss = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>();
    Some((ss / values.len() as f64).sqrt())
}

/// Standard scores `(x - mean) / sd` using the population standard deviation.
///
/// A dataset without spread yields `NaN` scores, so no value ever exceeds a
/// threshold.
///
/// # Examples
///
/// ```
/// # use sternlab_stats::descriptive::z_scores;
/// let z = z_scores(&[1.0, 3.0]);
/// assert_eq!(z, vec![-1.0, 1.0]);
/// assert!(z_scores(&[4.0, 4.0]).iter().all(|z| z.is_nan()));
/// ```
#[must_use]
pub fn z_scores(values: &[f64]) -> Vec<f64> {
    let (Some(mean), Some(sd)) = (mean(values), population_std_dev(values)) else {
        return vec![];
    };
    if sd == 0.0 {
        return vec![f64::NAN; values.len()];
    }
    values.iter().map(|v| (v - mean) / sd).collect()
}
