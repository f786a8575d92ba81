use crate::{descriptive::DescriptiveStats, quantile::Percentiles};

/// Summary table row combining descriptive statistics and quartiles.
///
/// Mirrors the classic "describe" layout: count, mean, std, min, 25%, 50%,
/// 75%, max.
///
/// # Examples
///
/// ```
/// use sternlab_stats::describe::Describe;
///
/// let summary = Describe::new([1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
/// assert_eq!(summary.stats.count, 5);
/// assert_eq!(summary.q1(), 2.0);
/// assert_eq!(summary.q3(), 4.0);
/// ```
#[derive(Debug, Clone)]
pub struct Describe {
    /// Basic descriptive statistics for the dataset.
    pub stats: DescriptiveStats,
    /// The quartiles (25th, 50th and 75th percentiles).
    pub quartiles: Percentiles,
}

impl Describe {
    const QUARTILES: [f64; 3] = [25.0, 50.0, 75.0];

    /// Row labels in output order.
    pub const LABELS: [&'static str; 8] = ["count", "mean", "std", "min", "25%", "50%", "75%", "max"];

    /// Computes the summary from unsorted values, or `None` for an empty dataset.
    #[must_use]
    pub fn new<I>(values: I) -> Option<Self>
    where
        I: IntoIterator<Item = f64>,
    {
        let mut sorted = values.into_iter().collect::<Vec<_>>();
        sorted.sort_by(f64::total_cmp);
        Self::from_sorted(&sorted)
    }

    /// Computes the summary from pre-sorted values.
    ///
    /// # Panics
    ///
    /// Panics in debug mode if `sorted_values` is not sorted in ascending order.
    #[must_use]
    pub fn from_sorted(sorted_values: &[f64]) -> Option<Self> {
        debug_assert!(
            sorted_values.is_sorted_by(|a, b| a <= b),
            "values must be sorted in ascending order"
        );

        let stats = DescriptiveStats::from_sorted(sorted_values)?;
        let quartiles = Percentiles::from_sorted(sorted_values, &Self::QUARTILES);
        Some(Self { stats, quartiles })
    }

    #[must_use]
    pub fn q1(&self) -> f64 {
        self.quartiles.get(25.0).unwrap_or(f64::NAN)
    }

    #[must_use]
    pub fn q3(&self) -> f64 {
        self.quartiles.get(75.0).unwrap_or(f64::NAN)
    }

    /// Values matching [`Describe::LABELS`].
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn values(&self) -> [f64; 8] {
        [
            self.stats.count as f64,
            self.stats.mean,
            self.stats.std_dev,
            self.stats.min,
            self.q1(),
            self.stats.median,
            self.q3(),
            self.stats.max,
        ]
    }
}
