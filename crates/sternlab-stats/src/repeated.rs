//! Balanced subject-by-condition data for within-subject designs.

use std::collections::{BTreeMap, BTreeSet};

/// Complete-case matrix of repeated measurements.
///
/// Rows are subjects, columns are conditions (levels of the within-subject
/// factor) in ascending order. Only subjects observed at every condition are
/// kept (listwise deletion); duplicate observations of the same
/// subject/condition cell are averaged.
#[derive(Debug, Clone, PartialEq)]
pub struct RepeatedMeasures<L> {
    levels: Vec<L>,
    rows: Vec<Vec<f64>>,
    dropped_subjects: usize,
}

impl<L> RepeatedMeasures<L>
where
    L: Ord + Clone,
{
    /// Builds the matrix from long-format `(subject, condition, value)` triples.
    ///
    /// # Examples
    ///
    /// ```
    /// use sternlab_stats::repeated::RepeatedMeasures;
    ///
    /// let measures = RepeatedMeasures::from_long([
    ///     ("a", 0, 1.0), ("a", 1, 2.0),
    ///     ("b", 0, 3.0), ("b", 1, 5.0),
    ///     ("c", 0, 4.0),
    /// ]);
    /// assert_eq!(measures.levels(), &[0, 1]);
    /// assert_eq!(measures.num_subjects(), 2);
    /// assert_eq!(measures.dropped_subjects(), 1);
    /// assert_eq!(measures.column(1), vec![2.0, 5.0]);
    /// ```
    #[expect(clippy::cast_precision_loss)]
    pub fn from_long<S, I>(observations: I) -> Self
    where
        S: Ord,
        I: IntoIterator<Item = (S, L, f64)>,
    {
        let mut cells = BTreeMap::<S, BTreeMap<L, (f64, usize)>>::new();
        let mut levels = BTreeSet::new();
        for (subject, level, value) in observations {
            levels.insert(level.clone());
            let cell = cells.entry(subject).or_default().entry(level).or_default();
            cell.0 += value;
            cell.1 += 1;
        }
        let levels = levels.into_iter().collect::<Vec<_>>();

        let total_subjects = cells.len();
        let rows = cells
            .into_values()
            .filter(|row| row.len() == levels.len())
            .map(|row| {
                row.into_values()
                    .map(|(sum, count)| sum / count as f64)
                    .collect::<Vec<_>>()
            })
            .collect::<Vec<_>>();
        let dropped_subjects = total_subjects - rows.len();

        Self {
            levels,
            rows,
            dropped_subjects,
        }
    }
}

impl<L> RepeatedMeasures<L> {
    /// Condition labels, in column order.
    #[must_use]
    pub fn levels(&self) -> &[L] {
        &self.levels
    }

    /// Number of conditions.
    #[must_use]
    pub fn num_levels(&self) -> usize {
        self.levels.len()
    }

    /// Number of complete subjects.
    #[must_use]
    pub fn num_subjects(&self) -> usize {
        self.rows.len()
    }

    /// Number of subjects removed because they missed at least one condition.
    #[must_use]
    pub fn dropped_subjects(&self) -> usize {
        self.dropped_subjects
    }

    /// Subject rows; each row has one value per condition.
    #[must_use]
    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    /// Values of one condition across subjects.
    #[must_use]
    pub fn column(&self, level_index: usize) -> Vec<f64> {
        self.rows.iter().map(|row| row[level_index]).collect()
    }

    /// Iterator over all values.
    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.rows.iter().flatten().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty() {
        let measures = RepeatedMeasures::<u8>::from_long(Vec::<(u8, u8, f64)>::new());
        assert_eq!(measures.num_levels(), 0);
        assert_eq!(measures.num_subjects(), 0);
    }

    #[test]
    fn test_duplicates_are_averaged() {
        let measures = RepeatedMeasures::from_long([
            (1, "x", 1.0),
            (1, "x", 3.0),
            (1, "y", 5.0),
        ]);
        assert_eq!(measures.rows(), &[vec![2.0, 5.0]]);
    }

    #[test]
    fn test_levels_are_sorted() {
        let measures = RepeatedMeasures::from_long([
            (1, "T2", 3.0),
            (1, "T0", 1.0),
            (1, "T1", 2.0),
        ]);
        assert_eq!(measures.levels(), &["T0", "T1", "T2"]);
        assert_eq!(measures.values().collect::<Vec<_>>(), vec![1.0, 2.0, 3.0]);
    }
}
