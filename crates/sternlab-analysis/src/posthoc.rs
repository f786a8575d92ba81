//! Post-hoc pairwise comparison of timepoints.
//!
//! Two strategies implement [`PairwiseEstimator`]:
//!
//! - [`LibraryEstimator`] runs the library's pairwise paired t-tests with
//!   Bonferroni adjustment on the subjects observed at every timepoint, and
//!   reports Hedges' g.
//! - [`ManualEstimator`] tests each pair of timepoints on the subjects the
//!   two have in common, applies the Bonferroni correction itself, and
//!   reports Cohen's d for paired samples.
//!
//! [`compare`] runs the library estimator first and falls back to the manual
//! one when the library fails or its table does not pass
//! [`is_valid_table`].
//!
//! Whatever the strategy, the mean difference and its confidence interval
//! are computed on the subjects common to both timepoints of a pair, and
//! are reported only when enough such subjects exist.

use serde::{Deserialize, Serialize};
use sternlab_stats::{
    StatsError,
    pairwise::{PAdjust, pairwise_paired_t_tests},
    ttest::PairedDifferences,
};

use crate::{
    anova::Significance, config::AnalysisConfig, outcome::Outcome, reshape::LongData,
    timepoint::Timepoint,
};

/// Strategy that produced a comparison table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, derive_more::Display)]
#[serde(rename_all = "snake_case")]
pub enum EstimatorKind {
    #[display("library")]
    Library,
    #[display("manual")]
    Manual,
}

/// Test results of one pair, as produced by an estimator.
#[derive(Debug, Clone, PartialEq)]
pub struct PairwiseRow {
    pub a: Timepoint,
    pub b: Timepoint,
    pub t: f64,
    pub dof: f64,
    pub p_unc: f64,
    pub p_corr: Option<f64>,
    pub effect_size: f64,
}

/// A strategy for testing every pair of timepoints.
pub trait PairwiseEstimator {
    fn kind(&self) -> EstimatorKind;

    /// Runs the tests; rows are ordered by pair.
    fn estimate(
        &self,
        data: &LongData,
        config: &AnalysisConfig,
    ) -> Result<Vec<PairwiseRow>, StatsError>;
}

/// Pairwise paired t-tests from the statistics library.
#[derive(Debug, Clone, Copy, Default)]
pub struct LibraryEstimator;

impl PairwiseEstimator for LibraryEstimator {
    fn kind(&self) -> EstimatorKind {
        EstimatorKind::Library
    }

    fn estimate(
        &self,
        data: &LongData,
        _config: &AnalysisConfig,
    ) -> Result<Vec<PairwiseRow>, StatsError> {
        let measures = data.repeated_measures();
        let rows = pairwise_paired_t_tests(&measures, PAdjust::Bonferroni)?;
        Ok(rows
            .into_iter()
            .map(|row| PairwiseRow {
                a: row.a,
                b: row.b,
                t: row.t,
                dof: row.dof,
                p_unc: row.p_unc,
                p_corr: row.p_corr,
                effect_size: row
                    .hedges
                    .filter(|g| g.is_finite())
                    .or_else(|| Some(row.t / (row.dof + 1.0).sqrt()))
                    .filter(|es| es.is_finite())
                    .unwrap_or(0.0),
            })
            .collect())
    }
}

/// Pair-by-pair paired t-tests on common subjects.
#[derive(Debug, Clone, Copy, Default)]
pub struct ManualEstimator;

impl PairwiseEstimator for ManualEstimator {
    fn kind(&self) -> EstimatorKind {
        EstimatorKind::Manual
    }

    fn estimate(
        &self,
        data: &LongData,
        config: &AnalysisConfig,
    ) -> Result<Vec<PairwiseRow>, StatsError> {
        let pairs = timepoint_pairs(data);
        let comparisons = pairs.len();
        let mut rows = Vec::with_capacity(comparisons);
        for (a, b) in pairs {
            let (xa, xb) = data.paired(a, b);
            if xa.len() < config.min_common_subjects.max(2) {
                tracing::debug!(%a, %b, common = xa.len(), "too few common subjects, pair skipped");
                continue;
            }
            let diffs = PairedDifferences::new(&xa, &xb)?;
            let test = diffs.t_test()?;
            rows.push(PairwiseRow {
                a,
                b,
                t: test.t,
                dof: test.dof,
                p_unc: test.p_value,
                p_corr: Some(PAdjust::Bonferroni.adjust(test.p_value, comparisons)),
                effect_size: diffs.cohens_dz(),
            });
        }
        Ok(rows)
    }
}

/// Whether a table has the shape the report needs: at least one row, and a
/// corrected p-value column on every row.
///
/// Undefined values (a pair with no spread of differences) are kept; they
/// are reported as missing.
#[must_use]
pub fn is_valid_table(rows: &[PairwiseRow]) -> bool {
    !rows.is_empty() && rows.iter().all(|row| row.p_corr.is_some())
}

/// One reported comparison between two timepoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostHocRecord {
    pub a: Timepoint,
    pub b: Timepoint,
    /// `"<a> vs <b>"`.
    pub pair_label: String,
    /// Mean of `a - b` over common subjects, `None` with too few of them.
    pub mean_difference: Option<f64>,
    pub ci_lower: Option<f64>,
    pub ci_upper: Option<f64>,
    /// Subjects observed at both timepoints.
    pub common_subjects: usize,
    /// `None` when the statistic is not finite.
    pub test_statistic: Option<f64>,
    pub dof: f64,
    pub raw_p: Option<f64>,
    pub corrected_p: Option<f64>,
    pub significance: Significance,
    pub effect_size: f64,
}

/// Comparisons of all pairs, with the strategy that produced them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostHocTable {
    pub estimator: EstimatorKind,
    pub comparisons: Vec<PostHocRecord>,
}

/// Compares every pair of timepoints, library first, manual on failure.
#[must_use]
pub fn compare(data: &LongData, config: &AnalysisConfig) -> Outcome<PostHocTable> {
    compare_with(data, config, &LibraryEstimator, &ManualEstimator)
}

/// Compares every pair of timepoints with explicit strategies.
///
/// `primary` is used when it succeeds with a table that passes
/// [`is_valid_table`]; otherwise `fallback` is used as is.
#[must_use]
pub fn compare_with(
    data: &LongData,
    config: &AnalysisConfig,
    primary: &dyn PairwiseEstimator,
    fallback: &dyn PairwiseEstimator,
) -> Outcome<PostHocTable> {
    if data.is_empty() {
        return Outcome::failed("no valid observations");
    }
    let present = data.timepoints().len();
    if present < 2 {
        return Outcome::failed(format!(
            "only {present} timepoint(s) present, need at least 2"
        ));
    }

    let (estimator, rows) = match primary.estimate(data, config) {
        Ok(rows) if is_valid_table(&rows) => (primary.kind(), rows),
        primary_result => {
            match primary_result {
                Ok(_) => tracing::warn!(
                    estimator = %primary.kind(),
                    "pairwise table failed validation, using fallback"
                ),
                Err(err) => tracing::warn!(
                    estimator = %primary.kind(),
                    %err,
                    "pairwise tests failed, using fallback"
                ),
            }
            match fallback.estimate(data, config) {
                Ok(rows) => (fallback.kind(), rows),
                Err(err) => return Outcome::failed(err.to_string()),
            }
        }
    };
    if rows.is_empty() {
        return Outcome::failed("no pairwise comparison could be computed");
    }

    let comparisons = rows
        .into_iter()
        .map(|row| record(data, config, row))
        .collect();
    Outcome::Computed(PostHocTable {
        estimator,
        comparisons,
    })
}

fn record(data: &LongData, config: &AnalysisConfig, row: PairwiseRow) -> PostHocRecord {
    let (xa, xb) = data.paired(row.a, row.b);
    let common_subjects = xa.len();
    let interval = if common_subjects >= config.min_common_subjects.max(2) {
        mean_difference_interval(&xa, &xb, config.confidence_level)
    } else {
        None
    };
    let finite = |x: f64| x.is_finite().then_some(x);
    let significance = match row.p_corr {
        Some(p) if p.is_finite() => Significance::from_p_value(p, config.alpha),
        _ => Significance::NotSignificant,
    };
    PostHocRecord {
        a: row.a,
        b: row.b,
        pair_label: format!("{} vs {}", row.a, row.b),
        mean_difference: interval.map(|(mean, _, _)| mean),
        ci_lower: interval.map(|(_, lower, _)| lower),
        ci_upper: interval.map(|(_, _, upper)| upper),
        common_subjects,
        test_statistic: finite(row.t),
        dof: row.dof,
        raw_p: finite(row.p_unc),
        corrected_p: row.p_corr.and_then(finite),
        significance,
        effect_size: row.effect_size,
    }
}

/// `(mean, lower, upper)` of the paired difference `a - b`.
fn mean_difference_interval(a: &[f64], b: &[f64], level: f64) -> Option<(f64, f64, f64)> {
    let diffs = PairedDifferences::new(a, b).ok()?;
    let (lower, upper) = diffs.confidence_interval(level).ok()?;
    Some((diffs.mean, lower, upper))
}

/// Unordered pairs of the timepoints present, in measurement order.
fn timepoint_pairs(data: &LongData) -> Vec<(Timepoint, Timepoint)> {
    let present = data.timepoints().into_iter().collect::<Vec<_>>();
    present
        .iter()
        .enumerate()
        .flat_map(|(i, a)| present[i + 1..].iter().map(move |b| (*a, *b)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reshape::Observation;

    fn long(rows: &[(&str, [Option<f64>; 3])]) -> LongData {
        LongData::new(
            rows.iter()
                .flat_map(|(subject, values)| {
                    Timepoint::ALL
                        .into_iter()
                        .zip(values)
                        .filter_map(|(timepoint, value)| {
                            Some(Observation {
                                subject: (*subject).to_owned(),
                                timepoint,
                                value: (*value)?,
                            })
                        })
                })
                .collect(),
        )
    }

    fn reference() -> LongData {
        long(&[
            ("s1", [Some(1.0), Some(2.0), Some(3.0)]),
            ("s2", [Some(2.0), Some(3.0), Some(5.0)]),
            ("s3", [Some(3.0), Some(3.0), Some(4.0)]),
            ("s4", [Some(2.0), Some(4.0), Some(6.0)]),
        ])
    }

    /// Returns a fixed table regardless of the data.
    struct FixedEstimator(Result<Vec<PairwiseRow>, StatsError>);

    impl PairwiseEstimator for FixedEstimator {
        fn kind(&self) -> EstimatorKind {
            EstimatorKind::Library
        }

        fn estimate(
            &self,
            _data: &LongData,
            _config: &AnalysisConfig,
        ) -> Result<Vec<PairwiseRow>, StatsError> {
            self.0.clone()
        }
    }

    #[test]
    fn test_library_path() {
        let outcome = compare(&reference(), &AnalysisConfig::default());
        let table = outcome.computed().unwrap();
        assert_eq!(table.estimator, EstimatorKind::Library);
        let labels = table
            .comparisons
            .iter()
            .map(|c| c.pair_label.as_str())
            .collect::<Vec<_>>();
        assert_eq!(labels, vec!["T0 vs T1", "T0 vs T2", "T1 vs T2"]);

        // T0 - T2: differences -2, -3, -1, -4 -> mean -2.5
        let t0_t2 = &table.comparisons[1];
        assert!((t0_t2.mean_difference.unwrap() + 2.5).abs() < 1e-12);
        assert!(t0_t2.ci_lower.unwrap() < -2.5 && t0_t2.ci_upper.unwrap() > -2.5);
        assert_eq!(t0_t2.common_subjects, 4);
        let raw = t0_t2.raw_p.unwrap();
        assert!((t0_t2.corrected_p.unwrap() - (raw * 3.0).min(1.0)).abs() < 1e-12);
    }

    #[test]
    fn test_invalid_primary_selects_fallback() {
        let invalid = FixedEstimator(Ok(vec![PairwiseRow {
            a: Timepoint::T0,
            b: Timepoint::T1,
            t: f64::NAN,
            dof: 3.0,
            p_unc: f64::NAN,
            p_corr: None,
            effect_size: 0.0,
        }]));
        let outcome = compare_with(
            &reference(),
            &AnalysisConfig::default(),
            &invalid,
            &ManualEstimator,
        );
        let table = outcome.computed().unwrap();
        assert_eq!(table.estimator, EstimatorKind::Manual);
        assert_eq!(table.comparisons.len(), 3);
    }

    #[test]
    fn test_failed_primary_selects_fallback() {
        let failing = FixedEstimator(Err(StatsError::SingularMatrix));
        let outcome = compare_with(
            &reference(),
            &AnalysisConfig::default(),
            &failing,
            &ManualEstimator,
        );
        assert_eq!(outcome.computed().unwrap().estimator, EstimatorKind::Manual);
    }

    #[test]
    fn test_manual_bonferroni() {
        let rows = ManualEstimator
            .estimate(&reference(), &AnalysisConfig::default())
            .unwrap();
        assert_eq!(rows.len(), 3);
        for row in &rows {
            assert!((row.p_corr.unwrap() - (row.p_unc * 3.0).min(1.0)).abs() < 1e-12);
        }
        assert!((PAdjust::Bonferroni.adjust(0.02, 3) - 0.06).abs() < 1e-12);
    }

    #[test]
    fn test_manual_uses_common_subjects_per_pair() {
        // s4 lacks T2: T0/T1 use 4 subjects, pairs with T2 use 3
        let data = long(&[
            ("s1", [Some(1.0), Some(2.0), Some(3.0)]),
            ("s2", [Some(2.0), Some(3.0), Some(5.0)]),
            ("s3", [Some(3.0), Some(3.0), Some(4.0)]),
            ("s4", [Some(2.0), Some(4.0), None]),
        ]);
        let rows = ManualEstimator
            .estimate(&data, &AnalysisConfig::default())
            .unwrap();
        assert_eq!(rows[0].dof, 3.0);
        assert_eq!(rows[1].dof, 2.0);
        assert_eq!(rows[2].dof, 2.0);
    }

    #[test]
    fn test_two_common_subjects_have_no_interval() {
        // T0 and T1 share only s1 and s2
        let data = long(&[
            ("s1", [Some(1.0), Some(2.0), Some(3.0)]),
            ("s2", [Some(2.0), Some(4.0), Some(5.0)]),
            ("s3", [Some(3.0), None, Some(4.0)]),
            ("s4", [None, Some(4.0), Some(6.0)]),
        ]);
        let row = PairwiseRow {
            a: Timepoint::T0,
            b: Timepoint::T1,
            t: 3.0,
            dof: 1.0,
            p_unc: 0.2,
            p_corr: Some(0.6),
            effect_size: 1.0,
        };
        let record = record(&data, &AnalysisConfig::default(), row);
        assert_eq!(record.common_subjects, 2);
        assert_eq!(record.mean_difference, None);
        assert_eq!(record.ci_lower, None);
        assert_eq!(record.ci_upper, None);
        assert_eq!(record.significance, Significance::NotSignificant);
    }

    #[test]
    fn test_single_timepoint() {
        let data = long(&[("s1", [Some(1.0), None, None]), ("s2", [Some(2.0), None, None])]);
        let outcome = compare(&data, &AnalysisConfig::default());
        assert!(matches!(outcome, Outcome::Failed { .. }));
    }

    #[test]
    fn test_no_comparison_possible() {
        // every pair shares fewer than three subjects
        let data = long(&[
            ("s1", [Some(1.0), Some(2.0), None]),
            ("s2", [Some(2.0), None, Some(5.0)]),
            ("s3", [None, Some(3.0), Some(4.0)]),
        ]);
        let outcome = compare(&data, &AnalysisConfig::default());
        assert_eq!(
            outcome.reason(),
            Some("no pairwise comparison could be computed")
        );
    }

    #[test]
    fn test_validation_predicate() {
        let row = PairwiseRow {
            a: Timepoint::T0,
            b: Timepoint::T1,
            t: 1.0,
            dof: 4.0,
            p_unc: 0.3,
            p_corr: Some(0.9),
            effect_size: 0.2,
        };
        assert!(is_valid_table(std::slice::from_ref(&row)));
        assert!(!is_valid_table(&[]));
        assert!(!is_valid_table(&[PairwiseRow {
            p_corr: None,
            ..row.clone()
        }]));
        assert!(is_valid_table(&[PairwiseRow {
            t: f64::NAN,
            p_unc: f64::NAN,
            p_corr: Some(f64::NAN),
            ..row
        }]));
    }

    #[test]
    fn test_undefined_pair_stays_on_library_path() {
        // T0 == T1 for every subject, as with ceiling accuracy
        let data = long(&[
            ("s1", [Some(1.0), Some(1.0), Some(0.8)]),
            ("s2", [Some(0.9), Some(0.9), Some(0.6)]),
            ("s3", [Some(0.8), Some(0.8), Some(0.7)]),
            ("s4", [Some(1.0), Some(1.0), Some(0.5)]),
        ]);
        let outcome = compare(&data, &AnalysisConfig::default());
        let table = outcome.computed().unwrap();
        assert_eq!(table.estimator, EstimatorKind::Library);
        assert_eq!(table.comparisons.len(), 3);

        let t0_t1 = &table.comparisons[0];
        assert_eq!(t0_t1.test_statistic, None);
        assert_eq!(t0_t1.raw_p, None);
        assert_eq!(t0_t1.corrected_p, None);
        assert_eq!(t0_t1.significance, Significance::NotSignificant);
        assert!(t0_t1.effect_size.is_finite());

        let t0 = [1.0, 0.9, 0.8, 1.0];
        let t2 = [0.8, 0.6, 0.7, 0.5];
        let t0_t2 = &table.comparisons[1];
        let g = sternlab_stats::pairwise::hedges_g(&t0, &t2).unwrap();
        assert!((t0_t2.effect_size - g).abs() < 1e-12);
        assert!(t0_t2.corrected_p.is_some());
    }
}
