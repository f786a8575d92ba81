//! Per-timepoint normality test and outlier screening.
//!
//! Each timepoint is examined on its own:
//!
//! - **Normality**: Shapiro-Wilk test, "normal" when `p > alpha`. Fewer than
//!   `min_normality_n` values, or values without any spread, yield an
//!   "insufficient data" verdict without a statistic.
//! - **IQR outliers**: values strictly outside
//!   `[Q1 - k * IQR, Q3 + k * IQR]`.
//! - **Z-score outliers**: values with `|z| > threshold`, where z uses the
//!   population standard deviation. Needs at least two values.
//!
//! Nothing in this module fails; short or degenerate data is reported in the
//! records themselves.

use serde::{Deserialize, Serialize};
use sternlab_stats::{
    StatsError,
    descriptive::{self, DescriptiveStats},
    quantile::IqrFences,
    shapiro::ShapiroWilk,
};

use crate::{config::AnalysisConfig, reshape::LongData, timepoint::Timepoint};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, derive_more::Display)]
#[serde(rename_all = "snake_case")]
pub enum NormalityVerdict {
    #[display("normal")]
    Normal,
    #[display("not normal")]
    NotNormal,
    #[display("insufficient data")]
    InsufficientData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalityRecord {
    pub timepoint: Timepoint,
    pub n: usize,
    /// Shapiro-Wilk W, `None` when the test could not run.
    pub statistic: Option<f64>,
    pub p_value: Option<f64>,
    pub verdict: NormalityVerdict,
    /// Why the test did not run.
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlierRecord {
    pub timepoint: Timepoint,
    pub n: usize,
    pub count_iqr: usize,
    pub count_z: usize,
    pub pct_iqr: f64,
    pub pct_z: f64,
    pub mean: f64,
    /// Sample standard deviation, `None` for a single value.
    pub std: Option<f64>,
    pub min: f64,
    pub max: f64,
}

/// Runs the normality test on one timepoint's values.
#[must_use]
pub fn normality(timepoint: Timepoint, values: &[f64], config: &AnalysisConfig) -> NormalityRecord {
    let n = values.len();
    let insufficient = |reason: String| NormalityRecord {
        timepoint,
        n,
        statistic: None,
        p_value: None,
        verdict: NormalityVerdict::InsufficientData,
        reason: Some(reason),
    };
    if n < config.min_normality_n.max(3) {
        return insufficient(format!(
            "need at least {} values, got {n}",
            config.min_normality_n.max(3)
        ));
    }
    match ShapiroWilk::test(values) {
        Ok(result) => {
            if result.is_extrapolated() {
                tracing::warn!(%timepoint, n, "Shapiro-Wilk p-value may be inaccurate for n > 5000");
            }
            let verdict = if result.p_value > config.alpha {
                NormalityVerdict::Normal
            } else {
                NormalityVerdict::NotNormal
            };
            NormalityRecord {
                timepoint,
                n,
                statistic: Some(result.w),
                p_value: Some(result.p_value),
                verdict,
                reason: None,
            }
        }
        Err(StatsError::ZeroVariance) => insufficient("all values are identical".to_owned()),
        Err(err) => insufficient(err.to_string()),
    }
}

/// Counts outliers and summarizes one timepoint's values, or `None` when
/// there are no values.
#[expect(clippy::cast_precision_loss)]
#[must_use]
pub fn outliers(
    timepoint: Timepoint,
    values: &[f64],
    config: &AnalysisConfig,
) -> Option<OutlierRecord> {
    let stats = DescriptiveStats::new(values.iter().copied())?;
    let n = values.len();
    let count_iqr = IqrFences::new(values, config.iqr_multiplier)
        .map_or(0, |fences| fences.count_outside(values));
    let count_z = if n >= 2 {
        descriptive::z_scores(values)
            .iter()
            .filter(|z| z.abs() > config.z_threshold)
            .count()
    } else {
        0
    };
    let pct = |count: usize| 100.0 * count as f64 / n as f64;
    Some(OutlierRecord {
        timepoint,
        n,
        count_iqr,
        count_z,
        pct_iqr: pct(count_iqr),
        pct_z: pct(count_z),
        mean: stats.mean,
        std: (n >= 2).then_some(stats.std_dev),
        min: stats.min,
        max: stats.max,
    })
}

/// Normality and outlier records for every timepoint of a variable.
///
/// Normality records are produced for all three timepoints; a timepoint
/// without values has no outlier record.
#[must_use]
pub fn screen(data: &LongData, config: &AnalysisConfig) -> (Vec<NormalityRecord>, Vec<OutlierRecord>) {
    let mut normality_records = Vec::with_capacity(Timepoint::ALL.len());
    let mut outlier_records = Vec::with_capacity(Timepoint::ALL.len());
    for timepoint in Timepoint::ALL {
        let values = data.values(timepoint);
        normality_records.push(normality(timepoint, &values, config));
        outlier_records.extend(outliers(timepoint, &values, config));
    }
    (normality_records, outlier_records)
}
