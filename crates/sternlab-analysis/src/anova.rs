//! Omnibus repeated-measures ANOVA over the timepoints of a variable.
//!
//! The within-subject factor is the timepoint. Subjects missing any
//! timepoint are dropped before the test (listwise deletion). The effect
//! size is the generalized eta-squared reported by the library; when it is
//! unavailable, partial eta-squared is derived from F and the degrees of
//! freedom.

use serde::{Deserialize, Serialize};
use sternlab_stats::{descriptive, rm_anova};

use crate::{config::AnalysisConfig, outcome::Outcome, reshape::LongData};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, derive_more::Display)]
#[serde(rename_all = "snake_case")]
pub enum Significance {
    #[display("significant")]
    Significant,
    #[display("not significant")]
    NotSignificant,
}

impl Significance {
    /// `Significant` iff `p_value < alpha`.
    #[must_use]
    pub fn from_p_value(p_value: f64, alpha: f64) -> Self {
        if p_value < alpha {
            Self::Significant
        } else {
            Self::NotSignificant
        }
    }

    #[must_use]
    pub fn is_significant(self) -> bool {
        self == Self::Significant
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, derive_more::Display,
)]
#[serde(rename_all = "snake_case")]
pub enum EffectMagnitude {
    #[display("small")]
    Small,
    #[display("medium")]
    Medium,
    #[display("large")]
    Large,
}

impl EffectMagnitude {
    /// Classifies an eta-squared value; both bounds are inclusive.
    ///
    /// # Examples
    ///
    /// ```
    /// use sternlab_analysis::{anova::EffectMagnitude, config::AnalysisConfig};
    ///
    /// let config = AnalysisConfig::default();
    /// assert_eq!(EffectMagnitude::classify(0.14, &config), EffectMagnitude::Large);
    /// assert_eq!(EffectMagnitude::classify(0.06, &config), EffectMagnitude::Medium);
    /// assert_eq!(EffectMagnitude::classify(0.02, &config), EffectMagnitude::Small);
    /// ```
    #[must_use]
    pub fn classify(eta_squared: f64, config: &AnalysisConfig) -> Self {
        if eta_squared >= config.large_effect {
            Self::Large
        } else if eta_squared >= config.medium_effect {
            Self::Medium
        } else {
            Self::Small
        }
    }
}

/// Which estimate [`AnovaRecord::partial_eta_squared`] holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, derive_more::Display)]
#[serde(rename_all = "snake_case")]
pub enum EffectSizeSource {
    #[display("generalized")]
    Generalized,
    #[display("partial")]
    Partial,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnovaRecord {
    pub f: f64,
    pub p_value: f64,
    /// Effect size used for classification, see `effect_source`.
    pub partial_eta_squared: f64,
    pub effect_source: EffectSizeSource,
    pub significance: Significance,
    pub magnitude: EffectMagnitude,
    pub df1: f64,
    pub df2: f64,
    /// Subjects observed at every timepoint.
    pub subjects: usize,
}

/// Runs the repeated-measures ANOVA for one variable.
#[must_use]
pub fn anova(data: &LongData, config: &AnalysisConfig) -> Outcome<AnovaRecord> {
    if data.is_empty() {
        return Outcome::failed("no valid observations");
    }
    let values = data.all_values().collect::<Vec<_>>();
    if descriptive::sample_variance(&values).is_none_or(|v| v <= 0.0) {
        return Outcome::failed("no variability in data");
    }

    let measures = data.repeated_measures();
    if measures.dropped_subjects() > 0 {
        tracing::debug!(
            dropped = measures.dropped_subjects(),
            "subjects with missing timepoints excluded from ANOVA"
        );
    }
    let table = match rm_anova::rm_anova(&measures) {
        Ok(table) => table,
        Err(err) => return Outcome::failed(err.to_string()),
    };
    let (effect, effect_source) = match table.generalized_eta_squared {
        Some(ng2) if ng2.is_finite() => (ng2, EffectSizeSource::Generalized),
        _ => (table.partial_eta_squared(), EffectSizeSource::Partial),
    };
    tracing::debug!(f = table.f, p = table.p_value, effect, "ANOVA computed");
    Outcome::Computed(AnovaRecord {
        f: table.f,
        p_value: table.p_value,
        partial_eta_squared: effect,
        effect_source,
        significance: Significance::from_p_value(table.p_value, config.alpha),
        magnitude: EffectMagnitude::classify(effect, config),
        df1: table.df1,
        df2: table.df2,
        subjects: table.subjects,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{reshape::Observation, timepoint::Timepoint};

    fn long(rows: &[(&str, [f64; 3])]) -> LongData {
        LongData::new(
            rows.iter()
                .flat_map(|(subject, values)| {
                    Timepoint::ALL
                        .into_iter()
                        .zip(values)
                        .map(|(timepoint, value)| Observation {
                            subject: (*subject).to_owned(),
                            timepoint,
                            value: *value,
                        })
                })
                .collect(),
        )
    }

    #[test]
    fn test_effect_classification() {
        let config = AnalysisConfig::default();
        assert_eq!(EffectMagnitude::classify(0.20, &config), EffectMagnitude::Large);
        assert_eq!(EffectMagnitude::classify(0.10, &config), EffectMagnitude::Medium);
        assert_eq!(EffectMagnitude::classify(0.02, &config), EffectMagnitude::Small);
        assert_eq!(EffectMagnitude::classify(0.14, &config), EffectMagnitude::Large);
        assert_eq!(EffectMagnitude::classify(0.06, &config), EffectMagnitude::Medium);
    }

    #[test]
    fn test_reference_data() {
        let data = long(&[
            ("s1", [1.0, 2.0, 3.0]),
            ("s2", [2.0, 3.0, 5.0]),
            ("s3", [3.0, 3.0, 4.0]),
            ("s4", [2.0, 4.0, 6.0]),
        ]);
        let outcome = anova(&data, &AnalysisConfig::default());
        let record = outcome.computed().unwrap();
        assert!((record.f - 14.25).abs() < 1e-9);
        assert_eq!(record.effect_source, EffectSizeSource::Generalized);
        assert!((record.partial_eta_squared - 38.0 / 65.0).abs() < 1e-9);
        assert_eq!(record.significance, Significance::Significant);
        assert_eq!(record.magnitude, EffectMagnitude::Large);
        assert_eq!((record.df1, record.df2), (2.0, 6.0));
    }

    #[test]
    fn test_no_variability() {
        let data = long(&[("s1", [2.0; 3]), ("s2", [2.0; 3]), ("s3", [2.0; 3])]);
        assert_eq!(
            anova(&data, &AnalysisConfig::default()).reason(),
            Some("no variability in data")
        );
    }

    #[test]
    fn test_empty() {
        let outcome = anova(&LongData::default(), &AnalysisConfig::default());
        assert!(matches!(outcome, Outcome::Failed { .. }));
    }

    #[test]
    fn test_library_error_is_tagged() {
        let data = long(&[("s1", [1.0, 2.0, 3.0])]);
        let outcome = anova(&data, &AnalysisConfig::default());
        assert_eq!(outcome.reason(), Some("need at least 2 observations, got 1"));
    }
}
