//! Sphericity of the three repeated measures (Mauchly's test).

use serde::{Deserialize, Serialize};
use sternlab_stats::{descriptive, sphericity::mauchly};

use crate::{config::AnalysisConfig, outcome::Outcome, reshape::LongData, timepoint::Timepoint};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, derive_more::Display)]
#[serde(rename_all = "snake_case")]
pub enum SphericityVerdict {
    #[display("spherical")]
    Spherical,
    #[display("not spherical")]
    NotSpherical,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SphericityRecord {
    /// Mauchly's W.
    pub w: f64,
    pub chi_square: f64,
    pub dof: f64,
    pub p_value: f64,
    pub verdict: SphericityVerdict,
    /// Greenhouse-Geisser epsilon.
    pub epsilon_gg: f64,
    /// Subjects observed at every timepoint.
    pub subjects: usize,
}

/// Runs Mauchly's test on the subjects observed at every timepoint.
///
/// Returns [`Outcome::NotApplicable`] when the data has no observations,
/// fewer than three timepoints, fewer than `min_subjects` distinct subjects
/// at some timepoint, or no variability at all.
#[must_use]
pub fn sphericity(data: &LongData, config: &AnalysisConfig) -> Outcome<SphericityRecord> {
    if data.is_empty() {
        return Outcome::not_applicable("no valid observations");
    }
    let present = data.timepoints().len();
    if present < Timepoint::ALL.len() {
        return Outcome::not_applicable(format!(
            "fewer than {} timepoints present ({present})",
            Timepoint::ALL.len()
        ));
    }
    let (min_tp, min_subjects) = Timepoint::ALL
        .into_iter()
        .map(|tp| (tp, data.subjects(tp).len()))
        .min_by_key(|(_, count)| *count)
        .unwrap_or((Timepoint::T0, 0));
    if min_subjects < config.min_subjects {
        return Outcome::not_applicable(format!(
            "insufficient participants: {min_subjects} at {min_tp} (need {})",
            config.min_subjects
        ));
    }
    let values = data.all_values().collect::<Vec<_>>();
    if descriptive::sample_variance(&values).is_none_or(|v| v <= 0.0) {
        return Outcome::not_applicable("no variability in data");
    }

    match mauchly(&data.repeated_measures()) {
        Ok(result) => {
            let verdict = if result.p_value > config.alpha {
                SphericityVerdict::Spherical
            } else {
                SphericityVerdict::NotSpherical
            };
            tracing::debug!(w = result.w, p = result.p_value, "sphericity computed");
            Outcome::Computed(SphericityRecord {
                w: result.w,
                chi_square: result.chi_square,
                dof: result.dof,
                p_value: result.p_value,
                verdict,
                epsilon_gg: result.epsilon_gg,
                subjects: result.subjects,
            })
        }
        Err(err) => {
            tracing::debug!(%err, "sphericity test failed");
            Outcome::failed(err.to_string())
        }
    }
}
