//! Policy thresholds of the analysis pipeline.
//!
//! Every constant the pipeline decides with lives here, so that a run can be
//! reproduced from its report. Missing fields in a serialized configuration
//! take their default values.
//!
//! ```json
//! {
//!   "alpha": 0.05,
//!   "iqr_multiplier": 1.5,
//!   "z_threshold": 3.0,
//!   "convention": "token"
//! }
//! ```

use serde::{Deserialize, Serialize};

use crate::timepoint::{TagConvention, TimepointTokenizer};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Significance level for every test verdict.
    pub alpha: f64,
    /// Multiple of the IQR beyond the quartiles that marks an outlier.
    pub iqr_multiplier: f64,
    /// Absolute z-score above which a value is an outlier.
    pub z_threshold: f64,
    /// Minimum sample size for the normality test.
    pub min_normality_n: usize,
    /// Minimum distinct subjects per timepoint for the sphericity test.
    pub min_subjects: usize,
    /// Minimum subjects shared by two timepoints for a paired comparison.
    pub min_common_subjects: usize,
    /// Coverage of the mean-difference confidence intervals.
    pub confidence_level: f64,
    /// Lower bound (inclusive) of a large partial eta-squared.
    pub large_effect: f64,
    /// Lower bound (inclusive) of a medium partial eta-squared.
    pub medium_effect: f64,
    /// How timepoint tags are found in column names.
    pub convention: TagConvention,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            alpha: 0.05,
            iqr_multiplier: 1.5,
            z_threshold: 3.0,
            min_normality_n: 3,
            min_subjects: 3,
            min_common_subjects: 3,
            confidence_level: 0.95,
            large_effect: 0.14,
            medium_effect: 0.06,
            convention: TagConvention::default(),
        }
    }
}

impl AnalysisConfig {
    #[must_use]
    pub fn tokenizer(&self) -> TimepointTokenizer {
        TimepointTokenizer::new(self.convention)
    }
}
