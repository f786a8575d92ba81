//! Statistical routines for the Sternlab project.
//!
//! This crate provides the numerical building blocks used by the
//! repeated-measures analysis pipeline:
//!
//! - **Descriptive statistics**: Mean, sample variance, standard deviation, z-scores
//! - **Quantiles**: Percentiles with linear interpolation between order statistics
//! - **Describe tables**: Count/mean/std/min/quartiles/max summaries
//! - **Normality**: Shapiro-Wilk W test (Royston's approximation)
//! - **Paired tests**: Paired Student's t-test and paired-difference summaries
//! - **Repeated measures**: One-way repeated-measures ANOVA, Mauchly's test of
//!   sphericity and pairwise paired t-tests with p-value adjustment
//!
//! # Modules
//!
//! - [`descriptive`]: Descriptive statistics for summarizing datasets
//! - [`quantile`]: Percentile computation and storage
//! - [`describe`]: Combined summary in the layout of a "describe" table
//! - [`shapiro`]: Shapiro-Wilk normality test
//! - [`ttest`]: Paired t-test and confidence intervals
//! - [`repeated`]: Balanced subject-by-condition matrices built from long data
//! - [`rm_anova`]: One-way repeated-measures ANOVA
//! - [`sphericity`]: Mauchly's test of sphericity
//! - [`pairwise`]: Pairwise paired t-tests with multiple-comparison correction
//!
//! # Examples
//!
//! ## Computing descriptive statistics
//!
//! ```
//! use sternlab_stats::descriptive::DescriptiveStats;
//!
//! let values = [1.0, 2.0, 3.0, 4.0, 5.0];
//! let stats = DescriptiveStats::new(values).unwrap();
//! assert_eq!(stats.mean, 3.0);
//! assert_eq!(stats.variance, 2.5);
//! ```
//!
//! ## Computing percentiles
//!
//! ```
//! use sternlab_stats::quantile::Percentiles;
//!
//! let values = [1.0, 2.0, 3.0, 4.0, 5.0, 100.0];
//! let percentiles = Percentiles::new(&values, &[25.0, 75.0]);
//! assert_eq!(percentiles.get(25.0), Some(2.25));
//! assert_eq!(percentiles.get(75.0), Some(4.75));
//! ```
//!
//! ## Running a repeated-measures ANOVA
//!
//! ```
//! use sternlab_stats::{repeated::RepeatedMeasures, rm_anova::rm_anova};
//!
//! let observations = [
//!     ("s1", "T0", 1.0), ("s1", "T1", 2.0), ("s1", "T2", 3.0),
//!     ("s2", "T0", 2.0), ("s2", "T1", 3.0), ("s2", "T2", 5.0),
//!     ("s3", "T0", 3.0), ("s3", "T1", 3.0), ("s3", "T2", 4.0),
//!     ("s4", "T0", 2.0), ("s4", "T1", 4.0), ("s4", "T2", 6.0),
//! ];
//! let measures = RepeatedMeasures::from_long(observations);
//! let table = rm_anova(&measures).unwrap();
//! assert!((table.f - 14.25).abs() < 1e-9);
//! ```

pub mod describe;
pub mod descriptive;
pub mod pairwise;
pub mod quantile;
pub mod repeated;
pub mod rm_anova;
pub mod shapiro;
pub mod sphericity;
pub mod ttest;

use std::fmt;

/// Errors raised by the statistical routines in this crate.
#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
pub enum StatsError {
    #[display("need at least {required} observations, got {actual}")]
    InsufficientData { required: usize, actual: usize },
    #[display("need at least {required} conditions, got {actual}")]
    InsufficientConditions { required: usize, actual: usize },
    #[display("samples differ in length ({left} vs {right})")]
    LengthMismatch { left: usize, right: usize },
    #[display("data has zero variance")]
    ZeroVariance,
    #[display("covariance matrix is singular")]
    SingularMatrix,
    #[display("invalid distribution parameters: {message}")]
    Distribution { message: String },
}

impl StatsError {
    pub(crate) fn distribution<E>(err: E) -> Self
    where
        E: fmt::Display,
    {
        Self::Distribution {
            message: err.to_string(),
        }
    }
}
