//! Repeated-measures analysis of Sternberg task data across three timepoints
//!
//! This crate discovers the variables of a wide subject table, reshapes each
//! variable into long format, and runs the same battery of tests on every
//! one of them.
//!
//! # Overview
//!
//! The analysis system supports two workflows:
//!
//! ## Variable Analysis Workflow
//!
//! 1. **Load Wide Table** ([`table::WideTable`]): One row per subject, raw text cells
//! 2. **Discover Variables** ([`discovery::discover`]): Strip timepoint tags with
//!    [`timepoint::TimepointTokenizer`] and keep variables present at T0, T1 and T2
//! 3. **Reshape** ([`reshape::reshape`]): Flatten one variable into
//!    (subject, timepoint, value) observations
//! 4. **Test** ([`pipeline::VariableBundle`]): Normality and outliers
//!    ([`normality`]), sphericity ([`sphericity`]), omnibus ANOVA ([`anova`]) and
//!    Bonferroni-corrected post-hoc comparisons ([`posthoc`])
//! 5. **Report** ([`report::ReportTables`]): Flatten bundles into one sheet per
//!    record family
//!
//! ## Trial Aggregation Workflow
//!
//! 1. **Load Trials** ([`aggregate::TrialTable`]): One participant's trial file
//! 2. **Compute Metrics** ([`aggregate::ParticipantMetrics`]): Reaction times,
//!    accuracy and scanning slope per timepoint
//! 3. **Build Wide Table** ([`aggregate::AggregateTable`]): One row per participant,
//!    ready for the variable analysis workflow
//!
//! # Fault Isolation
//!
//! Components never return errors. Data that cannot be tested yields
//! [`outcome::Outcome::NotApplicable`] and a failed computation yields
//! [`outcome::Outcome::Failed`], so one bad variable never stops the others.
//! Only loading errors ([`table::TableError`], [`aggregate::AggregateError`])
//! are reported to the caller.
//!
//! # Examples
//!
//! ```
//! use sternlab_analysis::{
//!     config::AnalysisConfig, discovery::discover, pipeline::analyze_variable,
//!     report::ReportTables, table::WideTable,
//! };
//!
//! let csv = "id,rt_T0,rt_T1,rt_T2,acc_T0,acc_T1\n\
//!            s1,510,480,450,0.9,0.95\n\
//!            s2,620,590,560,0.8,0.85\n\
//!            s3,580,560,530,0.85,0.9\n\
//!            s4,700,650,640,0.7,0.8\n";
//! let table = WideTable::from_reader(csv.as_bytes())?;
//! let config = AnalysisConfig::default();
//!
//! let discovery = discover(table.value_columns(), &config.tokenizer());
//! assert_eq!(discovery.names().collect::<Vec<_>>(), vec!["rt"]);
//!
//! let bundles = discovery
//!     .complete()
//!     .iter()
//!     .map(|variable| analyze_variable(&table, variable, &config).bundle)
//!     .collect::<Vec<_>>();
//! let tables = ReportTables::from_bundles(&bundles);
//! assert_eq!(tables.anova.len(), 1);
//! assert_eq!(tables.normality.len(), 3);
//! # Ok::<(), sternlab_analysis::table::TableError>(())
//! ```

pub mod aggregate;
pub mod anova;
pub mod config;
pub mod discovery;
pub mod normality;
pub mod outcome;
pub mod pipeline;
pub mod posthoc;
pub mod report;
pub mod reshape;
pub mod sphericity;
pub mod table;
pub mod timepoint;
