//! Per-variable analysis pipeline.
//!
//! # Overview
//!
//! ```text
//! WideTable + VariableColumns
//!     ↓ reshape
//! LongData
//!     ├─ normality::screen   → NormalityRecord, OutlierRecord (per timepoint)
//!     ├─ sphericity          → Outcome<SphericityRecord>
//!     ├─ anova               → Outcome<AnovaRecord>
//!     └─ posthoc::compare    → Outcome<PostHocTable>
//!     ↓
//! VariableBundle (+ BoxplotSeries for plotting)
//! ```
//!
//! The four components only read the reshaped data; a tagged result from
//! one of them never affects the others or other variables.
//!
//! # Examples
//!
//! ```
//! use sternlab_analysis::{
//!     config::AnalysisConfig, discovery::discover, pipeline::analyze_variable, table::WideTable,
//! };
//!
//! let csv = "id,score_T0,score_T1,score_T2\n\
//!            s1,10,12,15\ns2,11,12,13\ns3,9,13,16\ns4,12,12,17\n";
//! let table = WideTable::from_reader(csv.as_bytes()).unwrap();
//! let config = AnalysisConfig::default();
//! let discovery = discover(table.value_columns(), &config.tokenizer());
//!
//! let analysis = analyze_variable(&table, &discovery.complete()[0], &config);
//! assert_eq!(analysis.bundle.variable, "score");
//! assert!(analysis.bundle.anova.is_computed());
//! assert_eq!(analysis.series.groups.len(), 3);
//! ```

use serde::{Deserialize, Serialize};
use sternlab_stats::descriptive;

use crate::{
    anova::{self, AnovaRecord},
    config::AnalysisConfig,
    discovery::VariableColumns,
    normality::{self, NormalityRecord, OutlierRecord},
    outcome::Outcome,
    posthoc::{self, PostHocTable},
    reshape::{self, LongData},
    sphericity::{self, SphericityRecord},
    table::WideTable,
    timepoint::Timepoint,
};

/// Every result computed for one variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableBundle {
    pub variable: String,
    /// Valid long-format observations the results are based on.
    pub observations: usize,
    pub normality: Vec<NormalityRecord>,
    pub outliers: Vec<OutlierRecord>,
    pub sphericity: Outcome<SphericityRecord>,
    pub anova: Outcome<AnovaRecord>,
    pub posthoc: Outcome<PostHocTable>,
}

impl VariableBundle {
    /// Runs every component on already reshaped data.
    #[must_use]
    pub fn compute(variable: &str, data: &LongData, config: &AnalysisConfig) -> Self {
        let (normality, outliers) = normality::screen(data, config);
        Self {
            variable: variable.to_owned(),
            observations: data.len(),
            normality,
            outliers,
            sphericity: sphericity::sphericity(data, config),
            anova: anova::anova(data, config),
            posthoc: posthoc::compare(data, config),
        }
    }

    /// Whether any component produced a not-applicable or failed result.
    #[must_use]
    pub fn has_tagged_results(&self) -> bool {
        !(self.sphericity.is_computed() && self.anova.is_computed() && self.posthoc.is_computed())
    }
}

/// Values of one variable grouped by timepoint, for a box plot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxplotSeries {
    pub variable: String,
    /// Timepoints with at least one value, in measurement order.
    pub groups: Vec<(Timepoint, Vec<f64>)>,
}

impl BoxplotSeries {
    #[must_use]
    pub fn from_long(variable: &str, data: &LongData) -> Self {
        let groups = Timepoint::ALL
            .into_iter()
            .map(|tp| (tp, data.values(tp)))
            .filter(|(_, values)| !values.is_empty())
            .collect();
        Self {
            variable: variable.to_owned(),
            groups,
        }
    }

    /// Mean of each group, in group order.
    pub fn means(&self) -> impl Iterator<Item = (Timepoint, f64)> + '_ {
        self.groups
            .iter()
            .filter_map(|(tp, values)| Some((*tp, descriptive::mean(values)?)))
    }
}

/// Bundle and plot data of one variable.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableAnalysis {
    pub bundle: VariableBundle,
    pub series: BoxplotSeries,
}

/// Reshapes and analyzes one discovered variable.
#[must_use]
pub fn analyze_variable(
    table: &WideTable,
    variable: &VariableColumns,
    config: &AnalysisConfig,
) -> VariableAnalysis {
    let data = reshape::reshape(table, variable);
    let bundle = VariableBundle::compute(variable.name(), &data, config);
    if bundle.has_tagged_results() {
        tracing::debug!(variable = variable.name(), "variable has tagged results");
    }
    VariableAnalysis {
        bundle,
        series: BoxplotSeries::from_long(variable.name(), &data),
    }
}
