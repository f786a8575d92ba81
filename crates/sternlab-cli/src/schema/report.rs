use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sternlab_analysis::{config::AnalysisConfig, pipeline::VariableBundle};

/// Complete result of one `analyze` run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// Timestamp when the report was generated (ISO 8601 format)
    pub generated_at: DateTime<Utc>,
    /// Wide table the analysis was run on
    pub input: PathBuf,
    /// Configuration the results were computed with
    pub config: AnalysisConfig,
    /// Name of the subject id column
    pub subject_column: String,
    /// Variables observed at all three timepoints, in analysis order
    pub variables: Vec<String>,
    /// Variables skipped because a timepoint column is missing
    pub incomplete_variables: Vec<String>,
    /// Results per analyzed variable
    pub bundles: Vec<VariableBundle>,
}

/// One row of `summary.csv`
#[derive(Debug, Clone, Serialize)]
pub struct VariableSummaryRow<'a> {
    pub variable: &'a str,
    pub total_variables: usize,
}
