//! Summary of a saved analysis report

use std::path::PathBuf;

use clap::Args;
use sternlab_analysis::outcome::Outcome;

use crate::{schema::report::AnalysisReport, util};

#[derive(Debug, Clone, Args)]
pub(crate) struct SummaryArg {
    /// Path to the `report.json` written by `analyze`
    pub report: PathBuf,
}

pub(crate) fn run(arg: &SummaryArg) -> anyhow::Result<()> {
    let report = util::read_report_file(&arg.report)?;
    print_summary(&report);
    Ok(())
}

fn print_summary(report: &AnalysisReport) {
    println!("Analysis Summary");
    println!("================");
    println!(
        "Generated at: {}",
        report.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    println!("Input: {}", report.input.display());
    println!("Variables analyzed: {}", report.variables.len());
    println!();

    let significant = report
        .bundles
        .iter()
        .filter_map(|bundle| Some((bundle, bundle.anova.computed()?)))
        .filter(|(_, anova)| anova.significance.is_significant())
        .collect::<Vec<_>>();
    println!("Significant ANOVAs: {}", significant.len());
    for (bundle, anova) in &significant {
        println!(
            "  {}: F = {:.3}, p = {:.4}, eta^2 = {:.3} ({})",
            bundle.variable, anova.f, anova.p_value, anova.partial_eta_squared, anova.magnitude
        );
    }
    println!();

    let tables = report
        .bundles
        .iter()
        .filter_map(|bundle| match &bundle.posthoc {
            Outcome::Computed(table) => Some((bundle, table)),
            _ => None,
        })
        .collect::<Vec<_>>();
    let total = tables.iter().map(|(_, t)| t.comparisons.len()).sum::<usize>();
    let significant_comparisons = tables
        .iter()
        .flat_map(|(bundle, table)| {
            table
                .comparisons
                .iter()
                .filter(|c| c.significance.is_significant())
                .map(move |c| (*bundle, c))
        })
        .collect::<Vec<_>>();
    println!("Post-hoc comparisons: {total}");
    println!("Significant comparisons: {}", significant_comparisons.len());
    for (bundle, comparison) in significant_comparisons {
        println!(
            "  {} - {}: p = {:.4}, effect size = {:.3}",
            bundle.variable,
            comparison.pair_label,
            comparison.corrected_p.unwrap_or(f64::NAN),
            comparison.effect_size
        );
    }
}

#[cfg(test)]
mod tests {
    use sternlab_analysis::config::AnalysisConfig;

    use super::*;
    use crate::util::Output;

    #[test]
    fn test_reads_saved_report() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        let report = AnalysisReport {
            generated_at: chrono::Utc::now(),
            input: PathBuf::from("wide.csv"),
            config: AnalysisConfig::default(),
            subject_column: "id".to_owned(),
            variables: vec![],
            incomplete_variables: vec![],
            bundles: vec![],
        };
        Output::save_json(&report, Some(path.clone())).unwrap();
        run(&SummaryArg { report: path }).unwrap();
    }

    #[test]
    fn test_missing_report_fails() {
        let result = run(&SummaryArg {
            report: PathBuf::from("/nonexistent/report.json"),
        });
        assert!(result.is_err());
    }
}
