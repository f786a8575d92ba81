//! Full repeated-measures analysis command
//!
//! Runs normality, outlier, sphericity, ANOVA and post-hoc tests on every
//! variable of a wide table and writes one CSV sheet per record family, a
//! JSON report and, optionally, one box plot per variable.

mod table;

use std::{fs, path::PathBuf};

use anyhow::Context;
use clap::Args;
use sternlab_analysis::{
    discovery::discover,
    pipeline::{VariableBundle, analyze_variable},
    report::ReportTables,
    timepoint::TagConvention,
};

use crate::{
    plot,
    schema::report::{AnalysisReport, VariableSummaryRow},
    util::{self, Output},
};

#[derive(Debug, Clone, Args)]
pub(crate) struct AnalyzeArg {
    /// Path to the wide table CSV file
    pub input: PathBuf,

    /// Analysis configuration JSON file (missing fields take defaults)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Timepoint tag convention: `suffix` or `token` (overrides the config)
    #[arg(long)]
    pub convention: Option<TagConvention>,

    /// Output directory for report files and plots
    #[arg(long, default_value = "results")]
    pub output_dir: PathBuf,

    /// Do not draw box plots
    #[arg(long)]
    pub no_plots: bool,
}

pub(crate) fn run(arg: &AnalyzeArg) -> anyhow::Result<()> {
    let mut config = util::read_config_file(arg.config.as_ref())?;
    if let Some(convention) = arg.convention {
        config.convention = convention;
    }

    eprintln!("Loading {}...", arg.input.display());
    let table = util::read_wide_table(&arg.input, false)?;
    eprintln!(
        "Loaded {} subjects, subject column: {}",
        table.num_rows(),
        table.subject_column()
    );

    let discovery = discover(table.value_columns(), &config.tokenizer());
    let variables = discovery.names().map(str::to_owned).collect::<Vec<_>>();
    let incomplete = discovery
        .incomplete()
        .iter()
        .map(|v| v.name().to_owned())
        .collect::<Vec<_>>();
    if !incomplete.is_empty() {
        eprintln!(
            "Skipping {} variable(s) without all three timepoints: {}",
            incomplete.len(),
            incomplete.join(", ")
        );
    }
    if variables.is_empty() {
        anyhow::bail!(
            "No variable with T0, T1 and T2 columns found in {}",
            arg.input.display()
        );
    }
    eprintln!("Found {} variable(s) to analyze", variables.len());

    let plot_dir = arg.output_dir.join("plots");
    fs::create_dir_all(&arg.output_dir).with_context(|| {
        format!(
            "Failed to create output directory: {}",
            arg.output_dir.display()
        )
    })?;
    if !arg.no_plots {
        fs::create_dir_all(&plot_dir)
            .with_context(|| format!("Failed to create plot directory: {}", plot_dir.display()))?;
    }

    let mut bundles = Vec::with_capacity(variables.len());
    for (i, variable) in discovery.complete().iter().enumerate() {
        eprintln!(
            "{:2}/{} - Analyzing: {}",
            i + 1,
            variables.len(),
            variable.name()
        );
        let analysis = analyze_variable(&table, variable, &config);
        if !arg.no_plots {
            let path = plot::boxplot_path(&plot_dir, variable.name());
            if let Err(err) = plot::draw_boxplot(&path, &analysis.series) {
                tracing::warn!(variable = variable.name(), %err, "failed to draw box plot");
            }
        }
        table::print_variable_progress(&analysis.bundle);
        bundles.push(analysis.bundle);
    }

    save_sheets(&arg.output_dir, &variables, &bundles)?;

    let report = AnalysisReport {
        generated_at: chrono::Utc::now(),
        input: arg.input.clone(),
        config,
        subject_column: table.subject_column().to_owned(),
        variables,
        incomplete_variables: incomplete,
        bundles,
    };
    let report_path = arg.output_dir.join("report.json");
    Output::save_json(&report, Some(report_path.clone()))?;

    println!();
    table::print_summary_table(&report.bundles, report.config.alpha);
    println!();
    println!("Analysis saved to: {}", arg.output_dir.display());
    println!("  Report: {}", report_path.display());
    if !arg.no_plots {
        println!("  Plots:  {}", plot_dir.display());
    }
    Ok(())
}

fn save_sheets(
    dir: &std::path::Path,
    variables: &[String],
    bundles: &[VariableBundle],
) -> anyhow::Result<()> {
    let summary = variables.iter().map(|variable| VariableSummaryRow {
        variable,
        total_variables: variables.len(),
    });
    util::save_csv(summary, dir.join("summary.csv"))?;

    let sheets = ReportTables::from_bundles(bundles);
    util::save_csv(&sheets.normality, dir.join("normality.csv"))?;
    util::save_csv(&sheets.outliers, dir.join("outliers.csv"))?;
    util::save_csv(&sheets.anova, dir.join("anova.csv"))?;
    util::save_csv(&sheets.sphericity, dir.join("sphericity.csv"))?;
    util::save_csv(&sheets.posthoc, dir.join("posthoc.csv"))?;
    Ok(())
}
