//! ANOVA-only report command
//!
//! A quick pass over a wide table: one repeated-measures ANOVA per variable,
//! ranked by p-value, plus per-timepoint descriptive statistics. Column
//! names follow the token convention, and the table may start with a
//! description line.

use std::{fs, path::PathBuf};

use anyhow::Context;
use clap::Args;
use sternlab_analysis::{
    anova::{self, EffectMagnitude},
    discovery::discover,
    report::{self, AnovaRow},
    reshape,
    timepoint::TagConvention,
};

use crate::util;

#[derive(Debug, Clone, Args)]
pub(crate) struct AnovaArg {
    /// Path to the wide table CSV file
    pub input: PathBuf,

    /// Analysis configuration JSON file (missing fields take defaults)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Output directory for `anova.csv` and `descriptives.csv`
    #[arg(long, default_value = "anova_results")]
    pub output_dir: PathBuf,
}

pub(crate) fn run(arg: &AnovaArg) -> anyhow::Result<()> {
    let mut config = util::read_config_file(arg.config.as_ref())?;
    config.convention = TagConvention::Token;

    let table = util::read_wide_table(&arg.input, true)?;
    let discovery = discover(table.value_columns(), &config.tokenizer());
    println!("Variables found for ANOVA: {}", discovery.complete().len());
    if discovery.complete().is_empty() {
        anyhow::bail!(
            "No variable with T0, T1 and T2 columns found in {}",
            arg.input.display()
        );
    }

    let mut rows = vec![];
    let mut descriptives = vec![];
    for variable in discovery.complete() {
        let data = reshape::reshape(&table, variable);
        let outcome = anova::anova(&data, &config);
        if let Some(reason) = outcome.reason() {
            tracing::warn!(variable = variable.name(), reason, "ANOVA not computed");
        }
        rows.push(report::anova_row(variable.name(), &outcome));
        descriptives.extend(report::descriptives(variable.name(), &data));
    }
    report::sort_by_p_value(&mut rows);

    fs::create_dir_all(&arg.output_dir).with_context(|| {
        format!(
            "Failed to create output directory: {}",
            arg.output_dir.display()
        )
    })?;
    util::save_csv(&rows, arg.output_dir.join("anova.csv"))?;
    util::save_csv(&descriptives, arg.output_dir.join("descriptives.csv"))?;

    print_significant(&rows);
    println!();
    println!("Results saved to: {}", arg.output_dir.display());
    Ok(())
}

fn print_significant(rows: &[AnovaRow]) {
    let significant = rows
        .iter()
        .filter(|row| row.significance.as_deref() == Some("significant"))
        .collect::<Vec<_>>();
    println!();
    println!("Significant variables (p < alpha): {}", significant.len());
    for row in &significant {
        println!(
            "  {}: F = {:.3}, p = {:.4}, eta^2 = {:.4}",
            row.variable,
            row.f.unwrap_or(f64::NAN),
            row.p_value.unwrap_or(f64::NAN),
            row.partial_eta_squared.unwrap_or(f64::NAN),
        );
    }

    let large = EffectMagnitude::Large.to_string();
    let large_effects = significant
        .iter()
        .filter(|row| row.magnitude.as_deref() == Some(large.as_str()))
        .collect::<Vec<_>>();
    println!();
    println!("Large effects among them: {}", large_effects.len());
    for row in large_effects {
        println!(
            "  {}: eta^2 = {:.4}",
            row.variable,
            row.partial_eta_squared.unwrap_or(f64::NAN)
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anova_report() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("wide.csv");
        fs::write(
            &input,
            "Aggregated Sternberg metrics\n\
             id,mean_rt_by_length_T0_2,mean_rt_by_length_T1_2,mean_rt_by_length_T2_2,flat_T0,flat_T1,flat_T2\n\
             s1,1,2,3,5,5,5\n\
             s2,2,3,5,5,5,5\n\
             s3,3,3,4,5,5,5\n\
             s4,2,4,6,5,5,5\n",
        )
        .unwrap();
        let output_dir = dir.path().join("out");
        run(&AnovaArg {
            input,
            config: None,
            output_dir: output_dir.clone(),
        })
        .unwrap();

        let anova = fs::read_to_string(output_dir.join("anova.csv")).unwrap();
        let lines = anova.lines().collect::<Vec<_>>();
        assert_eq!(lines.len(), 3);
        let fields = lines[1].split(',').collect::<Vec<_>>();
        assert_eq!(&fields[..3], ["mean_rt_by_length_2", "ok", ""]);
        let f = fields[3].parse::<f64>().unwrap();
        assert!((f - 14.25).abs() < 1e-9);
        assert!(lines[2].starts_with("flat,failed,no variability in data"));

        let descriptives = fs::read_to_string(output_dir.join("descriptives.csv")).unwrap();
        assert_eq!(descriptives.lines().count(), 1 + 6);
        assert!(descriptives.starts_with("variable,timepoint,count,mean,std,min,25%,50%,75%,max\n"));
    }
}
