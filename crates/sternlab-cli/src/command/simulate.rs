//! Synthetic wide table generation
//!
//! Each value is `shift[timepoint] + subject intercept + noise`, with the
//! subject intercept drawn once per subject and variable. Cells are left
//! empty with probability `missing_rate`.

use std::{io::Write as _, path::PathBuf};

use anyhow::Context;
use clap::Args;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use rand_pcg::Pcg32;
use sternlab_analysis::timepoint::{Timepoint, TimepointTokenizer};

use crate::util::Output;

#[derive(Debug, Clone, Args)]
pub(crate) struct SimulateArg {
    /// Number of subjects (rows)
    #[arg(long, default_value_t = 30)]
    pub subjects: usize,

    /// Number of variables, named `var1`, `var2`, ...
    #[arg(long, default_value_t = 3)]
    pub variables: usize,

    /// Mean of each timepoint (T0,T1,T2)
    #[arg(long, value_delimiter = ',', default_values_t = [0.0, 0.5, 1.0])]
    pub shifts: Vec<f64>,

    /// Standard deviation of the per-subject random intercept
    #[arg(long, default_value_t = 1.0)]
    pub subject_sd: f64,

    /// Standard deviation of the measurement noise
    #[arg(long, default_value_t = 1.0)]
    pub noise_sd: f64,

    /// Probability that a cell is left empty
    #[arg(long, default_value_t = 0.0)]
    pub missing_rate: f64,

    /// Seed of the random number generator
    #[arg(long, default_value_t = 0)]
    pub seed: u64,

    /// Output CSV file (stdout if omitted)
    #[arg(long)]
    pub output: Option<PathBuf>,
}

/// Header and rows of a generated wide table.
#[derive(Debug, Clone, PartialEq)]
struct SimulatedTable {
    headers: Vec<String>,
    rows: Vec<Vec<Option<f64>>>,
}

fn simulate(arg: &SimulateArg) -> anyhow::Result<SimulatedTable> {
    let [t0, t1, t2] = arg.shifts[..] else {
        anyhow::bail!("Expected 3 timepoint shifts, got {}", arg.shifts.len());
    };
    if !(0.0..=1.0).contains(&arg.missing_rate) {
        anyhow::bail!("Missing rate must be within [0, 1], got {}", arg.missing_rate);
    }
    let intercept = Normal::new(0.0, arg.subject_sd)
        .map_err(|err| anyhow::anyhow!("Invalid subject standard deviation: {err}"))?;
    let noise = Normal::new(0.0, arg.noise_sd)
        .map_err(|err| anyhow::anyhow!("Invalid noise standard deviation: {err}"))?;
    let shifts = [t0, t1, t2];

    let mut headers = vec!["id".to_owned()];
    for i in 1..=arg.variables {
        for tp in Timepoint::ALL {
            headers.push(TimepointTokenizer::column_name(&format!("var{i}"), tp));
        }
    }

    let mut rng = Pcg32::seed_from_u64(arg.seed);
    let mut rows = Vec::with_capacity(arg.subjects);
    for _ in 0..arg.subjects {
        let mut row = Vec::with_capacity(headers.len() - 1);
        for _ in 0..arg.variables {
            let subject = intercept.sample(&mut rng);
            for tp in Timepoint::ALL {
                let value = shifts[tp.index()] + subject + noise.sample(&mut rng);
                let missing = rng.random_bool(arg.missing_rate);
                row.push((!missing).then_some(value));
            }
        }
        rows.push(row);
    }
    Ok(SimulatedTable { headers, rows })
}

pub(crate) fn run(arg: &SimulateArg) -> anyhow::Result<()> {
    let table = simulate(arg)?;

    let mut output = Output::from_output_path(arg.output.clone())?;
    let display_path = output.display_path();
    let mut writer = csv::Writer::from_writer(&mut output);
    writer
        .write_record(&table.headers)
        .with_context(|| format!("Failed to write CSV header to {display_path}"))?;
    for (i, row) in table.rows.iter().enumerate() {
        let id = format!("s{:03}", i + 1);
        let cells = row
            .iter()
            .map(|value| value.map(|v| format!("{v:.4}")).unwrap_or_default());
        writer
            .write_record(std::iter::once(id).chain(cells))
            .with_context(|| format!("Failed to write CSV row to {display_path}"))?;
    }
    writer
        .flush()
        .with_context(|| format!("Failed to flush output to {display_path}"))?;
    drop(writer);
    output
        .flush()
        .with_context(|| format!("Failed to flush output to {display_path}"))?;

    eprintln!(
        "Generated {} subjects x {} variables to {display_path}",
        arg.subjects, arg.variables
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use sternlab_analysis::{
        config::AnalysisConfig, discovery::discover, pipeline::analyze_variable, table::WideTable,
    };

    use super::*;

    fn arg(seed: u64) -> SimulateArg {
        SimulateArg {
            subjects: 20,
            variables: 2,
            shifts: vec![0.0, 2.0, 4.0],
            subject_sd: 1.0,
            noise_sd: 0.5,
            missing_rate: 0.0,
            seed,
            output: None,
        }
    }

    #[test]
    fn test_reproducible_from_seed() {
        assert_eq!(simulate(&arg(7)).unwrap(), simulate(&arg(7)).unwrap());
        assert_ne!(simulate(&arg(7)).unwrap(), simulate(&arg(8)).unwrap());
    }

    #[test]
    fn test_shape() {
        let table = simulate(&arg(1)).unwrap();
        assert_eq!(
            table.headers[..4],
            ["id", "var1_T0", "var1_T1", "var1_T2"]
        );
        assert_eq!(table.headers.len(), 7);
        assert_eq!(table.rows.len(), 20);
        assert!(table.rows.iter().all(|row| row.len() == 6 && row.iter().all(Option::is_some)));
    }

    #[test]
    fn test_missing_rate() {
        let mut all_missing = arg(3);
        all_missing.missing_rate = 1.0;
        let table = simulate(&all_missing).unwrap();
        assert!(table.rows.iter().flatten().all(Option::is_none));

        all_missing.missing_rate = 1.5;
        assert!(simulate(&all_missing).is_err());
    }

    #[test]
    fn test_generated_table_is_analyzable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sim.csv");
        let mut sim = arg(11);
        sim.output = Some(path.clone());
        run(&sim).unwrap();

        let table = WideTable::from_path(&path).unwrap();
        let config = AnalysisConfig::default();
        let discovery = discover(table.value_columns(), &config.tokenizer());
        assert_eq!(discovery.names().collect::<Vec<_>>(), vec!["var1", "var2"]);
        let bundle = analyze_variable(&table, &discovery.complete()[0], &config).bundle;
        let anova = bundle.anova.computed().unwrap();
        assert_eq!(anova.subjects, 20);
        assert!(anova.significance.is_significant());
    }
}
