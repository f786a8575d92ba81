//! Trial aggregation command
//!
//! Turns a directory of per-participant Sternberg trial files into the wide
//! table the analysis commands consume.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context;
use clap::Args;
use sternlab_analysis::aggregate::{
    AggregateError, AggregateTable, ParticipantMetrics, TrialTable, participant_id,
};

use crate::util::Output;

#[derive(Debug, Clone, Args)]
pub(crate) struct AggregateArg {
    /// Directory containing the `*_sternberg_combined.csv` trial files
    pub input_dir: PathBuf,

    /// Output CSV file (stdout if omitted)
    #[arg(long)]
    pub output: Option<PathBuf>,
}

pub(crate) fn run(arg: &AggregateArg) -> anyhow::Result<()> {
    let files = trial_files(&arg.input_dir)?;
    eprintln!("Found {} CSV files to process", files.len());

    let mut rows = vec![];
    for path in &files {
        let Some(id) = participant_id(path) else {
            tracing::warn!(path = %path.display(), "skipping file without a usable name");
            continue;
        };
        eprintln!("Processing {}", path.display());
        match TrialTable::from_path(path) {
            Ok(table) => rows.push(ParticipantMetrics::compute(&id, &table)),
            Err(err @ AggregateError::MissingColumns { .. }) => {
                tracing::warn!(path = %path.display(), %err, "skipping trial file");
            }
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("Failed to read trial file: {}", path.display()));
            }
        }
    }
    if rows.is_empty() {
        anyhow::bail!("No participant could be aggregated from {}", arg.input_dir.display());
    }

    let table = AggregateTable::new(rows);
    let mut output = Output::from_output_path(arg.output.clone())?;
    let display_path = output.display_path();
    table
        .write_csv(&mut output)
        .with_context(|| format!("Failed to write aggregated table to {display_path}"))?;

    eprintln!();
    eprintln!("Aggregation complete");
    eprintln!("  Participants: {}", table.rows().len());
    eprintln!("  Columns:      {}", table.columns().len() + 1);
    eprintln!("  Output:       {display_path}");
    Ok(())
}

/// CSV files of a directory, sorted by path.
fn trial_files(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir)
        .with_context(|| format!("Failed to read input directory: {}", dir.display()))?;
    let mut files = vec![];
    for entry in entries {
        let path = entry
            .with_context(|| format!("Failed to read input directory: {}", dir.display()))?
            .path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "csv") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "T0_rt,T0_length,T0_corr,T1_rt,T1_length,T1_corr,T2_rt,T2_length,T2_corr";

    #[test]
    fn test_aggregate_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("p02_sternberg_combined.csv"),
            format!("desc\n{HEADER}\n500,2,1,450,2,1,400,2,1\n700,4,0,650,4,1,600,4,1\n"),
        )
        .unwrap();
        fs::write(
            dir.path().join("p01_sternberg_combined.csv"),
            format!("desc\n{HEADER}\n550,2,1,500,2,0,450,2,1\n"),
        )
        .unwrap();
        fs::write(dir.path().join("broken.csv"), "desc\nT0_rt\n1\n").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let output = dir.path().join("out.csv");
        run(&AggregateArg {
            input_dir: dir.path().to_owned(),
            output: Some(output.clone()),
        })
        .unwrap();

        let text = fs::read_to_string(output).unwrap();
        let mut lines = text.lines();
        let header = lines.next().unwrap();
        assert!(header.starts_with("id,mean_rt_total_T0,mean_rt_by_length_T0_2,"));
        assert!(header.contains("rt_slope_T2"));
        assert!(lines.next().unwrap().starts_with("p01,550,550,"));
        assert!(lines.next().unwrap().starts_with("p02,600,500,"));
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn test_empty_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let result = run(&AggregateArg {
            input_dir: dir.path().to_owned(),
            output: None,
        });
        assert!(result.is_err());
    }
}
