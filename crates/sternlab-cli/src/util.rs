use std::{
    fs::File,
    io::{self, BufWriter, StdoutLock, Write as _},
    path::{Path, PathBuf},
};

use anyhow::Context;
use sternlab_analysis::{config::AnalysisConfig, table::WideTable};

use crate::schema::report::AnalysisReport;

#[derive(Debug)]
pub enum Output {
    Stdout {
        writer: StdoutLock<'static>,
    },
    File {
        writer: BufWriter<File>,
        path: PathBuf,
    },
}

impl Output {
    pub fn save_json<T>(value: &T, output_path: Option<PathBuf>) -> anyhow::Result<()>
    where
        T: serde::Serialize,
    {
        let mut output = Output::from_output_path(output_path)?;
        output.write_json(value)
    }

    pub fn from_output_path(output_path: Option<PathBuf>) -> anyhow::Result<Self> {
        match output_path {
            Some(path) => Output::open(path),
            None => Ok(Output::stdout()),
        }
    }

    pub fn stdout() -> Self {
        Output::Stdout {
            writer: io::stdout().lock(),
        }
    }

    pub fn open(path: PathBuf) -> anyhow::Result<Self> {
        let file = File::create(&path)
            .with_context(|| format!("Failed to create output file: {}", path.display()))?;
        Ok(Output::File {
            writer: BufWriter::new(file),
            path,
        })
    }

    pub fn display_path(&self) -> String {
        match self {
            Output::Stdout { .. } => "stdout".to_string(),
            Output::File { path, .. } => path.display().to_string(),
        }
    }

    pub fn write_json<T>(&mut self, value: T) -> anyhow::Result<()>
    where
        T: serde::Serialize,
    {
        serde_json::to_writer_pretty(&mut *self, &value)
            .with_context(|| format!("Failed to write JSON to {}", self.display_path()))?;
        writeln!(&mut *self).with_context(|| {
            format!(
                "Failed to write newline after JSON to {}",
                self.display_path()
            )
        })?;
        self.flush()
            .with_context(|| format!("Failed to flush output to {}", self.display_path()))?;
        Ok(())
    }

    /// Writes one CSV record per row, with a header from the row fields.
    pub fn write_csv<I, T>(&mut self, rows: I) -> anyhow::Result<()>
    where
        I: IntoIterator<Item = T>,
        T: serde::Serialize,
    {
        let path = self.display_path();
        let mut writer = csv::Writer::from_writer(&mut *self);
        for row in rows {
            writer
                .serialize(row)
                .with_context(|| format!("Failed to write CSV row to {path}"))?;
        }
        writer
            .flush()
            .with_context(|| format!("Failed to flush output to {path}"))?;
        Ok(())
    }
}

impl io::Write for Output {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Output::Stdout { writer } => writer.write(buf),
            Output::File { writer, .. } => writer.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Output::Stdout { writer } => writer.flush(),
            Output::File { writer, .. } => writer.flush(),
        }
    }
}

/// Writes rows as a CSV file.
pub fn save_csv<I, T>(rows: I, path: PathBuf) -> anyhow::Result<()>
where
    I: IntoIterator<Item = T>,
    T: serde::Serialize,
{
    Output::open(path)?.write_csv(rows)
}

pub fn read_json_file<T, P>(file_kind: &str, path: P) -> anyhow::Result<T>
where
    T: serde::de::DeserializeOwned,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("Failed to open {} file: {}", file_kind, path.display()))?;

    let reader = io::BufReader::new(file);
    let value = serde_json::from_reader(reader).with_context(|| {
        format!(
            "Failed to parse {} JSON file: {}",
            file_kind,
            path.display()
        )
    })?;

    Ok(value)
}

/// Read the analysis configuration, or the defaults when no path is given
pub fn read_config_file<P>(path: Option<P>) -> anyhow::Result<AnalysisConfig>
where
    P: AsRef<Path>,
{
    match path {
        Some(path) => read_json_file("analysis config", path),
        None => Ok(AnalysisConfig::default()),
    }
}

/// Read a saved analysis report
pub fn read_report_file<P>(path: P) -> anyhow::Result<AnalysisReport>
where
    P: AsRef<Path>,
{
    read_json_file("analysis report", path)
}

/// Read a wide subject table from a CSV file
///
/// With `with_description`, one free-text line before the header is
/// tolerated.
///
/// # Errors
///
/// Returns error if the file cannot be read or has no subject id column
pub fn read_wide_table<P>(path: P, with_description: bool) -> anyhow::Result<WideTable>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let table = if with_description {
        WideTable::from_path_with_description(path)
    } else {
        WideTable::from_path(path)
    };
    table.with_context(|| format!("Failed to load wide table: {}", path.display()))
}
