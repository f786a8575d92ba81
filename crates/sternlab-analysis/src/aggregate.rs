//! Sternberg trial files aggregated into one wide row per participant.
//!
//! Each participant file holds one trial per row and, per timepoint, a
//! reaction time (`Tk_rt`), a memory set size (`Tk_length`) and a
//! correctness flag (`Tk_corr`, 1 or 0). The first line of a file is a free
//! description and is skipped.
//!
//! Per timepoint the following metrics are produced, in this order:
//!
//! | column | value |
//! |---|---|
//! | `mean_rt_total_Tk` | mean of the valid reaction times |
//! | `mean_rt_by_length_Tk_<len>` | mean reaction time per set size |
//! | `mean_rt_correct_Tk` | mean reaction time of correct trials |
//! | `mean_rt_incorrect_Tk` | mean reaction time of incorrect trials |
//! | `accuracy_total_Tk` | share of correct trials |
//! | `accuracy_by_length_Tk_<len>` | share of correct trials per set size |
//! | `rt_slope_Tk`, `rt_intercept_Tk` | least-squares line of mean reaction time over set size |
//!
//! Only `mean_rt_total_Tk` is always present (empty when no reaction time
//! is valid); the others exist when they have at least one contributing
//! trial, and the regression needs two distinct set sizes.

use std::{collections::BTreeMap, fs::File, io, path::Path};

use sternlab_stats::descriptive;

use crate::{reshape::parse_value, timepoint::Timepoint};

/// File name suffix of a participant trial file.
pub const FILE_SUFFIX: &str = "_sternberg_combined.csv";

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum AggregateError {
    #[display("missing columns: {}", columns.join(", "))]
    MissingColumns { columns: Vec<String> },
    #[display("trial file has no header row")]
    MissingHeader,
    #[display("failed to read CSV data")]
    Csv(csv::Error),
    #[display("failed to read trial file")]
    Io(io::Error),
}

/// One trial of one timepoint; fields that fail numeric coercion are `None`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Trial {
    pub rt: Option<f64>,
    pub length: Option<f64>,
    pub corr: Option<f64>,
}

/// Trials of one participant, by timepoint.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrialTable {
    trials: [Vec<Trial>; 3],
}

impl TrialTable {
    /// Reads a trial file, skipping its description line.
    pub fn from_reader<R>(mut reader: R) -> Result<Self, AggregateError>
    where
        R: io::BufRead,
    {
        let mut description = String::new();
        reader
            .read_line(&mut description)
            .map_err(AggregateError::Io)?;

        let mut trial_reader = csv::ReaderBuilder::new()
            .flexible(true)
            .has_headers(false)
            .from_reader(reader);
        let mut records = trial_reader.records();
        let headers = match records.next() {
            Some(record) => record
                .map_err(AggregateError::Csv)?
                .iter()
                .map(|h| h.trim().to_owned())
                .collect::<Vec<_>>(),
            None => return Err(AggregateError::MissingHeader),
        };

        let mut indices = [[0; 3]; 3];
        let mut missing = vec![];
        for tp in Timepoint::ALL {
            for (slot, field) in ["rt", "length", "corr"].into_iter().enumerate() {
                let name = format!("{tp}_{field}");
                match headers.iter().position(|h| *h == name) {
                    Some(index) => indices[tp.index()][slot] = index,
                    None => missing.push(name),
                }
            }
        }
        if !missing.is_empty() {
            return Err(AggregateError::MissingColumns { columns: missing });
        }

        let mut table = Self::default();
        for record in records {
            let record = record.map_err(AggregateError::Csv)?;
            let field = |index: usize| record.get(index).and_then(parse_value);
            for tp in Timepoint::ALL {
                let [rt, length, corr] = indices[tp.index()];
                let trial = Trial {
                    rt: field(rt),
                    length: field(length),
                    corr: field(corr),
                };
                if trial != (Trial { rt: None, length: None, corr: None }) {
                    table.trials[tp.index()].push(trial);
                }
            }
        }
        Ok(table)
    }

    pub fn from_path<P>(path: P) -> Result<Self, AggregateError>
    where
        P: AsRef<Path>,
    {
        let file = File::open(path).map_err(AggregateError::Io)?;
        Self::from_reader(io::BufReader::new(file))
    }

    #[must_use]
    pub fn trials(&self, timepoint: Timepoint) -> &[Trial] {
        &self.trials[timepoint.index()]
    }
}

/// Participant id of a trial file: its name without [`FILE_SUFFIX`], or
/// its stem for other names.
#[must_use]
pub fn participant_id(path: &Path) -> Option<String> {
    let name = path.file_name()?.to_str()?;
    match name.strip_suffix(FILE_SUFFIX) {
        Some(id) => Some(id.to_owned()),
        None => Some(path.file_stem()?.to_str()?.to_owned()),
    }
}

/// Ordered metrics of one participant.
#[derive(Debug, Clone, PartialEq)]
pub struct ParticipantMetrics {
    pub id: String,
    pub metrics: Vec<(String, Option<f64>)>,
}

impl ParticipantMetrics {
    #[must_use]
    pub fn compute(id: &str, table: &TrialTable) -> Self {
        let mut metrics = vec![];
        for tp in Timepoint::ALL {
            push_timepoint_metrics(&mut metrics, tp, table.trials(tp));
        }
        Self {
            id: id.to_owned(),
            metrics,
        }
    }

    #[must_use]
    pub fn get(&self, column: &str) -> Option<f64> {
        self.metrics
            .iter()
            .find(|(name, _)| name == column)
            .and_then(|(_, value)| *value)
    }
}

#[expect(clippy::cast_possible_truncation)]
fn set_size(length: f64) -> i64 {
    length as i64
}

/// `Some(true)` for a correct trial, `Some(false)` for an incorrect one.
#[expect(clippy::float_cmp)]
fn response(corr: f64) -> Option<bool> {
    if corr == 1.0 {
        Some(true)
    } else if corr == 0.0 {
        Some(false)
    } else {
        None
    }
}

#[expect(clippy::cast_precision_loss)]
fn push_timepoint_metrics(out: &mut Vec<(String, Option<f64>)>, tp: Timepoint, trials: &[Trial]) {
    let rts = trials.iter().filter_map(|t| t.rt).collect::<Vec<_>>();
    out.push((format!("mean_rt_total_{tp}"), descriptive::mean(&rts)));

    let mut rt_by_length = BTreeMap::<i64, Vec<f64>>::new();
    for trial in trials {
        if let (Some(rt), Some(length)) = (trial.rt, trial.length) {
            rt_by_length.entry(set_size(length)).or_default().push(rt);
        }
    }
    let length_means = rt_by_length
        .iter()
        .filter_map(|(length, rts)| Some((*length, descriptive::mean(rts)?)))
        .collect::<Vec<_>>();
    for (length, mean) in &length_means {
        out.push((format!("mean_rt_by_length_{tp}_{length}"), Some(*mean)));
    }

    let answered = trials
        .iter()
        .filter_map(|t| Some((t.rt?, t.corr?)))
        .collect::<Vec<_>>();
    let correct = answered
        .iter()
        .filter(|(_, corr)| response(*corr) == Some(true))
        .map(|(rt, _)| *rt)
        .collect::<Vec<_>>();
    let incorrect = answered
        .iter()
        .filter(|(_, corr)| response(*corr) == Some(false))
        .map(|(rt, _)| *rt)
        .collect::<Vec<_>>();
    if let Some(mean) = descriptive::mean(&correct) {
        out.push((format!("mean_rt_correct_{tp}"), Some(mean)));
    }
    if let Some(mean) = descriptive::mean(&incorrect) {
        out.push((format!("mean_rt_incorrect_{tp}"), Some(mean)));
    }
    if !answered.is_empty() {
        let accuracy = correct.len() as f64 / answered.len() as f64;
        out.push((format!("accuracy_total_{tp}"), Some(accuracy)));
    }

    let mut corr_by_length = BTreeMap::<i64, (usize, usize)>::new();
    for trial in trials {
        if let (Some(length), Some(corr)) = (trial.length, trial.corr) {
            let (hits, total) = corr_by_length.entry(set_size(length)).or_default();
            *hits += usize::from(response(corr) == Some(true));
            *total += 1;
        }
    }
    for (length, (hits, total)) in corr_by_length {
        let accuracy = hits as f64 / total as f64;
        out.push((format!("accuracy_by_length_{tp}_{length}"), Some(accuracy)));
    }

    let points = length_means
        .iter()
        .map(|(length, mean)| (*length as f64, *mean))
        .collect::<Vec<_>>();
    if let Some((slope, intercept)) = least_squares(&points) {
        out.push((format!("rt_slope_{tp}"), Some(slope)));
        out.push((format!("rt_intercept_{tp}"), Some(intercept)));
    }
}

/// Slope and intercept of the least-squares line, or `None` when the x
/// values have no spread.
#[expect(clippy::cast_precision_loss)]
fn least_squares(points: &[(f64, f64)]) -> Option<(f64, f64)> {
    if points.len() < 2 {
        return None;
    }
    let n = points.len() as f64;
    let mean_x = points.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_y = points.iter().map(|(_, y)| y).sum::<f64>() / n;
    let sxx = points.iter().map(|(x, _)| (x - mean_x).powi(2)).sum::<f64>();
    if sxx <= 0.0 {
        return None;
    }
    let sxy = points
        .iter()
        .map(|(x, y)| (x - mean_x) * (y - mean_y))
        .sum::<f64>();
    let slope = sxy / sxx;
    Some((slope, mean_y - slope * mean_x))
}

/// Wide table of all participants.
///
/// Columns are the union of every participant's metrics, in first-seen
/// order within each timepoint, T0 columns first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregateTable {
    columns: Vec<String>,
    rows: Vec<ParticipantMetrics>,
}

impl AggregateTable {
    #[must_use]
    pub fn new(rows: Vec<ParticipantMetrics>) -> Self {
        let mut columns: Vec<String> = vec![];
        for row in &rows {
            for (name, _) in &row.metrics {
                if !columns.contains(name) {
                    columns.push(name.clone());
                }
            }
        }
        columns.sort_by_key(|name| column_timepoint(name));
        Self { columns, rows }
    }

    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    #[must_use]
    pub fn rows(&self) -> &[ParticipantMetrics] {
        &self.rows
    }

    /// Writes the table as CSV with an `id` column first.
    pub fn write_csv<W>(&self, writer: W) -> Result<(), AggregateError>
    where
        W: io::Write,
    {
        let mut writer = csv::Writer::from_writer(writer);
        writer
            .write_record(std::iter::once("id").chain(self.columns.iter().map(String::as_str)))
            .map_err(AggregateError::Csv)?;
        for row in &self.rows {
            let values = self
                .columns
                .iter()
                .map(|column| row.get(column).map(|v| v.to_string()).unwrap_or_default());
            writer
                .write_record(std::iter::once(row.id.clone()).chain(values))
                .map_err(AggregateError::Csv)?;
        }
        writer.flush().map_err(AggregateError::Io)
    }
}

fn column_timepoint(name: &str) -> Option<Timepoint> {
    Timepoint::ALL
        .into_iter()
        .find(|tp| name.split('_').any(|piece| piece == tp.tag()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRIALS: &str = "\
Sternberg task, combined sessions
T0_rt,T0_length,T0_corr,T1_rt,T1_length,T1_corr,T2_rt,T2_length,T2_corr
500,2,1,450,2,1,400,2,1
600,4,1,520,4,0,,4,1
700,6,0,600,6,1,480,6,1
x,2,1,,,,,,
";

    fn assert_close(actual: Option<f64>, expected: f64) {
        let actual = actual.unwrap();
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn test_metrics() {
        let table = TrialTable::from_reader(TRIALS.as_bytes()).unwrap();
        assert_eq!(table.trials(Timepoint::T0).len(), 4);
        let metrics = ParticipantMetrics::compute("p01", &table);

        assert_close(metrics.get("mean_rt_total_T0"), 600.0);
        assert_close(metrics.get("mean_rt_by_length_T0_4"), 600.0);
        assert_close(metrics.get("mean_rt_correct_T0"), 550.0);
        assert_close(metrics.get("mean_rt_incorrect_T0"), 700.0);
        assert_close(metrics.get("accuracy_total_T0"), 2.0 / 3.0);
        // the trial with an invalid RT still counts for accuracy by length
        assert_close(metrics.get("accuracy_by_length_T0_2"), 1.0);
        assert_close(metrics.get("rt_slope_T0"), 50.0);
        assert_close(metrics.get("rt_intercept_T0"), 400.0);

        assert_close(metrics.get("mean_rt_total_T2"), 440.0);
        assert_eq!(metrics.get("mean_rt_by_length_T2_4"), None);
        assert_eq!(metrics.get("mean_rt_incorrect_T2"), None);
    }

    #[test]
    fn test_column_order() {
        let metrics = ParticipantMetrics::compute(
            "p01",
            &TrialTable::from_reader(TRIALS.as_bytes()).unwrap(),
        );
        let names = metrics
            .metrics
            .iter()
            .map(|(name, _)| name.as_str())
            .take(6)
            .collect::<Vec<_>>();
        assert_eq!(
            names,
            vec![
                "mean_rt_total_T0",
                "mean_rt_by_length_T0_2",
                "mean_rt_by_length_T0_4",
                "mean_rt_by_length_T0_6",
                "mean_rt_correct_T0",
                "mean_rt_incorrect_T0",
            ]
        );
    }

    #[test]
    fn test_missing_columns() {
        let text = "desc\nT0_rt,T0_length\n1,2\n";
        let err = TrialTable::from_reader(text.as_bytes()).unwrap_err();
        let AggregateError::MissingColumns { columns } = &err else {
            panic!("unexpected error: {err}");
        };
        assert_eq!(columns.len(), 7);
        assert!(err.to_string().starts_with("missing columns: T0_corr, T1_rt"));
    }

    #[test]
    fn test_participant_id() {
        assert_eq!(
            participant_id(Path::new("data/p07_sternberg_combined.csv")).as_deref(),
            Some("p07")
        );
        assert_eq!(
            participant_id(Path::new("data/other.csv")).as_deref(),
            Some("other")
        );
    }

    #[test]
    fn test_table_groups_columns_by_timepoint() {
        let first = ParticipantMetrics {
            id: "a".to_owned(),
            metrics: vec![
                ("mean_rt_total_T0".to_owned(), Some(1.0)),
                ("mean_rt_total_T1".to_owned(), Some(2.0)),
            ],
        };
        let second = ParticipantMetrics {
            id: "b".to_owned(),
            metrics: vec![
                ("mean_rt_total_T0".to_owned(), None),
                ("mean_rt_by_length_T0_3".to_owned(), Some(3.0)),
                ("mean_rt_total_T1".to_owned(), Some(4.0)),
            ],
        };
        let table = AggregateTable::new(vec![first, second]);
        assert_eq!(
            table.columns(),
            ["mean_rt_total_T0", "mean_rt_by_length_T0_3", "mean_rt_total_T1"]
        );

        let mut out = vec![];
        table.write_csv(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "id,mean_rt_total_T0,mean_rt_by_length_T0_3,mean_rt_total_T1\na,1,,2\nb,,3,4\n"
        );
    }
}
