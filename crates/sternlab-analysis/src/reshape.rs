//! Wide-to-long reshaping of one variable.
//!
//! The three timepoint columns of a variable are flattened into
//! `(subject, timepoint, value)` observations. Cells that are missing, not
//! numeric, or not finite are dropped, as are rows without a subject id.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use sternlab_stats::repeated::RepeatedMeasures;

use crate::{discovery::VariableColumns, table::WideTable, timepoint::Timepoint};

/// One measurement of one subject at one timepoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub subject: String,
    pub timepoint: Timepoint,
    pub value: f64,
}

/// Parses a cell as a finite number.
///
/// # Examples
///
/// ```
/// use sternlab_analysis::reshape::parse_value;
///
/// assert_eq!(parse_value(" 1.5 "), Some(1.5));
/// assert_eq!(parse_value("1e3"), Some(1000.0));
/// assert_eq!(parse_value("n/a"), None);
/// assert_eq!(parse_value("NaN"), None);
/// assert_eq!(parse_value("inf"), None);
/// ```
#[must_use]
pub fn parse_value(cell: &str) -> Option<f64> {
    cell.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

/// Long-format observations of a single variable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LongData {
    observations: Vec<Observation>,
}

impl LongData {
    #[must_use]
    pub fn new(observations: Vec<Observation>) -> Self {
        Self { observations }
    }

    #[must_use]
    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.observations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Values observed at `timepoint`, in emission order.
    #[must_use]
    pub fn values(&self, timepoint: Timepoint) -> Vec<f64> {
        self.at(timepoint).map(|obs| obs.value).collect()
    }

    /// Every value of the variable.
    pub fn all_values(&self) -> impl Iterator<Item = f64> + '_ {
        self.observations.iter().map(|obs| obs.value)
    }

    /// Distinct timepoints with at least one observation.
    #[must_use]
    pub fn timepoints(&self) -> BTreeSet<Timepoint> {
        self.observations.iter().map(|obs| obs.timepoint).collect()
    }

    /// Distinct subjects observed at `timepoint`.
    #[must_use]
    pub fn subjects(&self, timepoint: Timepoint) -> BTreeSet<&str> {
        self.at(timepoint).map(|obs| obs.subject.as_str()).collect()
    }

    /// Values at `a` and `b` for the subjects observed at both, in subject
    /// order. A subject with several values at one timepoint contributes its
    /// first one.
    #[must_use]
    pub fn paired(&self, a: Timepoint, b: Timepoint) -> (Vec<f64>, Vec<f64>) {
        let first_by_subject = |tp: Timepoint| {
            let mut map = BTreeMap::new();
            for obs in self.at(tp) {
                map.entry(obs.subject.as_str()).or_insert(obs.value);
            }
            map
        };
        let left = first_by_subject(a);
        let right = first_by_subject(b);
        left.iter()
            .filter_map(|(subject, x)| right.get(subject).map(|y| (*x, *y)))
            .unzip()
    }

    /// Subject-by-timepoint matrix of the subjects observed at every
    /// timepoint present.
    #[must_use]
    pub fn repeated_measures(&self) -> RepeatedMeasures<Timepoint> {
        RepeatedMeasures::from_long(
            self.observations
                .iter()
                .map(|obs| (obs.subject.as_str(), obs.timepoint, obs.value)),
        )
    }

    fn at(&self, timepoint: Timepoint) -> impl Iterator<Item = &Observation> + '_ {
        self.observations
            .iter()
            .filter(move |obs| obs.timepoint == timepoint)
    }
}

/// Flattens the timepoint columns of `variable` into long format.
///
/// Observations are emitted timepoint by timepoint, in row order. A
/// timepoint whose column is absent from the table contributes nothing.
#[must_use]
pub fn reshape(table: &WideTable, variable: &VariableColumns) -> LongData {
    let mut observations = Vec::new();
    for timepoint in Timepoint::ALL {
        let Some(cells) = variable
            .column(timepoint)
            .and_then(|column| table.column_cells(column))
        else {
            continue;
        };
        observations.extend(cells.filter_map(|(subject, cell)| {
            Some(Observation {
                subject: subject?.to_owned(),
                timepoint,
                value: parse_value(cell?)?,
            })
        }));
    }
    tracing::debug!(
        variable = variable.name(),
        observations = observations.len(),
        "reshaped variable"
    );
    LongData::new(observations)
}
