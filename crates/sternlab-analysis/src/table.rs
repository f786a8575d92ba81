//! Wide-format subject tables.
//!
//! A [`WideTable`] holds one row per subject and one column per
//! (variable, timepoint) pair. Cells are kept as text; numeric coercion is
//! left to the reshaper so that the table can be loaded even when some
//! columns are not numeric.
//!
//! # Subject Column
//!
//! The subject identifier column is resolved once, when the table is built:
//!
//! 1. a column named `id` (case-insensitive), otherwise
//! 2. the first column whose lower-cased name contains `id`, `participant`
//!    or `participante`.
//!
//! A table without such a column cannot be analyzed and fails with
//! [`TableError::NoSubjectColumn`].
//!
//! # Examples
//!
//! ```
//! use sternlab_analysis::table::WideTable;
//!
//! let csv = "Participant,score_T0,score_T1,score_T2\np1,1.5,2,\np2,3,n/a,4\n";
//! let table = WideTable::from_reader(csv.as_bytes()).unwrap();
//!
//! assert_eq!(table.subject_column(), "Participant");
//! assert_eq!(table.value_columns().collect::<Vec<_>>(), vec!["score_T0", "score_T1", "score_T2"]);
//! assert_eq!(table.cell(0, "score_T2"), None);
//! assert_eq!(table.cell(1, "score_T1"), Some("n/a"));
//! ```

use std::{fs::File, io, path::Path};

/// Errors raised while building or loading a [`WideTable`].
#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum TableError {
    #[display("no subject id column found among {columns:?}")]
    NoSubjectColumn { columns: Vec<String> },
    #[display("table has no header row")]
    MissingHeader,
    #[display("failed to read CSV data")]
    Csv(csv::Error),
    #[display("failed to open table file")]
    Io(io::Error),
}

/// One row per subject, cells kept as raw text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WideTable {
    headers: Vec<String>,
    rows: Vec<Vec<Option<String>>>,
    subject_index: usize,
}

impl WideTable {
    /// Builds a table from headers and rows.
    ///
    /// Cells are trimmed; empty cells become `None`. Short rows are padded
    /// and long rows truncated to the header length.
    pub fn new<I, R, C>(headers: Vec<String>, rows: I) -> Result<Self, TableError>
    where
        I: IntoIterator<Item = R>,
        R: IntoIterator<Item = Option<C>>,
        C: AsRef<str>,
    {
        let subject_index =
            resolve_subject_column(&headers).ok_or_else(|| TableError::NoSubjectColumn {
                columns: headers.clone(),
            })?;
        let width = headers.len();
        let rows = rows
            .into_iter()
            .map(|row| {
                let mut cells = row
                    .into_iter()
                    .take(width)
                    .map(|cell| {
                        cell.map(|c| c.as_ref().trim().to_owned())
                            .filter(|c| !c.is_empty())
                    })
                    .collect::<Vec<_>>();
                cells.resize(width, None);
                cells
            })
            .collect();
        Ok(Self {
            headers,
            rows,
            subject_index,
        })
    }

    /// Reads a CSV table whose first line is the header.
    pub fn from_reader<R>(reader: R) -> Result<Self, TableError>
    where
        R: io::Read,
    {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .has_headers(false)
            .from_reader(reader);
        let mut records = reader.records();
        let headers = match records.next() {
            Some(record) => record
                .map_err(TableError::Csv)?
                .iter()
                .map(|h| h.trim().to_owned())
                .collect::<Vec<_>>(),
            None => return Err(TableError::MissingHeader),
        };
        let rows = records
            .map(|record| {
                record
                    .map(|r| r.iter().map(|c| Some(c.to_owned())).collect::<Vec<_>>())
                    .map_err(TableError::Csv)
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(headers, rows)
    }

    /// Reads a CSV table that may start with one free-text description line.
    ///
    /// The first line is taken as the header if it has an `id` column;
    /// otherwise the second line is tried. When neither line has one, the
    /// result of reading from the first line is returned.
    pub fn from_reader_with_description<R>(mut reader: R) -> Result<Self, TableError>
    where
        R: io::Read,
    {
        let mut text = String::new();
        reader.read_to_string(&mut text).map_err(TableError::Io)?;
        let first = Self::from_reader(text.as_bytes());
        if matches!(&first, Ok(table) if table.has_id_column()) {
            return first;
        }
        let rest = text.split_once('\n').map_or("", |(_, rest)| rest);
        match Self::from_reader(rest.as_bytes()) {
            Ok(table) if table.has_id_column() => {
                tracing::debug!("skipped description line before header");
                Ok(table)
            }
            _ => first,
        }
    }

    fn has_id_column(&self) -> bool {
        self.subject_column().eq_ignore_ascii_case("id")
    }

    /// Opens and reads a CSV file, see [`WideTable::from_reader`].
    pub fn from_path<P>(path: P) -> Result<Self, TableError>
    where
        P: AsRef<Path>,
    {
        let file = File::open(path).map_err(TableError::Io)?;
        Self::from_reader(io::BufReader::new(file))
    }

    /// Opens and reads a CSV file, see [`WideTable::from_reader_with_description`].
    pub fn from_path_with_description<P>(path: P) -> Result<Self, TableError>
    where
        P: AsRef<Path>,
    {
        let file = File::open(path).map_err(TableError::Io)?;
        Self::from_reader_with_description(io::BufReader::new(file))
    }

    #[must_use]
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Name of the subject identifier column.
    #[must_use]
    pub fn subject_column(&self) -> &str {
        &self.headers[self.subject_index]
    }

    /// Every column except the subject identifier, in table order.
    pub fn value_columns(&self) -> impl Iterator<Item = &str> + '_ {
        self.headers
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != self.subject_index)
            .map(|(_, h)| h.as_str())
    }

    #[must_use]
    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Subject identifier of row `row`, `None` when the cell is empty.
    #[must_use]
    pub fn subject(&self, row: usize) -> Option<&str> {
        self.rows.get(row)?[self.subject_index].as_deref()
    }

    /// Text of the cell at `row` in column `column`.
    #[must_use]
    pub fn cell(&self, row: usize, column: &str) -> Option<&str> {
        let index = self.column_index(column)?;
        self.rows.get(row)?[index].as_deref()
    }

    /// `(subject, cell)` pairs of one column, in row order.
    ///
    /// Returns `None` when the table has no such column.
    pub fn column_cells(
        &self,
        column: &str,
    ) -> Option<impl Iterator<Item = (Option<&str>, Option<&str>)> + '_> {
        let index = self.column_index(column)?;
        Some(self.rows.iter().map(move |row| {
            (
                row[self.subject_index].as_deref(),
                row[index].as_deref(),
            )
        }))
    }
}

/// Index of the subject identifier column in `headers`.
///
/// # Examples
///
/// ```
/// use sternlab_analysis::table::resolve_subject_column;
///
/// let headers = ["participante".to_owned(), "ID".to_owned()];
/// assert_eq!(resolve_subject_column(&headers), Some(1));
/// let headers = ["x_T0".to_owned(), "Participant".to_owned()];
/// assert_eq!(resolve_subject_column(&headers), Some(1));
/// ```
#[must_use]
pub fn resolve_subject_column(headers: &[String]) -> Option<usize> {
    headers
        .iter()
        .position(|h| h.eq_ignore_ascii_case("id"))
        .or_else(|| {
            headers.iter().position(|h| {
                let lower = h.to_lowercase();
                ["id", "participant", "participante"]
                    .iter()
                    .any(|key| lower.contains(key))
            })
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_subject_column() {
        let err = WideTable::from_reader("a_T0,a_T1\n1,2\n".as_bytes()).unwrap_err();
        assert!(matches!(err, TableError::NoSubjectColumn { columns } if columns.len() == 2));
    }

    #[test]
    fn test_empty_input() {
        assert!(matches!(
            WideTable::from_reader("".as_bytes()),
            Err(TableError::MissingHeader)
        ));
    }

    #[test]
    fn test_ragged_rows() {
        let table = WideTable::from_reader("id,x_T0,x_T1\ns1,1\ns2,1,2,3\n".as_bytes()).unwrap();
        assert_eq!(table.num_rows(), 2);
        assert_eq!(table.cell(0, "x_T1"), None);
        assert_eq!(table.cell(1, "x_T1"), Some("2"));
    }

    #[test]
    fn test_description_line_is_skipped() {
        let csv = "Sternberg results exported 2024\nid,x_T0\ns1,4\n";
        let table = WideTable::from_reader_with_description(csv.as_bytes()).unwrap();
        assert_eq!(table.subject_column(), "id");
        assert_eq!(table.cell(0, "x_T0"), Some("4"));

        let plain = WideTable::from_reader_with_description("id,x_T0\ns1,4\n".as_bytes()).unwrap();
        assert_eq!(plain, table);
    }

    #[test]
    fn test_exact_id_wins_over_substring() {
        let headers = ["valid_T0".to_owned(), "Id".to_owned()];
        assert_eq!(resolve_subject_column(&headers), Some(1));
    }

    #[test]
    fn test_column_cells() {
        let table = WideTable::from_reader("id,x_T0\ns1, 4 \n,5\n".as_bytes()).unwrap();
        let cells = table.column_cells("x_T0").unwrap().collect::<Vec<_>>();
        assert_eq!(cells, vec![(Some("s1"), Some("4")), (None, Some("5"))]);
        assert!(table.column_cells("missing").is_none());
    }
}
