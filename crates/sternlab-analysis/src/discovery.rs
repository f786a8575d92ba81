//! Variable discovery over wide-table column names.
//!
//! Each column that carries a timepoint tag contributes to the base variable
//! it names. A variable is analyzable only when it has a column for every
//! timepoint; variables with one or two timepoints are reported separately
//! and never partially analyzed.
//!
//! # Examples
//!
//! ```
//! use sternlab_analysis::{
//!     discovery::discover,
//!     timepoint::{TagConvention, Timepoint, TimepointTokenizer},
//! };
//!
//! let columns = ["score_T0", "score_T1", "score_T2", "age", "rt_T0", "rt_T2"];
//! let discovery = discover(columns, &TimepointTokenizer::new(TagConvention::Suffix));
//!
//! assert_eq!(discovery.names().collect::<Vec<_>>(), vec!["score"]);
//! assert_eq!(discovery.complete()[0].column(Timepoint::T1), Some("score_T1"));
//! assert_eq!(discovery.incomplete()[0].name(), "rt");
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::timepoint::{Timepoint, TimepointTokenizer};

/// Base variable together with the column that holds each timepoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableColumns {
    name: String,
    columns: [Option<String>; 3],
}

impl VariableColumns {
    fn new(name: String) -> Self {
        Self {
            name,
            columns: [None, None, None],
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Column holding `timepoint`, if the table has one.
    #[must_use]
    pub fn column(&self, timepoint: Timepoint) -> Option<&str> {
        self.columns[timepoint.index()].as_deref()
    }

    /// Timepoints with a column, in measurement order.
    pub fn present(&self) -> impl Iterator<Item = Timepoint> + '_ {
        Timepoint::ALL
            .into_iter()
            .filter(|tp| self.columns[tp.index()].is_some())
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.columns.iter().all(Option::is_some)
    }
}

/// Outcome of scanning a set of column names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Discovery {
    complete: Vec<VariableColumns>,
    incomplete: Vec<VariableColumns>,
}

impl Discovery {
    /// Variables with a column for every timepoint, sorted by name.
    #[must_use]
    pub fn complete(&self) -> &[VariableColumns] {
        &self.complete
    }

    /// Tagged variables missing at least one timepoint, sorted by name.
    #[must_use]
    pub fn incomplete(&self) -> &[VariableColumns] {
        &self.incomplete
    }

    /// Names of the analyzable variables.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.complete.iter().map(VariableColumns::name)
    }

    /// Number of candidate variables, complete or not.
    #[must_use]
    pub fn num_candidates(&self) -> usize {
        self.complete.len() + self.incomplete.len()
    }
}

/// Groups tagged columns by base variable.
///
/// The subject-id column should not be passed in. When two columns map to
/// the same variable and timepoint, the first one wins.
pub fn discover<'a, I>(columns: I, tokenizer: &TimepointTokenizer) -> Discovery
where
    I: IntoIterator<Item = &'a str>,
{
    let mut variables = BTreeMap::<String, VariableColumns>::new();
    for column in columns {
        let Some((base, timepoint)) = tokenizer.split(column) else {
            continue;
        };
        let entry = variables
            .entry(base)
            .or_insert_with_key(|name| VariableColumns::new(name.clone()));
        let slot = &mut entry.columns[timepoint.index()];
        if let Some(existing) = slot {
            tracing::warn!(
                variable = entry.name.as_str(),
                %timepoint,
                kept = existing.as_str(),
                ignored = column,
                "duplicate timepoint column"
            );
            continue;
        }
        *slot = Some(column.to_owned());
    }

    let (complete, incomplete) = variables
        .into_values()
        .partition::<Vec<_>, _>(VariableColumns::is_complete);
    tracing::debug!(
        complete = complete.len(),
        incomplete = incomplete.len(),
        "variable discovery finished"
    );
    Discovery {
        complete,
        incomplete,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use proptest::prelude::*;

    use super::*;
    use crate::timepoint::TagConvention;

    #[test]
    fn test_sorted_and_complete_only() {
        let columns = [
            "zeta_T0", "zeta_T1", "zeta_T2", "alpha_T2", "alpha_T0", "alpha_T1", "beta_T0",
        ];
        let discovery = discover(columns, &TimepointTokenizer::new(TagConvention::Suffix));
        assert_eq!(discovery.names().collect::<Vec<_>>(), vec!["alpha", "zeta"]);
        assert_eq!(discovery.num_candidates(), 3);
        let beta = &discovery.incomplete()[0];
        assert_eq!(beta.present().collect::<Vec<_>>(), vec![Timepoint::T0]);
    }

    #[test]
    fn test_token_convention_strips_embedded_tags() {
        let columns = [
            "mean_rt_by_length_T0_3",
            "mean_rt_by_length_T1_3",
            "mean_rt_by_length_T2_3",
        ];
        let discovery = discover(columns, &TimepointTokenizer::new(TagConvention::Token));
        assert_eq!(
            discovery.names().collect::<Vec<_>>(),
            vec!["mean_rt_by_length_3"]
        );
        let suffix = discover(columns, &TimepointTokenizer::new(TagConvention::Suffix));
        assert_eq!(suffix.num_candidates(), 0);
    }

    #[test]
    fn test_duplicate_slot_keeps_first() {
        let columns = ["x_T0", "x_T1", "x_T2", "x_T0_"];
        let discovery = discover(columns, &TimepointTokenizer::new(TagConvention::Token));
        assert_eq!(discovery.complete()[0].column(Timepoint::T0), Some("x_T0"));
    }

    fn column_name() -> impl Strategy<Value = String> {
        ("[a-c]{1,2}", prop::option::of(0..3_usize), "(_[0-9])?").prop_map(
            |(base, tag, tail)| match tag {
                Some(i) => format!("{base}_{}{tail}", Timepoint::ALL[i].tag()),
                None => format!("{base}{tail}"),
            },
        )
    }

    proptest! {
        #[test]
        fn discovered_variables_have_every_column(
            columns in prop::collection::vec(column_name(), 0..24),
            token in any::<bool>(),
        ) {
            let convention = if token { TagConvention::Token } else { TagConvention::Suffix };
            let tokenizer = TimepointTokenizer::new(convention);
            let source = columns.iter().map(String::as_str).collect::<BTreeSet<_>>();
            let discovery = discover(columns.iter().map(String::as_str), &tokenizer);
            for variable in discovery.complete() {
                for tp in Timepoint::ALL {
                    let column = variable.column(tp).unwrap();
                    prop_assert!(source.contains(column));
                    let (base, found) = tokenizer.split(column).unwrap();
                    prop_assert_eq!(base.as_str(), variable.name());
                    prop_assert_eq!(found, tp);
                }
            }
        }
    }
}
