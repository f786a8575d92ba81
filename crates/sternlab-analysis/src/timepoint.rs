//! Measurement occasions and the column-name tokenizer that finds them.
//!
//! Wide tables name their columns `<variable>_<timepoint>`. Two naming
//! conventions are in use:
//!
//! - **Suffix**: the tag ends the name (`score_T0`).
//! - **Token**: the tag may be embedded, followed by a further suffix
//!   (`mean_rt_by_length_T0_3`). The tag is removed and the remaining pieces
//!   are joined back together (`mean_rt_by_length_3`).
//!
//! Both are handled by [`TimepointTokenizer`]. In the token convention a
//! suffix tag takes precedence; otherwise the leftmost embedded tag is used.
//!
//! # Examples
//!
//! ```
//! use sternlab_analysis::timepoint::{TagConvention, Timepoint, TimepointTokenizer};
//!
//! let suffix = TimepointTokenizer::new(TagConvention::Suffix);
//! assert_eq!(suffix.split("score_T1"), Some(("score".to_owned(), Timepoint::T1)));
//! assert_eq!(suffix.split("mean_rt_by_length_T0_3"), None);
//!
//! let token = TimepointTokenizer::new(TagConvention::Token);
//! assert_eq!(
//!     token.split("mean_rt_by_length_T0_3"),
//!     Some(("mean_rt_by_length_3".to_owned(), Timepoint::T0)),
//! );
//! ```

use serde::{Deserialize, Serialize};

/// One of the three repeated measurement occasions.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
)]
pub enum Timepoint {
    T0,
    T1,
    T2,
}

impl Timepoint {
    /// All timepoints, in measurement order.
    pub const ALL: [Self; 3] = [Self::T0, Self::T1, Self::T2];

    /// Tag used in column names.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::T0 => "T0",
            Self::T1 => "T1",
            Self::T2 => "T2",
        }
    }

    /// Position in [`Timepoint::ALL`].
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::T0 => 0,
            Self::T1 => 1,
            Self::T2 => 2,
        }
    }

    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tp| tp.tag() == tag)
    }
}

/// How timepoint tags are located in column names.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, derive_more::FromStr,
)]
#[serde(rename_all = "snake_case")]
pub enum TagConvention {
    /// `<base>_T{0,1,2}` at the end of the name only.
    #[default]
    Suffix,
    /// `_T{0,1,2}` anywhere, followed by `_` or the end of the name.
    Token,
}

/// Splits column names into a base variable name and a timepoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimepointTokenizer {
    convention: TagConvention,
}

impl TimepointTokenizer {
    #[must_use]
    pub const fn new(convention: TagConvention) -> Self {
        Self { convention }
    }

    #[must_use]
    pub const fn convention(&self) -> TagConvention {
        self.convention
    }

    /// Returns the base name and timepoint of `column`, or `None` when the
    /// column carries no timepoint tag under this convention.
    ///
    /// A base name that would be empty (a column named just `T0`) is
    /// rejected.
    #[must_use]
    pub fn split(&self, column: &str) -> Option<(String, Timepoint)> {
        if let Some(found) = split_suffix(column) {
            return Some(found);
        }
        match self.convention {
            TagConvention::Suffix => None,
            TagConvention::Token => split_token(column),
        }
    }

    /// Column name for `base` at `timepoint` in the suffix form.
    #[must_use]
    pub fn column_name(base: &str, timepoint: Timepoint) -> String {
        format!("{base}_{}", timepoint.tag())
    }
}

fn split_suffix(column: &str) -> Option<(String, Timepoint)> {
    Timepoint::ALL.into_iter().find_map(|tp| {
        let base = column.strip_suffix(tp.tag())?.strip_suffix('_')?;
        (!base.is_empty()).then(|| (base.to_owned(), tp))
    })
}

fn split_token(column: &str) -> Option<(String, Timepoint)> {
    column.match_indices('_').find_map(|(start, _)| {
        let rest = &column[start + 1..];
        let tp = Timepoint::ALL.into_iter().find(|tp| {
            rest.strip_prefix(tp.tag())
                .is_some_and(|after| after.is_empty() || after.starts_with('_'))
        })?;
        let head = &column[..start];
        let tail = &column[start + 1 + tp.tag().len()..];
        let base = collapse_underscores(&format!("{head}_{tail}"));
        (!base.is_empty()).then_some((base, tp))
    })
}

/// Collapses runs of `_` into one and trims leading/trailing `_`.
fn collapse_underscores(name: &str) -> String {
    name.split('_')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}
