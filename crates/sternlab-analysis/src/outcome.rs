//! Tagged results of the per-variable components.

use serde::{Deserialize, Serialize};

/// Result of one statistical component for one variable.
///
/// Components never return errors: data that cannot be tested becomes
/// [`Outcome::NotApplicable`], and a failed computation becomes
/// [`Outcome::Failed`], both carrying a human-readable reason.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome<T> {
    Computed(T),
    NotApplicable { reason: String },
    Failed { reason: String },
}

impl<T> Outcome<T> {
    pub fn not_applicable(reason: impl Into<String>) -> Self {
        Self::NotApplicable {
            reason: reason.into(),
        }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Self::Failed {
            reason: reason.into(),
        }
    }

    #[must_use]
    pub fn computed(&self) -> Option<&T> {
        match self {
            Self::Computed(value) => Some(value),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_computed(&self) -> bool {
        matches!(self, Self::Computed(_))
    }

    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Computed(_) => None,
            Self::NotApplicable { reason } | Self::Failed { reason } => Some(reason),
        }
    }

    /// Short status label used in report tables.
    #[must_use]
    pub fn status(&self) -> &'static str {
        match self {
            Self::Computed(_) => "ok",
            Self::NotApplicable { .. } => "not_applicable",
            Self::Failed { .. } => "failed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Value {
        x: f64,
    }

    #[test]
    fn test_serialized_tag() {
        let ok = Outcome::Computed(Value { x: 1.5 });
        assert_eq!(
            serde_json::to_string(&ok).unwrap(),
            r#"{"status":"computed","x":1.5}"#
        );
        let failed = Outcome::<Value>::failed("boom");
        let json = serde_json::to_string(&failed).unwrap();
        assert_eq!(json, r#"{"status":"failed","reason":"boom"}"#);
        assert_eq!(serde_json::from_str::<Outcome<Value>>(&json).unwrap(), failed);
        assert_eq!(failed.reason(), Some("boom"));
        assert_eq!(failed.status(), "failed");
    }
}
