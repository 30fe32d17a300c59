//! Identifier types.
//!
//! Target ids are generated by the store as `{prefix}-{8 hex chars}`. Source
//! ids arrive inside export documents as either numbers or strings; they are
//! only used to check references within one document and are never written
//! as target primary keys.

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub const PREFIX_ACADEMY: &str = "aca";
pub const PREFIX_COURSE: &str = "crs";
pub const PREFIX_MODULE: &str = "mod";
pub const PREFIX_LESSON: &str = "les";
pub const PREFIX_QUIZ: &str = "qiz";

pub const ALL_PREFIXES: &[&str] = &[
    PREFIX_ACADEMY,
    PREFIX_COURSE,
    PREFIX_MODULE,
    PREFIX_LESSON,
    PREFIX_QUIZ,
];

/// An id as recorded by the producer of an export document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum SourceId {
    Number(i64),
    Text(String),
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for SourceId {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<i64> for SourceId {
    fn from(value: i64) -> Self {
        Self::Number(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_id_accepts_numbers_and_strings() {
        let ids: Vec<SourceId> = serde_json::from_str(r#"[42, "crs-a1b2c3d4"]"#).unwrap();
        assert_eq!(ids[0], SourceId::Number(42));
        assert_eq!(ids[1], SourceId::Text("crs-a1b2c3d4".into()));
        assert_eq!(ids[0].to_string(), "42");
    }

    #[test]
    fn prefixes_are_unique() {
        let mut seen = std::collections::HashSet::new();
        for prefix in ALL_PREFIXES {
            assert!(seen.insert(prefix), "duplicate prefix {prefix}");
        }
    }
}
