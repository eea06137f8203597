//! Data values stored in matrix slots.
//!
//! # Invariants
//! - `DataValue` is a closed set; every consumer matches it exhaustively.
//! - Values carry no back-pointer to their slot; the owning `Matrix` binds
//!   position `i` to formal argument `i`.

use super::predicate::Predicate;
use super::time::TimeStamp;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

// No leading/trailing whitespace, none of `()<>|,;"`, no control characters.
static NOMINAL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^[^\s()<>|,;"\p{Cc}](?:[^()<>|,;"\p{Cc}]*[^\s()<>|,;"\p{Cc}])?$"#)
        .expect("valid nominal regex")
});

/// Value held by one slot of a matrix.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum DataValue {
    #[default]
    Undefined,
    Text(String),
    Nominal(String),
    Integer(i64),
    Float(f64),
    TimeStamp(TimeStamp),
    Predicate(Predicate),
}

/// Tag of a `DataValue`, used in diagnostics and admissibility checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    Undefined,
    Text,
    Nominal,
    Integer,
    Float,
    TimeStamp,
    Predicate,
}

impl Display for ValueKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Undefined => "undefined",
            Self::Text => "text",
            Self::Nominal => "nominal",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::TimeStamp => "time stamp",
            Self::Predicate => "predicate",
        };
        f.write_str(label)
    }
}

impl DataValue {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    pub fn nominal(value: impl Into<String>) -> Self {
        Self::Nominal(value.into())
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Undefined => ValueKind::Undefined,
            Self::Text(_) => ValueKind::Text,
            Self::Nominal(_) => ValueKind::Nominal,
            Self::Integer(_) => ValueKind::Integer,
            Self::Float(_) => ValueKind::Float,
            Self::TimeStamp(_) => ValueKind::TimeStamp,
            Self::Predicate(_) => ValueKind::Predicate,
        }
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Self::Undefined)
    }

    /// Undefined values and unset predicates both render as the slot
    /// placeholder.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Undefined => true,
            Self::Predicate(predicate) => !predicate.is_set(),
            Self::Text(_)
            | Self::Nominal(_)
            | Self::Integer(_)
            | Self::Float(_)
            | Self::TimeStamp(_) => false,
        }
    }

    /// Short label for diagnostics; predicates are named by id.
    pub fn label(&self) -> String {
        match self {
            Self::Undefined => "undefined".to_string(),
            Self::Text(text) => text.clone(),
            Self::Nominal(nominal) => nominal.clone(),
            Self::Integer(value) => value.to_string(),
            Self::Float(value) => value.to_string(),
            Self::TimeStamp(ts) => ts.to_string(),
            Self::Predicate(predicate) => format!("predicate {}", predicate.pve_id()),
        }
    }
}

/// Nominals are non-empty, trimmed, and free of reserved punctuation.
pub fn is_valid_nominal(value: &str) -> bool {
    NOMINAL_RE.is_match(value)
}

/// Text values may hold anything except control characters (tab allowed).
pub fn is_valid_text(value: &str) -> bool {
    value.chars().all(|ch| ch == '\t' || !ch.is_control())
}
