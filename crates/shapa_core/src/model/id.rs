//! Entity identifiers.
//!
//! # Invariants
//! - Ids are unique within one `Database` and never reused after deletion.
//! - `INVALID_ID` never names a live entity; it marks an unbound reference.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Opaque identifier of a cell, column, vocabulary element or formal argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Id(i64);

/// Sentinel for "not bound to any entity".
pub const INVALID_ID: Id = Id(0);

impl Id {
    /// Wraps a raw id value, e.g. one read back by a persistence layer.
    pub const fn from_raw(raw: i64) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> i64 {
        self.0
    }

    /// Returns whether this id can name a live entity.
    pub const fn is_valid(self) -> bool {
        self.0 > 0
    }
}

impl Default for Id {
    fn default() -> Self {
        INVALID_ID
    }
}

impl Display for Id {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
