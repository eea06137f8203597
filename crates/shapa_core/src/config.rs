//! Database configuration.
//!
//! # Responsibility
//! - Carry the coercion policy applied when vocabulary edits cascade into
//!   stored values, or when a predicate is rebound without clearing.
//!
//! # Invariants
//! - The default policy keeps every value that still fits its slot and turns
//!   everything else into Undefined; nothing is clamped unless asked for.

use serde::{Deserialize, Serialize};

/// How values move across a slot whose type changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoercionMode {
    /// Convert where the coercion table allows it.
    #[default]
    BestEffort,
    /// Every retyped slot becomes Undefined.
    AlwaysUndefined,
}

/// What happens to a numeric value outside the new slot range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RangePolicy {
    Clamp,
    #[default]
    Undefined,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoercionPolicy {
    #[serde(default)]
    pub mode: CoercionMode,
    #[serde(default)]
    pub out_of_range: RangePolicy,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub coercion: CoercionPolicy,
}
