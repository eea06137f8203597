//! Core annotation database for time-coded observational coding.
//! This crate is the single source of truth for vocabulary and cell invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;

pub use config::{CoercionMode, CoercionPolicy, DatabaseConfig, RangePolicy};
pub use db::{
    CellRecord, Column, Database, DbError, DbResult, EntityKind, IdIndex, IndexEntry,
    InvariantError, ReferenceError, SharedDatabase,
};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::cell::DataCell;
pub use model::error::ValidationError;
pub use model::id::{Id, INVALID_ID};
pub use model::matrix::Matrix;
pub use model::predicate::Predicate;
pub use model::time::TimeStamp;
pub use model::value::{DataValue, ValueKind};
pub use model::vocab::{
    ArgConstraint, ArgType, ColumnType, FormalArgument, VocabElement, VocabKind,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
