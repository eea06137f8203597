//! In-process annotation database.
//!
//! # Responsibility
//! - Own the identifier index, the vocabulary and every column with its cells.
//! - Expose the mutation API; every value edit flows through `replace_cell`.
//! - Cascade vocabulary edits into every bound matrix.
//!
//! # Invariants
//! - Mutations validate first and commit second; a rejected call leaves the
//!   database untouched.
//! - Callers only ever hold copies; the database hands out `&` borrows or
//!   clones, never interior references that outlive a call.
//!
//! # See also
//! - `crate::model` for the entity types.

use crate::model::error::ValidationError;
use crate::model::id::Id;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod cascade;
mod database;
pub mod index;
mod render;
mod shared;
mod validate;
mod vocab_ops;

pub use database::{Column, Database};
pub use index::{EntityKind, IdIndex, IndexEntry};
pub use render::CellRecord;
pub use shared::SharedDatabase;

pub type DbResult<T> = Result<T, DbError>;

/// A caller-held id no longer (or never) names a live entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReferenceError {
    CellNotFound(Id),
    ColumnNotFound(Id),
    VocabElementNotFound(Id),
    /// Id does not resolve to a predicate vocabulary element.
    UnknownPredicate(Id),
    /// Formal argument id is not part of the element being replaced.
    FormalArgumentNotFound { vocab_id: Id, arg_id: Id },
    /// Cell copy claims a different column than the stored cell.
    CellColumnMismatch { cell_id: Id, column_id: Id },
}

impl Display for ReferenceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CellNotFound(id) => write!(f, "cell not found: {id}"),
            Self::ColumnNotFound(id) => write!(f, "column not found: {id}"),
            Self::VocabElementNotFound(id) => write!(f, "vocabulary element not found: {id}"),
            Self::UnknownPredicate(id) => write!(f, "unknown predicate: {id}"),
            Self::FormalArgumentNotFound { vocab_id, arg_id } => write!(
                f,
                "formal argument {arg_id} does not belong to vocabulary element {vocab_id}"
            ),
            Self::CellColumnMismatch { cell_id, column_id } => {
                write!(f, "cell {cell_id} does not belong to column {column_id}")
            }
        }
    }
}

impl Error for ReferenceError {}

/// Broken internal bookkeeping. Always a defect, never user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvariantError {
    DuplicateId(Id),
    DanglingId(Id),
    /// Id below the first issuable id.
    InvalidId(Id),
    /// A writer panicked while holding the shared database lock.
    LockPoisoned,
}

impl Display for InvariantError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateId(id) => write!(f, "id already registered: {id}"),
            Self::DanglingId(id) => write!(f, "dangling id: {id}"),
            Self::InvalidId(id) => write!(f, "id cannot be registered: {id}"),
            Self::LockPoisoned => write!(f, "database lock poisoned"),
        }
    }
}

impl Error for InvariantError {}

/// Error returned by every database operation.
#[derive(Debug, Clone, PartialEq)]
pub enum DbError {
    Validation(ValidationError),
    Reference(ReferenceError),
    Invariant(InvariantError),
}

impl DbError {
    /// Validation and reference failures can be retried with corrected input
    /// or a re-fetched id; invariant failures cannot.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Invariant(_))
    }

    /// Stable code for `error_code=` log fields.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Reference(_) => "reference",
            Self::Invariant(_) => "invariant",
        }
    }
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Reference(err) => write!(f, "{err}"),
            Self::Invariant(err) => write!(f, "{err}"),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Reference(err) => Some(err),
            Self::Invariant(err) => Some(err),
        }
    }
}

impl From<ValidationError> for DbError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<ReferenceError> for DbError {
    fn from(value: ReferenceError) -> Self {
        Self::Reference(value)
    }
}

impl From<InvariantError> for DbError {
    fn from(value: InvariantError) -> Self {
        Self::Invariant(value)
    }
}
