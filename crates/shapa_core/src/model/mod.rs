//! Typed annotation model.
//!
//! # Responsibility
//! - Define the vocabulary (columns, predicates, formal arguments) and the
//!   values, matrices, predicates and cells constrained by it.
//! - Enforce every invariant that can be checked without the database.
//!
//! # Invariants
//! - Entities refer to each other by `Id`, never by ownership pointer.
//! - Model types never reach into a database; cross-entity checks live in
//!   `crate::db`.

pub mod cell;
pub mod error;
pub mod id;
pub mod matrix;
pub mod predicate;
pub mod time;
pub mod value;
pub mod vocab;
