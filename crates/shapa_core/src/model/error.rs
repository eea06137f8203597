//! Validation failures raised by model types.
//!
//! Every variant is recoverable: the rejected operation mutated nothing and
//! the caller may retry with corrected input.

use super::id::Id;
use super::time::TimeStamp;
use super::value::ValueKind;
use super::vocab::{ArgType, VocabKind};
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Value tag is not admissible for the slot's declared type.
    TypeMismatch {
        arg: String,
        expected: ArgType,
        found: ValueKind,
    },
    /// Numeric value, nominal or predicate outside the slot's constraint.
    ValueOutOfRange { arg: String, value: String },
    /// Value text violates its alphabet or cannot be parsed.
    InvalidValue(String),
    /// Matrix length differs from the arity of its vocabulary element.
    ArityMismatch {
        vocab_id: Id,
        expected: usize,
        found: usize,
    },
    /// Matrix is bound to another vocabulary element than the one required.
    WrongVocabElement { expected: Id, found: Id },
    /// Offset earlier than onset.
    InvalidInterval { onset: TimeStamp, offset: TimeStamp },
    NegativeTimeStamp(i64),
    /// Vocabulary element name already used within its kind.
    DuplicateName { kind: VocabKind, name: String },
    /// Formal argument name already used by a sibling.
    NameCollision(String),
    InvalidName(String),
    IndexOutOfRange { index: usize, len: usize },
    /// Constraint does not fit the declared type, or has `min > max`.
    InvalidConstraint(String),
    /// Single-argument columns cannot gain or lose arguments.
    FixedArity(Id),
    /// Id names a vocabulary element of the other kind.
    KindMismatch { id: Id, expected: VocabKind },
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TypeMismatch {
                arg,
                expected,
                found,
            } => write!(
                f,
                "type mismatch for <{arg}>: expected {expected}, found {found}"
            ),
            Self::ValueOutOfRange { arg, value } => {
                write!(f, "value `{value}` is outside the range of <{arg}>")
            }
            Self::InvalidValue(message) => write!(f, "invalid value: {message}"),
            Self::ArityMismatch {
                vocab_id,
                expected,
                found,
            } => write!(
                f,
                "arity mismatch for vocabulary element {vocab_id}: expected {expected}, found {found}"
            ),
            Self::WrongVocabElement { expected, found } => write!(
                f,
                "matrix bound to vocabulary element {found}, expected {expected}"
            ),
            Self::InvalidInterval { onset, offset } => {
                write!(f, "offset ({offset}) must be >= onset ({onset})")
            }
            Self::NegativeTimeStamp(millis) => {
                write!(f, "time stamp must not be negative, got {millis}")
            }
            Self::DuplicateName { kind, name } => {
                write!(f, "{kind} vocabulary element `{name}` already exists")
            }
            Self::NameCollision(name) => {
                write!(f, "formal argument <{name}> already exists in this element")
            }
            Self::InvalidName(name) => write!(f, "invalid name `{name}`"),
            Self::IndexOutOfRange { index, len } => {
                write!(f, "index {index} out of range for length {len}")
            }
            Self::InvalidConstraint(message) => write!(f, "invalid constraint: {message}"),
            Self::FixedArity(id) => {
                write!(f, "vocabulary element {id} has a fixed single argument")
            }
            Self::KindMismatch { id, expected } => {
                write!(f, "vocabulary element {id} is not a {expected} element")
            }
        }
    }
}

impl Error for ValidationError {}
