//! Data cell: one time-bounded record of a column.
//!
//! # Responsibility
//! - Hold onset/offset and the value matrix of one annotation.
//! - Reject local edits that break the interval or the matrix binding.
//!
//! # Invariants
//! - `onset <= offset`; both are non-negative by construction of `TimeStamp`.
//! - `matrix.vocab_id()` equals the vocabulary element of the owning column.
//! - `ord` is the 1-based position inside the column, maintained by the
//!   database; edits to a detached copy do not change it.

use super::error::ValidationError;
use super::id::Id;
use super::matrix::Matrix;
use super::time::TimeStamp;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataCell {
    id: Id,
    column_id: Id,
    ord: usize,
    onset: TimeStamp,
    offset: TimeStamp,
    matrix: Matrix,
}

impl DataCell {
    pub(crate) fn new(
        id: Id,
        column_id: Id,
        onset: TimeStamp,
        offset: TimeStamp,
        matrix: Matrix,
    ) -> Result<Self, ValidationError> {
        check_interval(onset, offset)?;
        Ok(Self {
            id,
            column_id,
            ord: 0,
            onset,
            offset,
            matrix,
        })
    }

    pub fn id(&self) -> Id {
        self.id
    }

    pub fn column_id(&self) -> Id {
        self.column_id
    }

    /// Vocabulary element the cell's matrix is bound to.
    pub fn vocab_id(&self) -> Id {
        self.matrix.vocab_id()
    }

    pub fn ord(&self) -> usize {
        self.ord
    }

    pub fn onset(&self) -> TimeStamp {
        self.onset
    }

    pub fn offset(&self) -> TimeStamp {
        self.offset
    }

    pub fn matrix(&self) -> &Matrix {
        &self.matrix
    }

    /// Slot-level edits go through `Matrix::replace_arg`, which keeps the
    /// binding intact.
    pub fn matrix_mut(&mut self) -> &mut Matrix {
        &mut self.matrix
    }

    /// # Errors
    /// - `InvalidInterval` when `onset` would pass the current offset. The
    ///   cell is unchanged.
    pub fn set_onset(&mut self, onset: TimeStamp) -> Result<(), ValidationError> {
        check_interval(onset, self.offset)?;
        self.onset = onset;
        Ok(())
    }

    /// # Errors
    /// - `InvalidInterval` when `offset` would precede the current onset.
    pub fn set_offset(&mut self, offset: TimeStamp) -> Result<(), ValidationError> {
        check_interval(self.onset, offset)?;
        self.offset = offset;
        Ok(())
    }

    /// Moves both ends at once, for shifts that pass the other end.
    pub fn set_interval(
        &mut self,
        onset: TimeStamp,
        offset: TimeStamp,
    ) -> Result<(), ValidationError> {
        check_interval(onset, offset)?;
        self.onset = onset;
        self.offset = offset;
        Ok(())
    }

    /// Replaces the whole matrix.
    ///
    /// # Errors
    /// - `ArityMismatch` when `matrix` is bound to another vocabulary element
    ///   than the cell's column, or has a different length. The cell is
    ///   unchanged.
    pub fn set_val(&mut self, matrix: Matrix) -> Result<(), ValidationError> {
        if matrix.vocab_id() != self.matrix.vocab_id() || matrix.len() != self.matrix.len() {
            return Err(ValidationError::ArityMismatch {
                vocab_id: matrix.vocab_id(),
                expected: self.matrix.len(),
                found: matrix.len(),
            });
        }
        self.matrix = matrix;
        Ok(())
    }

    pub(crate) fn set_ord(&mut self, ord: usize) {
        self.ord = ord;
    }
}

fn check_interval(onset: TimeStamp, offset: TimeStamp) -> Result<(), ValidationError> {
    if offset < onset {
        return Err(ValidationError::InvalidInterval { onset, offset });
    }
    Ok(())
}
