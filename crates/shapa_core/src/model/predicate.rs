//! Predicate values: a predicate element reference plus its argument matrix.
//!
//! Predicates nest through `DataValue::Predicate`. Values are owned, so the
//! structure is always a finite tree.

use super::error::ValidationError;
use super::id::{Id, INVALID_ID};
use super::matrix::Matrix;
use super::value::DataValue;
use super::vocab::{VocabElement, VocabKind};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Predicate {
    pve_id: Id,
    args: Matrix,
}

impl Predicate {
    /// Predicate with no target element and no arguments.
    pub fn unset() -> Self {
        Self {
            pve_id: INVALID_ID,
            args: Matrix::empty(),
        }
    }

    /// Predicate bound to `element` with all arguments Undefined.
    pub fn for_element(element: &VocabElement) -> Result<Self, ValidationError> {
        if element.kind() != VocabKind::Predicate {
            return Err(ValidationError::KindMismatch {
                id: element.id(),
                expected: VocabKind::Predicate,
            });
        }
        Ok(Self {
            pve_id: element.id(),
            args: Matrix::new(element),
        })
    }

    pub fn pve_id(&self) -> Id {
        self.pve_id
    }

    pub fn is_set(&self) -> bool {
        self.pve_id.is_valid()
    }

    pub fn args(&self) -> &Matrix {
        &self.args
    }

    pub fn arity(&self) -> usize {
        self.args.len()
    }

    pub fn arg_copy(&self, index: usize) -> Result<DataValue, ValidationError> {
        self.args.arg_copy(index)
    }

    pub fn replace_arg(&mut self, index: usize, value: DataValue) -> Result<(), ValidationError> {
        self.args.replace_arg(index, value)
    }

    pub(crate) fn rebind(&mut self, pve_id: Id, args: Matrix) {
        self.pve_id = pve_id;
        self.args = args;
    }

    pub(crate) fn args_mut(&mut self) -> &mut Matrix {
        &mut self.args
    }
}

impl Default for Predicate {
    fn default() -> Self {
        Self::unset()
    }
}
