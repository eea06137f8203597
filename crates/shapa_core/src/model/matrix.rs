//! Ordered value tuple bound to one vocabulary element.
//!
//! # Invariants
//! - `values.len() == formal_args.len()`.
//! - `values[i]` satisfies `formal_args[i]` or is Undefined.
//! - `formal_args` is the schema the matrix was last bound to; the database
//!   re-validates against the live schema on every commit.

use super::error::ValidationError;
use super::id::{Id, INVALID_ID};
use super::value::DataValue;
use super::vocab::{FormalArgument, VocabElement};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "MatrixParts")]
pub struct Matrix {
    vocab_id: Id,
    formal_args: Vec<FormalArgument>,
    values: Vec<DataValue>,
}

/// Wire form of a `Matrix` before the length invariant is checked.
#[derive(Deserialize)]
struct MatrixParts {
    vocab_id: Id,
    formal_args: Vec<FormalArgument>,
    values: Vec<DataValue>,
}

impl TryFrom<MatrixParts> for Matrix {
    type Error = ValidationError;

    fn try_from(parts: MatrixParts) -> Result<Self, Self::Error> {
        if parts.formal_args.len() != parts.values.len() {
            return Err(ValidationError::ArityMismatch {
                vocab_id: parts.vocab_id,
                expected: parts.formal_args.len(),
                found: parts.values.len(),
            });
        }
        Ok(Self {
            vocab_id: parts.vocab_id,
            formal_args: parts.formal_args,
            values: parts.values,
        })
    }
}

impl Matrix {
    /// Allocates one Undefined slot per formal argument of `element`.
    pub fn new(element: &VocabElement) -> Self {
        Self {
            vocab_id: element.id(),
            formal_args: element.formal_args().to_vec(),
            values: vec![DataValue::Undefined; element.arity()],
        }
    }

    /// Matrix of an unset predicate.
    pub fn empty() -> Self {
        Self {
            vocab_id: INVALID_ID,
            formal_args: Vec::new(),
            values: Vec::new(),
        }
    }

    pub(crate) fn from_parts(
        vocab_id: Id,
        formal_args: Vec<FormalArgument>,
        values: Vec<DataValue>,
    ) -> Self {
        debug_assert_eq!(formal_args.len(), values.len());
        Self {
            vocab_id,
            formal_args,
            values,
        }
    }

    pub fn vocab_id(&self) -> Id {
        self.vocab_id
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn formal_args(&self) -> &[FormalArgument] {
        &self.formal_args
    }

    pub fn values(&self) -> &[DataValue] {
        &self.values
    }

    /// Borrowed view of one slot.
    pub fn arg(&self, index: usize) -> Option<&DataValue> {
        self.values.get(index)
    }

    /// Returns an independent deep copy of one slot.
    pub fn arg_copy(&self, index: usize) -> Result<DataValue, ValidationError> {
        self.values
            .get(index)
            .cloned()
            .ok_or(ValidationError::IndexOutOfRange {
                index,
                len: self.values.len(),
            })
    }

    /// Replaces one slot after checking the value against its formal argument.
    ///
    /// # Errors
    /// - `IndexOutOfRange` for a bad index.
    /// - `TypeMismatch`, `ValueOutOfRange`, `InvalidValue` from the slot check.
    ///   The matrix is unchanged on error.
    pub fn replace_arg(&mut self, index: usize, value: DataValue) -> Result<(), ValidationError> {
        let len = self.values.len();
        let out_of_range = ValidationError::IndexOutOfRange { index, len };
        let arg = self.formal_args.get(index).ok_or(out_of_range.clone())?;
        arg.check_value(&value)?;
        let slot = self.values.get_mut(index).ok_or(out_of_range)?;
        *slot = value;
        Ok(())
    }

    pub(crate) fn values_mut(&mut self) -> &mut [DataValue] {
        &mut self.values
    }

    pub(crate) fn set_formal_args(&mut self, formal_args: Vec<FormalArgument>) {
        debug_assert_eq!(formal_args.len(), self.values.len());
        self.formal_args = formal_args;
    }
}

#[cfg(test)]
mod tests {
    use super::Matrix;
    use crate::model::error::ValidationError;
    use crate::model::value::DataValue;
    use crate::model::vocab::{ArgConstraint, ArgType, ColumnType, FormalArgument, VocabElement};

    fn two_slot_element() -> VocabElement {
        let mut element = VocabElement::new_matrix("gesture", ColumnType::Matrix).unwrap();
        element
            .insert_formal_arg(0, FormalArgument::new("hand", ArgType::Nominal).unwrap())
            .unwrap();
        let count = FormalArgument::new("count", ArgType::Integer)
            .unwrap()
            .with_constraint(ArgConstraint::IntRange { min: 0, max: 10 })
            .unwrap();
        element.insert_formal_arg(1, count).unwrap();
        element
    }

    #[test]
    fn new_matrix_is_all_undefined() {
        let matrix = Matrix::new(&two_slot_element());
        assert_eq!(matrix.len(), 2);
        assert!(matrix.values().iter().all(DataValue::is_undefined));
    }

    #[test]
    fn replace_arg_checks_type_and_range() {
        let mut matrix = Matrix::new(&two_slot_element());

        let err = matrix.replace_arg(0, DataValue::Integer(3)).unwrap_err();
        assert!(matches!(err, ValidationError::TypeMismatch { .. }));

        let err = matrix.replace_arg(1, DataValue::Integer(11)).unwrap_err();
        assert!(matches!(err, ValidationError::ValueOutOfRange { .. }));

        let err = matrix.replace_arg(2, DataValue::Undefined).unwrap_err();
        assert_eq!(err, ValidationError::IndexOutOfRange { index: 2, len: 2 });

        matrix.replace_arg(1, DataValue::Integer(4)).unwrap();
        assert_eq!(matrix.arg(1), Some(&DataValue::Integer(4)));
        assert!(matrix.arg(0).unwrap().is_undefined());
    }

    #[test]
    fn arg_copy_is_detached_from_matrix() {
        let mut matrix = Matrix::new(&two_slot_element());
        matrix.replace_arg(0, DataValue::nominal("left")).unwrap();

        let mut copy = matrix.arg_copy(0).unwrap();
        if let DataValue::Nominal(text) = &mut copy {
            text.push_str("ish");
        }
        assert_eq!(matrix.arg(0), Some(&DataValue::nominal("left")));

        let unchanged = matrix.arg_copy(0).unwrap();
        matrix.replace_arg(0, unchanged).unwrap();
        assert_eq!(matrix.arg(0), Some(&DataValue::nominal("left")));
    }
}
