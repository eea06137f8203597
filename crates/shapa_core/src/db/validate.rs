//! Deep validation of matrices against the live vocabulary.

use super::database::Database;
use super::DbResult;
use crate::model::error::ValidationError;
use crate::model::matrix::Matrix;
use crate::model::value::DataValue;

impl Database {
    /// Checks `matrix` and every nested predicate against the current
    /// vocabulary. The matrix's own schema snapshot is not trusted.
    ///
    /// # Errors
    /// - `VocabElementNotFound` / `UnknownPredicate` for unresolvable ids.
    /// - `ArityMismatch` when a length differs from the live arity.
    /// - `WrongVocabElement` when a predicate's matrix is bound elsewhere.
    /// - Slot errors from `FormalArgument::check_value`.
    pub fn validate_matrix(&self, matrix: &Matrix) -> DbResult<()> {
        let element = self.get_vocab_element(matrix.vocab_id())?;
        if matrix.len() != element.arity() {
            return Err(ValidationError::ArityMismatch {
                vocab_id: element.id(),
                expected: element.arity(),
                found: matrix.len(),
            }
            .into());
        }

        for (arg, value) in element.formal_args().iter().zip(matrix.values()) {
            arg.check_value(value)?;
            if let DataValue::Predicate(predicate) = value {
                if !predicate.is_set() {
                    if !predicate.args().is_empty() {
                        return Err(ValidationError::ArityMismatch {
                            vocab_id: predicate.pve_id(),
                            expected: 0,
                            found: predicate.arity(),
                        }
                        .into());
                    }
                    continue;
                }
                self.predicate_target(predicate.pve_id())?;
                if predicate.args().vocab_id() != predicate.pve_id() {
                    return Err(ValidationError::WrongVocabElement {
                        expected: predicate.pve_id(),
                        found: predicate.args().vocab_id(),
                    }
                    .into());
                }
                self.validate_matrix(predicate.args())?;
            }
        }
        Ok(())
    }

    /// Refreshes the schema snapshot of an already validated matrix, and of
    /// every nested predicate, to the live formal arguments.
    pub(super) fn bind_to_live_schema(&self, matrix: &mut Matrix) {
        if let Some(element) = self.vocab.get(&matrix.vocab_id()) {
            if element.formal_args().len() == matrix.len() {
                matrix.set_formal_args(element.formal_args().to_vec());
            }
        }
        for value in matrix.values_mut() {
            if let DataValue::Predicate(predicate) = value {
                if predicate.is_set() {
                    self.bind_to_live_schema(predicate.args_mut());
                }
            }
        }
    }
}
