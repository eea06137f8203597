//! Vocabulary edits and their cascade.
//!
//! # Responsibility
//! - Create, edit, rename and delete vocabulary elements.
//! - Push every accepted edit into all bound matrices before returning.
//!
//! # Invariants
//! - Every edit is funnelled through `replace_vocab_element`, so the
//!   validate-then-commit and cascade rules live in one place.
//! - Formal arguments keep their id across edits; the cascade joins old and
//!   new shapes by that id.
//! - Deleting a predicate element leaves no value or constraint pointing at it.

use super::cascade::{cascade_matrix, cascade_nested_predicates, invalidate_predicate};
use super::database::Database;
use super::index::{EntityKind, IndexEntry};
use super::{DbResult, InvariantError, ReferenceError};
use crate::model::error::ValidationError;
use crate::model::id::{Id, INVALID_ID};
use crate::model::vocab::{
    ArgConstraint, ArgType, ColumnType, FormalArgument, VocabElement, VocabKind,
};
use log::info;
use std::collections::HashSet;

impl Database {
    /// Creates an empty vocabulary element. A matrix element gets its
    /// free-arity column at the same time.
    ///
    /// # Errors
    /// - `InvalidName` / `DuplicateName` for a bad or taken name.
    pub fn create_vocab_element(
        &mut self,
        name: impl Into<String>,
        kind: VocabKind,
    ) -> DbResult<Id> {
        let element = match kind {
            VocabKind::Matrix => VocabElement::new_matrix(name, ColumnType::Matrix),
            VocabKind::Predicate => VocabElement::new_predicate(name),
        };
        let element = element.map_err(|err| self.reject("vocab_create", err.into()))?;
        let (vocab_id, _) = self.insert_element(element)?;
        Ok(vocab_id)
    }

    /// Creates a column and its backing element; returns the column id.
    pub fn create_column(
        &mut self,
        name: impl Into<String>,
        column_type: ColumnType,
    ) -> DbResult<Id> {
        let element = VocabElement::new_matrix(name, column_type)
            .map_err(|err| self.reject("column_create", err.into()))?;
        let (_, column_id) = self.insert_element(element)?;
        column_id.ok_or_else(|| InvariantError::DanglingId(INVALID_ID).into())
    }

    /// Inserts `arg` at `position` and returns its new id. Existing matrices
    /// gain an Undefined slot there.
    ///
    /// # Errors
    /// - `IndexOutOfRange`, `NameCollision`, `FixedArity`.
    pub fn add_formal_argument(
        &mut self,
        vocab_id: Id,
        position: usize,
        mut arg: FormalArgument,
    ) -> DbResult<Id> {
        arg.assign_id(INVALID_ID);
        self.edit_element(vocab_id, |element| element.insert_formal_arg(position, arg))?;
        Ok(self.vocab_entry(vocab_id)?.formal_arg(position)?.id())
    }

    /// Removes the argument at `position`; matrices lose that slot.
    pub fn remove_formal_argument(&mut self, vocab_id: Id, position: usize) -> DbResult<()> {
        self.edit_element(vocab_id, |element| {
            element.remove_formal_arg(position).map(|_| ())
        })
    }

    /// Retypes one argument; stored values go through the coercion table.
    pub fn set_formal_argument_type(
        &mut self,
        vocab_id: Id,
        position: usize,
        arg_type: ArgType,
        constraint: ArgConstraint,
    ) -> DbResult<()> {
        self.edit_element(vocab_id, |element| {
            element.retype_formal_arg(position, arg_type, constraint)
        })
    }

    pub fn rename_formal_argument(
        &mut self,
        vocab_id: Id,
        position: usize,
        name: impl Into<String>,
    ) -> DbResult<()> {
        self.edit_element(vocab_id, |element| element.rename_formal_arg(position, name))
    }

    /// Renames an element. References join by id, so every rendering picks
    /// the new name up immediately.
    pub fn rename_vocab_element(&mut self, vocab_id: Id, name: impl Into<String>) -> DbResult<()> {
        self.edit_element(vocab_id, |element| element.set_name(name))
    }

    /// Commits an edited copy of a vocabulary element.
    ///
    /// Arguments with `INVALID_ID` are new; arguments with an id must already
    /// belong to this element. Every bound matrix (column cells for matrix
    /// elements, predicate values at any depth for predicate elements) is
    /// reshaped with `cascade_matrix` before this returns.
    pub fn replace_vocab_element(&mut self, edited: VocabElement) -> DbResult<()> {
        if let Err(err) = self.check_vocab_replacement(&edited) {
            return Err(self.reject("vocab_replace", err));
        }

        let vocab_id = edited.id();
        let old = self.vocab_entry(vocab_id)?.clone();
        let mut new = edited;
        let removed_ids = old
            .formal_args()
            .iter()
            .map(FormalArgument::id)
            .filter(|arg_id| new.position_of_arg(*arg_id).is_none())
            .collect::<Vec<_>>();
        self.unregister_all(&removed_ids)?;
        for arg in new.formal_args_mut() {
            if !arg.id().is_valid() {
                let arg_id = self
                    .index
                    .register(IndexEntry::new(EntityKind::FormalArgument, vocab_id));
                arg.assign_id(arg_id);
            }
        }
        self.vocab.insert(vocab_id, new.clone());
        let touched = self.cascade_element(&old, &new);

        info!(
            "event=vocab_replace module=vocab status=ok vocab_id={vocab_id} kind={} arity={} matrices={touched}",
            new.kind(),
            new.arity()
        );
        Ok(())
    }

    /// Deletes a vocabulary element.
    ///
    /// A matrix element takes its column and cells with it. A predicate
    /// element turns every value bound to it into Undefined and is dropped
    /// from all predicate-set constraints.
    pub fn delete_vocab_element(&mut self, vocab_id: Id) -> DbResult<()> {
        let element = self.get_vocab_element(vocab_id)?;
        if element.kind() == VocabKind::Matrix {
            let column_id = self
                .column_of_mve(vocab_id)
                .ok_or(InvariantError::DanglingId(vocab_id))?;
            return self.delete_column(column_id);
        }

        let mut owned_ids = element
            .formal_args()
            .iter()
            .map(FormalArgument::id)
            .collect::<Vec<_>>();
        owned_ids.push(vocab_id);
        self.unregister_all(&owned_ids)?;
        self.vocab.remove(&vocab_id);

        let mut cleared = 0;
        for column in self.columns.values_mut() {
            for cell in column.cells.iter_mut() {
                cleared += invalidate_predicate(cell.matrix_mut(), vocab_id);
            }
        }
        for element in self.vocab.values_mut() {
            for arg in element.formal_args_mut() {
                arg.forget_predicate(vocab_id);
            }
        }

        info!(
            "event=vocab_delete module=vocab status=ok vocab_id={vocab_id} kind=predicate cleared_values={cleared}"
        );
        Ok(())
    }

    fn insert_element(&mut self, mut element: VocabElement) -> DbResult<(Id, Option<Id>)> {
        if let Err(err) = self.ensure_unique_name(element.kind(), element.name(), None) {
            return Err(self.reject("vocab_create", err.into()));
        }

        let entity = match element.kind() {
            VocabKind::Matrix => EntityKind::MatrixVocab,
            VocabKind::Predicate => EntityKind::PredicateVocab,
        };
        let vocab_id = self.index.register(IndexEntry::new(entity, INVALID_ID));
        element.assign_id(vocab_id);
        for arg in element.formal_args_mut() {
            let arg_id = self
                .index
                .register(IndexEntry::new(EntityKind::FormalArgument, vocab_id));
            arg.assign_id(arg_id);
        }

        let kind = element.kind();
        let name = element.name().to_string();
        self.vocab.insert(vocab_id, element);
        let column_id = match kind {
            VocabKind::Matrix => Some(self.insert_column(vocab_id)),
            VocabKind::Predicate => None,
        };

        info!(
            "event=vocab_create module=vocab status=ok vocab_id={vocab_id} kind={kind} name={name}"
        );
        Ok((vocab_id, column_id))
    }

    fn edit_element<F>(&mut self, vocab_id: Id, edit: F) -> DbResult<()>
    where
        F: FnOnce(&mut VocabElement) -> Result<(), ValidationError>,
    {
        let mut edited = self.get_vocab_element(vocab_id)?.clone();
        if let Err(err) = edit(&mut edited) {
            return Err(self.reject("vocab_edit", err.into()));
        }
        self.replace_vocab_element(edited)
    }

    fn ensure_unique_name(
        &self,
        kind: VocabKind,
        name: &str,
        skip: Option<Id>,
    ) -> Result<(), ValidationError> {
        let taken = self.vocab.values().any(|element| {
            element.kind() == kind && element.name() == name && Some(element.id()) != skip
        });
        if taken {
            return Err(ValidationError::DuplicateName {
                kind,
                name: name.to_string(),
            });
        }
        Ok(())
    }

    fn check_vocab_replacement(&self, edited: &VocabElement) -> DbResult<()> {
        let current = self.get_vocab_element(edited.id())?;
        if current.kind() != edited.kind() || current.column_type() != edited.column_type() {
            return Err(ValidationError::KindMismatch {
                id: edited.id(),
                expected: current.kind(),
            }
            .into());
        }
        edited.validate()?;
        self.ensure_unique_name(edited.kind(), edited.name(), Some(edited.id()))?;

        let mut seen = HashSet::new();
        for arg in edited.formal_args() {
            if arg.id().is_valid() {
                let owned = matches!(
                    self.index.get(arg.id()),
                    Some(entry) if entry.kind == EntityKind::FormalArgument && entry.owner == edited.id()
                );
                if !owned {
                    return Err(ReferenceError::FormalArgumentNotFound {
                        vocab_id: edited.id(),
                        arg_id: arg.id(),
                    }
                    .into());
                }
                if !seen.insert(arg.id()) {
                    return Err(InvariantError::DuplicateId(arg.id()).into());
                }
            }
            if let ArgConstraint::PredicateSet { ids } = arg.constraint() {
                for pve_id in ids {
                    self.predicate_target(*pve_id)?;
                }
            }
        }
        Ok(())
    }

    fn cascade_element(&mut self, old: &VocabElement, new: &VocabElement) -> usize {
        let policy = self.config.coercion;
        match new.kind() {
            VocabKind::Matrix => {
                let Some(column) = self
                    .columns
                    .values_mut()
                    .find(|column| column.vocab_id == new.id())
                else {
                    return 0;
                };
                for cell in column.cells.iter_mut() {
                    let reshaped = cascade_matrix(old, new, cell.matrix(), &policy);
                    *cell.matrix_mut() = reshaped;
                }
                column.cells.len()
            }
            VocabKind::Predicate => {
                let mut touched = 0;
                for column in self.columns.values_mut() {
                    for cell in column.cells.iter_mut() {
                        touched += cascade_nested_predicates(cell.matrix_mut(), old, new, &policy);
                    }
                }
                touched
            }
        }
    }
}
