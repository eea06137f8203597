//! Database handle: columns, cells and lookups.
//!
//! # Responsibility
//! - Create, replace and delete cells; keep cells ordered inside a column.
//! - Resolve vocabulary elements for editors and persistence callers.
//!
//! # Invariants
//! - Cells of a column are sorted by `(onset, id)` and `ord` is 1-based.
//! - Every live entity has exactly one index entry, and vice versa.
//! - `replace_cell` is the only path that commits edited cell values.

use super::cascade::rebind_matrix;
use super::index::{EntityKind, IdIndex, IndexEntry};
use super::{DbError, DbResult, InvariantError, ReferenceError};
use crate::config::DatabaseConfig;
use crate::model::cell::DataCell;
use crate::model::error::ValidationError;
use crate::model::id::{Id, INVALID_ID};
use crate::model::matrix::Matrix;
use crate::model::predicate::Predicate;
use crate::model::time::TimeStamp;
use crate::model::vocab::{VocabElement, VocabKind};
use log::{debug, info, warn};
use std::collections::BTreeMap;

/// A column: the cells recorded against one matrix vocabulary element.
#[derive(Debug, Clone)]
pub struct Column {
    pub(super) id: Id,
    pub(super) vocab_id: Id,
    pub(super) cells: Vec<DataCell>,
}

impl Column {
    pub fn id(&self) -> Id {
        self.id
    }

    /// The matrix vocabulary element backing this column.
    pub fn vocab_id(&self) -> Id {
        self.vocab_id
    }

    /// Cells in temporal order.
    pub fn cells(&self) -> &[DataCell] {
        &self.cells
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    fn position_of(&self, cell_id: Id) -> Option<usize> {
        self.cells.iter().position(|cell| cell.id() == cell_id)
    }

    pub(super) fn sort_cells(&mut self) {
        self.cells.sort_by_key(|cell| (cell.onset(), cell.id()));
        for (position, cell) in self.cells.iter_mut().enumerate() {
            cell.set_ord(position + 1);
        }
    }
}

/// Single source of truth for one annotation project.
#[derive(Debug, Clone, Default)]
pub struct Database {
    pub(super) config: DatabaseConfig,
    pub(super) index: IdIndex,
    pub(super) vocab: BTreeMap<Id, VocabElement>,
    pub(super) columns: BTreeMap<Id, Column>,
}

impl Database {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: DatabaseConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    pub fn index(&self) -> &IdIndex {
        &self.index
    }

    // ----- cells -------------------------------------------------------

    /// Creates an all-Undefined cell in `column_id`.
    ///
    /// # Errors
    /// - `ColumnNotFound` for an unknown column.
    /// - `InvalidInterval` when `offset < onset`; no cell is created.
    pub fn create_cell(
        &mut self,
        column_id: Id,
        onset: TimeStamp,
        offset: TimeStamp,
    ) -> DbResult<Id> {
        let vocab_id = match self.column(column_id) {
            Ok(column) => column.vocab_id,
            Err(err) => return Err(self.reject("cell_create", err)),
        };
        if offset < onset {
            return Err(self.reject(
                "cell_create",
                ValidationError::InvalidInterval { onset, offset }.into(),
            ));
        }
        let matrix = Matrix::new(self.vocab_entry(vocab_id)?);

        let cell_id = self
            .index
            .register(IndexEntry::new(EntityKind::Cell, column_id));
        let cell = DataCell::new(cell_id, column_id, onset, offset, matrix)?;
        let column = self.column_entry_mut(column_id)?;
        column.cells.push(cell);
        column.sort_cells();

        debug!(
            "event=cell_create module=db status=ok cell_id={cell_id} column_id={column_id} onset={onset} offset={offset}"
        );
        Ok(cell_id)
    }

    /// Returns a detached copy of one cell.
    pub fn get_cell(&self, cell_id: Id) -> DbResult<DataCell> {
        let (column_id, position) = self.locate_cell(cell_id)?;
        Ok(self.column_entry(column_id)?.cells[position].clone())
    }

    /// Commits an edited cell copy.
    ///
    /// Checks, before anything is written: the cell and its column exist, the
    /// matrix is bound to the column's element with its current arity, every
    /// slot (and nested predicate, at any depth) fits the live vocabulary,
    /// and `onset <= offset`. The stored cell is then replaced as a whole and
    /// the column re-sorted.
    pub fn replace_cell(&mut self, cell: &DataCell) -> DbResult<()> {
        if let Err(err) = self.check_cell_replacement(cell) {
            return Err(self.reject("cell_replace", err));
        }

        let mut stored = cell.clone();
        self.bind_to_live_schema(stored.matrix_mut());
        let (column_id, position) = self.locate_cell(cell.id())?;
        let column = self.column_entry_mut(column_id)?;
        column.cells[position] = stored;
        column.sort_cells();

        debug!(
            "event=cell_replace module=db status=ok cell_id={} column_id={column_id}",
            cell.id()
        );
        Ok(())
    }

    pub fn delete_cell(&mut self, cell_id: Id) -> DbResult<()> {
        let (column_id, position) = self.locate_cell(cell_id)?;
        self.index.unregister(cell_id)?;
        let column = self.column_entry_mut(column_id)?;
        column.cells.remove(position);
        column.sort_cells();

        debug!("event=cell_delete module=db status=ok cell_id={cell_id} column_id={column_id}");
        Ok(())
    }

    // ----- columns -----------------------------------------------------

    pub fn column(&self, column_id: Id) -> DbResult<&Column> {
        match self.index.get(column_id) {
            Some(entry) if entry.kind == EntityKind::Column => self.column_entry(column_id),
            _ => Err(ReferenceError::ColumnNotFound(column_id).into()),
        }
    }

    /// Columns in creation order.
    pub fn columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.values()
    }

    /// Column backed by the matrix vocabulary element `vocab_id`.
    pub fn column_of_mve(&self, vocab_id: Id) -> Option<Id> {
        self.columns
            .values()
            .find(|column| column.vocab_id == vocab_id)
            .map(|column| column.id)
    }

    pub fn column_by_name(&self, name: &str) -> Option<&Column> {
        self.columns.values().find(|column| {
            self.vocab
                .get(&column.vocab_id)
                .is_some_and(|element| element.name() == name)
        })
    }

    pub fn cell_count(&self, column_id: Id) -> DbResult<usize> {
        Ok(self.column(column_id)?.len())
    }

    /// Cell ids of a column in temporal order.
    pub fn cell_ids(&self, column_id: Id) -> DbResult<Vec<Id>> {
        Ok(self
            .column(column_id)?
            .cells
            .iter()
            .map(DataCell::id)
            .collect())
    }

    /// Deletes a column, its cells and its backing vocabulary element.
    pub fn delete_column(&mut self, column_id: Id) -> DbResult<()> {
        let column = self.column(column_id)?;
        let vocab_id = column.vocab_id;
        let cell_ids = column.cells.iter().map(DataCell::id).collect::<Vec<_>>();
        let arg_ids = self
            .vocab_entry(vocab_id)?
            .formal_args()
            .iter()
            .map(|arg| arg.id())
            .collect::<Vec<_>>();

        let mut owned_ids = cell_ids.clone();
        owned_ids.extend(arg_ids);
        owned_ids.extend([column_id, vocab_id]);
        self.unregister_all(&owned_ids)?;
        self.columns.remove(&column_id);
        self.vocab.remove(&vocab_id);

        info!(
            "event=column_delete module=db status=ok column_id={column_id} vocab_id={vocab_id} cells={}",
            cell_ids.len()
        );
        Ok(())
    }

    /// Visits every column with its backing element, in creation order.
    pub fn for_each_column<F>(&self, mut visit: F) -> DbResult<()>
    where
        F: FnMut(&Column, &VocabElement),
    {
        for column in self.columns.values() {
            visit(column, self.vocab_entry(column.vocab_id)?);
        }
        Ok(())
    }

    /// Visits the cells of one column in temporal order.
    pub fn for_each_cell<F>(&self, column_id: Id, visit: F) -> DbResult<()>
    where
        F: FnMut(&DataCell),
    {
        self.column(column_id)?.cells.iter().for_each(visit);
        Ok(())
    }

    // ----- vocabulary lookups -------------------------------------------

    pub fn get_vocab_element(&self, vocab_id: Id) -> DbResult<&VocabElement> {
        self.vocab
            .get(&vocab_id)
            .ok_or_else(|| ReferenceError::VocabElementNotFound(vocab_id).into())
    }

    pub fn get_matrix_ve(&self, vocab_id: Id) -> DbResult<&VocabElement> {
        self.vocab_of_kind(vocab_id, VocabKind::Matrix)
    }

    pub fn get_pred_ve(&self, vocab_id: Id) -> DbResult<&VocabElement> {
        self.vocab_of_kind(vocab_id, VocabKind::Predicate)
    }

    /// Predicate elements in creation order.
    pub fn get_pred_ves(&self) -> Vec<&VocabElement> {
        self.vocab
            .values()
            .filter(|element| element.kind() == VocabKind::Predicate)
            .collect()
    }

    pub fn find_pred_ve_by_name(&self, name: &str) -> Option<&VocabElement> {
        self.vocab
            .values()
            .find(|element| element.kind() == VocabKind::Predicate && element.name() == name)
    }

    /// Fresh all-Undefined matrix for any vocabulary element.
    pub fn new_matrix(&self, vocab_id: Id) -> DbResult<Matrix> {
        Ok(Matrix::new(self.get_vocab_element(vocab_id)?))
    }

    /// Fresh predicate bound to `pve_id` with all arguments Undefined.
    pub fn new_predicate(&self, pve_id: Id) -> DbResult<Predicate> {
        let element = self.predicate_target(pve_id)?;
        Ok(Predicate::for_element(element)?)
    }

    /// Points `predicate` at another predicate element.
    ///
    /// With `clear_args` the arguments restart all Undefined; otherwise the
    /// previous arguments are coerced slot by slot onto the new element.
    /// `INVALID_ID` unsets the predicate.
    ///
    /// # Errors
    /// - `UnknownPredicate` when `pve_id` names no predicate element; the
    ///   predicate is left as it was.
    pub fn set_predicate_id(
        &self,
        predicate: &mut Predicate,
        pve_id: Id,
        clear_args: bool,
    ) -> DbResult<()> {
        if pve_id == INVALID_ID {
            *predicate = Predicate::unset();
            return Ok(());
        }
        let element = self.predicate_target(pve_id)?;
        let args = if clear_args {
            Matrix::new(element)
        } else {
            rebind_matrix(predicate.args(), element, &self.config.coercion)
        };
        predicate.rebind(pve_id, args);
        Ok(())
    }

    // ----- internals -----------------------------------------------------

    /// Logs a rejected mutation and hands the error back.
    pub(super) fn reject(&self, event: &str, err: DbError) -> DbError {
        warn!(
            "event={event} module=db status=error error_code={} error={err}",
            err.code()
        );
        err
    }

    /// Unregisters `ids` only after every one of them resolved, so a
    /// dangling id leaves the index untouched.
    pub(super) fn unregister_all(&mut self, ids: &[Id]) -> DbResult<()> {
        for id in ids {
            self.index.resolve(*id)?;
        }
        for id in ids {
            self.index.unregister(*id)?;
        }
        Ok(())
    }

    pub(super) fn predicate_target(&self, pve_id: Id) -> DbResult<&VocabElement> {
        match self.vocab.get(&pve_id) {
            Some(element) if element.kind() == VocabKind::Predicate => Ok(element),
            _ => Err(ReferenceError::UnknownPredicate(pve_id).into()),
        }
    }

    /// Element lookup for ids that come from inside the database.
    pub(super) fn vocab_entry(&self, vocab_id: Id) -> DbResult<&VocabElement> {
        self.vocab
            .get(&vocab_id)
            .ok_or_else(|| InvariantError::DanglingId(vocab_id).into())
    }

    pub(super) fn column_entry(&self, column_id: Id) -> DbResult<&Column> {
        self.columns
            .get(&column_id)
            .ok_or_else(|| InvariantError::DanglingId(column_id).into())
    }

    pub(super) fn column_entry_mut(&mut self, column_id: Id) -> DbResult<&mut Column> {
        self.columns
            .get_mut(&column_id)
            .ok_or_else(|| InvariantError::DanglingId(column_id).into())
    }

    pub(super) fn insert_column(&mut self, vocab_id: Id) -> Id {
        let column_id = self
            .index
            .register(IndexEntry::new(EntityKind::Column, vocab_id));
        self.columns.insert(
            column_id,
            Column {
                id: column_id,
                vocab_id,
                cells: Vec::new(),
            },
        );
        column_id
    }

    fn vocab_of_kind(&self, vocab_id: Id, kind: VocabKind) -> DbResult<&VocabElement> {
        let element = self.get_vocab_element(vocab_id)?;
        if element.kind() != kind {
            return Err(ValidationError::KindMismatch {
                id: vocab_id,
                expected: kind,
            }
            .into());
        }
        Ok(element)
    }

    fn locate_cell(&self, cell_id: Id) -> DbResult<(Id, usize)> {
        let entry = match self.index.get(cell_id) {
            Some(entry) if entry.kind == EntityKind::Cell => entry,
            _ => return Err(ReferenceError::CellNotFound(cell_id).into()),
        };
        let position = self
            .column_entry(entry.owner)?
            .position_of(cell_id)
            .ok_or(InvariantError::DanglingId(cell_id))?;
        Ok((entry.owner, position))
    }

    fn check_cell_replacement(&self, cell: &DataCell) -> DbResult<()> {
        let (column_id, _) = self.locate_cell(cell.id())?;
        if column_id != cell.column_id() {
            return Err(ReferenceError::CellColumnMismatch {
                cell_id: cell.id(),
                column_id: cell.column_id(),
            }
            .into());
        }
        let vocab_id = self.column_entry(column_id)?.vocab_id;
        if cell.vocab_id() != vocab_id {
            return Err(ValidationError::WrongVocabElement {
                expected: vocab_id,
                found: cell.vocab_id(),
            }
            .into());
        }
        if cell.offset() < cell.onset() {
            return Err(ValidationError::InvalidInterval {
                onset: cell.onset(),
                offset: cell.offset(),
            }
            .into());
        }
        self.validate_matrix(cell.matrix())
    }
}
