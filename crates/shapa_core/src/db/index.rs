//! Identifier index.
//!
//! # Responsibility
//! - Issue ids and remember what kind of entity each live id names.
//!
//! # Invariants
//! - Issued ids increase monotonically and are never reused, even after
//!   `unregister`.
//! - Resolving or unregistering an unknown id is an invariant breach
//!   (`DanglingId`); callers that accept ids from outside use `get` first.

use super::InvariantError;
use crate::model::id::Id;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Column,
    Cell,
    MatrixVocab,
    PredicateVocab,
    FormalArgument,
}

/// What a live id names, and who owns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexEntry {
    pub kind: EntityKind,
    /// Column of a cell, element of a formal argument, backing element of a
    /// column. `INVALID_ID` for vocabulary elements.
    pub owner: Id,
}

impl IndexEntry {
    pub fn new(kind: EntityKind, owner: Id) -> Self {
        Self { kind, owner }
    }
}

#[derive(Debug, Clone)]
pub struct IdIndex {
    last_issued: i64,
    entries: HashMap<Id, IndexEntry>,
}

impl Default for IdIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl IdIndex {
    pub fn new() -> Self {
        Self {
            last_issued: 0,
            entries: HashMap::new(),
        }
    }

    /// Issues a fresh id without recording an entry.
    pub fn next_id(&mut self) -> Id {
        self.last_issued += 1;
        Id::from_raw(self.last_issued)
    }

    /// Issues a fresh id and records `entry` under it.
    pub fn register(&mut self, entry: IndexEntry) -> Id {
        let id = self.next_id();
        self.entries.insert(id, entry);
        id
    }

    /// Records `entry` under a caller-chosen id, e.g. when rebuilding from a
    /// snapshot. Later issued ids continue past it.
    pub fn register_with_id(&mut self, id: Id, entry: IndexEntry) -> Result<(), InvariantError> {
        if !id.is_valid() {
            return Err(InvariantError::InvalidId(id));
        }
        if self.entries.contains_key(&id) {
            return Err(InvariantError::DuplicateId(id));
        }
        self.entries.insert(id, entry);
        self.last_issued = self.last_issued.max(id.raw());
        Ok(())
    }

    pub fn resolve(&self, id: Id) -> Result<IndexEntry, InvariantError> {
        self.entries
            .get(&id)
            .copied()
            .ok_or(InvariantError::DanglingId(id))
    }

    pub fn get(&self, id: Id) -> Option<IndexEntry> {
        self.entries.get(&id).copied()
    }

    pub fn contains(&self, id: Id) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn unregister(&mut self, id: Id) -> Result<IndexEntry, InvariantError> {
        self.entries
            .remove(&id)
            .ok_or(InvariantError::DanglingId(id))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
