//! Thread-safe handle over one database.
//!
//! # Invariants
//! - Readers run concurrently; a writer holds the lock for the whole
//!   mutating call, cascade included.
//! - A poisoned lock is reported as `InvariantError::LockPoisoned`, never
//!   unwrapped.

use super::database::Database;
use super::{DbResult, InvariantError};
use log::error;
use std::sync::{Arc, RwLock};

#[derive(Debug, Clone, Default)]
pub struct SharedDatabase {
    inner: Arc<RwLock<Database>>,
}

impl SharedDatabase {
    pub fn new(database: Database) -> Self {
        Self {
            inner: Arc::new(RwLock::new(database)),
        }
    }

    /// Runs `op` under the shared read lock.
    pub fn read<T, F>(&self, op: F) -> DbResult<T>
    where
        F: FnOnce(&Database) -> DbResult<T>,
    {
        let guard = self.inner.read().map_err(|_| poisoned("db_read"))?;
        op(&guard)
    }

    /// Runs `op` under the exclusive write lock.
    pub fn write<T, F>(&self, op: F) -> DbResult<T>
    where
        F: FnOnce(&mut Database) -> DbResult<T>,
    {
        let mut guard = self.inner.write().map_err(|_| poisoned("db_write"))?;
        op(&mut guard)
    }
}

impl From<Database> for SharedDatabase {
    fn from(database: Database) -> Self {
        Self::new(database)
    }
}

fn poisoned(event: &str) -> InvariantError {
    error!("event={event} module=db status=error error_code=invariant error=lock poisoned");
    InvariantError::LockPoisoned
}
