use rusqlite::Connection;
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::errors::MirrorError;

const SCHEMA_SQL: &str = include_str!("../../sql/schema.sql");

/// Owns the single SQLite connection used by a run.
///
/// A run has exactly one caller, so the connection sits behind a `RefCell`
/// rather than a lock.
pub struct Database {
    path: PathBuf,
    conn: RefCell<Connection>,
}

impl Database {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, MirrorError> {
        let path = path.as_ref().to_path_buf();
        let conn = Connection::open(&path)
            .map_err(|e| MirrorError::Db(format!("Open DB failed: {e}")))?;
        Ok(Self {
            path,
            conn: RefCell::new(conn),
        })
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self, MirrorError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| MirrorError::Db(format!("Open DB failed: {e}")))?;
        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn: RefCell::new(conn),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Provides a mutable connection to the closure.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T, MirrorError>
    where
        F: FnOnce(&mut Connection) -> Result<T, MirrorError>,
    {
        let mut conn = self
            .conn
            .try_borrow_mut()
            .map_err(|_| MirrorError::Db("connection already in use".into()))?;
        f(&mut *conn)
    }
}

/// Applies the embedded schema. Safe to call on every start.
pub fn init_db(db: &Database) -> Result<(), MirrorError> {
    db.with_conn(|conn| {
        conn.execute_batch(SCHEMA_SQL)
            .map_err(|e| MirrorError::Db(format!("Failed to apply schema: {e}")))?;
        Ok(())
    })?;

    info!(path = %db.path().display(), "database initialized");
    Ok(())
}
