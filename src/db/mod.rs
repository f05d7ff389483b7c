//! SQLite persistence.
//!
//! One connection guarded by a mutex. Every model maps onto a table through
//! [`Record`], and [`repo`] provides the generic CRUD on top of it.
//!
//! ## Layout
//!
//! - `schema` - DDL and schema version
//! - `record` - the row mapping trait and column helpers
//! - `repo` - transactional list/get/insert/update/delete
//! - `tables` - one `Record` impl per entity, with its write hooks
//! - `queries` - reads and writes that do not fit the generic repository
//! - `bootstrap` - first-run administrator

pub mod bootstrap;
pub mod queries;
pub mod record;
pub mod repo;
pub mod schema;
pub mod tables;
#[cfg(test)]
pub(crate) mod test_support;

use std::sync::{Mutex, MutexGuard, PoisonError};

use rusqlite::Connection;
use tracing::{debug, info, warn};

use crate::error::AppResult;

pub use record::{Record, WriteContext};

/// Path that selects an in-memory database.
pub const IN_MEMORY: &str = ":memory:";

/// The application database.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Opens (or creates) the database file at `path`.
    ///
    /// `":memory:"` opens a private in-memory database.
    pub fn open(path: &str) -> AppResult<Self> {
        if path == IN_MEMORY {
            return Self::open_in_memory();
        }
        info!(path, "Opening SQLite database");
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        Self::from_connection(conn)
    }

    /// Opens an empty in-memory database.
    pub fn open_in_memory() -> AppResult<Self> {
        debug!("Opening in-memory SQLite database");
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> AppResult<Self> {
        schema::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Locks the connection, recovering it if a panic poisoned the mutex.
    ///
    /// An unfinished transaction has already rolled back on drop.
    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|poisoned: PoisonError<_>| {
            warn!("Recovering database connection after a panic");
            self.conn.clear_poison();
            poisoned.into_inner()
        })
    }

    /// Runs `f` with shared access to the connection.
    pub fn with_conn<F, T>(&self, f: F) -> AppResult<T>
    where
        F: FnOnce(&Connection) -> AppResult<T>,
    {
        let conn = self.lock();
        f(&conn)
    }

    /// Runs `f` with exclusive access, for transactions.
    pub fn with_conn_mut<F, T>(&self, f: F) -> AppResult<T>
    where
        F: FnOnce(&mut Connection) -> AppResult<T>,
    {
        let mut conn = self.lock();
        f(&mut conn)
    }
}
