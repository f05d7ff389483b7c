//! Application state for the PMMIS API.
//!
//! This module defines the shared application state that is available
//! to all request handlers.

use std::sync::Arc;

use rusqlite::Connection;

use crate::config::ConfigLoader;
use crate::db::Database;
use crate::error::{AppError, AppResult};

/// Shared application state.
///
/// Contains the loaded settings and the database, both shared across all
/// request handlers.
#[derive(Clone)]
pub struct AppState {
    /// The loaded service configuration.
    config: Arc<ConfigLoader>,
    /// The application database.
    db: Arc<Database>,
}

impl AppState {
    /// Creates a new application state.
    pub fn new(config: ConfigLoader, db: Database) -> Self {
        Self {
            config: Arc::new(config),
            db: Arc::new(db),
        }
    }

    /// Returns a reference to the configuration loader.
    pub fn config(&self) -> &ConfigLoader {
        &self.config
    }

    /// Returns a reference to the database.
    pub fn db(&self) -> &Database {
        &self.db
    }

    /// Runs `f` against the database on the blocking thread pool.
    pub async fn run<F, T>(&self, f: F) -> AppResult<T>
    where
        F: FnOnce(&mut Connection) -> AppResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || db.with_conn_mut(f))
            .await
            .map_err(|e| AppError::Database {
                message: format!("database task failed: {}", e),
            })?
    }
}
