//! Configuration loading functionality.
//!
//! This module provides the [`ConfigLoader`] type for loading service
//! settings from a YAML file.

use std::fs;
use std::net::SocketAddr;
use std::path::Path;

use crate::error::{AppError, AppResult};

use super::types::AppConfig;

/// Loads and provides access to the service configuration.
///
/// # Example
///
/// ```no_run
/// use pmmis::config::ConfigLoader;
///
/// let loader = ConfigLoader::load("./config/pmmis.yaml").unwrap();
/// println!("Listening on {}", loader.bind_address().unwrap());
/// ```
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    config: AppConfig,
}

impl ConfigLoader {
    /// Loads configuration from the specified YAML file.
    ///
    /// # Returns
    ///
    /// Returns a `ConfigLoader` instance on success, or an error if:
    /// - The file is missing
    /// - The file contains invalid YAML or misses a required section
    /// - A value is unusable (bad bind address, empty database path)
    pub fn load<P: AsRef<Path>>(path: P) -> AppResult<Self> {
        let path = path.as_ref();
        let path_str = path.display().to_string();

        let content = fs::read_to_string(path).map_err(|_| AppError::ConfigNotFound {
            path: path_str.clone(),
        })?;

        let config: AppConfig =
            serde_yaml::from_str(&content).map_err(|e| AppError::ConfigParseError {
                path: path_str,
                message: e.to_string(),
            })?;

        Self::from_config(config)
    }

    /// Wraps an already-built configuration after validating it.
    pub fn from_config(config: AppConfig) -> AppResult<Self> {
        let loader = Self { config };
        loader.bind_address()?;
        if loader.config.database.path.trim().is_empty() {
            return Err(AppError::ConfigInvalid {
                field: "database.path".to_string(),
                message: "must not be empty".to_string(),
            });
        }
        if loader.config.bootstrap.admin_username.trim().is_empty() {
            return Err(AppError::ConfigInvalid {
                field: "bootstrap.admin_username".to_string(),
                message: "must not be empty".to_string(),
            });
        }
        Ok(loader)
    }

    /// Returns the underlying configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Replaces the bind address (command-line override).
    pub fn override_bind(&mut self, bind: impl Into<String>) -> AppResult<()> {
        self.config.server.bind = bind.into();
        self.bind_address().map(|_| ())
    }

    /// Replaces the database path (command-line override).
    pub fn override_database(&mut self, path: impl Into<String>) {
        self.config.database.path = path.into();
    }

    /// Parses the configured bind address.
    pub fn bind_address(&self) -> AppResult<SocketAddr> {
        self.config
            .server
            .bind
            .parse()
            .map_err(|e: std::net::AddrParseError| AppError::ConfigInvalid {
                field: "server.bind".to_string(),
                message: e.to_string(),
            })
    }

    /// Returns the database path.
    pub fn database_path(&self) -> &str {
        &self.config.database.path
    }

    /// Whether workflow transitions create notifications.
    pub fn notifications_enabled(&self) -> bool {
        self.config.workflow.notify_on_transition
    }
}
