//! Configuration types for the service.
//!
//! This module contains the strongly-typed settings structures that are
//! deserialized from the YAML configuration file.

use serde::Deserialize;

use crate::models::Language;

/// HTTP server settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    /// Socket address the API listens on (e.g., "127.0.0.1:8080").
    pub bind: String,
}

/// Database settings.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    /// Path to the SQLite database file.
    pub path: String,
}

/// Logging settings.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    /// Default filter directive when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Approval workflow settings.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkflowSettings {
    /// Whether workflow transitions create notifications.
    #[serde(default = "default_true")]
    pub notify_on_transition: bool,
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self {
            notify_on_transition: true,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Reporting settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReportSettings {
    /// Language used for localized names in reports.
    #[serde(default)]
    pub default_language: Language,
}

/// Settings for creating the first administrator on an empty database.
#[derive(Debug, Clone, Deserialize)]
pub struct BootstrapSettings {
    /// Username of the administrator account.
    pub admin_username: String,
    /// Display name of the administrator account.
    pub admin_full_name: String,
}

impl Default for BootstrapSettings {
    fn default() -> Self {
        Self {
            admin_username: "admin".to_string(),
            admin_full_name: "System Administrator".to_string(),
        }
    }
}

/// The complete service configuration loaded from YAML.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// HTTP server settings.
    pub server: ServerSettings,
    /// Database settings.
    pub database: DatabaseSettings,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingSettings,
    /// Approval workflow settings.
    #[serde(default)]
    pub workflow: WorkflowSettings,
    /// Reporting settings.
    #[serde(default)]
    pub reports: ReportSettings,
    /// First-run administrator settings.
    #[serde(default)]
    pub bootstrap: BootstrapSettings,
}

impl AppConfig {
    /// Settings suitable for tests: in-memory database, notifications on.
    pub fn for_tests() -> Self {
        Self {
            server: ServerSettings {
                bind: "127.0.0.1:0".to_string(),
            },
            database: DatabaseSettings {
                path: ":memory:".to_string(),
            },
            logging: LoggingSettings::default(),
            workflow: WorkflowSettings::default(),
            reports: ReportSettings::default(),
            bootstrap: BootstrapSettings::default(),
        }
    }
}
