//! Configuration loading and management.
//!
//! This module loads the service settings (server, database, logging,
//! workflow and bootstrap options) from a YAML file.
//!
//! # Example
//!
//! ```no_run
//! use pmmis::config::ConfigLoader;
//!
//! let config = ConfigLoader::load("./config/pmmis.yaml").unwrap();
//! println!("Database: {}", config.database_path());
//! ```

mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::{
    AppConfig, BootstrapSettings, DatabaseSettings, LoggingSettings, ReportSettings,
    ServerSettings, WorkflowSettings,
};
