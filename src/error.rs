//! Error types for the project management information system.
//!
//! This module provides strongly-typed errors using the `thiserror` crate
//! for every failure the persistence layer, the approval workflow and the
//! HTTP layer can report.

use rusqlite::ffi;
use thiserror::Error;

/// The main error type for the system.
///
/// Every fallible operation returns this error type, so the HTTP layer can
/// map failures to responses in one place.
///
/// # Example
///
/// ```
/// use pmmis::error::AppError;
///
/// let error = AppError::NotFound {
///     entity: "contract".to_string(),
///     id: 42,
/// };
/// assert_eq!(error.to_string(), "contract 42 not found");
/// ```
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration file was not found at the specified path.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Configuration file could not be parsed.
    #[error("Failed to parse configuration file '{path}': {message}")]
    ConfigParseError {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },

    /// Configuration parsed but holds an unusable value.
    #[error("Invalid configuration value '{field}': {message}")]
    ConfigInvalid {
        /// The offending settings key.
        field: String,
        /// Why the value was rejected.
        message: String,
    },

    /// A requested record does not exist.
    #[error("{entity} {id} not found")]
    NotFound {
        /// The kind of record.
        entity: String,
        /// The requested identifier.
        id: i64,
    },

    /// A record failed domain validation.
    #[error("Invalid {entity} field '{field}': {message}")]
    Validation {
        /// The kind of record.
        entity: String,
        /// The field that was invalid.
        field: String,
        /// A description of what made the field invalid.
        message: String,
    },

    /// A write collided with existing data (duplicate key or a live reference).
    #[error("Conflict: {message}")]
    Conflict {
        /// A description of the conflict.
        message: String,
    },

    /// The request carried no usable user identity.
    #[error("Unauthorized: {message}")]
    Unauthorized {
        /// Why the identity was rejected.
        message: String,
    },

    /// The acting user lacks the required permission.
    #[error("User '{username}' may not {action} {resource}")]
    Forbidden {
        /// The acting user.
        username: String,
        /// The attempted action.
        action: String,
        /// The resource the action targeted.
        resource: String,
    },

    /// A workflow action is not allowed from the current approval status.
    #[error("Cannot {action} work progress in status {status}")]
    InvalidTransition {
        /// The attempted workflow action.
        action: String,
        /// The current approval status.
        status: String,
    },

    /// The underlying database failed.
    #[error("Database error: {message}")]
    Database {
        /// A description of the database failure.
        message: String,
    },
}

/// A type alias for Results that return AppError.
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Shorthand for a validation failure on one field.
    pub fn validation(
        entity: impl Into<String>,
        field: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        AppError::Validation {
            entity: entity.into(),
            field: field.into(),
            message: message.into(),
        }
    }

    /// Shorthand for a missing record.
    pub fn not_found(entity: impl Into<String>, id: i64) -> Self {
        AppError::NotFound {
            entity: entity.into(),
            id,
        }
    }
}

impl From<rusqlite::Error> for AppError {
    fn from(error: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(failure, message) = &error {
            let detail = message.clone().unwrap_or_else(|| failure.to_string());
            match failure.extended_code {
                ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
                    return AppError::Conflict {
                        message: format!("duplicate value ({})", detail),
                    };
                }
                ffi::SQLITE_CONSTRAINT_FOREIGNKEY => {
                    return AppError::Conflict {
                        message: "referenced record is missing or still in use".to_string(),
                    };
                }
                ffi::SQLITE_CONSTRAINT_CHECK | ffi::SQLITE_CONSTRAINT_NOTNULL => {
                    return AppError::Validation {
                        entity: "record".to_string(),
                        field: "constraint".to_string(),
                        message: detail,
                    };
                }
                _ => {}
            }
        }
        AppError::Database {
            message: error.to_string(),
        }
    }
}
