//! Error types for zakat.
//!
//! This module defines all error types used throughout the zakat crate and
//! maps each of them onto the small set of failure classes the console
//! reports to the operator.

use std::path::PathBuf;
use thiserror::Error;

use crate::validate::ValidationError;

/// The main error type for zakat operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Storage Errors ===
    /// Failed to open or create the database.
    #[error("failed to open database at {path}: {source}")]
    DatabaseOpen {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// A database query failed.
    #[error("database query failed: {0}")]
    DatabaseQuery(#[from] rusqlite::Error),

    /// Failed to run database migrations.
    #[error("database migration failed: {message}")]
    DatabaseMigration {
        /// Description of what went wrong.
        message: String,
    },

    // === Record Errors ===
    /// Input did not pass validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A referenced record does not exist.
    #[error("no {entity} found with ID {id}")]
    NotFound {
        /// Kind of record that was looked up.
        entity: &'static str,
        /// The identifier that was not found.
        id: i64,
    },

    /// A donation still has distributions referencing it.
    #[error("donation {id} has {count} distribution(s) and cannot be deleted")]
    HasDistributions {
        /// The donation identifier.
        id: i64,
        /// Number of dependent distributions.
        count: i64,
    },

    /// A rice type with this name already exists.
    #[error("rice type '{name}' already exists")]
    DuplicateName {
        /// The conflicting name.
        name: String,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === Output Errors ===
    /// Writing an export file failed.
    #[error("failed to write {path}: {message}")]
    Export {
        /// Path of the file being written.
        path: PathBuf,
        /// Description of what went wrong.
        message: String,
    },

    /// CSV serialization failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },
}

/// A specialized Result type for zakat operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Failure classes shown to the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// The database could not be reached.
    Connection,
    /// Input was rejected; the operator can try again.
    Validation,
    /// A read or write against the database failed and was rolled back.
    Write,
    /// An export or backup file could not be written.
    FileOutput,
    /// Anything else.
    Unexpected,
}

impl std::fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Connection => write!(f, "connection error"),
            Self::Validation => write!(f, "validation error"),
            Self::Write => write!(f, "database error"),
            Self::FileOutput => write!(f, "file error"),
            Self::Unexpected => write!(f, "unexpected error"),
        }
    }
}

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a not-found error for the given entity.
    #[must_use]
    pub fn not_found(entity: &'static str, id: i64) -> Self {
        Self::NotFound { entity, id }
    }

    /// Create an export error for the given file.
    #[must_use]
    pub fn export(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Export {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Classify this error for reporting.
    #[must_use]
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::DatabaseOpen { .. } => ErrorClass::Connection,
            Self::Validation(_)
            | Self::NotFound { .. }
            | Self::HasDistributions { .. }
            | Self::DuplicateName { .. } => ErrorClass::Validation,
            Self::DatabaseQuery(_) | Self::DatabaseMigration { .. } => ErrorClass::Write,
            Self::Export { .. } | Self::Csv(_) | Self::Io(_) | Self::DirectoryCreate { .. } => {
                ErrorClass::FileOutput
            }
            Self::ConfigLoad(_) | Self::ConfigValidation { .. } => ErrorClass::Unexpected,
        }
    }

    /// Check if this error means a referenced record is missing.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
