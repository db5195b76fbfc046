//! Error types for casebook.
//!
//! This module defines all error types used throughout the casebook crate,
//! providing detailed context for debugging and user-friendly error messages.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for casebook operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Record Errors ===
    /// One or more required fields are missing or malformed.
    #[error("Missing or invalid fields: {}", .fields.join(", "))]
    Validation {
        /// Every offending field, in form order.
        fields: Vec<String>,
    },

    /// An import document failed shape or required-field checks.
    #[error("invalid import document{}: {message}", index_suffix(*.index))]
    Format {
        /// Index of the offending record, if the failure is record-specific.
        index: Option<usize>,
        /// Description of what went wrong.
        message: String,
    },

    /// No record exists under the given id.
    #[error("record not found: {id}")]
    NotFound {
        /// The id that was looked up.
        id: String,
    },

    // === Storage Errors ===
    /// The storage medium rejected a write because of its size limit.
    #[error("storage quota exceeded: write needs {needed} bytes, quota is {quota} bytes")]
    Capacity {
        /// Total bytes the storage would hold after the write.
        needed: u64,
        /// Configured quota in bytes.
        quota: u64,
    },

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

    // === I/O Errors ===
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

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Generic Errors ===
    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

fn index_suffix(index: Option<usize>) -> String {
    index.map_or_else(String::new, |i| format!(" (record at index {i})"))
}

/// A specialized Result type for casebook operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a validation error from a list of offending field names.
    #[must_use]
    pub fn validation<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Validation {
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    /// Create a document-level format error.
    #[must_use]
    pub fn format(message: impl Into<String>) -> Self {
        Self::Format {
            index: None,
            message: message.into(),
        }
    }

    /// Create a format error pointing at one record of the document.
    #[must_use]
    pub fn format_at(index: usize, message: impl Into<String>) -> Self {
        Self::Format {
            index: Some(index),
            message: message.into(),
        }
    }

    /// Create a not-found error.
    #[must_use]
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }

    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Check if this error is a validation rejection.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    /// Check if this error is an import format rejection.
    #[must_use]
    pub fn is_format(&self) -> bool {
        matches!(self, Self::Format { .. })
    }

    /// Check if this error means the storage quota was hit.
    #[must_use]
    pub fn is_capacity(&self) -> bool {
        matches!(self, Self::Capacity { .. })
    }

    /// Check if this error means a record id was unknown.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
