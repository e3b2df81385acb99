//! Error types for spotlight-storage

use std::fmt;
use thiserror::Error;

/// Storage error kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Database errors (SQLite)
    Database,
    /// Serialization/deserialization errors
    Serialization,
    /// Uniqueness constraint violated (duplicate key)
    Conflict,
    /// Exhibit not found
    ExhibitNotFound,
    /// Sidecar not found
    SidecarNotFound,
    /// Browse search not found
    SearchNotFound,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Database => "database",
            ErrorKind::Serialization => "serialization",
            ErrorKind::Conflict => "conflict",
            ErrorKind::ExhibitNotFound => "exhibit_not_found",
            ErrorKind::SidecarNotFound => "sidecar_not_found",
            ErrorKind::SearchNotFound => "search_not_found",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Storage error type
#[derive(Debug, Error)]
#[error("[{kind}] {message}")]
pub struct StorageError {
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
    pub kind: ErrorKind,
    pub message: String,
}

impl StorageError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// True when the store rejected a write because the key already exists.
    ///
    /// Sidecar find-or-create relies on this to turn a lost insert race into
    /// a lookup.
    pub fn is_conflict(&self) -> bool {
        self.kind == ErrorKind::Conflict
    }

    // Convenience constructors
    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Database, message)
    }

    pub fn serialization(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Serialization, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, message)
    }

    pub fn exhibit_not_found(exhibit_id: i64) -> Self {
        Self::new(
            ErrorKind::ExhibitNotFound,
            format!("Exhibit not found: {}", exhibit_id),
        )
    }

    pub fn sidecar_not_found(document_id: &str, exhibit_id: i64) -> Self {
        Self::new(
            ErrorKind::SidecarNotFound,
            format!("Sidecar not found: {} (exhibit {})", document_id, exhibit_id),
        )
    }

    pub fn search_not_found(search_id: i64) -> Self {
        Self::new(
            ErrorKind::SearchNotFound,
            format!("Search not found: {}", search_id),
        )
    }
}

// SQLite error conversions
#[cfg(feature = "sqlite")]
impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        let is_constraint = matches!(
            err.sqlite_error_code(),
            Some(rusqlite::ErrorCode::ConstraintViolation)
        );
        if is_constraint {
            StorageError::conflict(format!("SQLite constraint: {}", err)).with_source(err)
        } else {
            StorageError::database(format!("SQLite error: {}", err)).with_source(err)
        }
    }
}

// JSON error conversions
impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::serialization(format!("JSON error: {}", err)).with_source(err)
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, StorageError>;
