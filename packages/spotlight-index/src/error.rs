//! Index error types

use thiserror::Error;

/// Search index error
#[derive(Debug, Error)]
pub enum IndexError {
    /// No record with this ID exists in the index
    #[error("Document not found: {0}")]
    NotFound(String),

    /// Malformed request (missing id, bad field value, ...)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Stored record could not be (de)serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Backend failure
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl IndexError {
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound(id.into())
    }

    pub fn internal<E: std::fmt::Display>(e: E) -> Self {
        Self::InternalError(e.to_string())
    }

    /// True for the "no such document" condition callers may swallow
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

#[cfg(feature = "tantivy")]
impl From<tantivy::TantivyError> for IndexError {
    fn from(err: tantivy::TantivyError) -> Self {
        Self::InternalError(format!("tantivy: {}", err))
    }
}

/// Index result type
pub type IndexResult<T> = std::result::Result<T, IndexError>;
