//! Search Index Port
//!
//! The only view this workspace has of the canonical document store.
//! Implementations:
//! - `InMemoryIndex` (tests, embedded use)
//! - `TantivyIndex` (persistent, feature `tantivy`)

use async_trait::async_trait;

use crate::error::IndexResult;
use crate::record::{FieldMap, IndexRecord};

#[async_trait]
pub trait SearchIndex: Send + Sync {
    /// Look up a record by ID
    ///
    /// # Errors
    ///
    /// `IndexError::NotFound` if no record has this ID
    async fn find(&self, id: &str) -> IndexResult<IndexRecord>;

    /// Insert or fully replace a record (ingest)
    async fn add(&self, record: &IndexRecord) -> IndexResult<()>;

    /// Publish a projection as a field-level update of an existing record
    ///
    /// Fields in the projection are set; `null`/empty values remove the
    /// field. Fields absent from the projection are left alone.
    ///
    /// # Errors
    ///
    /// `IndexError::NotFound` if the projection's `id` is not indexed;
    /// `IndexError::InvalidInput` if the projection has no `id`
    async fn write(&self, projection: &FieldMap) -> IndexResult<()>;

    /// Remove a record; removing an unknown ID is not an error
    async fn delete(&self, id: &str) -> IndexResult<()>;

    /// IDs of records whose `field` holds `value`
    async fn find_ids_by_field(&self, field: &str, value: &str) -> IndexResult<Vec<String>>;

    /// Number of records
    async fn count(&self) -> IndexResult<usize>;
}
