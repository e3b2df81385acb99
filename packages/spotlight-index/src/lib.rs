//! Search index collaborator
//!
//! Documents live in the search index; curation only reads them and pushes
//! field-level projections back. This crate provides the `SearchIndex` port
//! and two adapters.
//!
//! # Examples
//!
//! ```rust,ignore
//! use spotlight_index::{InMemoryIndex, IndexRecord, SearchIndex};
//!
//! let index = InMemoryIndex::new();
//! index.add(&IndexRecord::new("dq287tq6352")).await?;
//! index.write(&projection).await?;
//! ```

pub mod error;
pub mod memory;
pub mod ports;
pub mod record;

#[cfg(feature = "tantivy")]
pub mod schema;
#[cfg(feature = "tantivy")]
pub mod tantivy_index;

pub use error::{IndexError, IndexResult};
pub use memory::InMemoryIndex;
pub use ports::SearchIndex;
pub use record::{field_matches, FieldMap, IndexRecord, ID_FIELD};

#[cfg(feature = "tantivy")]
pub use tantivy_index::{TantivyIndex, DEFAULT_WRITER_HEAP_BYTES};
