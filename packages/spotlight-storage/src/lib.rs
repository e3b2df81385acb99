//! Spotlight curation side-tables
//!
//! The relational state an exhibit layers over search-index documents:
//!
//! - `Exhibit`: curation context and tagger identity
//! - `Sidecar`: per-(document, exhibit) attribute record
//! - `Tag` / `Tagging`: exhibit-scoped tags on documents
//! - `Search`: saved browse categories
//!
//! ## Usage
//!
//! ```rust,ignore
//! use spotlight_storage::{ExhibitStore, SidecarStore, Sidecar, SqliteSpotlightStore};
//!
//! let store = SqliteSpotlightStore::new("spotlight.db")?;
//! let exhibit = store.default_exhibit().await?;
//!
//! let mut sidecar = Sidecar::new("dq287tq6352", exhibit.id);
//! sidecar.merge_data(fields);
//! store.insert_sidecar(&sidecar).await?;
//! ```

pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod uploads;

pub use error::{ErrorKind, Result, StorageError};

pub use domain::{
    tag_names, taggable_ids, DocumentId, Exhibit, ExhibitId, ExhibitStore, FieldMap,
    NewExhibit, Search, SearchStore, Sidecar, SidecarStore, Tag, Tagging, TaggingStore,
    TAG_CONTEXT,
};
pub use infrastructure::{InMemorySpotlightStore, SqliteSpotlightStore};
pub use uploads::{MastheadUploader, UploadStorage};
