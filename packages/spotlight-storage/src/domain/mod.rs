//! Storage Domain Layer
//!
//! Port/Adapter pattern for storage backend abstraction

pub mod models;
pub mod ports;

pub use models::{
    DocumentId, Exhibit, ExhibitId, FieldMap, NewExhibit, Search, Sidecar, Tag, Tagging,
    TAG_CONTEXT,
};
pub use ports::{
    tag_names, taggable_ids, ExhibitStore, SearchStore, SidecarStore, TaggingStore,
};
