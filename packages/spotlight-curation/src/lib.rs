//! Exhibit curation over search-index documents
//!
//! Curators annotate indexed documents per exhibit: custom fields live in
//! sidecars, tags in exhibit-owned taggings. Every change is projected back
//! onto the index record as field-level updates.
//!
//! # Architecture
//!
//! ```text
//! Catalog ──find──► Document ──update/save──► SidecarService / TagLedger
//!    ▲                  │
//!    │                  └──reindex──► projection::build ──► SearchIndex::write
//!    │
//! ReindexTrigger ◄── TagEvent::Removed
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use spotlight_curation::{Catalog, CurationConfig, Saveable};
//!
//! let config = CurationConfig::from_yaml("spotlight.yaml")?;
//! let (catalog, trigger) = Catalog::from_config(&config)?;
//! tokio::spawn(trigger.run());
//!
//! let exhibit = catalog.exhibits().default_exhibit().await?;
//! let mut document = catalog.find("dq287tq6352").await?;
//! document.update(&exhibit, attributes).await?;
//! ```

pub mod catalog;
pub mod config;
pub mod document;
pub mod error;
pub mod projection;
pub mod reindex;
pub mod sidecar;
pub mod tags;
pub mod telemetry;

pub use catalog::{Catalog, CatalogParts};
pub use config::{ConfigError, CurationConfig};
pub use document::{Document, Identifiable, ProjectionBuilder, Saveable};
pub use error::{CurationError, Result};
pub use projection::{solr_field_for_tagger, tags_to_solr};
pub use reindex::ReindexTrigger;
pub use sidecar::SidecarService;
pub use tags::{TagEvent, TagLedger, TagList};
pub use telemetry::init_tracing;
