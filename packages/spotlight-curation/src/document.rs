//! Index document with curation behavior
//!
//! A `Document` wraps one record fetched from the search index. Exhibit
//! curation state (sidecars, tags, visibility) is kept in the side-tables;
//! `reindex` projects that state back onto the record.
//!
//! ```text
//! update(exhibit, attrs) ─┬─ "sidecar"          → merge + save sidecar
//!                         └─ "exhibit_tag_list" → stage tags → save()
//! save()    → flush staged tags → reindex()
//! reindex() → to_solr() → SearchIndex::write
//! ```

use async_trait::async_trait;
use serde_json::Value;
use spotlight_index::{FieldMap, IndexRecord};
use spotlight_storage::{Exhibit, ExhibitId, Sidecar};
use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::catalog::Catalog;
use crate::error::{CurationError, Result};
use crate::projection;
use crate::tags::TagList;

/// Attribute carrying sidecar fields in `update`
pub const SIDECAR_ATTRIBUTE: &str = "sidecar";
/// Attribute carrying the exhibit's tag list in `update`
pub const TAG_LIST_ATTRIBUTE: &str = "exhibit_tag_list";

/// Identity and lifecycle of a persisted model
pub trait Identifiable {
    /// Key parts identifying the record
    fn to_key(&self) -> Vec<String>;

    fn is_persisted(&self) -> bool {
        true
    }

    fn is_destroyed(&self) -> bool {
        false
    }

    fn is_new_record(&self) -> bool {
        !self.is_persisted()
    }
}

#[async_trait]
pub trait Saveable: Identifiable {
    /// Persist pending changes, then reindex
    async fn save(&mut self) -> Result<()>;

    /// Push current state to the search index. Does nothing unless the
    /// model has an index projection.
    async fn reindex(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Field-level index projection of a model
#[async_trait]
pub trait ProjectionBuilder {
    async fn to_solr(&self) -> Result<FieldMap>;
}

pub struct Document {
    record: IndexRecord,
    catalog: Arc<Catalog>,

    /// Loaded or initialized sidecars, one per exhibit
    sidecars: HashMap<ExhibitId, Sidecar>,

    /// Owned tag lists staged by `update`, flushed by `save`
    staged_tags: BTreeMap<ExhibitId, TagList>,
}

impl Document {
    pub fn new(catalog: Arc<Catalog>, record: IndexRecord) -> Self {
        Self {
            record,
            catalog,
            sidecars: HashMap::new(),
            staged_tags: BTreeMap::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.record.id
    }

    /// Indexed fields as last loaded or written
    pub fn record(&self) -> &IndexRecord {
        &self.record
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.record.get(field)
    }

    /// This document's sidecar in `exhibit`, loaded or initialized once per
    /// exhibit and then reused.
    pub async fn sidecar(&mut self, exhibit: &Exhibit) -> Result<&mut Sidecar> {
        match self.sidecars.entry(exhibit.id) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let sidecar = self
                    .catalog
                    .sidecars()
                    .find_or_initialize(&self.record.id, exhibit.id)
                    .await?;
                Ok(entry.insert(sidecar))
            }
        }
    }

    /// Every stored sidecar for this document (fresh query)
    pub async fn sidecars(&self) -> Result<Vec<Sidecar>> {
        self.catalog.sidecars().for_document(&self.record.id).await
    }

    /// Apply curator changes for one exhibit.
    ///
    /// `"sidecar"` (an object) is merged into the exhibit's sidecar and
    /// saved. `"exhibit_tag_list"` (a string or list of strings) replaces
    /// the exhibit's tags and saves the document, which reindexes it.
    /// Other keys are ignored.
    pub async fn update(&mut self, exhibit: &Exhibit, mut attributes: FieldMap) -> Result<()> {
        let custom_data = match attributes.remove(SIDECAR_ATTRIBUTE) {
            None | Some(Value::Null) => None,
            Some(Value::Object(fields)) => Some(fields),
            Some(_) => {
                return Err(CurationError::invalid_attribute(
                    SIDECAR_ATTRIBUTE,
                    "expected an object of field values",
                ))
            }
        };
        let tags = match attributes.remove(TAG_LIST_ATTRIBUTE) {
            None | Some(Value::Null) => None,
            Some(value) => Some(TagList::from_value(TAG_LIST_ATTRIBUTE, &value)?),
        };

        for key in attributes.keys() {
            debug!(document_id = %self.record.id, key = %key, "ignoring unsupported attribute");
        }

        if let Some(fields) = custom_data {
            let catalog = Arc::clone(&self.catalog);
            let sidecar = self.sidecar(exhibit).await?;
            sidecar.merge_data(fields);
            *sidecar = catalog.sidecars().save(sidecar).await?;
        }

        if let Some(tags) = tags {
            self.staged_tags.insert(exhibit.id, tags);
            self.save().await?;
        }

        Ok(())
    }

    pub async fn make_public(&mut self, exhibit: &Exhibit) -> Result<()> {
        self.set_visibility(exhibit, true).await
    }

    pub async fn make_private(&mut self, exhibit: &Exhibit) -> Result<()> {
        self.set_visibility(exhibit, false).await
    }

    pub async fn is_private(&mut self, exhibit: &Exhibit) -> Result<bool> {
        Ok(!self.sidecar(exhibit).await?.is_public())
    }

    async fn set_visibility(&mut self, exhibit: &Exhibit, public: bool) -> Result<()> {
        let catalog = Arc::clone(&self.catalog);
        let sidecar = self.sidecar(exhibit).await?;
        sidecar.public = Some(public);
        *sidecar = catalog.sidecars().save(sidecar).await?;
        Ok(())
    }

    /// Tag names `exhibit` placed on this document
    pub async fn owned_tags(&self, exhibit: &Exhibit) -> Result<Vec<String>> {
        self.catalog.ledger().tags_on(&self.record.id, exhibit.id).await
    }

    async fn flush_staged_tags(&mut self) -> Result<()> {
        let staged = std::mem::take(&mut self.staged_tags);
        for (exhibit_id, tags) in staged {
            self.catalog
                .ledger()
                .replace_tags(&self.record.id, exhibit_id, &tags)
                .await?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("record", &self.record)
            .field("sidecars", &self.sidecars)
            .field("staged_tags", &self.staged_tags)
            .finish_non_exhaustive()
    }
}

impl Identifiable for Document {
    fn to_key(&self) -> Vec<String> {
        vec![self.record.id.clone()]
    }
}

#[async_trait]
impl Saveable for Document {
    async fn save(&mut self) -> Result<()> {
        self.flush_staged_tags().await?;
        self.reindex().await
    }

    async fn reindex(&mut self) -> Result<()> {
        let fields = self.to_solr().await?;

        match self.catalog.index().write(&fields).await {
            Ok(()) => {
                self.record.apply(&fields);
                info!(document_id = %self.record.id, fields = fields.len(), "document reindexed");
                Ok(())
            }
            // Removed from the index since it was loaded
            Err(e) if e.is_not_found() => {
                debug!(document_id = %self.record.id, "reindex skipped; document not in index");
                Ok(())
            }
            Err(e) => {
                warn!(document_id = %self.record.id, error = %e, "reindex failed");
                Err(e.into())
            }
        }
    }
}

#[async_trait]
impl ProjectionBuilder for Document {
    async fn to_solr(&self) -> Result<FieldMap> {
        let sidecars = self.sidecars().await?;
        let taggings = self.catalog.ledger().taggings_for(&self.record.id).await?;
        let exhibits = self.catalog.exhibits().list_exhibits().await?;

        Ok(projection::build(
            &self.record.id,
            &sidecars,
            &taggings,
            &exhibits,
        ))
    }
}
