//! Curation context
//!
//! `Catalog` wires the side-table stores, the search index and the tag
//! ledger together. Documents are looked up through it and keep a handle
//! back to it.
//!
//! ```text
//! Catalog::new ──► (Arc<Catalog>, ReindexTrigger)
//!        │                 ▲
//!        └── TagLedger ── TagEvent (mpsc) ──┘
//! ```

use spotlight_index::{InMemoryIndex, SearchIndex, TantivyIndex};
use spotlight_storage::{
    Exhibit, ExhibitId, ExhibitStore, InMemorySpotlightStore, MastheadUploader, Search, SearchStore,
    SidecarStore, SqliteSpotlightStore, TaggingStore,
};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::config::{ConfigError, CurationConfig, IndexBackend, StorageBackend};
use crate::document::{Document, Saveable};
use crate::error::{CurationError, Result};
use crate::reindex::ReindexTrigger;
use crate::sidecar::SidecarService;
use crate::tags::TagLedger;

pub struct Catalog {
    exhibits: Arc<dyn ExhibitStore>,
    searches: Arc<dyn SearchStore>,
    sidecars: SidecarService,
    ledger: TagLedger,
    index: Arc<dyn SearchIndex>,
    uploader: MastheadUploader,
}

/// Store handles a catalog is assembled from
pub struct CatalogParts {
    pub exhibits: Arc<dyn ExhibitStore>,
    pub searches: Arc<dyn SearchStore>,
    pub sidecars: Arc<dyn SidecarStore>,
    pub taggings: Arc<dyn TaggingStore>,
    pub index: Arc<dyn SearchIndex>,
    pub uploader: MastheadUploader,
}

impl CatalogParts {
    /// Every side-table served by one store
    pub fn from_store<S>(store: Arc<S>, index: Arc<dyn SearchIndex>) -> Self
    where
        S: ExhibitStore + SearchStore + SidecarStore + TaggingStore + 'static,
    {
        Self {
            exhibits: store.clone(),
            searches: store.clone(),
            sidecars: store.clone(),
            taggings: store,
            index,
            uploader: MastheadUploader::default(),
        }
    }

    pub fn with_uploader(mut self, uploader: MastheadUploader) -> Self {
        self.uploader = uploader;
        self
    }
}

impl Catalog {
    /// Build the catalog and the trigger that reindexes documents after
    /// tag removals. Run the trigger with `tokio::spawn(trigger.run())`
    /// or call `drain` to process pending events in place.
    pub fn new(parts: CatalogParts) -> (Arc<Self>, ReindexTrigger) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        let catalog = Arc::new(Self {
            exhibits: parts.exhibits,
            searches: parts.searches,
            sidecars: SidecarService::new(parts.sidecars),
            ledger: TagLedger::new(parts.taggings).with_events(events_tx),
            index: parts.index,
            uploader: parts.uploader,
        });
        let trigger = ReindexTrigger::new(Arc::downgrade(&catalog), events_rx);

        (catalog, trigger)
    }

    /// All in memory (tests, previews)
    pub fn in_memory() -> (Arc<Self>, ReindexTrigger) {
        Self::new(CatalogParts::from_store(
            Arc::new(InMemorySpotlightStore::new()),
            Arc::new(InMemoryIndex::new()),
        ))
    }

    /// Install logging, then open the backends named in `config`
    pub fn from_config(config: &CurationConfig) -> Result<(Arc<Self>, ReindexTrigger)> {
        if !config.init_logging()? {
            debug!("tracing subscriber already installed; logging.filter not applied");
        }

        let index: Arc<dyn SearchIndex> = match config.index.backend {
            IndexBackend::Memory => Arc::new(InMemoryIndex::new()),
            IndexBackend::Tantivy => {
                let path = config.index.path.as_deref().ok_or_else(|| ConfigError::MissingField {
                    section: "index".to_string(),
                    field: "path".to_string(),
                    hint: "The tantivy backend needs an index directory.".to_string(),
                })?;
                Arc::new(
                    TantivyIndex::open(path, config.index.writer_heap_bytes)
                        .map_err(|e| ConfigError::backend("tantivy", e))?,
                )
            }
        };

        let uploader = MastheadUploader::new(config.uploads.storage, &config.uploads.asset_root);

        let parts = match config.storage.backend {
            StorageBackend::Memory => {
                CatalogParts::from_store(Arc::new(InMemorySpotlightStore::new()), index)
            }
            StorageBackend::Sqlite => {
                let path = config.storage.path.as_deref().ok_or_else(|| ConfigError::MissingField {
                    section: "storage".to_string(),
                    field: "path".to_string(),
                    hint: "The sqlite backend needs a database file.".to_string(),
                })?;
                let store =
                    SqliteSpotlightStore::new(path).map_err(|e| ConfigError::backend("sqlite", e))?;
                CatalogParts::from_store(Arc::new(store), index)
            }
        };

        info!(
            storage = ?config.storage.backend,
            index = ?config.index.backend,
            "curation catalog opened"
        );
        Ok(Self::new(parts.with_uploader(uploader)))
    }

    /// Load a document from the index
    pub async fn find(self: &Arc<Self>, id: &str) -> Result<Document> {
        match self.index.find(id).await {
            Ok(record) => Ok(Document::new(Arc::clone(self), record)),
            Err(e) if e.is_not_found() => Err(CurationError::DocumentNotFound(id.to_string())),
            Err(e) => Err(e.into()),
        }
    }

    /// Recompute and write a document's projection.
    ///
    /// A document that is no longer indexed is skipped.
    pub async fn reindex(self: &Arc<Self>, id: &str) -> Result<()> {
        match self.find(id).await {
            Ok(mut document) => document.reindex().await,
            Err(CurationError::DocumentNotFound(_)) => {
                debug!(document_id = id, "reindex skipped; document not in index");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Reindex every document an exhibit has tagged
    pub async fn reindex_exhibit(self: &Arc<Self>, exhibit: &Exhibit) -> Result<usize> {
        let documents = self.ledger.documents_tagged_by(exhibit.id).await?;
        for id in &documents {
            self.reindex(id).await?;
        }
        info!(exhibit_id = exhibit.id, documents = documents.len(), "exhibit reindexed");
        Ok(documents.len())
    }

    /// Look an exhibit up by ID
    ///
    /// Fails with `ErrorKind::ExhibitNotFound` when there is none.
    pub async fn exhibit(&self, exhibit_id: ExhibitId) -> Result<Exhibit> {
        Ok(self.exhibits.require_exhibit(exhibit_id).await?)
    }

    /// Exhibit's browse categories, ordered by weight
    pub async fn browse_categories(&self, exhibit: &Exhibit) -> Result<Vec<Search>> {
        Ok(self.searches.searches_for_exhibit(exhibit.id).await?)
    }

    /// Browse categories shown on the exhibit's landing page
    pub async fn landing_page_categories(&self, exhibit: &Exhibit) -> Result<Vec<Search>> {
        Ok(self.searches.landing_page_searches(exhibit.id).await?)
    }

    pub fn exhibits(&self) -> &dyn ExhibitStore {
        self.exhibits.as_ref()
    }

    pub fn searches(&self) -> &dyn SearchStore {
        self.searches.as_ref()
    }

    pub fn sidecars(&self) -> &SidecarService {
        &self.sidecars
    }

    pub fn ledger(&self) -> &TagLedger {
        &self.ledger
    }

    pub fn index(&self) -> &dyn SearchIndex {
        self.index.as_ref()
    }

    pub fn uploader(&self) -> &MastheadUploader {
        &self.uploader
    }
}
