//! Storage Ports (Trait Interfaces)
//!
//! Port/Adapter pattern for backend flexibility:
//! - Development/Production: SQLite
//! - Testing: InMemory (fast unit tests)

use async_trait::async_trait;

use super::models::{
    DocumentId, Exhibit, ExhibitId, NewExhibit, Search, Sidecar, Tag, Tagging,
};
use crate::error::{Result, StorageError};

/// Exhibit Store Port
#[async_trait]
pub trait ExhibitStore: Send + Sync {
    /// Insert a new exhibit and assign its ID
    ///
    /// # Errors
    ///
    /// `ErrorKind::Conflict` if the slug is taken
    async fn create_exhibit(&self, exhibit: &NewExhibit) -> Result<Exhibit>;

    /// Get exhibit by ID
    async fn get_exhibit(&self, exhibit_id: ExhibitId) -> Result<Option<Exhibit>>;

    /// Get exhibit by ID, failing when it does not exist
    ///
    /// # Errors
    ///
    /// `ErrorKind::ExhibitNotFound` if no exhibit has this ID
    async fn require_exhibit(&self, exhibit_id: ExhibitId) -> Result<Exhibit> {
        self.get_exhibit(exhibit_id)
            .await?
            .ok_or_else(|| StorageError::exhibit_not_found(exhibit_id))
    }

    /// Get exhibit by slug
    async fn find_exhibit_by_slug(&self, slug: &str) -> Result<Option<Exhibit>>;

    /// Every exhibit in the system, ordered by ID
    async fn list_exhibits(&self) -> Result<Vec<Exhibit>>;

    /// Find or create the exhibit with slug [`Exhibit::DEFAULT_SLUG`]
    async fn default_exhibit(&self) -> Result<Exhibit> {
        if let Some(exhibit) = self.find_exhibit_by_slug(Exhibit::DEFAULT_SLUG).await? {
            return Ok(exhibit);
        }

        let new = NewExhibit::new(Exhibit::DEFAULT_SLUG, "Default exhibit");
        match self.create_exhibit(&new).await {
            Ok(exhibit) => Ok(exhibit),
            Err(e) if e.is_conflict() => self
                .find_exhibit_by_slug(Exhibit::DEFAULT_SLUG)
                .await?
                .ok_or(e),
            Err(e) => Err(e),
        }
    }
}

/// Sidecar Store Port
///
/// At most one sidecar exists per `(document_id, exhibit_id)`; the store
/// enforces this and reports a duplicate insert as `ErrorKind::Conflict`.
#[async_trait]
pub trait SidecarStore: Send + Sync {
    /// Get the sidecar for a document in an exhibit
    async fn find_sidecar(
        &self,
        document_id: &str,
        exhibit_id: ExhibitId,
    ) -> Result<Option<Sidecar>>;

    /// Insert an unsaved sidecar; returns it with its ID assigned
    async fn insert_sidecar(&self, sidecar: &Sidecar) -> Result<Sidecar>;

    /// Overwrite a persisted sidecar's data and visibility
    ///
    /// # Errors
    ///
    /// `ErrorKind::SidecarNotFound` if the row does not exist
    async fn update_sidecar(&self, sidecar: &Sidecar) -> Result<Sidecar>;

    /// All sidecars for a document across exhibits (no ordering guarantee)
    async fn sidecars_for_document(&self, document_id: &str) -> Result<Vec<Sidecar>>;
}

/// Tagging Store Port
///
/// Taggings are returned in insertion order.
#[async_trait]
pub trait TaggingStore: Send + Sync {
    /// Look up a tag by name, creating it if needed
    async fn find_or_create_tag(&self, name: &str) -> Result<Tag>;

    /// Attach `tag` to a document on behalf of an exhibit
    ///
    /// # Errors
    ///
    /// `ErrorKind::Conflict` if the exhibit already tagged the document
    /// with this tag
    async fn add_tagging(
        &self,
        tag: &Tag,
        taggable_id: &str,
        tagger_id: ExhibitId,
    ) -> Result<Tagging>;

    /// Delete a tagging; returns the removed row, if any
    async fn remove_tagging(&self, tagging_id: i64) -> Result<Option<Tagging>>;

    /// All taggings on a document (every tagger)
    async fn taggings_for(&self, taggable_id: &str) -> Result<Vec<Tagging>>;

    /// Taggings on a document owned by one exhibit
    async fn owner_taggings(
        &self,
        taggable_id: &str,
        tagger_id: ExhibitId,
    ) -> Result<Vec<Tagging>>;

    /// All taggings made by one exhibit
    async fn taggings_by_tagger(&self, tagger_id: ExhibitId) -> Result<Vec<Tagging>>;
}

/// Browse Search Store Port
#[async_trait]
pub trait SearchStore: Send + Sync {
    /// Insert (id None) or update a search
    async fn save_search(&self, search: &Search) -> Result<Search>;

    /// Get search by ID
    async fn get_search(&self, search_id: i64) -> Result<Option<Search>>;

    /// Searches of an exhibit ordered by weight, then ID
    async fn searches_for_exhibit(&self, exhibit_id: ExhibitId) -> Result<Vec<Search>>;

    /// Delete a search
    ///
    /// # Errors
    ///
    /// `ErrorKind::SearchNotFound` if the row does not exist
    async fn delete_search(&self, search_id: i64) -> Result<()>;

    /// Searches flagged for the exhibit landing page, in browse order
    async fn landing_page_searches(&self, exhibit_id: ExhibitId) -> Result<Vec<Search>> {
        Ok(self
            .searches_for_exhibit(exhibit_id)
            .await?
            .into_iter()
            .filter(|s| s.on_landing_page)
            .collect())
    }
}

/// Convenience alias for a document's tag names in ledger order
pub fn tag_names(taggings: &[Tagging]) -> Vec<String> {
    taggings.iter().map(|t| t.tag.name.clone()).collect()
}

/// IDs of the distinct documents among `taggings`, first-seen order
pub fn taggable_ids(taggings: &[Tagging]) -> Vec<DocumentId> {
    let mut ids: Vec<DocumentId> = Vec::new();
    for tagging in taggings {
        if !ids.contains(&tagging.taggable_id) {
            ids.push(tagging.taggable_id.clone());
        }
    }
    ids
}
