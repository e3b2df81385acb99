//! In-Memory Spotlight Store (for testing)
//!
//! Simple HashMap-based implementation of every storage port.
//! Enforces the same uniqueness rules as the SQLite schema.
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::domain::models::{
    Exhibit, ExhibitId, NewExhibit, Search, Sidecar, Tag, Tagging, TAG_CONTEXT,
};
use crate::domain::ports::{ExhibitStore, SearchStore, SidecarStore, TaggingStore};
use crate::error::{Result, StorageError};

#[derive(Default)]
struct Tables {
    exhibits: Vec<Exhibit>,
    sidecars: HashMap<(String, ExhibitId), Sidecar>,
    tags: Vec<Tag>,
    taggings: Vec<Tagging>,
    searches: HashMap<i64, Search>,
    next_id: i64,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Clone, Default)]
pub struct InMemorySpotlightStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemorySpotlightStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>> {
        self.tables
            .read()
            .map_err(|_| StorageError::database("in-memory store lock poisoned"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>> {
        self.tables
            .write()
            .map_err(|_| StorageError::database("in-memory store lock poisoned"))
    }
}

#[async_trait]
impl ExhibitStore for InMemorySpotlightStore {
    async fn create_exhibit(&self, exhibit: &NewExhibit) -> Result<Exhibit> {
        let mut tables = self.write()?;
        if tables.exhibits.iter().any(|e| e.slug == exhibit.slug) {
            return Err(StorageError::conflict(format!(
                "exhibit slug already taken: {}",
                exhibit.slug
            )));
        }
        let id = tables.next_id();
        let created = Exhibit::new(id, exhibit.slug.clone(), exhibit.title.clone());
        tables.exhibits.push(created.clone());
        Ok(created)
    }

    async fn get_exhibit(&self, exhibit_id: ExhibitId) -> Result<Option<Exhibit>> {
        Ok(self
            .read()?
            .exhibits
            .iter()
            .find(|e| e.id == exhibit_id)
            .cloned())
    }

    async fn find_exhibit_by_slug(&self, slug: &str) -> Result<Option<Exhibit>> {
        Ok(self.read()?.exhibits.iter().find(|e| e.slug == slug).cloned())
    }

    async fn list_exhibits(&self) -> Result<Vec<Exhibit>> {
        Ok(self.read()?.exhibits.clone())
    }
}

#[async_trait]
impl SidecarStore for InMemorySpotlightStore {
    async fn find_sidecar(
        &self,
        document_id: &str,
        exhibit_id: ExhibitId,
    ) -> Result<Option<Sidecar>> {
        Ok(self
            .read()?
            .sidecars
            .get(&(document_id.to_string(), exhibit_id))
            .cloned())
    }

    async fn insert_sidecar(&self, sidecar: &Sidecar) -> Result<Sidecar> {
        let mut tables = self.write()?;
        let key = (sidecar.document_id.clone(), sidecar.exhibit_id);
        if tables.sidecars.contains_key(&key) {
            return Err(StorageError::conflict(format!(
                "sidecar already exists: {} (exhibit {})",
                sidecar.document_id, sidecar.exhibit_id
            )));
        }
        let mut stored = sidecar.clone();
        stored.id = Some(tables.next_id());
        tables.sidecars.insert(key, stored.clone());
        Ok(stored)
    }

    async fn update_sidecar(&self, sidecar: &Sidecar) -> Result<Sidecar> {
        let mut tables = self.write()?;
        let key = (sidecar.document_id.clone(), sidecar.exhibit_id);
        match tables.sidecars.get_mut(&key) {
            Some(existing) if sidecar.id.is_some() && existing.id == sidecar.id => {
                existing.data = sidecar.data.clone();
                existing.public = sidecar.public;
                existing.updated_at = Utc::now();
                Ok(existing.clone())
            }
            _ => Err(StorageError::sidecar_not_found(
                &sidecar.document_id,
                sidecar.exhibit_id,
            )),
        }
    }

    async fn sidecars_for_document(&self, document_id: &str) -> Result<Vec<Sidecar>> {
        Ok(self
            .read()?
            .sidecars
            .values()
            .filter(|s| s.document_id == document_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl TaggingStore for InMemorySpotlightStore {
    async fn find_or_create_tag(&self, name: &str) -> Result<Tag> {
        let mut tables = self.write()?;
        if let Some(tag) = tables.tags.iter().find(|t| t.name == name) {
            return Ok(tag.clone());
        }
        let tag = Tag {
            id: tables.next_id(),
            name: name.to_string(),
        };
        tables.tags.push(tag.clone());
        Ok(tag)
    }

    async fn add_tagging(
        &self,
        tag: &Tag,
        taggable_id: &str,
        tagger_id: ExhibitId,
    ) -> Result<Tagging> {
        let mut tables = self.write()?;
        let duplicate = tables.taggings.iter().any(|t| {
            t.tag.id == tag.id && t.taggable_id == taggable_id && t.tagger_id == tagger_id
        });
        if duplicate {
            return Err(StorageError::conflict(format!(
                "tagging already exists: {} on {} (exhibit {})",
                tag.name, taggable_id, tagger_id
            )));
        }
        let tagging = Tagging {
            id: tables.next_id(),
            tag: tag.clone(),
            taggable_id: taggable_id.to_string(),
            tagger_id,
            context: TAG_CONTEXT.to_string(),
            created_at: Utc::now(),
        };
        tables.taggings.push(tagging.clone());
        Ok(tagging)
    }

    async fn remove_tagging(&self, tagging_id: i64) -> Result<Option<Tagging>> {
        let mut tables = self.write()?;
        let position = tables.taggings.iter().position(|t| t.id == tagging_id);
        Ok(position.map(|i| tables.taggings.remove(i)))
    }

    async fn taggings_for(&self, taggable_id: &str) -> Result<Vec<Tagging>> {
        Ok(self
            .read()?
            .taggings
            .iter()
            .filter(|t| t.taggable_id == taggable_id)
            .cloned()
            .collect())
    }

    async fn owner_taggings(
        &self,
        taggable_id: &str,
        tagger_id: ExhibitId,
    ) -> Result<Vec<Tagging>> {
        Ok(self
            .read()?
            .taggings
            .iter()
            .filter(|t| t.taggable_id == taggable_id && t.tagger_id == tagger_id)
            .cloned()
            .collect())
    }

    async fn taggings_by_tagger(&self, tagger_id: ExhibitId) -> Result<Vec<Tagging>> {
        Ok(self
            .read()?
            .taggings
            .iter()
            .filter(|t| t.tagger_id == tagger_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl SearchStore for InMemorySpotlightStore {
    async fn save_search(&self, search: &Search) -> Result<Search> {
        let mut tables = self.write()?;
        let mut stored = search.clone();
        match stored.id {
            Some(id) => {
                if !tables.searches.contains_key(&id) {
                    return Err(StorageError::search_not_found(id));
                }
                stored.updated_at = Utc::now();
            }
            None => stored.id = Some(tables.next_id()),
        }
        if let Some(id) = stored.id {
            tables.searches.insert(id, stored.clone());
        }
        Ok(stored)
    }

    async fn get_search(&self, search_id: i64) -> Result<Option<Search>> {
        Ok(self.read()?.searches.get(&search_id).cloned())
    }

    async fn searches_for_exhibit(&self, exhibit_id: ExhibitId) -> Result<Vec<Search>> {
        let mut searches: Vec<Search> = self
            .read()?
            .searches
            .values()
            .filter(|s| s.exhibit_id == exhibit_id)
            .cloned()
            .collect();
        searches.sort_by_key(|s| (s.weight, s.id));
        Ok(searches)
    }

    async fn delete_search(&self, search_id: i64) -> Result<()> {
        self.write()?
            .searches
            .remove(&search_id)
            .map(|_| ())
            .ok_or_else(|| StorageError::search_not_found(search_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_duplicate_sidecar_insert_is_conflict() {
        let store = InMemorySpotlightStore::new();
        let sidecar = Sidecar::new("abc123", 1);

        let first = store.insert_sidecar(&sidecar).await.unwrap();
        assert!(first.id.is_some());

        let err = store.insert_sidecar(&sidecar).await.unwrap_err();
        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn test_update_unsaved_sidecar_fails() {
        let store = InMemorySpotlightStore::new();
        let err = store
            .update_sidecar(&Sidecar::new("abc123", 1))
            .await
            .unwrap_err();
        assert_eq!(err.kind, crate::error::ErrorKind::SidecarNotFound);
    }

    #[tokio::test]
    async fn test_taggings_keep_insertion_order() {
        let store = InMemorySpotlightStore::new();
        for name in ["zebra", "apple", "mango"] {
            let tag = store.find_or_create_tag(name).await.unwrap();
            store.add_tagging(&tag, "abc123", 1).await.unwrap();
        }

        let names = crate::domain::tag_names(&store.taggings_for("abc123").await.unwrap());
        assert_eq!(names, vec!["zebra", "apple", "mango"]);
    }

    #[tokio::test]
    async fn test_default_exhibit_is_created_once() {
        let store = InMemorySpotlightStore::new();
        let first = store.default_exhibit().await.unwrap();
        let second = store.default_exhibit().await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(store.list_exhibits().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_require_exhibit() {
        let store = InMemorySpotlightStore::new();
        let exhibit = store.default_exhibit().await.unwrap();

        assert_eq!(store.require_exhibit(exhibit.id).await.unwrap().id, exhibit.id);

        let err = store.require_exhibit(exhibit.id + 1).await.unwrap_err();
        assert_eq!(err.kind, crate::error::ErrorKind::ExhibitNotFound);
    }
}
