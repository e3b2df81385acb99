//! Exhibit-scoped tagging
//!
//! Each exhibit tags documents on its own behalf (the exhibit is the
//! tagger). `TagLedger` owns every tag mutation and announces removals
//! on an event channel so the affected document can be reindexed.

use serde_json::Value;
use spotlight_storage::{
    tag_names, taggable_ids, DocumentId, ExhibitId, Tagging, TaggingStore,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

use crate::error::{CurationError, Result};

const DELIMITER: char = ',';

/// Ordered, de-duplicated list of tag names
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagList(Vec<String>);

impl TagList {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut list = Self::default();
        for name in names {
            list.push(name.as_ref());
        }
        list
    }

    /// Parse a delimited string: `"map, rare, 'Paris, France'"`
    ///
    /// Quoted names may contain the delimiter.
    pub fn parse(input: &str) -> Self {
        let mut list = Self::default();
        let mut current = String::new();
        let mut quote: Option<char> = None;

        for c in input.chars() {
            match (quote, c) {
                (None, '"' | '\'') if current.trim().is_empty() => {
                    current.clear();
                    quote = Some(c);
                }
                (Some(q), c) if c == q => quote = None,
                (None, DELIMITER) => {
                    list.push(&current);
                    current.clear();
                }
                _ => current.push(c),
            }
        }
        list.push(&current);
        list
    }

    /// Accept either a delimited string or an array of strings
    pub fn from_value(key: &str, value: &Value) -> Result<Self> {
        match value {
            Value::String(s) => Ok(Self::parse(s)),
            Value::Array(items) => {
                let mut list = Self::default();
                for item in items {
                    let name = item.as_str().ok_or_else(|| {
                        CurationError::invalid_attribute(key, "tag names must be strings")
                    })?;
                    list.push(name);
                }
                Ok(list)
            }
            _ => Err(CurationError::invalid_attribute(
                key,
                "expected a comma-separated string or a list of strings",
            )),
        }
    }

    fn push(&mut self, name: &str) {
        let name = name.trim();
        if !name.is_empty() && !self.contains(name) {
            self.0.push(name.to_string());
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|n| n == name)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn into_vec(self) -> Vec<String> {
        self.0
    }
}

impl std::fmt::Display for TagList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.join(", "))
    }
}

/// Tag lifecycle notifications
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagEvent {
    /// A tagging was destroyed; the document's projection is stale
    Removed {
        document_id: DocumentId,
        exhibit_id: ExhibitId,
        tag: String,
    },
}

impl TagEvent {
    pub fn document_id(&self) -> &str {
        match self {
            TagEvent::Removed { document_id, .. } => document_id,
        }
    }
}

pub struct TagLedger {
    store: Arc<dyn TaggingStore>,
    events: Option<UnboundedSender<TagEvent>>,
}

impl TagLedger {
    pub fn new(store: Arc<dyn TaggingStore>) -> Self {
        Self {
            store,
            events: None,
        }
    }

    /// Announce removals on `events`
    pub fn with_events(mut self, events: UnboundedSender<TagEvent>) -> Self {
        self.events = Some(events);
        self
    }

    /// Every tagging on a document, all exhibits
    pub async fn taggings_for(&self, document_id: &str) -> Result<Vec<Tagging>> {
        Ok(self.store.taggings_for(document_id).await?)
    }

    /// Tag names one exhibit placed on a document
    pub async fn tags_on(&self, document_id: &str, exhibit_id: ExhibitId) -> Result<Vec<String>> {
        let taggings = self.store.owner_taggings(document_id, exhibit_id).await?;
        Ok(tag_names(&taggings))
    }

    /// Make `tags` the complete set an exhibit holds on a document.
    ///
    /// Taggings not in `tags` are destroyed (each emitting
    /// `TagEvent::Removed`); missing ones are added in list order.
    pub async fn replace_tags(
        &self,
        document_id: &str,
        exhibit_id: ExhibitId,
        tags: &TagList,
    ) -> Result<Vec<Tagging>> {
        let current = self.store.owner_taggings(document_id, exhibit_id).await?;

        for tagging in current.iter().filter(|t| !tags.contains(&t.tag.name)) {
            self.destroy(tagging.id).await?;
        }

        for name in tags.iter() {
            if current.iter().any(|t| t.tag.name == name) {
                continue;
            }
            let tag = self.store.find_or_create_tag(name).await?;
            match self.store.add_tagging(&tag, document_id, exhibit_id).await {
                Ok(_) => {}
                // Tagged concurrently; the desired state already holds
                Err(e) if e.is_conflict() => {
                    debug!(document_id, exhibit_id, tag = name, "tagging already present");
                }
                Err(e) => return Err(e.into()),
            }
        }

        debug!(document_id, exhibit_id, tags = %tags, "owned tags replaced");
        Ok(self.store.owner_taggings(document_id, exhibit_id).await?)
    }

    /// Remove one tag an exhibit placed on a document. Returns whether this
    /// call removed a tagging.
    pub async fn remove_tag(
        &self,
        document_id: &str,
        exhibit_id: ExhibitId,
        name: &str,
    ) -> Result<bool> {
        let taggings = self.store.owner_taggings(document_id, exhibit_id).await?;
        match taggings.iter().find(|t| t.tag.name == name) {
            Some(tagging) => self.destroy(tagging.id).await,
            None => Ok(false),
        }
    }

    /// Tag usage within an exhibit, most used first (ties by name)
    pub async fn tag_counts(&self, exhibit_id: ExhibitId) -> Result<Vec<(String, usize)>> {
        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        for tagging in self.store.taggings_by_tagger(exhibit_id).await? {
            *counts.entry(tagging.tag.name).or_default() += 1;
        }

        let mut counts: Vec<_> = counts.into_iter().collect();
        counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        Ok(counts)
    }

    /// Documents an exhibit tagged with `name`
    pub async fn documents_tagged(
        &self,
        exhibit_id: ExhibitId,
        name: &str,
    ) -> Result<Vec<DocumentId>> {
        let taggings: Vec<Tagging> = self
            .store
            .taggings_by_tagger(exhibit_id)
            .await?
            .into_iter()
            .filter(|t| t.tag.name == name)
            .collect();

        let mut ids = taggable_ids(&taggings);
        ids.sort();
        ids.dedup();
        Ok(ids)
    }

    /// Every document an exhibit has tagged
    pub async fn documents_tagged_by(&self, exhibit_id: ExhibitId) -> Result<Vec<DocumentId>> {
        let mut ids = taggable_ids(&self.store.taggings_by_tagger(exhibit_id).await?);
        ids.sort();
        ids.dedup();
        Ok(ids)
    }

    /// Returns false when the tagging was already gone
    async fn destroy(&self, tagging_id: i64) -> Result<bool> {
        let removed = match self.store.remove_tagging(tagging_id).await? {
            Some(removed) => removed,
            // Removed concurrently; whoever removed it announced it
            None => {
                debug!(tagging_id, "tagging already removed");
                return Ok(false);
            }
        };

        let event = TagEvent::Removed {
            document_id: removed.taggable_id,
            exhibit_id: removed.tagger_id,
            tag: removed.tag.name,
        };
        debug!(?event, "tagging destroyed");

        if let Some(events) = &self.events {
            if events.send(event).is_err() {
                debug!("reindex trigger is gone; removal not announced");
            }
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use async_trait::async_trait;
    use serde_json::json;
    use spotlight_storage::{InMemorySpotlightStore, Tag};
    use tokio::sync::mpsc;

    fn ledger() -> TagLedger {
        TagLedger::new(Arc::new(InMemorySpotlightStore::new()))
    }

    #[test]
    fn test_parse_trims_and_dedupes() {
        let list = TagList::parse(" map, rare ,, map ,");
        assert_eq!(list.into_vec(), vec!["map", "rare"]);
    }

    #[test]
    fn test_parse_quoted_names_keep_delimiter() {
        let list = TagList::parse(r#"atlas, "Paris, France", 'a,b'"#);
        assert_eq!(list.into_vec(), vec!["atlas", "Paris, France", "a,b"]);
    }

    #[test]
    fn test_parse_empty_string_is_empty_list() {
        assert!(TagList::parse("").is_empty());
        assert!(TagList::parse(" , ").is_empty());
    }

    #[test]
    fn test_from_value() {
        let key = "exhibit_tag_list";
        assert_eq!(
            TagList::from_value(key, &json!(["a", " b ", "a"])).unwrap(),
            TagList::new(["a", "b"])
        );
        assert_eq!(
            TagList::from_value(key, &json!("a,b")).unwrap(),
            TagList::new(["a", "b"])
        );
        assert!(TagList::from_value(key, &json!(42)).is_err());
        assert!(TagList::from_value(key, &json!(["a", 1])).is_err());
    }

    #[tokio::test]
    async fn test_replace_tags_adds_and_removes() {
        let ledger = ledger();
        ledger
            .replace_tags("doc", 1, &TagList::new(["a", "b"]))
            .await
            .unwrap();
        let taggings = ledger
            .replace_tags("doc", 1, &TagList::new(["b", "c"]))
            .await
            .unwrap();

        assert_eq!(tag_names(&taggings), vec!["b", "c"]);
    }

    #[tokio::test]
    async fn test_replace_tags_is_scoped_to_exhibit() {
        let ledger = ledger();
        ledger
            .replace_tags("doc", 1, &TagList::new(["a"]))
            .await
            .unwrap();
        ledger
            .replace_tags("doc", 2, &TagList::new(["z"]))
            .await
            .unwrap();
        ledger.replace_tags("doc", 1, &TagList::default()).await.unwrap();

        assert!(ledger.tags_on("doc", 1).await.unwrap().is_empty());
        assert_eq!(ledger.tags_on("doc", 2).await.unwrap(), vec!["z"]);
    }

    #[tokio::test]
    async fn test_removal_emits_event() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let ledger = ledger().with_events(tx);

        ledger
            .replace_tags("doc", 1, &TagList::new(["a", "b"]))
            .await
            .unwrap();
        assert!(rx.try_recv().is_err());

        assert!(ledger.remove_tag("doc", 1, "a").await.unwrap());
        assert!(!ledger.remove_tag("doc", 1, "a").await.unwrap());

        assert_eq!(
            rx.try_recv().unwrap(),
            TagEvent::Removed {
                document_id: "doc".to_string(),
                exhibit_id: 1,
                tag: "a".to_string(),
            }
        );
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_counts_and_documents_tagged() {
        let ledger = ledger();
        ledger
            .replace_tags("d1", 1, &TagList::new(["map", "rare"]))
            .await
            .unwrap();
        ledger
            .replace_tags("d2", 1, &TagList::new(["map"]))
            .await
            .unwrap();
        ledger
            .replace_tags("d3", 2, &TagList::new(["map"]))
            .await
            .unwrap();

        assert_eq!(
            ledger.tag_counts(1).await.unwrap(),
            vec![("map".to_string(), 2), ("rare".to_string(), 1)]
        );
        assert_eq!(
            ledger.documents_tagged(1, "map").await.unwrap(),
            vec!["d1", "d2"]
        );
    }

    /// Another writer always deletes the tagging first
    struct RacingRemovals(InMemorySpotlightStore);

    #[async_trait]
    impl TaggingStore for RacingRemovals {
        async fn find_or_create_tag(&self, name: &str) -> spotlight_storage::Result<Tag> {
            self.0.find_or_create_tag(name).await
        }

        async fn add_tagging(
            &self,
            tag: &Tag,
            taggable_id: &str,
            tagger_id: ExhibitId,
        ) -> spotlight_storage::Result<Tagging> {
            self.0.add_tagging(tag, taggable_id, tagger_id).await
        }

        async fn remove_tagging(
            &self,
            tagging_id: i64,
        ) -> spotlight_storage::Result<Option<Tagging>> {
            self.0.remove_tagging(tagging_id).await?;
            self.0.remove_tagging(tagging_id).await
        }

        async fn taggings_for(&self, taggable_id: &str) -> spotlight_storage::Result<Vec<Tagging>> {
            self.0.taggings_for(taggable_id).await
        }

        async fn owner_taggings(
            &self,
            taggable_id: &str,
            tagger_id: ExhibitId,
        ) -> spotlight_storage::Result<Vec<Tagging>> {
            self.0.owner_taggings(taggable_id, tagger_id).await
        }

        async fn taggings_by_tagger(
            &self,
            tagger_id: ExhibitId,
        ) -> spotlight_storage::Result<Vec<Tagging>> {
            self.0.taggings_by_tagger(tagger_id).await
        }
    }

    #[tokio::test]
    async fn test_tagging_removed_concurrently_is_not_an_error() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let ledger =
            TagLedger::new(Arc::new(RacingRemovals(InMemorySpotlightStore::new()))).with_events(tx);

        ledger
            .replace_tags("doc", 1, &TagList::new(["a", "b"]))
            .await
            .unwrap();
        let taggings = ledger
            .replace_tags("doc", 1, &TagList::new(["b"]))
            .await
            .unwrap();

        assert_eq!(tag_names(&taggings), vec!["b"]);
        assert!(!ledger.remove_tag("doc", 1, "b").await.unwrap());
        assert!(ledger.tags_on("doc", 1).await.unwrap().is_empty());
        assert!(rx.try_recv().is_err());
    }
}
