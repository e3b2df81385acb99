//! In-memory search index backed by a concurrent map

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;

use crate::error::{IndexError, IndexResult};
use crate::ports::SearchIndex;
use crate::record::{field_matches, projection_id, FieldMap, IndexRecord};

#[derive(Clone, Default)]
pub struct InMemoryIndex {
    records: Arc<DashMap<String, IndexRecord>>,
}

impl InMemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index seeded with `records`
    pub fn with_records(records: impl IntoIterator<Item = IndexRecord>) -> Self {
        let index = Self::new();
        for record in records {
            index.records.insert(record.id.clone(), record);
        }
        index
    }
}

#[async_trait]
impl SearchIndex for InMemoryIndex {
    async fn find(&self, id: &str) -> IndexResult<IndexRecord> {
        self.records
            .get(id)
            .map(|r| r.value().clone())
            .ok_or_else(|| IndexError::not_found(id))
    }

    async fn add(&self, record: &IndexRecord) -> IndexResult<()> {
        self.records.insert(record.id.clone(), record.clone());
        Ok(())
    }

    async fn write(&self, projection: &FieldMap) -> IndexResult<()> {
        let id = projection_id(projection)?;
        let mut record = self
            .records
            .get_mut(id)
            .ok_or_else(|| IndexError::not_found(id))?;
        record.apply(projection);
        Ok(())
    }

    async fn delete(&self, id: &str) -> IndexResult<()> {
        self.records.remove(id);
        Ok(())
    }

    async fn find_ids_by_field(&self, field: &str, value: &str) -> IndexResult<Vec<String>> {
        let mut ids: Vec<String> = self
            .records
            .iter()
            .filter(|r| r.get(field).is_some_and(|v| field_matches(v, value)))
            .map(|r| r.id.clone())
            .collect();
        ids.sort();
        Ok(ids)
    }

    async fn count(&self) -> IndexResult<usize> {
        Ok(self.records.len())
    }
}
