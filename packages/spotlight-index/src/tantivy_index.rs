//! Tantivy-backed persistent search index
//!
//! # Architecture
//!
//! ```text
//! IndexRecord → TantivyDocument(id, fields JSON, terms) → IndexWriter → Tantivy Index
//! ```
//!
//! Every mutation is an atomic upsert (delete by `id` term + add) followed by
//! a commit and a reader reload, so reads observe writes immediately.
//! Projection writes hold the writer lock across read-merge-write.

use async_trait::async_trait;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tantivy::{
    collector::DocSetCollector,
    directory::MmapDirectory,
    doc,
    query::TermQuery,
    schema::{IndexRecordOption, Value},
    Index, IndexReader, IndexWriter, ReloadPolicy, TantivyDocument, Term,
};
use tracing::debug;

use crate::error::{IndexError, IndexResult};
use crate::ports::SearchIndex;
use crate::record::{field_terms, projection_id, FieldMap, IndexRecord};
use crate::schema::{build_schema, SchemaFields};

/// Default writer heap (50MB)
pub const DEFAULT_WRITER_HEAP_BYTES: usize = 50_000_000;

pub struct TantivyIndex {
    /// Tantivy index
    index: Index,

    /// Index writer (thread-safe)
    writer: Arc<Mutex<IndexWriter>>,

    /// Manually reloaded after each commit
    reader: IndexReader,

    /// Schema fields (cached)
    schema_fields: SchemaFields,
}

impl TantivyIndex {
    /// Open the index in `index_dir`, creating it (and the directory) if absent
    pub fn open(index_dir: &Path, writer_heap_bytes: usize) -> IndexResult<Self> {
        std::fs::create_dir_all(index_dir).map_err(|e| {
            IndexError::InternalError(format!("Failed to create index dir: {}", e))
        })?;
        let directory = MmapDirectory::open(index_dir).map_err(|e| {
            IndexError::InternalError(format!("Failed to open index dir: {}", e))
        })?;
        let index = Index::open_or_create(directory, build_schema())?;
        Self::from_index(index, writer_heap_bytes)
    }

    /// RAM-only index (tests)
    pub fn in_ram() -> IndexResult<Self> {
        let index = Index::create_in_ram(build_schema());
        Self::from_index(index, DEFAULT_WRITER_HEAP_BYTES)
    }

    fn from_index(index: Index, writer_heap_bytes: usize) -> IndexResult<Self> {
        let schema_fields = SchemaFields::from_schema(index.schema())?;

        // Single indexing thread keeps segment order deterministic
        let writer: IndexWriter = index.writer_with_num_threads(1, writer_heap_bytes)?;

        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()?;

        Ok(Self {
            index,
            writer: Arc::new(Mutex::new(writer)),
            reader,
            schema_fields,
        })
    }

    fn lock_writer(&self) -> IndexResult<MutexGuard<'_, IndexWriter>> {
        self.writer
            .lock()
            .map_err(|e| IndexError::InternalError(format!("Failed to acquire writer lock: {}", e)))
    }

    fn id_term(&self, id: &str) -> Term {
        Term::from_field_text(self.schema_fields.id, id)
    }

    /// Build a Tantivy document from a record
    fn build_document(&self, record: &IndexRecord) -> IndexResult<TantivyDocument> {
        let payload = serde_json::to_string(&record.fields)?;
        let mut doc = doc!(
            self.schema_fields.id => record.id.clone(),
            self.schema_fields.fields => payload,
        );
        for term in field_terms(&record.fields) {
            doc.add_text(self.schema_fields.terms, &term);
        }
        Ok(doc)
    }

    fn read_record(&self, doc: &TantivyDocument) -> IndexResult<IndexRecord> {
        let id = doc
            .get_first(self.schema_fields.id)
            .and_then(|v| v.as_str())
            .ok_or_else(|| IndexError::InternalError("stored document has no id".to_string()))?
            .to_string();

        let payload = doc
            .get_first(self.schema_fields.fields)
            .and_then(|v| v.as_str())
            .unwrap_or("{}");

        Ok(IndexRecord {
            id,
            fields: serde_json::from_str(payload)?,
        })
    }

    fn lookup(&self, id: &str) -> IndexResult<Option<IndexRecord>> {
        let searcher = self.reader.searcher();
        let query = TermQuery::new(self.id_term(id), IndexRecordOption::Basic);
        let hits = searcher.search(&query, &DocSetCollector)?;

        match hits.into_iter().next() {
            Some(address) => {
                let doc: TantivyDocument = searcher.doc(address)?;
                self.read_record(&doc).map(Some)
            }
            None => Ok(None),
        }
    }

    /// Delete-by-id then add, commit, reload
    fn upsert(&self, writer: &mut IndexWriter, record: &IndexRecord) -> IndexResult<()> {
        let doc = self.build_document(record)?;
        writer.delete_term(self.id_term(&record.id));
        writer.add_document(doc)?;
        self.commit(writer)
    }

    fn commit(&self, writer: &mut IndexWriter) -> IndexResult<()> {
        writer.commit()?;
        self.reader.reload()?;
        Ok(())
    }

    /// Underlying tantivy index
    pub fn index(&self) -> &Index {
        &self.index
    }
}

#[async_trait]
impl SearchIndex for TantivyIndex {
    async fn find(&self, id: &str) -> IndexResult<IndexRecord> {
        self.lookup(id)?.ok_or_else(|| IndexError::not_found(id))
    }

    async fn add(&self, record: &IndexRecord) -> IndexResult<()> {
        let mut writer = self.lock_writer()?;
        self.upsert(&mut writer, record)
    }

    async fn write(&self, projection: &FieldMap) -> IndexResult<()> {
        let id = projection_id(projection)?;
        let mut writer = self.lock_writer()?;

        let mut record = self.lookup(id)?.ok_or_else(|| IndexError::not_found(id))?;
        record.apply(projection);
        self.upsert(&mut writer, &record)?;

        debug!(document_id = id, fields = projection.len(), "projection written");
        Ok(())
    }

    async fn delete(&self, id: &str) -> IndexResult<()> {
        let mut writer = self.lock_writer()?;
        writer.delete_term(self.id_term(id));
        self.commit(&mut writer)
    }

    async fn find_ids_by_field(&self, field: &str, value: &str) -> IndexResult<Vec<String>> {
        let searcher = self.reader.searcher();
        let term = Term::from_field_text(self.schema_fields.terms, &format!("{}={}", field, value));
        let query = TermQuery::new(term, IndexRecordOption::Basic);

        let mut ids = Vec::new();
        for address in searcher.search(&query, &DocSetCollector)? {
            let doc: TantivyDocument = searcher.doc(address)?;
            ids.push(self.read_record(&doc)?.id);
        }
        ids.sort();
        Ok(ids)
    }

    async fn count(&self) -> IndexResult<usize> {
        Ok(self.reader.searcher().num_docs() as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_add_and_find() {
        let index = TantivyIndex::in_ram().unwrap();
        let record = IndexRecord::new("dq287tq6352").with_field("title_tesim", json!(["L'AMERIQUE"]));

        index.add(&record).await.unwrap();

        assert_eq!(index.find("dq287tq6352").await.unwrap(), record);
        assert!(index.find("missing").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_add_replaces_existing_record() {
        let index = TantivyIndex::in_ram().unwrap();
        index
            .add(&IndexRecord::new("a").with_field("v", json!(1)))
            .await
            .unwrap();
        index
            .add(&IndexRecord::new("a").with_field("v", json!(2)))
            .await
            .unwrap();

        assert_eq!(index.count().await.unwrap(), 1);
        assert_eq!(index.find("a").await.unwrap().get("v"), Some(&json!(2)));
    }
}
