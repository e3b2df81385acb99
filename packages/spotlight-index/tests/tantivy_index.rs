//! Tantivy index integration tests
//!
//! 1. Projection writes merge into the stored record
//! 2. Null fields clear previously written values
//! 3. Records persist across reopen
//! 4. Field lookups follow writes

use pretty_assertions::assert_eq;
use serde_json::json;
use spotlight_index::{FieldMap, IndexRecord, SearchIndex, TantivyIndex, DEFAULT_WRITER_HEAP_BYTES};
use tempfile::TempDir;

fn projection(value: serde_json::Value) -> FieldMap {
    value.as_object().cloned().unwrap()
}

#[tokio::test]
async fn test_write_merges_and_clears_fields() {
    let index = TantivyIndex::in_ram().unwrap();
    index
        .add(&IndexRecord::new("abc123").with_field("title_tesim", json!(["Atlas"])))
        .await
        .unwrap();

    index
        .write(&projection(json!({
            "id": "abc123",
            "featured": true,
            "exhibit_1_tags_ssim": ["map"],
            "exhibit_2_tags_ssim": ["rare"],
        })))
        .await
        .unwrap();

    index
        .write(&projection(json!({
            "id": "abc123",
            "exhibit_1_tags_ssim": ["map"],
            "exhibit_2_tags_ssim": null,
        })))
        .await
        .unwrap();

    let record = index.find("abc123").await.unwrap();
    assert_eq!(
        record.to_field_map(),
        projection(json!({
            "id": "abc123",
            "title_tesim": ["Atlas"],
            "featured": true,
            "exhibit_1_tags_ssim": ["map"],
        }))
    );

    // stale tag term is gone too
    let rare = index
        .find_ids_by_field("exhibit_2_tags_ssim", "rare")
        .await
        .unwrap();
    assert!(rare.is_empty());
    let map = index
        .find_ids_by_field("exhibit_1_tags_ssim", "map")
        .await
        .unwrap();
    assert_eq!(map, vec!["abc123"]);
}

#[tokio::test]
async fn test_write_unknown_document_is_not_found() {
    let index = TantivyIndex::in_ram().unwrap();
    let err = index
        .write(&projection(json!({"id": "does-not-exist", "featured": true})))
        .await
        .unwrap_err();

    assert!(err.is_not_found());
    assert_eq!(index.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_records_persist_across_reopen() {
    let temp_dir = TempDir::new().unwrap();
    let index_dir = temp_dir.path().join("index");

    {
        let index = TantivyIndex::open(&index_dir, DEFAULT_WRITER_HEAP_BYTES).unwrap();
        index
            .add(&IndexRecord::new("dq287tq6352").with_field("format", json!("map")))
            .await
            .unwrap();
        index.add(&IndexRecord::new("gone")).await.unwrap();
        index.delete("gone").await.unwrap();
    }

    let index = TantivyIndex::open(&index_dir, DEFAULT_WRITER_HEAP_BYTES).unwrap();
    assert_eq!(index.count().await.unwrap(), 1);
    assert_eq!(
        index.find("dq287tq6352").await.unwrap().get("format"),
        Some(&json!("map"))
    );
    assert!(index.find("gone").await.unwrap_err().is_not_found());
}
