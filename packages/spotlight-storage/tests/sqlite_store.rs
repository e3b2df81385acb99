//! SQLite store integration tests
//!
//! 1. File-based persistence across reopen
//! 2. Sidecar uniqueness on (document, exhibit)
//! 3. Tagging order and per-exhibit scoping
//! 4. Browse search ordering

use pretty_assertions::assert_eq;
use serde_json::json;
use spotlight_storage::{
    tag_names, ErrorKind, ExhibitStore, NewExhibit, Search, SearchStore, Sidecar, SidecarStore,
    SqliteSpotlightStore, TaggingStore,
};
use tempfile::TempDir;

fn fields(value: serde_json::Value) -> spotlight_storage::FieldMap {
    value.as_object().cloned().unwrap()
}

#[tokio::test]
async fn test_sidecar_survives_reopen() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("spotlight.db");

    let exhibit_id = {
        let store = SqliteSpotlightStore::new(&db_path).unwrap();
        let exhibit = store
            .create_exhibit(&NewExhibit::new("maps", "Maps"))
            .await
            .unwrap();

        let mut sidecar = Sidecar::new("dq287tq6352", exhibit.id);
        sidecar.merge_data(fields(json!({"note": "x", "featured": true})));
        sidecar.public = Some(false);
        store.insert_sidecar(&sidecar).await.unwrap();
        exhibit.id
    };

    let store = SqliteSpotlightStore::new(&db_path).unwrap();
    let sidecar = store
        .find_sidecar("dq287tq6352", exhibit_id)
        .await
        .unwrap()
        .expect("sidecar persisted");

    assert_eq!(sidecar.data, fields(json!({"note": "x", "featured": true})));
    assert_eq!(sidecar.public, Some(false));
    assert!(!sidecar.is_new_record());
}

#[tokio::test]
async fn test_sidecar_unique_per_document_and_exhibit() {
    let store = SqliteSpotlightStore::in_memory().unwrap();

    store.insert_sidecar(&Sidecar::new("abc123", 1)).await.unwrap();
    store.insert_sidecar(&Sidecar::new("abc123", 2)).await.unwrap();

    let err = store
        .insert_sidecar(&Sidecar::new("abc123", 1))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);

    let all = store.sidecars_for_document("abc123").await.unwrap();
    assert_eq!(all.len(), 2);
}

#[tokio::test]
async fn test_update_sidecar_replaces_data() {
    let store = SqliteSpotlightStore::in_memory().unwrap();
    let mut sidecar = store
        .insert_sidecar(&Sidecar::new("abc123", 1))
        .await
        .unwrap();

    sidecar.merge_data(fields(json!({"note": "y"})));
    store.update_sidecar(&sidecar).await.unwrap();

    let reloaded = store.find_sidecar("abc123", 1).await.unwrap().unwrap();
    assert_eq!(reloaded.data, fields(json!({"note": "y"})));
}

#[tokio::test]
async fn test_taggings_scoped_by_tagger_in_insertion_order() {
    let store = SqliteSpotlightStore::in_memory().unwrap();
    let map = store.find_or_create_tag("map").await.unwrap();
    let rare = store.find_or_create_tag("rare").await.unwrap();
    let atlas = store.find_or_create_tag("atlas").await.unwrap();

    store.add_tagging(&map, "abc123", 1).await.unwrap();
    store.add_tagging(&rare, "abc123", 2).await.unwrap();
    store.add_tagging(&atlas, "abc123", 1).await.unwrap();

    let all = store.taggings_for("abc123").await.unwrap();
    assert_eq!(tag_names(&all), vec!["map", "rare", "atlas"]);

    let owned = store.owner_taggings("abc123", 1).await.unwrap();
    assert_eq!(tag_names(&owned), vec!["map", "atlas"]);

    // same tag row reused
    assert_eq!(store.find_or_create_tag("map").await.unwrap().id, map.id);

    let err = store.add_tagging(&map, "abc123", 1).await.unwrap_err();
    assert!(err.is_conflict());
}

#[tokio::test]
async fn test_remove_tagging_returns_row() {
    let store = SqliteSpotlightStore::in_memory().unwrap();
    let tag = store.find_or_create_tag("map").await.unwrap();
    let tagging = store.add_tagging(&tag, "abc123", 1).await.unwrap();

    let removed = store.remove_tagging(tagging.id).await.unwrap().unwrap();
    assert_eq!(removed.tag.name, "map");
    assert_eq!(removed.taggable_id, "abc123");

    assert!(store.remove_tagging(tagging.id).await.unwrap().is_none());
    assert!(store.taggings_for("abc123").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_searches_ordered_by_weight() {
    let store = SqliteSpotlightStore::in_memory().unwrap();

    let mut heavy = Search::new(1, "Heavy");
    heavy.weight = 10;
    heavy.on_landing_page = true;
    let mut light = Search::new(1, "Light");
    light.weight = 1;
    light.query_params = fields(json!({"q": "map"}));
    let other_exhibit = Search::new(2, "Elsewhere");

    store.save_search(&heavy).await.unwrap();
    let light = store.save_search(&light).await.unwrap();
    store.save_search(&other_exhibit).await.unwrap();

    let titles: Vec<String> = store
        .searches_for_exhibit(1)
        .await
        .unwrap()
        .into_iter()
        .map(|s| s.title)
        .collect();
    assert_eq!(titles, vec!["Light", "Heavy"]);

    let landing = store.landing_page_searches(1).await.unwrap();
    assert_eq!(landing.len(), 1);
    assert_eq!(landing[0].title, "Heavy");

    let reloaded = store.get_search(light.id.unwrap()).await.unwrap().unwrap();
    assert_eq!(reloaded.query_params, fields(json!({"q": "map"})));

    store.delete_search(light.id.unwrap()).await.unwrap();
    let err = store.delete_search(light.id.unwrap()).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::SearchNotFound);
}

#[tokio::test]
async fn test_exhibit_slug_unique() {
    let store = SqliteSpotlightStore::in_memory().unwrap();
    store
        .create_exhibit(&NewExhibit::new("maps", "Maps"))
        .await
        .unwrap();

    let err = store
        .create_exhibit(&NewExhibit::new("maps", "Other"))
        .await
        .unwrap_err();
    assert!(err.is_conflict());

    let default = store.default_exhibit().await.unwrap();
    let exhibits = store.list_exhibits().await.unwrap();
    assert_eq!(exhibits.len(), 2);
    assert_eq!(exhibits[1].id, default.id);
}
