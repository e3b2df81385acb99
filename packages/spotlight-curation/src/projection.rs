//! Index projection of a document's curation state
//!
//! ```text
//! { id } ← sidecar fields (in order, later wins; id kept) ← exhibit tag fields
//! ```
//!
//! Tag fields are emitted for every known exhibit. An exhibit with no tags
//! on the document projects `null`, which clears the field in the index.

use serde_json::Value;
use spotlight_index::ID_FIELD;
use spotlight_storage::{Exhibit, ExhibitId, FieldMap, Sidecar, Tagging};

/// Index field holding the tags `exhibit_id` placed on a document
pub fn solr_field_for_tagger(exhibit_id: ExhibitId) -> String {
    format!("{}_{}_tags_ssim", Exhibit::param_key(), exhibit_id)
}

/// Per-exhibit tag fields: `null` for every known exhibit, replaced by the
/// exhibit's tag names (in tagging order) where it has any.
pub fn tags_to_solr(taggings: &[Tagging], exhibits: &[Exhibit]) -> FieldMap {
    let mut fields = FieldMap::new();
    for exhibit in exhibits {
        fields.insert(solr_field_for_tagger(exhibit.id), Value::Null);
    }

    for tagging in taggings {
        let slot = fields
            .entry(solr_field_for_tagger(tagging.tagger_id))
            .or_insert(Value::Null);
        if !slot.is_array() {
            *slot = Value::Array(Vec::new());
        }
        if let Value::Array(names) = slot {
            names.push(Value::String(tagging.tag.name.clone()));
        }
    }
    fields
}

/// Union of every sidecar's contribution, in sidecar order
pub fn sidecars_to_solr(sidecars: &[Sidecar]) -> FieldMap {
    let mut fields = FieldMap::new();
    for sidecar in sidecars {
        fields.extend(sidecar.to_solr());
    }
    fields
}

/// Full projection for one document
pub fn build(
    document_id: &str,
    sidecars: &[Sidecar],
    taggings: &[Tagging],
    exhibits: &[Exhibit],
) -> FieldMap {
    let mut fields = sidecars_to_solr(sidecars);
    fields.insert(ID_FIELD.to_string(), Value::String(document_id.to_string()));
    fields.extend(tags_to_solr(taggings, exhibits));
    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use serde_json::json;
    use spotlight_storage::{Tag, TAG_CONTEXT};

    fn tagging(id: i64, name: &str, doc: &str, exhibit_id: ExhibitId) -> Tagging {
        Tagging {
            id,
            tag: Tag {
                id,
                name: name.to_string(),
            },
            taggable_id: doc.to_string(),
            tagger_id: exhibit_id,
            context: TAG_CONTEXT.to_string(),
            created_at: Default::default(),
        }
    }

    fn sidecar(doc: &str, exhibit_id: ExhibitId, data: Value) -> Sidecar {
        let mut sidecar = Sidecar::new(doc, exhibit_id);
        sidecar.data = data.as_object().cloned().unwrap();
        sidecar
    }

    fn exhibits(ids: &[ExhibitId]) -> Vec<Exhibit> {
        ids.iter()
            .map(|&id| Exhibit::new(id, format!("e{}", id), format!("Exhibit {}", id)))
            .collect()
    }

    #[test]
    fn test_field_name() {
        assert_eq!(solr_field_for_tagger(1), "exhibit_1_tags_ssim");
    }

    #[test]
    fn test_abc123_projection() {
        let sidecars = vec![sidecar("abc123", 1, json!({"featured": true}))];
        let taggings = vec![
            tagging(1, "map", "abc123", 1),
            tagging(2, "rare", "abc123", 1),
        ];

        let fields = build("abc123", &sidecars, &taggings, &exhibits(&[1, 2]));

        assert_eq!(
            Value::Object(fields),
            json!({
                "id": "abc123",
                "featured": true,
                "exhibit_1_tags_ssim": ["map", "rare"],
                "exhibit_2_tags_ssim": null,
            })
        );
    }

    #[test]
    fn test_id_survives_sidecar_collision() {
        let sidecars = vec![sidecar("abc123", 1, json!({"id": "forged"}))];
        let fields = build("abc123", &sidecars, &[], &[]);
        assert_eq!(fields.get("id"), Some(&json!("abc123")));
    }

    #[test]
    fn test_later_sidecar_wins() {
        let sidecars = vec![
            sidecar("d", 1, json!({"k": "first", "only_first": 1})),
            sidecar("d", 2, json!({"k": "second"})),
        ];
        let fields = sidecars_to_solr(&sidecars);
        assert_eq!(
            Value::Object(fields),
            json!({"k": "second", "only_first": 1})
        );
    }

    #[test]
    fn test_visibility_is_projected_once_set() {
        let mut hidden = sidecar("d", 3, json!({}));
        hidden.public = Some(false);
        let fields = build("d", &[hidden], &[], &[]);
        assert_eq!(fields.get("exhibit_3_public_bsi"), Some(&json!(false)));
    }

    #[test]
    fn test_tagging_for_unlisted_exhibit_still_projects() {
        let fields = tags_to_solr(&[tagging(1, "x", "d", 9)], &[]);
        assert_eq!(Value::Object(fields), json!({"exhibit_9_tags_ssim": ["x"]}));
    }

    proptest! {
        #[test]
        fn prop_every_exhibit_has_a_tag_field(
            exhibit_ids in proptest::collection::btree_set(1i64..50, 0..8),
            tagged in proptest::collection::vec((1i64..50, "[a-z]{1,6}"), 0..20),
        ) {
            let exhibit_ids: Vec<_> = exhibit_ids.into_iter().collect();
            let known = exhibits(&exhibit_ids);
            let taggings: Vec<_> = tagged
                .iter()
                .enumerate()
                .map(|(i, (exhibit_id, name))| tagging(i as i64, name, "doc", *exhibit_id))
                .collect();

            let fields = build("doc", &[], &taggings, &known);

            let doc_id = json!("doc");
            prop_assert_eq!(fields.get("id"), Some(&doc_id));
            for id in &exhibit_ids {
                let value = fields.get(&solr_field_for_tagger(*id));
                let tagged_here: Vec<Value> = taggings
                    .iter()
                    .filter(|t| t.tagger_id == *id)
                    .map(|t| json!(t.tag.name))
                    .collect();
                let expected = if tagged_here.is_empty() {
                    Value::Null
                } else {
                    Value::Array(tagged_here)
                };
                prop_assert_eq!(value, Some(&expected));
            }
        }

        #[test]
        fn prop_id_always_wins(key in "[a-z_]{1,8}", id in "[a-z0-9]{1,12}") {
            let mut data = serde_json::Map::new();
            data.insert(key, json!("sidecar"));
            data.insert("id".to_string(), json!("sidecar-id"));
            let fields = build(&id, &[sidecar(&id, 1, Value::Object(data))], &[], &[]);
            let expected = json!(id);
            prop_assert_eq!(fields.get("id"), Some(&expected));
        }
    }
}
