//! Storage Domain Models
//!
//! The relational side of curation: exhibits, the per-exhibit sidecar record
//! of a document, exhibit-scoped taggings, and saved browse searches.
//!
//! Documents themselves live in the search index; here they are only
//! referenced by their opaque [`DocumentId`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Opaque search-index document ID (e.g. `"dq287tq6352"`)
pub type DocumentId = String;

/// Exhibit ID (primary key)
pub type ExhibitId = i64;

/// Free-form field mapping (sidecar data, projections)
pub type FieldMap = Map<String, Value>;

/// Tagging context used for exhibit tags
pub const TAG_CONTEXT: &str = "tags";

/// Exhibit Entity
///
/// A curation context. Exhibits scope sidecars and act as the tagger for
/// taggings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exhibit {
    /// Exhibit ID (primary key)
    pub id: ExhibitId,

    /// URL slug (unique)
    pub slug: String,

    /// Display title
    pub title: String,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Exhibit {
    /// Slug of the exhibit returned by `ExhibitStore::default_exhibit`
    pub const DEFAULT_SLUG: &'static str = "default";

    /// Model parameter key used when deriving index field names
    pub fn param_key() -> &'static str {
        "exhibit"
    }

    pub fn new(id: ExhibitId, slug: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id,
            slug: slug.into(),
            title: title.into(),
            created_at: Utc::now(),
        }
    }
}

/// Attributes for an exhibit that has not been stored yet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewExhibit {
    pub slug: String,
    pub title: String,
}

impl NewExhibit {
    pub fn new(slug: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            title: title.into(),
        }
    }
}

/// Sidecar Entity
///
/// Per-(document, exhibit) attribute record. Unique on
/// `(document_id, exhibit_id)`.
///
/// A sidecar with `id == None` has been initialized in memory but not yet
/// written to a store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sidecar {
    /// Row ID (None until persisted)
    pub id: Option<i64>,

    /// Document this sidecar annotates
    pub document_id: DocumentId,

    /// Exhibit scoping this sidecar
    pub exhibit_id: ExhibitId,

    /// Curator-supplied fields
    #[serde(default)]
    pub data: FieldMap,

    /// Per-exhibit visibility; None until explicitly set
    pub public: Option<bool>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Sidecar {
    /// Initialize an empty, unsaved sidecar
    pub fn new(document_id: impl Into<DocumentId>, exhibit_id: ExhibitId) -> Self {
        let now = Utc::now();
        Self {
            id: None,
            document_id: document_id.into(),
            exhibit_id,
            data: FieldMap::new(),
            public: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_new_record(&self) -> bool {
        self.id.is_none()
    }

    /// Merge `fields` into `data`; incoming keys replace existing ones.
    pub fn merge_data(&mut self, fields: FieldMap) {
        for (key, value) in fields {
            self.data.insert(key, value);
        }
        self.updated_at = Utc::now();
    }

    /// Visibility in this exhibit (unset counts as public)
    pub fn is_public(&self) -> bool {
        self.public.unwrap_or(true)
    }

    /// Index field carrying this sidecar's visibility flag
    pub fn visibility_field(exhibit_id: ExhibitId) -> String {
        format!("{}_{}_public_bsi", Exhibit::param_key(), exhibit_id)
    }

    /// This sidecar's contribution to the document projection
    pub fn to_solr(&self) -> FieldMap {
        let mut fields = self.data.clone();
        if let Some(public) = self.public {
            fields.insert(Self::visibility_field(self.exhibit_id), Value::Bool(public));
        }
        fields
    }
}

/// Tag Entity (name is unique)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tag {
    pub id: i64,
    pub name: String,
}

/// Tagging Entity
///
/// Attaches a tag to a document on behalf of an exhibit (the tagger).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tagging {
    pub id: i64,
    pub tag: Tag,
    pub taggable_id: DocumentId,
    pub tagger_id: ExhibitId,
    pub context: String,
    pub created_at: DateTime<Utc>,
}

/// Saved browse search (an exhibit's browse category)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Search {
    /// Row ID (None until persisted)
    pub id: Option<i64>,
    pub exhibit_id: ExhibitId,
    pub title: String,
    pub short_description: Option<String>,
    pub long_description: Option<String>,
    /// Search parameters replayed against the index (q, facets, ...)
    #[serde(default)]
    pub query_params: FieldMap,
    /// Sort key within an exhibit (ascending)
    pub weight: i32,
    pub on_landing_page: bool,
    pub featured_image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Search {
    pub fn new(exhibit_id: ExhibitId, title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: None,
            exhibit_id,
            title: title.into(),
            short_description: None,
            long_description: None,
            query_params: FieldMap::new(),
            weight: 0,
            on_landing_page: false,
            featured_image: None,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_sidecar_is_unsaved_and_empty() {
        let sidecar = Sidecar::new("abc123", 1);
        assert!(sidecar.is_new_record());
        assert!(sidecar.data.is_empty());
        assert!(sidecar.is_public());
    }

    #[test]
    fn test_merge_data_overwrites_keys() {
        let mut sidecar = Sidecar::new("abc123", 1);
        sidecar.merge_data(json!({"note": "a", "featured": true}).as_object().unwrap().clone());
        sidecar.merge_data(json!({"note": "b"}).as_object().unwrap().clone());

        assert_eq!(sidecar.data.get("note"), Some(&json!("b")));
        assert_eq!(sidecar.data.get("featured"), Some(&json!(true)));
    }

    #[test]
    fn test_sidecar_to_solr_includes_visibility_only_when_set() {
        let mut sidecar = Sidecar::new("abc123", 3);
        sidecar.merge_data(json!({"featured": true}).as_object().unwrap().clone());
        assert_eq!(sidecar.to_solr(), *json!({"featured": true}).as_object().unwrap());

        sidecar.public = Some(false);
        let fields = sidecar.to_solr();
        assert_eq!(fields.get("exhibit_3_public_bsi"), Some(&json!(false)));
    }
}
