//! Index records and field-level update semantics

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{IndexError, IndexResult};

/// Field name → value(s) mapping as stored in the index
pub type FieldMap = Map<String, Value>;

/// Unique key field of every index record
pub const ID_FIELD: &str = "id";

/// A document as seen through the search index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexRecord {
    pub id: String,
    /// Every stored field except `id`
    #[serde(default)]
    pub fields: FieldMap,
}

impl IndexRecord {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            fields: FieldMap::new(),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: Value) -> Self {
        self.fields.insert(name.into(), value);
        self
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Apply a projection as a field-level "set" on this record.
    ///
    /// `null` and empty lists remove the field; `id` is never touched.
    pub fn apply(&mut self, projection: &FieldMap) {
        for (name, value) in projection {
            if name == ID_FIELD {
                continue;
            }
            if is_empty_value(value) {
                self.fields.remove(name);
            } else {
                self.fields.insert(name.clone(), value.clone());
            }
        }
    }

    /// Flat map including `id`
    pub fn to_field_map(&self) -> FieldMap {
        let mut map = self.fields.clone();
        map.insert(ID_FIELD.to_string(), Value::String(self.id.clone()));
        map
    }
}

/// Read the `id` of a projection
pub fn projection_id(projection: &FieldMap) -> IndexResult<&str> {
    projection
        .get(ID_FIELD)
        .and_then(Value::as_str)
        .ok_or_else(|| IndexError::InvalidInput("projection has no string id".to_string()))
}

fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

/// Whether `value` holds `needle` (scalar equality or list membership)
pub fn field_matches(value: &Value, needle: &str) -> bool {
    match value {
        Value::String(s) => s == needle,
        Value::Array(items) => items.iter().any(|item| field_matches(item, needle)),
        Value::Null | Value::Object(_) => false,
        other => other.to_string() == needle,
    }
}

/// Searchable `field=value` terms of a record (one per scalar value)
pub fn field_terms(fields: &FieldMap) -> Vec<String> {
    let mut terms = Vec::new();
    for (name, value) in fields {
        collect_terms(name, value, &mut terms);
    }
    terms
}

fn collect_terms(name: &str, value: &Value, terms: &mut Vec<String>) {
    match value {
        Value::Array(items) => {
            for item in items {
                collect_terms(name, item, terms);
            }
        }
        Value::String(s) => terms.push(format!("{}={}", name, s)),
        Value::Null | Value::Object(_) => {}
        other => terms.push(format!("{}={}", name, other)),
    }
}
