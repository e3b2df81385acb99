//! Tantivy Schema Definition
//!
//! # 3-Field Schema
//!
//! 1. `id` - Document ID (STORED, keyword)
//! 2. `fields` - Record fields as a JSON object (STORED only)
//! 3. `terms` - `field=value` keywords, one per scalar value (indexed only)

use tantivy::schema::{Field, Schema, STORED, STRING};

use crate::error::{IndexError, IndexResult};

// Field name constants (for type-safe access)
pub const FIELD_ID: &str = "id";
pub const FIELD_FIELDS: &str = "fields";
pub const FIELD_TERMS: &str = "terms";

/// Build Tantivy schema
pub fn build_schema() -> Schema {
    let mut schema_builder = Schema::builder();

    // Exact-match key, stored so hits can be mapped back to documents
    schema_builder.add_text_field(FIELD_ID, STRING | STORED);

    // Opaque payload
    schema_builder.add_text_field(FIELD_FIELDS, STORED);

    // Multi-valued keyword field backing find_ids_by_field
    schema_builder.add_text_field(FIELD_TERMS, STRING);

    schema_builder.build()
}

/// Field handles (cached for performance)
#[derive(Debug, Clone)]
pub struct SchemaFields {
    pub schema: Schema,
    pub id: Field,
    pub fields: Field,
    pub terms: Field,
}

impl SchemaFields {
    /// Resolve handles against an existing index schema
    pub fn from_schema(schema: Schema) -> IndexResult<Self> {
        let field = |name: &str| {
            schema.get_field(name).map_err(|_| {
                IndexError::InternalError(format!("index schema has no '{}' field", name))
            })
        };
        Ok(Self {
            id: field(FIELD_ID)?,
            fields: field(FIELD_FIELDS)?,
            terms: field(FIELD_TERMS)?,
            schema: schema.clone(),
        })
    }
}
