//! SQLite Spotlight Store
//!
//! File-based persistent storage for exhibits, sidecars, taggings and browse
//! searches. Uniqueness rules live in the schema; violations surface as
//! `ErrorKind::Conflict`.
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

use crate::domain::models::{
    Exhibit, ExhibitId, FieldMap, NewExhibit, Search, Sidecar, Tag, Tagging, TAG_CONTEXT,
};
use crate::domain::ports::{ExhibitStore, SearchStore, SidecarStore, TaggingStore};
use crate::error::{Result, StorageError};

const TAGGING_COLUMNS: &str = "tg.id, t.id, t.name, tg.taggable_id, tg.tagger_id, tg.context, tg.created_at";
const SIDECAR_COLUMNS: &str =
    "id, document_id, exhibit_id, data, public, created_at, updated_at";
const SEARCH_COLUMNS: &str = "id, exhibit_id, title, short_description, long_description, \
     query_params, weight, on_landing_page, featured_image, created_at, updated_at";

/// SQLite-based implementation of every storage port
#[derive(Clone)]
pub struct SqliteSpotlightStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteSpotlightStore {
    /// Create a new SQLite store at the given path
    pub fn new(db_path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(db_path)?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Create an in-memory SQLite store (for testing)
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| StorageError::database("SQLite connection lock poisoned"))
    }

    /// Initialize database schema
    fn init_schema(&self) -> Result<()> {
        let conn = self.conn()?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS exhibits (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                slug TEXT NOT NULL UNIQUE,
                title TEXT NOT NULL,
                created_at INTEGER NOT NULL
            )",
            [],
        )?;

        // One sidecar per (document, exhibit)
        conn.execute(
            "CREATE TABLE IF NOT EXISTS sidecars (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                document_id TEXT NOT NULL,
                exhibit_id INTEGER NOT NULL,
                data TEXT NOT NULL,
                public BOOLEAN,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL,
                UNIQUE (document_id, exhibit_id),
                FOREIGN KEY (exhibit_id) REFERENCES exhibits(id)
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS tags (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS taggings (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                tag_id INTEGER NOT NULL,
                taggable_id TEXT NOT NULL,
                tagger_id INTEGER NOT NULL,
                context TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                UNIQUE (tag_id, taggable_id, tagger_id, context),
                FOREIGN KEY (tag_id) REFERENCES tags(id)
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_taggings_taggable
             ON taggings(taggable_id, context)",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_taggings_tagger
             ON taggings(tagger_id, context)",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS searches (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                exhibit_id INTEGER NOT NULL,
                title TEXT NOT NULL,
                short_description TEXT,
                long_description TEXT,
                query_params TEXT NOT NULL,
                weight INTEGER NOT NULL DEFAULT 0,
                on_landing_page BOOLEAN NOT NULL DEFAULT 0,
                featured_image TEXT,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_searches_exhibit
             ON searches(exhibit_id)",
            [],
        )?;

        Ok(())
    }
}

fn timestamp(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap_or_default()
}

/// Parse a JSON object column; anything but an object reads as empty
fn json_object(column: usize, raw: &str) -> rusqlite::Result<FieldMap> {
    let value: serde_json::Value = serde_json::from_str(raw).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(column, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(match value {
        serde_json::Value::Object(map) => map,
        _ => FieldMap::new(),
    })
}

fn exhibit_from_row(row: &Row<'_>) -> rusqlite::Result<Exhibit> {
    Ok(Exhibit {
        id: row.get(0)?,
        slug: row.get(1)?,
        title: row.get(2)?,
        created_at: timestamp(row.get(3)?),
    })
}

fn sidecar_from_row(row: &Row<'_>) -> rusqlite::Result<Sidecar> {
    let data: String = row.get(3)?;
    Ok(Sidecar {
        id: Some(row.get(0)?),
        document_id: row.get(1)?,
        exhibit_id: row.get(2)?,
        data: json_object(3, &data)?,
        public: row.get(4)?,
        created_at: timestamp(row.get(5)?),
        updated_at: timestamp(row.get(6)?),
    })
}

fn tagging_from_row(row: &Row<'_>) -> rusqlite::Result<Tagging> {
    Ok(Tagging {
        id: row.get(0)?,
        tag: Tag {
            id: row.get(1)?,
            name: row.get(2)?,
        },
        taggable_id: row.get(3)?,
        tagger_id: row.get(4)?,
        context: row.get(5)?,
        created_at: timestamp(row.get(6)?),
    })
}

fn search_from_row(row: &Row<'_>) -> rusqlite::Result<Search> {
    let query_params: String = row.get(5)?;
    Ok(Search {
        id: Some(row.get(0)?),
        exhibit_id: row.get(1)?,
        title: row.get(2)?,
        short_description: row.get(3)?,
        long_description: row.get(4)?,
        query_params: json_object(5, &query_params)?,
        weight: row.get(6)?,
        on_landing_page: row.get(7)?,
        featured_image: row.get(8)?,
        created_at: timestamp(row.get(9)?),
        updated_at: timestamp(row.get(10)?),
    })
}

#[async_trait]
impl ExhibitStore for SqliteSpotlightStore {
    async fn create_exhibit(&self, exhibit: &NewExhibit) -> Result<Exhibit> {
        let conn = self.conn()?;
        let created_at = Utc::now();
        conn.execute(
            "INSERT INTO exhibits (slug, title, created_at) VALUES (?1, ?2, ?3)",
            params![&exhibit.slug, &exhibit.title, created_at.timestamp()],
        )?;
        Ok(Exhibit {
            id: conn.last_insert_rowid(),
            slug: exhibit.slug.clone(),
            title: exhibit.title.clone(),
            created_at,
        })
    }

    async fn get_exhibit(&self, exhibit_id: ExhibitId) -> Result<Option<Exhibit>> {
        let conn = self.conn()?;
        let exhibit = conn
            .query_row(
                "SELECT id, slug, title, created_at FROM exhibits WHERE id = ?1",
                params![exhibit_id],
                exhibit_from_row,
            )
            .optional()?;
        Ok(exhibit)
    }

    async fn find_exhibit_by_slug(&self, slug: &str) -> Result<Option<Exhibit>> {
        let conn = self.conn()?;
        let exhibit = conn
            .query_row(
                "SELECT id, slug, title, created_at FROM exhibits WHERE slug = ?1",
                params![slug],
                exhibit_from_row,
            )
            .optional()?;
        Ok(exhibit)
    }

    async fn list_exhibits(&self) -> Result<Vec<Exhibit>> {
        let conn = self.conn()?;
        let mut stmt =
            conn.prepare("SELECT id, slug, title, created_at FROM exhibits ORDER BY id")?;
        let exhibits = stmt
            .query_map([], exhibit_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(exhibits)
    }
}

#[async_trait]
impl SidecarStore for SqliteSpotlightStore {
    async fn find_sidecar(
        &self,
        document_id: &str,
        exhibit_id: ExhibitId,
    ) -> Result<Option<Sidecar>> {
        let conn = self.conn()?;
        let sql = format!(
            "SELECT {} FROM sidecars WHERE document_id = ?1 AND exhibit_id = ?2",
            SIDECAR_COLUMNS
        );
        let sidecar = conn
            .query_row(&sql, params![document_id, exhibit_id], sidecar_from_row)
            .optional()?;
        Ok(sidecar)
    }

    async fn insert_sidecar(&self, sidecar: &Sidecar) -> Result<Sidecar> {
        let conn = self.conn()?;
        let data = serde_json::to_string(&sidecar.data)?;
        conn.execute(
            "INSERT INTO sidecars (document_id, exhibit_id, data, public, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                &sidecar.document_id,
                sidecar.exhibit_id,
                data,
                sidecar.public,
                sidecar.created_at.timestamp(),
                sidecar.updated_at.timestamp()
            ],
        )?;
        let mut stored = sidecar.clone();
        stored.id = Some(conn.last_insert_rowid());
        debug!(
            document_id = %stored.document_id,
            exhibit_id = stored.exhibit_id,
            "sidecar inserted"
        );
        Ok(stored)
    }

    async fn update_sidecar(&self, sidecar: &Sidecar) -> Result<Sidecar> {
        let id = sidecar
            .id
            .ok_or_else(|| StorageError::sidecar_not_found(&sidecar.document_id, sidecar.exhibit_id))?;
        let conn = self.conn()?;
        let data = serde_json::to_string(&sidecar.data)?;
        let updated_at = Utc::now();
        let changed = conn.execute(
            "UPDATE sidecars SET data = ?1, public = ?2, updated_at = ?3 WHERE id = ?4",
            params![data, sidecar.public, updated_at.timestamp(), id],
        )?;
        if changed == 0 {
            return Err(StorageError::sidecar_not_found(
                &sidecar.document_id,
                sidecar.exhibit_id,
            ));
        }
        let mut stored = sidecar.clone();
        stored.updated_at = updated_at;
        Ok(stored)
    }

    async fn sidecars_for_document(&self, document_id: &str) -> Result<Vec<Sidecar>> {
        let conn = self.conn()?;
        let sql = format!(
            "SELECT {} FROM sidecars WHERE document_id = ?1",
            SIDECAR_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let sidecars = stmt
            .query_map(params![document_id], sidecar_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(sidecars)
    }
}

#[async_trait]
impl TaggingStore for SqliteSpotlightStore {
    async fn find_or_create_tag(&self, name: &str) -> Result<Tag> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT OR IGNORE INTO tags (name) VALUES (?1)",
            params![name],
        )?;
        let tag = conn.query_row(
            "SELECT id, name FROM tags WHERE name = ?1",
            params![name],
            |row| {
                Ok(Tag {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            },
        )?;
        Ok(tag)
    }

    async fn add_tagging(
        &self,
        tag: &Tag,
        taggable_id: &str,
        tagger_id: ExhibitId,
    ) -> Result<Tagging> {
        let conn = self.conn()?;
        let created_at = Utc::now();
        conn.execute(
            "INSERT INTO taggings (tag_id, taggable_id, tagger_id, context, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                tag.id,
                taggable_id,
                tagger_id,
                TAG_CONTEXT,
                created_at.timestamp()
            ],
        )?;
        Ok(Tagging {
            id: conn.last_insert_rowid(),
            tag: tag.clone(),
            taggable_id: taggable_id.to_string(),
            tagger_id,
            context: TAG_CONTEXT.to_string(),
            created_at,
        })
    }

    async fn remove_tagging(&self, tagging_id: i64) -> Result<Option<Tagging>> {
        let conn = self.conn()?;
        let sql = format!(
            "SELECT {} FROM taggings tg JOIN tags t ON t.id = tg.tag_id WHERE tg.id = ?1",
            TAGGING_COLUMNS
        );
        let tagging = conn
            .query_row(&sql, params![tagging_id], tagging_from_row)
            .optional()?;
        if tagging.is_some() {
            conn.execute("DELETE FROM taggings WHERE id = ?1", params![tagging_id])?;
        }
        Ok(tagging)
    }

    async fn taggings_for(&self, taggable_id: &str) -> Result<Vec<Tagging>> {
        let conn = self.conn()?;
        let sql = format!(
            "SELECT {} FROM taggings tg JOIN tags t ON t.id = tg.tag_id
             WHERE tg.taggable_id = ?1 AND tg.context = ?2 ORDER BY tg.id",
            TAGGING_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let taggings = stmt
            .query_map(params![taggable_id, TAG_CONTEXT], tagging_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(taggings)
    }

    async fn owner_taggings(
        &self,
        taggable_id: &str,
        tagger_id: ExhibitId,
    ) -> Result<Vec<Tagging>> {
        let conn = self.conn()?;
        let sql = format!(
            "SELECT {} FROM taggings tg JOIN tags t ON t.id = tg.tag_id
             WHERE tg.taggable_id = ?1 AND tg.tagger_id = ?2 AND tg.context = ?3 ORDER BY tg.id",
            TAGGING_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let taggings = stmt
            .query_map(params![taggable_id, tagger_id, TAG_CONTEXT], tagging_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(taggings)
    }

    async fn taggings_by_tagger(&self, tagger_id: ExhibitId) -> Result<Vec<Tagging>> {
        let conn = self.conn()?;
        let sql = format!(
            "SELECT {} FROM taggings tg JOIN tags t ON t.id = tg.tag_id
             WHERE tg.tagger_id = ?1 AND tg.context = ?2 ORDER BY tg.id",
            TAGGING_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let taggings = stmt
            .query_map(params![tagger_id, TAG_CONTEXT], tagging_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(taggings)
    }
}

#[async_trait]
impl SearchStore for SqliteSpotlightStore {
    async fn save_search(&self, search: &Search) -> Result<Search> {
        let conn = self.conn()?;
        let query_params = serde_json::to_string(&search.query_params)?;
        let mut stored = search.clone();
        match search.id {
            Some(id) => {
                stored.updated_at = Utc::now();
                let changed = conn.execute(
                    "UPDATE searches SET exhibit_id = ?1, title = ?2, short_description = ?3,
                        long_description = ?4, query_params = ?5, weight = ?6,
                        on_landing_page = ?7, featured_image = ?8, updated_at = ?9
                     WHERE id = ?10",
                    params![
                        search.exhibit_id,
                        &search.title,
                        &search.short_description,
                        &search.long_description,
                        query_params,
                        search.weight,
                        search.on_landing_page,
                        &search.featured_image,
                        stored.updated_at.timestamp(),
                        id
                    ],
                )?;
                if changed == 0 {
                    return Err(StorageError::search_not_found(id));
                }
            }
            None => {
                conn.execute(
                    "INSERT INTO searches (exhibit_id, title, short_description, long_description,
                        query_params, weight, on_landing_page, featured_image, created_at, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                    params![
                        search.exhibit_id,
                        &search.title,
                        &search.short_description,
                        &search.long_description,
                        query_params,
                        search.weight,
                        search.on_landing_page,
                        &search.featured_image,
                        search.created_at.timestamp(),
                        search.updated_at.timestamp()
                    ],
                )?;
                stored.id = Some(conn.last_insert_rowid());
            }
        }
        Ok(stored)
    }

    async fn get_search(&self, search_id: i64) -> Result<Option<Search>> {
        let conn = self.conn()?;
        let sql = format!("SELECT {} FROM searches WHERE id = ?1", SEARCH_COLUMNS);
        let search = conn
            .query_row(&sql, params![search_id], search_from_row)
            .optional()?;
        Ok(search)
    }

    async fn searches_for_exhibit(&self, exhibit_id: ExhibitId) -> Result<Vec<Search>> {
        let conn = self.conn()?;
        let sql = format!(
            "SELECT {} FROM searches WHERE exhibit_id = ?1 ORDER BY weight, id",
            SEARCH_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let searches = stmt
            .query_map(params![exhibit_id], search_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(searches)
    }

    async fn delete_search(&self, search_id: i64) -> Result<()> {
        let conn = self.conn()?;
        let changed = conn.execute("DELETE FROM searches WHERE id = ?1", params![search_id])?;
        if changed == 0 {
            return Err(StorageError::search_not_found(search_id));
        }
        Ok(())
    }
}
