//! Curation configuration
//!
//! YAML schema v1:
//!
//! ```yaml
//! version: 1
//! storage:
//!   backend: sqlite          # memory | sqlite
//!   path: spotlight.db
//! index:
//!   backend: tantivy         # memory | tantivy
//!   path: index/
//!   writer_heap_bytes: 50000000
//! uploads:
//!   storage: file            # file | fog
//!   asset_root: /assets
//! logging:
//!   filter: info,spotlight_curation=debug
//! ```
//!
//! Every section is optional; an empty file with just `version: 1` yields
//! an all-in-memory setup.

mod error;

pub use error::{ConfigError, ConfigResult};

use serde::{Deserialize, Serialize};
use spotlight_storage::UploadStorage;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

pub const SUPPORTED_VERSIONS: &[u64] = &[1];

/// Tantivy refuses writer heaps below 15MB
pub const MIN_WRITER_HEAP_BYTES: usize = 15_000_000;
pub const MAX_WRITER_HEAP_BYTES: usize = 4_000_000_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CurationConfig {
    /// Schema version (always 1 for v1)
    pub version: u64,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub index: IndexConfig,

    #[serde(default)]
    pub uploads: UploadsConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    #[default]
    Memory,
    Sqlite,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,

    /// Database file (sqlite only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexBackend {
    #[default]
    Memory,
    Tantivy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IndexConfig {
    #[serde(default)]
    pub backend: IndexBackend,

    /// Index directory (tantivy only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    #[serde(default = "default_writer_heap_bytes")]
    pub writer_heap_bytes: usize,
}

fn default_writer_heap_bytes() -> usize {
    spotlight_index::DEFAULT_WRITER_HEAP_BYTES
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            backend: IndexBackend::default(),
            path: None,
            writer_heap_bytes: default_writer_heap_bytes(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UploadsConfig {
    #[serde(default)]
    pub storage: UploadStorage,

    #[serde(default = "default_asset_root")]
    pub asset_root: String,
}

fn default_asset_root() -> String {
    "/assets".to_string()
}

impl Default for UploadsConfig {
    fn default() -> Self {
        Self {
            storage: UploadStorage::default(),
            asset_root: default_asset_root(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// `EnvFilter` directive; `RUST_LOG` takes precedence
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

impl Default for CurationConfig {
    fn default() -> Self {
        Self {
            version: 1,
            storage: StorageConfig::default(),
            index: IndexConfig::default(),
            uploads: UploadsConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl CurationConfig {
    /// Load and validate a YAML file
    pub fn from_yaml(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(content: &str) -> ConfigResult<Self> {
        let raw: serde_yaml::Value = serde_yaml::from_str(content)?;

        // Version check before strict parsing so a missing header gets its own error
        let version = raw
            .get("version")
            .ok_or(ConfigError::MissingVersion)?
            .as_u64()
            .ok_or(ConfigError::MissingVersion)?;
        if !SUPPORTED_VERSIONS.contains(&version) {
            return Err(ConfigError::UnsupportedVersion {
                found: version,
                supported: SUPPORTED_VERSIONS.to_vec(),
            });
        }

        let config: Self = serde_yaml::from_value(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml(&self) -> ConfigResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Install the global subscriber with `logging.filter`
    ///
    /// Returns `false` if one was already installed.
    pub fn init_logging(&self) -> ConfigResult<bool> {
        crate::telemetry::init_tracing(&self.logging.filter)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.storage.backend == StorageBackend::Sqlite && self.storage.path.is_none() {
            return Err(ConfigError::MissingField {
                section: "storage".to_string(),
                field: "path".to_string(),
                hint: "The sqlite backend needs a database file.".to_string(),
            });
        }

        if self.index.backend == IndexBackend::Tantivy && self.index.path.is_none() {
            return Err(ConfigError::MissingField {
                section: "index".to_string(),
                field: "path".to_string(),
                hint: "The tantivy backend needs an index directory.".to_string(),
            });
        }

        let heap = self.index.writer_heap_bytes;
        if !(MIN_WRITER_HEAP_BYTES..=MAX_WRITER_HEAP_BYTES).contains(&heap) {
            return Err(ConfigError::Range {
                field: "index.writer_heap_bytes".to_string(),
                value: heap.to_string(),
                min: MIN_WRITER_HEAP_BYTES.to_string(),
                max: MAX_WRITER_HEAP_BYTES.to_string(),
                hint: "Tantivy splits this budget across its indexing thread.".to_string(),
            });
        }

        EnvFilter::try_new(&self.logging.filter).map_err(|e| ConfigError::LogFilter {
            filter: self.logging.filter.clone(),
            reason: e.to_string(),
        })?;

        Ok(())
    }
}
