//! Storage Infrastructure Layer
//!
//! Storage backends implementing every port trait

pub mod memory_store;
pub use memory_store::InMemorySpotlightStore;

#[cfg(feature = "sqlite")]
pub mod sqlite_store;
#[cfg(feature = "sqlite")]
pub use sqlite_store::SqliteSpotlightStore;

// If sqlite feature disabled, use InMemory as fallback
#[cfg(not(feature = "sqlite"))]
pub type SqliteSpotlightStore = InMemorySpotlightStore;
