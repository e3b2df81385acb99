//! Sidecar persistence
//!
//! A sidecar is unique per `(document, exhibit)`. Two writers can both
//! initialize the same sidecar in memory and race to insert it; the loser
//! folds its changes into the winner's row instead of failing.

use spotlight_storage::{ExhibitId, Sidecar, SidecarStore};
use std::sync::Arc;
use tracing::debug;

use crate::error::Result;

pub struct SidecarService {
    store: Arc<dyn SidecarStore>,
}

impl SidecarService {
    pub fn new(store: Arc<dyn SidecarStore>) -> Self {
        Self { store }
    }

    /// Stored sidecar, or a fresh unsaved one
    pub async fn find_or_initialize(
        &self,
        document_id: &str,
        exhibit_id: ExhibitId,
    ) -> Result<Sidecar> {
        Ok(self
            .store
            .find_sidecar(document_id, exhibit_id)
            .await?
            .unwrap_or_else(|| Sidecar::new(document_id, exhibit_id)))
    }

    /// Every stored sidecar for a document, across exhibits
    pub async fn for_document(&self, document_id: &str) -> Result<Vec<Sidecar>> {
        Ok(self.store.sidecars_for_document(document_id).await?)
    }

    /// Insert or update; returns the stored row.
    pub async fn save(&self, sidecar: &Sidecar) -> Result<Sidecar> {
        if !sidecar.is_new_record() {
            return Ok(self.store.update_sidecar(sidecar).await?);
        }

        match self.store.insert_sidecar(sidecar).await {
            Ok(stored) => Ok(stored),
            Err(e) if e.is_conflict() => {
                debug!(
                    document_id = %sidecar.document_id,
                    exhibit_id = sidecar.exhibit_id,
                    "sidecar inserted concurrently; merging into stored row"
                );
                let mut existing = self
                    .store
                    .find_sidecar(&sidecar.document_id, sidecar.exhibit_id)
                    .await?
                    .ok_or(e)?;
                existing.merge_data(sidecar.data.clone());
                if sidecar.public.is_some() {
                    existing.public = sidecar.public;
                }
                Ok(self.store.update_sidecar(&existing).await?)
            }
            Err(e) => Err(e.into()),
        }
    }
}
