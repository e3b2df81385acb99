//! Reindex-on-tag-removal
//!
//! Destroying a tagging leaves the document's indexed tag field stale.
//! `TagLedger` announces each removal; the trigger reindexes the affected
//! document. A document that has left the index is skipped.

use std::sync::Weak;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, warn};

use crate::catalog::Catalog;
use crate::error::Result;
use crate::tags::TagEvent;

pub struct ReindexTrigger {
    catalog: Weak<Catalog>,
    events: UnboundedReceiver<TagEvent>,
}

impl ReindexTrigger {
    pub(crate) fn new(catalog: Weak<Catalog>, events: UnboundedReceiver<TagEvent>) -> Self {
        Self { catalog, events }
    }

    /// Reindex the document an event refers to
    pub async fn handle(&self, event: &TagEvent) -> Result<()> {
        match self.catalog.upgrade() {
            Some(catalog) => catalog.reindex(event.document_id()).await,
            None => Ok(()),
        }
    }

    /// Process every event queued so far; returns how many were handled.
    pub async fn drain(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(event) = self.events.try_recv() {
            self.handle_logged(&event).await;
            handled += 1;
        }
        handled
    }

    /// Process events until the catalog is dropped
    pub async fn run(mut self) {
        while let Some(event) = self.events.recv().await {
            self.handle_logged(&event).await;
        }
        debug!("tag event channel closed; reindex trigger stopped");
    }

    async fn handle_logged(&self, event: &TagEvent) {
        if let Err(e) = self.handle(event).await {
            warn!(document_id = event.document_id(), error = %e, "reindex after tag removal failed");
        }
    }
}
