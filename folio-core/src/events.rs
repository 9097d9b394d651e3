//! Completion notifications for background enrichment.

use crate::lang::LanguageCode;
use crate::models::ResultMap;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::debug;

/// Corrected result map published once a load's enrichment settles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichmentEvent {
    pub load_id: u64,
    pub entries: ResultMap,
    pub lang: LanguageCode,
}

/// Fan-out channel for [`EnrichmentEvent`]s.
#[derive(Debug, Clone)]
pub struct EnrichmentEvents {
    tx: broadcast::Sender<EnrichmentEvent>,
}

impl EnrichmentEvents {
    /// Create a channel buffering up to `capacity` undelivered events.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EnrichmentEvent> {
        self.tx.subscribe()
    }

    /// Publish an event, ignoring the case where nobody listens.
    pub fn publish(&self, event: EnrichmentEvent) {
        match self.tx.send(event) {
            Ok(count) => debug!("Enrichment event delivered to {} listeners", count),
            Err(_) => debug!("Enrichment event dropped, no listeners"),
        }
    }

    pub fn listener_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EnrichmentEvents {
    fn default() -> Self {
        Self::new(16)
    }
}

/// The pending enrichment of one load.
#[derive(Debug)]
pub struct EnrichmentHandle {
    task: JoinHandle<EnrichmentEvent>,
}

impl EnrichmentHandle {
    pub(crate) fn new(task: JoinHandle<EnrichmentEvent>) -> Self {
        Self { task }
    }

    /// Wait for this load's event. `None` only if the task panicked.
    pub async fn settled(self) -> Option<EnrichmentEvent> {
        self.task.await.ok()
    }
}
