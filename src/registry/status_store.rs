use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::trace;

/// Latest status reported for one indicator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEntry {
    pub value: String,
    pub observed_at: DateTime<Utc>,
}

/// Per-indicator status overlay keyed by document identifier and indicator
/// name
///
/// Entries never expire. Once their document leaves the document store they
/// are simply never read again.
#[derive(Debug, Default)]
pub struct StatusStore {
    statuses: RwLock<HashMap<String, HashMap<String, StatusEntry>>>,
}

impl StatusStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a status, last write wins. The document does not have to be
    /// registered.
    pub async fn set_status(
        &self,
        document: &str,
        indicator: &str,
        value: &str,
        now: DateTime<Utc>,
    ) {
        let mut statuses = self.statuses.write().await;
        statuses.entry(document.to_string()).or_default().insert(
            indicator.to_string(),
            StatusEntry {
                value: value.to_string(),
                observed_at: now,
            },
        );

        trace!(document, indicator, value, "Recorded status");
    }

    pub async fn get(&self, document: &str, indicator: &str) -> Option<StatusEntry> {
        let statuses = self.statuses.read().await;
        statuses.get(document)?.get(indicator).cloned()
    }

    /// Every status recorded for one document, keyed by indicator name
    pub async fn for_document(&self, document: &str) -> HashMap<String, StatusEntry> {
        let statuses = self.statuses.read().await;
        statuses.get(document).cloned().unwrap_or_default()
    }
}
