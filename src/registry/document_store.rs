//! Time-indexed store of registered documents
//!
//! Agents re-register their documents on a fixed cadence. Every
//! registration refreshes the entry's timestamp, and the sweeper removes
//! entries that have not been refreshed within the TTL.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;
use tracing::{debug, instrument, trace};

/// A document as held by the registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredEntry {
    pub identifier: String,
    /// Canonical document bytes. Shared so snapshots don't copy documents.
    pub bytes: Arc<[u8]>,
    pub last_refreshed_at: DateTime<Utc>,
}

/// What a registration did to the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    Inserted,
    /// Same identifier and bytes, timestamp moved forward
    Refreshed,
    /// Same identifier, different bytes
    Replaced,
}

#[derive(Debug)]
pub struct DocumentStore {
    entries: RwLock<HashMap<String, RegisteredEntry>>,
    ttl: Duration,
}

impl DocumentStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Insert or refresh a document.
    ///
    /// The timestamp never moves backwards, so a slow caller carrying an
    /// older `now` cannot shorten an entry's life.
    #[instrument(skip(self, bytes), fields(bytes = bytes.len()))]
    pub async fn register(
        &self,
        identifier: &str,
        bytes: &[u8],
        now: DateTime<Utc>,
    ) -> Registration {
        let mut entries = self.entries.write().await;

        let registration = match entries.get_mut(identifier) {
            Some(entry) => {
                entry.last_refreshed_at = entry.last_refreshed_at.max(now);

                if *entry.bytes == *bytes {
                    Registration::Refreshed
                } else {
                    entry.bytes = Arc::from(bytes);
                    Registration::Replaced
                }
            }
            None => {
                entries.insert(
                    identifier.to_string(),
                    RegisteredEntry {
                        identifier: identifier.to_string(),
                        bytes: Arc::from(bytes),
                        last_refreshed_at: now,
                    },
                );
                Registration::Inserted
            }
        };

        trace!(?registration, "Registered document");
        registration
    }

    /// Remove every entry idle for longer than `ttl` and return the removed
    /// identifiers.
    ///
    /// Candidates are collected under the read lock and re-checked under the
    /// write lock, so a registration that lands between the two survives.
    #[instrument(skip(self))]
    pub async fn sweep(&self, now: DateTime<Utc>, ttl: Duration) -> BTreeSet<String> {
        let candidates: Vec<String> = {
            let entries = self.entries.read().await;
            entries
                .values()
                .filter(|entry| is_expired(entry, now, ttl))
                .map(|entry| entry.identifier.clone())
                .collect()
        };

        if candidates.is_empty() {
            return BTreeSet::new();
        }

        let mut entries = self.entries.write().await;
        let mut removed = BTreeSet::new();

        for identifier in candidates {
            let still_expired = entries
                .get(&identifier)
                .is_some_and(|entry| is_expired(entry, now, ttl));

            if still_expired {
                entries.remove(&identifier);
                removed.insert(identifier);
            } else {
                debug!(%identifier, "Entry refreshed during sweep, keeping it");
            }
        }

        removed
    }

    /// Snapshot of every live entry, ordered by identifier.
    ///
    /// Entries past the TTL are left out even if the sweeper has not
    /// reached them yet.
    pub async fn list(&self, now: DateTime<Utc>) -> Vec<RegisteredEntry> {
        let entries = self.entries.read().await;

        let mut live: Vec<RegisteredEntry> = entries
            .values()
            .filter(|entry| !is_expired(entry, now, self.ttl))
            .cloned()
            .collect();

        live.sort_by(|a, b| a.identifier.cmp(&b.identifier));
        live
    }

    pub async fn get(&self, identifier: &str) -> Option<RegisteredEntry> {
        self.entries.read().await.get(identifier).cloned()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

fn is_expired(entry: &RegisteredEntry, now: DateTime<Utc>, ttl: Duration) -> bool {
    now.signed_duration_since(entry.last_refreshed_at) > ttl
}
