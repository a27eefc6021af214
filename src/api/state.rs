//! API shared state

use std::sync::Arc;

use crate::clock::Clock;
use crate::metrics::RegistryMetrics;
use crate::patch::Patch;
use crate::registry::{DocumentStore, StatusStore};

/// Shared state passed to all API handlers
#[derive(Debug, Clone)]
pub struct ApiState {
    /// Registered documents
    pub documents: Arc<DocumentStore>,

    /// Per-indicator status overlay
    pub statuses: Arc<StatusStore>,

    /// Patches applied to every registered document, in order
    pub patches: Arc<[Patch]>,

    pub clock: Arc<dyn Clock>,

    pub metrics: RegistryMetrics,
}

impl ApiState {
    pub fn new(
        documents: Arc<DocumentStore>,
        statuses: Arc<StatusStore>,
        patches: Vec<Patch>,
        clock: Arc<dyn Clock>,
        metrics: RegistryMetrics,
    ) -> Self {
        Self {
            documents,
            statuses,
            patches: patches.into(),
            clock,
            metrics,
        }
    }
}
