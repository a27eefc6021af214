//! SweeperActor - Expires documents that stopped being re-registered
//!
//! ```text
//! Timer tick ─┐
//!             ├─> DocumentStore::sweep(now, ttl) ─> metrics + log
//! SweepNow ───┘
//! ```
//!
//! The sweep runs on its own cadence, independent of read traffic, so a
//! dead agent's documents disappear even if nobody lists them.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, info, instrument, warn};

use crate::clock::Clock;
use crate::metrics::RegistryMetrics;
use crate::registry::DocumentStore;

use super::messages::SweeperCommand;

pub struct SweeperActor {
    documents: Arc<DocumentStore>,
    clock: Arc<dyn Clock>,
    metrics: Option<RegistryMetrics>,
    command_rx: mpsc::Receiver<SweeperCommand>,
    interval_duration: Duration,
}

impl SweeperActor {
    pub fn new(
        documents: Arc<DocumentStore>,
        clock: Arc<dyn Clock>,
        metrics: Option<RegistryMetrics>,
        command_rx: mpsc::Receiver<SweeperCommand>,
        interval_duration: Duration,
    ) -> Self {
        Self {
            documents,
            clock,
            metrics,
            command_rx,
            interval_duration,
        }
    }

    /// Run until a Shutdown command arrives or every handle is dropped
    #[instrument(skip(self), fields(interval = ?self.interval_duration))]
    pub async fn run(mut self) {
        debug!("starting sweeper actor");

        let mut ticker = interval(self.interval_duration);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.sweep().await;
                }

                cmd = self.command_rx.recv() => {
                    match cmd {
                        Some(SweeperCommand::SweepNow { respond_to }) => {
                            debug!("received SweepNow command");
                            let removed = self.sweep().await;
                            let _ = respond_to.send(removed);
                        }

                        Some(SweeperCommand::Shutdown) => {
                            debug!("received shutdown command");
                            break;
                        }

                        None => {
                            warn!("command channel closed, shutting down");
                            break;
                        }
                    }
                }
            }
        }

        debug!("sweeper actor stopped");
    }

    async fn sweep(&self) -> usize {
        let now = self.clock.now();
        let removed = self.documents.sweep(now, self.documents.ttl()).await;

        if !removed.is_empty() {
            info!(count = removed.len(), documents = ?removed, "Expired documents");
        }

        if let Some(metrics) = &self.metrics {
            metrics.documents_expired_total.inc_by(removed.len() as u64);
            let remaining = self.documents.len().await;
            metrics
                .registered_documents
                .set(i64::try_from(remaining).unwrap_or(i64::MAX));
        }

        removed.len()
    }
}

/// Handle for controlling a [`SweeperActor`]
pub struct SweeperHandle {
    sender: mpsc::Sender<SweeperCommand>,
    task: JoinHandle<()>,
}

impl SweeperHandle {
    /// Spawn the sweeper on the current runtime
    pub fn spawn(
        documents: Arc<DocumentStore>,
        clock: Arc<dyn Clock>,
        metrics: Option<RegistryMetrics>,
        interval_duration: Duration,
    ) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel(8);

        let actor = SweeperActor::new(documents, clock, metrics, cmd_rx, interval_duration);
        let task = tokio::spawn(actor.run());

        Self {
            sender: cmd_tx,
            task,
        }
    }

    /// Sweep immediately and return how many documents were removed
    pub async fn sweep_now(&self) -> Result<usize> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(SweeperCommand::SweepNow { respond_to: tx })
            .await
            .context("failed to send SweepNow command")?;

        rx.await.context("failed to receive sweep result")
    }

    /// Stop the sweeper and wait for its task to finish
    pub async fn shutdown(self) -> Result<()> {
        self.sender
            .send(SweeperCommand::Shutdown)
            .await
            .context("failed to send Shutdown command")?;

        self.task.await.context("sweeper task panicked")
    }
}
