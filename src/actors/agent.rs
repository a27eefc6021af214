//! AgentActor - Keeps local indicator documents registered
//!
//! ```text
//! Timer tick ──┐
//!              ├─> DocumentFinder::find() ─> POST {registry}/v1/register (per document)
//! RegisterNow ─┘
//! ```
//!
//! The registry forgets documents that are not re-registered within its
//! TTL, so the agent re-sends everything on every tick. A document the
//! registry rejects is logged and does not stop the others.

use std::time::Duration;

use anyhow::{Context, Result};
use futures::stream::{self, StreamExt};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, error, info, instrument, trace, warn};

use crate::config::AgentConfig;
use crate::finder::{DocumentFinder, FoundDocument};

use super::messages::AgentCommand;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const MAX_IN_FLIGHT: usize = 4;

pub struct AgentActor {
    finder: DocumentFinder,
    client: reqwest::Client,
    register_url: String,
    command_rx: mpsc::Receiver<AgentCommand>,
    interval_duration: Duration,
}

impl AgentActor {
    pub fn new(config: &AgentConfig, command_rx: mpsc::Receiver<AgentCommand>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            finder: DocumentFinder::new(&config.documents_glob),
            client,
            register_url: register_url(&config.registry_uri),
            command_rx,
            interval_duration: config.interval(),
        })
    }

    #[instrument(skip(self), fields(registry = %self.register_url))]
    pub async fn run(mut self) {
        debug!("starting agent actor");

        let mut ticker = interval(self.interval_duration);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = self.register_all().await {
                        error!("failed to register documents: {e:#}");
                    }
                }

                cmd = self.command_rx.recv() => {
                    match cmd {
                        Some(AgentCommand::RegisterNow { respond_to }) => {
                            debug!("received RegisterNow command");
                            let result = self.register_all().await;
                            let _ = respond_to.send(result);
                        }

                        Some(AgentCommand::Shutdown) => {
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

        debug!("agent actor stopped");
    }

    /// Register every document found, returning how many were accepted
    async fn register_all(&self) -> Result<usize> {
        let documents = self.finder.find()?;
        let total = documents.len();
        trace!(count = total, "found documents");

        let requests: Vec<_> = documents
            .into_iter()
            .map(|document| {
                let client = self.client.clone();
                let url = self.register_url.clone();
                async move {
                    let result = register_document(&client, &url, &document).await;
                    if let Err(e) = &result {
                        warn!(path = %document.path.display(), "{e:#}");
                    }
                    result.is_ok()
                }
            })
            .collect();

        let accepted = stream::iter(requests)
            .buffer_unordered(MAX_IN_FLIGHT)
            .fold(0, |count, accepted| {
                futures::future::ready(count + usize::from(accepted))
            })
            .await;

        info!(accepted, total, "Registered indicator documents");
        Ok(accepted)
    }
}

async fn register_document(
    client: &reqwest::Client,
    url: &str,
    document: &FoundDocument,
) -> Result<()> {
    let response = client
        .post(url)
        .header(reqwest::header::CONTENT_TYPE, "application/yaml")
        .body(document.bytes.clone())
        .send()
        .await
        .context("failed to send registration request")?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        anyhow::bail!("registry rejected document with {status}: {body}");
    }

    Ok(())
}

fn register_url(registry_uri: &str) -> String {
    format!("{}/v1/register", registry_uri.trim_end_matches('/'))
}

/// Handle for controlling an [`AgentActor`]
pub struct AgentHandle {
    sender: mpsc::Sender<AgentCommand>,
    task: JoinHandle<()>,
}

impl AgentHandle {
    pub fn spawn(config: &AgentConfig) -> Result<Self> {
        let (cmd_tx, cmd_rx) = mpsc::channel(8);

        let actor = AgentActor::new(config, cmd_rx)?;
        let task = tokio::spawn(actor.run());

        Ok(Self {
            sender: cmd_tx,
            task,
        })
    }

    /// Register every document immediately
    pub async fn register_now(&self) -> Result<usize> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(AgentCommand::RegisterNow { respond_to: tx })
            .await
            .context("failed to send RegisterNow command")?;

        rx.await.context("failed to receive response")?
    }

    /// Stop the agent and wait for its task to finish
    pub async fn shutdown(self) -> Result<()> {
        self.sender
            .send(AgentCommand::Shutdown)
            .await
            .context("failed to send Shutdown command")?;

        self.task.await.context("agent task panicked")
    }
}
