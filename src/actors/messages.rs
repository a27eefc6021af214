//! Command types for the registry's background actors

use tokio::sync::oneshot;

/// Commands accepted by the expiry sweeper
#[derive(Debug)]
pub enum SweeperCommand {
    /// Run a sweep immediately, answering with the number of documents
    /// removed
    SweepNow { respond_to: oneshot::Sender<usize> },

    /// Stop the sweep loop
    Shutdown,
}

/// Commands accepted by the registration agent
#[derive(Debug)]
pub enum AgentCommand {
    /// Register every document now, answering with how many the registry
    /// accepted
    RegisterNow {
        respond_to: oneshot::Sender<anyhow::Result<usize>>,
    },

    /// Stop the registration loop
    Shutdown,
}
