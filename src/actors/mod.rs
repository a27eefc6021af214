//! Background actors
//!
//! Each actor runs as an independent tokio task, owns its state, and is
//! driven by a timer plus an mpsc command channel. Request/response
//! commands carry a oneshot sender.
//!
//! - **SweeperActor** (registry): expires documents past their TTL
//! - **AgentActor** (agent): re-registers local documents on an interval

pub mod agent;
pub mod messages;
pub mod sweeper;
