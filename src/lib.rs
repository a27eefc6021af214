//! Indicator document registry
//!
//! Agents register indicator documents (metrics, thresholds, alerting and
//! layout for a product) with a central registry. Registered documents live
//! for a TTL unless refreshed, pick up environment-specific patches on the
//! way in, and are served with live per-indicator status merged on top.

pub mod actors;
pub mod api;
pub mod clock;
pub mod config;
pub mod document;
pub mod finder;
pub mod metrics;
pub mod patch;
pub mod registry;
