//! In-memory registry state: registered documents and their status overlay

mod document_store;
mod merge;
mod status_store;

pub use document_store::{DocumentStore, RegisteredEntry, Registration};
pub use merge::{DocumentView, IndicatorStatus, IndicatorView, merge};
pub use status_store::{StatusEntry, StatusStore};
