use thiserror::Error;

use crate::patch::PatchError;

/// Failures while turning submitted bytes into a stored document
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("could not parse document: {0}")]
    Malformed(#[source] serde_yaml::Error),

    #[error("indicator {indicator} threshold {threshold}: {reason}")]
    InvalidThreshold {
        indicator: usize,
        threshold: usize,
        reason: String,
    },

    #[error("document failed validation: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error(transparent)]
    Patch(#[from] PatchError),

    #[error("could not encode document: {0}")]
    Encoding(#[from] serde_json::Error),
}

impl DocumentError {
    /// Human readable problems, one per entry
    pub fn messages(&self) -> Vec<String> {
        match self {
            DocumentError::Validation(errors) => errors.clone(),
            other => vec![other.to_string()],
        }
    }
}
