use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::{trace, warn};

/// A document file read from disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoundDocument {
    pub path: PathBuf,
    pub bytes: Vec<u8>,
}

/// Locates the indicator documents an agent registers
#[derive(Debug, Clone)]
pub struct DocumentFinder {
    pattern: String,
}

impl DocumentFinder {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
        }
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Read every file matching the pattern. Unreadable files are logged and
    /// left out.
    pub fn find(&self) -> Result<Vec<FoundDocument>> {
        let paths = glob::glob(&self.pattern)
            .with_context(|| format!("invalid documents glob {:?}", self.pattern))?;

        let mut documents = Vec::new();

        for entry in paths {
            let path = match entry {
                Ok(path) if path.is_file() => path,
                Ok(path) => {
                    trace!(path = %path.display(), "Skipping non-file match");
                    continue;
                }
                Err(e) => {
                    warn!("Skipping unreadable document path: {e}");
                    continue;
                }
            };

            match std::fs::read(&path) {
                Ok(bytes) => documents.push(FoundDocument { path, bytes }),
                Err(e) => warn!(path = %path.display(), "Could not read document: {e}"),
            }
        }

        Ok(documents)
    }
}
