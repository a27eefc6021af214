//! Conditional structural patches for indicator documents
//!
//! A [`Patch`] pairs a [`Match`] predicate with an ordered list of
//! path-addressed [`Operation`]s. Patches are applied to raw document bytes
//! before parsing, so they can touch any field an author may write.
//! Operations that cannot be resolved are skipped and recorded in a
//! [`PatchReport`] instead of failing the document.

mod engine;
mod matcher;
mod selector;

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use thiserror::Error;
use tracing::{info, warn};

pub use engine::{
    OperationOutcome, OperationReport, PatchOutcome, PatchReport, SkipReason, apply_patches,
};
pub use selector::{Selector, Token};

use crate::document::render_scalar;

#[derive(Debug, Error)]
pub enum PatchError {
    #[error("could not parse patch: {0}")]
    Malformed(#[source] serde_yaml::Error),

    #[error("could not parse document for patching: {0}")]
    Document(#[source] serde_yaml::Error),

    #[error("could not encode patched document: {0}")]
    Encoding(#[source] serde_yaml::Error),

    #[error("invalid patch glob {pattern:?}: {source}")]
    Glob {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },
}

/// Which documents a patch applies to
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawMatch", into = "RawMatch")]
pub struct Match {
    pub name: Option<String>,
    pub version: Option<String>,
    pub metadata: BTreeMap<String, String>,
}

impl Match {
    /// The product clause only takes part in matching when both name and
    /// version are given
    pub fn has_product_clause(&self) -> bool {
        self.name.is_some() && self.version.is_some()
    }

    /// Only one of product name and version is given, so the product
    /// clause is ignored
    pub fn is_product_clause_partial(&self) -> bool {
        self.name.is_some() != self.version.is_some()
    }

    /// A match with no effective clause selects every document
    pub fn is_empty(&self) -> bool {
        !self.has_product_clause() && self.metadata.is_empty()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct RawMatch {
    #[serde(default)]
    product: RawMatchProduct,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    metadata: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct RawMatchProduct {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    version: Option<Value>,
}

impl From<RawMatch> for Match {
    fn from(raw: RawMatch) -> Self {
        Self {
            name: raw.product.name.as_ref().and_then(render_scalar),
            version: raw.product.version.as_ref().and_then(render_scalar),
            metadata: raw
                .metadata
                .iter()
                .filter_map(|(key, value)| render_scalar(value).map(|v| (key.clone(), v)))
                .collect(),
        }
    }
}

impl From<Match> for RawMatch {
    fn from(matcher: Match) -> Self {
        Self {
            product: RawMatchProduct {
                name: matcher.name.map(Value::String),
                version: matcher.version.map(Value::String),
            },
            metadata: matcher
                .metadata
                .into_iter()
                .map(|(key, value)| (key, Value::String(value)))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationType {
    Add,
    Replace,
    Remove,
    Test,
    #[serde(other)]
    Unsupported,
}

impl std::fmt::Display for OperationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            OperationType::Add => "add",
            OperationType::Replace => "replace",
            OperationType::Remove => "remove",
            OperationType::Test => "test",
            OperationType::Unsupported => "unsupported",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    #[serde(rename = "type")]
    pub kind: OperationType,
    #[serde(default)]
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patch {
    #[serde(default)]
    pub api_version: String,
    #[serde(default, rename = "match")]
    pub matcher: Match,
    #[serde(default)]
    pub operations: Vec<Operation>,
}

impl Patch {
    pub fn from_yaml(bytes: &[u8]) -> Result<Self, PatchError> {
        serde_yaml::from_slice(bytes).map_err(PatchError::Malformed)
    }
}

/// Load every patch file matched by `pattern`.
///
/// Files that cannot be read or parsed are logged and skipped, as are
/// patches whose match would select every document.
pub fn load_patches(pattern: &str) -> Result<Vec<Patch>, PatchError> {
    let paths = glob::glob(pattern).map_err(|source| PatchError::Glob {
        pattern: pattern.to_string(),
        source,
    })?;

    let mut patches = Vec::new();

    for entry in paths {
        let path = match entry {
            Ok(path) => path,
            Err(e) => {
                warn!("Skipping unreadable patch path: {e}");
                continue;
            }
        };

        if let Some(patch) = load_patch_file(&path) {
            patches.push(patch);
        }
    }

    info!(count = patches.len(), pattern, "Loaded patches");
    Ok(patches)
}

fn load_patch_file(path: &Path) -> Option<Patch> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(path = %path.display(), "Could not read patch file: {e}");
            return None;
        }
    };

    let patch = match Patch::from_yaml(&bytes) {
        Ok(patch) => patch,
        Err(e) => {
            warn!(path = %path.display(), "Could not parse patch file: {e}");
            return None;
        }
    };

    if patch.matcher.is_product_clause_partial() {
        warn!(
            path = %path.display(),
            name = ?patch.matcher.name,
            version = ?patch.matcher.version,
            "Patch product match needs both name and version, ignoring it"
        );
    }

    if patch.matcher.is_empty() {
        warn!(
            path = %path.display(),
            "Rejecting patch without a match clause, it would apply to every document"
        );
        return None;
    }

    Some(patch)
}
