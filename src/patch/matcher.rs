use serde_yaml::Value;

use super::Match;
use crate::document::{API_VERSION_V1, render_scalar};

impl Match {
    /// Decide whether a raw document is selected by this match.
    ///
    /// The product clause only applies when both name and version are
    /// given. The metadata clause only applies when it has entries. A match
    /// with neither clause selects everything; [`super::load_patches`]
    /// refuses such patches.
    pub fn matches(&self, document: &Value) -> bool {
        self.product_matches(document) && self.metadata_matches(document)
    }

    fn product_matches(&self, document: &Value) -> bool {
        let (Some(name), Some(version)) = (&self.name, &self.version) else {
            return true;
        };

        let product = product_of(document);
        let field = |key: &str| product.and_then(|p| p.get(key)).and_then(render_scalar);

        field("name").as_ref() == Some(name) && field("version").as_ref() == Some(version)
    }

    fn metadata_matches(&self, document: &Value) -> bool {
        if self.metadata.is_empty() {
            return true;
        }

        let metadata = metadata_of(document);

        self.metadata.iter().all(|(key, expected)| {
            metadata
                .and_then(|m| m.get(key.as_str()))
                .and_then(render_scalar)
                .is_some_and(|actual| &actual == expected)
        })
    }
}

fn is_v1(document: &Value) -> bool {
    document
        .get("apiVersion")
        .and_then(Value::as_str)
        .is_some_and(|version| version == API_VERSION_V1)
}

fn product_of(document: &Value) -> Option<&Value> {
    if is_v1(document) {
        document.get("spec")?.get("product")
    } else {
        document.get("product")
    }
}

fn metadata_of(document: &Value) -> Option<&Value> {
    if is_v1(document) {
        document.get("metadata")?.get("labels")
    } else {
        document.get("metadata")
    }
}
