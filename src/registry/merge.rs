//! Read-time overlay of indicator status onto registered documents

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::status_store::StatusEntry;
use crate::document::{Indicator, IndicatorDocument, Layout, Product};

/// A registered document as served to readers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentView {
    pub identifier: String,
    pub api_version: String,
    pub product: Product,
    pub metadata: BTreeMap<String, String>,
    pub indicators: Vec<IndicatorView>,
    pub layout: Layout,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorView {
    #[serde(flatten)]
    pub indicator: Indicator,
    pub status: Option<IndicatorStatus>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndicatorStatus {
    pub value: String,
    pub updated_at: DateTime<Utc>,
}

impl From<StatusEntry> for IndicatorStatus {
    fn from(entry: StatusEntry) -> Self {
        Self {
            value: entry.value,
            updated_at: entry.observed_at,
        }
    }
}

/// Project a document and its statuses into a [`DocumentView`].
///
/// `lookup` is asked once per indicator with the document identifier and
/// the indicator name. Neither input is modified.
pub fn merge<F>(identifier: &str, document: &IndicatorDocument, lookup: F) -> DocumentView
where
    F: Fn(&str, &str) -> Option<StatusEntry>,
{
    let indicators = document
        .indicators
        .iter()
        .map(|indicator| IndicatorView {
            indicator: indicator.clone(),
            status: lookup(identifier, &indicator.name).map(IndicatorStatus::from),
        })
        .collect();

    DocumentView {
        identifier: identifier.to_string(),
        api_version: document.api_version.clone(),
        product: document.product.clone(),
        metadata: document.metadata.clone(),
        indicators,
        layout: document.layout.clone(),
    }
}
