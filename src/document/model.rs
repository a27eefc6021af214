//! Typed indicator document
//!
//! These types are the canonical form of a document after parsing and
//! defaulting. Their JSON serialization is what the registry stores and
//! hashes, so field order and map ordering are deterministic (`BTreeMap`).

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Product identity plus everything a monitoring backend needs to know
/// about it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndicatorDocument {
    pub api_version: String,
    pub product: Product,
    pub metadata: BTreeMap<String, String>,
    pub indicators: Vec<Indicator>,
    pub layout: Layout,
}

impl IndicatorDocument {
    /// Look up an indicator by name
    pub fn indicator(&self, name: &str) -> Option<&Indicator> {
        self.indicators.iter().find(|indicator| indicator.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Indicator {
    pub name: String,
    pub promql: String,
    pub thresholds: Vec<Threshold>,
    pub alert: Alert,
    pub presentation: Presentation,
    pub documentation: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Threshold {
    pub level: String,
    pub operator: ThresholdOperator,
    pub value: f64,
}

/// Comparison applied between an indicator's value and a threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThresholdOperator {
    Lt,
    Lte,
    Eq,
    Neq,
    Gte,
    Gt,
    Undefined,
}

impl ThresholdOperator {
    /// Order in which comparison keywords are looked up in raw input. The
    /// first keyword present wins.
    pub const PRECEDENCE: [ThresholdOperator; 6] = [
        ThresholdOperator::Lt,
        ThresholdOperator::Lte,
        ThresholdOperator::Eq,
        ThresholdOperator::Neq,
        ThresholdOperator::Gte,
        ThresholdOperator::Gt,
    ];

    /// The raw document keyword for this operator
    pub fn keyword(&self) -> &'static str {
        match self {
            ThresholdOperator::Lt => "lt",
            ThresholdOperator::Lte => "lte",
            ThresholdOperator::Eq => "eq",
            ThresholdOperator::Neq => "neq",
            ThresholdOperator::Gte => "gte",
            ThresholdOperator::Gt => "gt",
            ThresholdOperator::Undefined => "undefined",
        }
    }

    /// PromQL comparison symbol, if the operator is defined
    pub fn comparator(&self) -> Option<&'static str> {
        match self {
            ThresholdOperator::Lt => Some("<"),
            ThresholdOperator::Lte => Some("<="),
            ThresholdOperator::Eq => Some("=="),
            ThresholdOperator::Neq => Some("!="),
            ThresholdOperator::Gte => Some(">="),
            ThresholdOperator::Gt => Some(">"),
            ThresholdOperator::Undefined => None,
        }
    }
}

impl fmt::Display for ThresholdOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    #[serde(rename = "for")]
    pub for_duration: String,
    pub step: String,
}

impl Default for Alert {
    fn default() -> Self {
        Self {
            for_duration: DEFAULT_ALERT_DURATION.to_string(),
            step: DEFAULT_ALERT_DURATION.to_string(),
        }
    }
}

/// Flat document layout with product and metadata at the top level
pub const API_VERSION_V0: &str = "v0";

/// Kubernetes-style layout: product under `spec`, metadata under
/// `metadata.labels`
pub const API_VERSION_V1: &str = "indicatorprotocol.io/v1";

pub const API_VERSIONS: [&str; 2] = [API_VERSION_V0, API_VERSION_V1];

pub const DEFAULT_ALERT_DURATION: &str = "1m";

pub const DEFAULT_CHART_TYPE: &str = "step";

/// Chart types a dashboard generator knows how to draw
pub const CHART_TYPES: [&str; 4] = ["step", "bar", "status", "quota"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Presentation {
    pub chart_type: String,
    pub current_value: bool,
    pub frequency: i64,
    pub labels: Vec<String>,
    #[serde(default)]
    pub units: String,
}

impl Default for Presentation {
    fn default() -> Self {
        Self {
            chart_type: DEFAULT_CHART_TYPE.to_string(),
            current_value: false,
            frequency: 0,
            labels: Vec::new(),
            units: String::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Layout {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub owner: String,
    pub sections: Vec<Section>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub indicators: Vec<String>,
}

/// Title of the section generated for documents without a layout
pub const DEFAULT_SECTION_TITLE: &str = "Metrics";
