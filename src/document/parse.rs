//! Raw YAML shape of an indicator document and its conversion into the
//! typed model
//!
//! Conversion resolves threshold keywords and fills in the defaults a
//! document author may leave out. Both the flat `v0` layout and the
//! `indicatorprotocol.io/v1` layout (product under `spec`, metadata under
//! `metadata.labels`) end up in the same model.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_yaml::Value;

use super::error::DocumentError;
use super::model::{
    API_VERSION_V1, Alert, DEFAULT_ALERT_DURATION, DEFAULT_CHART_TYPE, DEFAULT_SECTION_TITLE, Indicator,
    IndicatorDocument, Layout, Presentation, Product, Section, Threshold, ThresholdOperator,
};
use super::scalar;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDocument {
    #[serde(default, deserialize_with = "scalar::string")]
    api_version: String,
    #[serde(default)]
    product: RawProduct,
    #[serde(default, deserialize_with = "scalar::string_map")]
    metadata: BTreeMap<String, String>,
    #[serde(default)]
    indicators: Vec<RawIndicator>,
    #[serde(default)]
    layout: Option<RawLayout>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawVersion {
    #[serde(default, deserialize_with = "scalar::string")]
    api_version: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawV1Document {
    #[serde(default, deserialize_with = "scalar::string")]
    api_version: String,
    #[serde(default)]
    metadata: RawV1Metadata,
    #[serde(default)]
    spec: RawV1Spec,
}

#[derive(Debug, Default, Deserialize)]
struct RawV1Metadata {
    #[serde(default, deserialize_with = "scalar::string_map")]
    labels: BTreeMap<String, String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawV1Spec {
    #[serde(default)]
    product: RawProduct,
    #[serde(default)]
    indicators: Vec<RawIndicator>,
    #[serde(default)]
    layout: Option<RawLayout>,
}

impl From<RawV1Document> for RawDocument {
    fn from(raw: RawV1Document) -> Self {
        Self {
            api_version: raw.api_version,
            product: raw.spec.product,
            metadata: raw.metadata.labels,
            indicators: raw.spec.indicators,
            layout: raw.spec.layout,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawProduct {
    #[serde(default, deserialize_with = "scalar::string")]
    name: String,
    #[serde(default, deserialize_with = "scalar::string")]
    version: String,
}

#[derive(Debug, Deserialize)]
struct RawIndicator {
    #[serde(default, deserialize_with = "scalar::string")]
    name: String,
    #[serde(default, alias = "promQLExpression", deserialize_with = "scalar::string")]
    promql: String,
    #[serde(default)]
    thresholds: Vec<RawThreshold>,
    #[serde(default)]
    alert: Option<RawAlert>,
    #[serde(default)]
    presentation: Option<RawPresentation>,
    #[serde(default, deserialize_with = "scalar::string_map")]
    documentation: BTreeMap<String, String>,
}

/// A threshold as written: a level plus either any number of comparison
/// keywords or an explicit `operator`/`value` pair
#[derive(Debug, Deserialize)]
struct RawThreshold {
    #[serde(default, deserialize_with = "scalar::string")]
    level: String,
    #[serde(flatten)]
    comparisons: BTreeMap<String, Value>,
}

#[derive(Debug, Default, Deserialize)]
struct RawAlert {
    #[serde(default, rename = "for", deserialize_with = "scalar::optional_string")]
    for_duration: Option<String>,
    #[serde(default, deserialize_with = "scalar::optional_string")]
    step: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPresentation {
    #[serde(default, deserialize_with = "scalar::optional_string")]
    chart_type: Option<String>,
    #[serde(default)]
    current_value: bool,
    #[serde(default)]
    frequency: i64,
    #[serde(default, deserialize_with = "scalar::string_list")]
    labels: Vec<String>,
    #[serde(default, deserialize_with = "scalar::string")]
    units: String,
}

#[derive(Debug, Default, Deserialize)]
struct RawLayout {
    #[serde(default, deserialize_with = "scalar::string")]
    title: String,
    #[serde(default, deserialize_with = "scalar::string")]
    description: String,
    #[serde(default, deserialize_with = "scalar::string")]
    owner: String,
    #[serde(default)]
    sections: Vec<RawSection>,
}

#[derive(Debug, Deserialize)]
struct RawSection {
    #[serde(default, deserialize_with = "scalar::string")]
    title: String,
    #[serde(default, deserialize_with = "scalar::string")]
    description: String,
    #[serde(default, deserialize_with = "scalar::string_list")]
    indicators: Vec<String>,
}

/// Parse raw document bytes (YAML, or JSON as a YAML subset) into the
/// typed model with defaults populated
pub fn parse_document(bytes: &[u8]) -> Result<IndicatorDocument, DocumentError> {
    let version: RawVersion = serde_yaml::from_slice(bytes).map_err(DocumentError::Malformed)?;

    let raw: RawDocument = if version.api_version == API_VERSION_V1 {
        serde_yaml::from_slice::<RawV1Document>(bytes)
            .map_err(DocumentError::Malformed)?
            .into()
    } else {
        serde_yaml::from_slice(bytes).map_err(DocumentError::Malformed)?
    };

    let indicators = raw
        .indicators
        .into_iter()
        .enumerate()
        .map(|(position, indicator)| indicator_from_raw(position, indicator))
        .collect::<Result<Vec<_>, _>>()?;

    let layout = layout_from_raw(raw.layout, &indicators);

    Ok(IndicatorDocument {
        api_version: raw.api_version,
        product: Product {
            name: raw.product.name,
            version: raw.product.version,
        },
        metadata: raw.metadata,
        indicators,
        layout,
    })
}

fn indicator_from_raw(position: usize, raw: RawIndicator) -> Result<Indicator, DocumentError> {
    let thresholds = raw
        .thresholds
        .into_iter()
        .enumerate()
        .map(|(threshold, raw_threshold)| {
            resolve_threshold(raw_threshold).map_err(|reason| DocumentError::InvalidThreshold {
                indicator: position,
                threshold,
                reason,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let alert = raw.alert.unwrap_or_default();
    let presentation = raw.presentation.unwrap_or_default();

    Ok(Indicator {
        name: raw.name,
        promql: raw.promql,
        thresholds,
        alert: Alert {
            for_duration: non_empty_or(alert.for_duration, DEFAULT_ALERT_DURATION),
            step: non_empty_or(alert.step, DEFAULT_ALERT_DURATION),
        },
        presentation: Presentation {
            chart_type: non_empty_or(presentation.chart_type, DEFAULT_CHART_TYPE),
            current_value: presentation.current_value,
            frequency: presentation.frequency,
            labels: presentation.labels,
            units: presentation.units,
        },
        documentation: raw.documentation,
    })
}

/// Use an explicit `operator`, otherwise pick the first comparison keyword
/// present, in precedence order
fn resolve_threshold(raw: RawThreshold) -> Result<Threshold, String> {
    if let Some(keyword) = raw.comparisons.get("operator").and_then(scalar::render_scalar) {
        let operator = ThresholdOperator::PRECEDENCE
            .into_iter()
            .find(|operator| operator.keyword() == keyword)
            .ok_or_else(|| format!("unknown operator {keyword:?}"))?;

        let value = match raw.comparisons.get("value") {
            Some(raw_value) => threshold_value(operator, raw_value)?,
            None => None,
        }
        .ok_or_else(|| format!("{operator} threshold has no value"))?;

        return Ok(Threshold {
            level: raw.level,
            operator,
            value,
        });
    }

    for operator in ThresholdOperator::PRECEDENCE {
        let Some(raw_value) = raw.comparisons.get(operator.keyword()) else {
            continue;
        };

        let Some(value) = threshold_value(operator, raw_value)? else {
            continue;
        };

        return Ok(Threshold {
            level: raw.level,
            operator,
            value,
        });
    }

    Ok(Threshold {
        level: raw.level,
        operator: ThresholdOperator::Undefined,
        value: 0.0,
    })
}

/// `None` for a blank value
fn threshold_value(operator: ThresholdOperator, raw: &Value) -> Result<Option<f64>, String> {
    match raw {
        Value::Null => Ok(None),
        Value::String(s) if s.trim().is_empty() => Ok(None),
        Value::Number(n) => n
            .as_f64()
            .map(Some)
            .ok_or_else(|| format!("{operator} value {n} is not representable")),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|_| format!("{operator} value {s:?} is not a number")),
        other => Err(format!("{operator} value {other:?} is not a number")),
    }
}

fn layout_from_raw(raw: Option<RawLayout>, indicators: &[Indicator]) -> Layout {
    let raw = raw.unwrap_or_default();

    let mut sections: Vec<Section> = raw
        .sections
        .into_iter()
        .map(|section| Section {
            title: section.title,
            description: section.description,
            indicators: section.indicators,
        })
        .collect();

    if sections.is_empty() {
        sections.push(Section {
            title: DEFAULT_SECTION_TITLE.to_string(),
            description: String::new(),
            indicators: indicators.iter().map(|i| i.name.clone()).collect(),
        });
    }

    Layout {
        title: raw.title,
        description: raw.description,
        owner: raw.owner,
        sections,
    }
}

fn non_empty_or(value: Option<String>, default: &str) -> String {
    value
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}
