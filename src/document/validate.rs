use std::collections::HashSet;

use super::model::{API_VERSIONS, CHART_TYPES, IndicatorDocument, ThresholdOperator};

fn is_valid_indicator_name(name: &str) -> bool {
    name.chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Check a parsed, defaulted document and collect every violation.
///
/// An empty result means the document is valid. Messages are meant for the
/// person who wrote the document and are returned in document order.
pub fn validate_document(document: &IndicatorDocument) -> Vec<String> {
    let mut errors = Vec::new();

    if !API_VERSIONS.contains(&document.api_version.as_str()) {
        errors.push(format!(
            "apiVersion must be one of {}, got {:?}",
            API_VERSIONS.join(", "),
            document.api_version
        ));
    }

    if document.product.name.is_empty() {
        errors.push("product name is required".to_string());
    }

    if document.product.version.is_empty() {
        errors.push("product version is required".to_string());
    }

    let mut seen = HashSet::new();

    for (idx, indicator) in document.indicators.iter().enumerate() {
        if indicator.name.is_empty() {
            errors.push(format!("indicators[{idx}] name is required"));
        } else if !is_valid_indicator_name(&indicator.name) {
            errors.push(format!(
                "indicators[{idx}] name {:?} may only contain letters, digits, '_' and '-'",
                indicator.name
            ));
        } else if !seen.insert(indicator.name.as_str()) {
            errors.push(format!(
                "indicators[{idx}] name {:?} is not unique",
                indicator.name
            ));
        }

        if indicator.promql.is_empty() {
            errors.push(format!("indicators[{idx}] promql is required"));
        }

        for (t_idx, threshold) in indicator.thresholds.iter().enumerate() {
            if threshold.level.is_empty() {
                errors.push(format!(
                    "indicators[{idx}].thresholds[{t_idx}] level is required"
                ));
            }

            if threshold.operator == ThresholdOperator::Undefined {
                errors.push(format!(
                    "indicators[{idx}].thresholds[{t_idx}] operator is required (one of lt, lte, eq, neq, gte, gt)"
                ));
            }
        }

        let chart_type = indicator.presentation.chart_type.as_str();
        if !CHART_TYPES.contains(&chart_type) {
            errors.push(format!(
                "indicators[{idx}] chartType {chart_type:?} is not one of {}",
                CHART_TYPES.join(", ")
            ));
        }
    }

    for (s_idx, section) in document.layout.sections.iter().enumerate() {
        for name in &section.indicators {
            if document.indicator(name).is_none() {
                errors.push(format!(
                    "layout.sections[{s_idx}] references unknown indicator {name:?}"
                ));
            }
        }
    }

    errors
}
