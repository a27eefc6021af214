//! Metadata substitution into indicator and layout text

use regex::{Captures, Regex};

use super::model::IndicatorDocument;

/// Replace `$key` and `${key}` with the value of the matching metadata
/// entry in every text field of the indicators and the layout.
///
/// A bare `$key` only matches when followed by a word boundary, `_`, or the
/// end of the text, so `$deployment` does not eat into `$deployments`.
/// Product, apiVersion and metadata are left as written.
pub fn interpolate_metadata(document: &mut IndicatorDocument) {
    let metadata = document.metadata.clone();

    for (key, value) in &metadata {
        let Ok(pattern) = metadata_pattern(key) else {
            tracing::debug!(key, "Skipping metadata key that cannot form a pattern");
            continue;
        };

        let substitute = |text: &mut String| {
            let replaced = pattern.replace_all(text.as_str(), |caps: &Captures| {
                let suffix = caps.get(2).map_or("", |m| m.as_str());
                format!("{value}{suffix}")
            });

            if let std::borrow::Cow::Owned(replaced) = replaced {
                *text = replaced;
            }
        };

        for indicator in &mut document.indicators {
            substitute(&mut indicator.name);
            substitute(&mut indicator.promql);
            indicator
                .thresholds
                .iter_mut()
                .for_each(|threshold| substitute(&mut threshold.level));
            substitute(&mut indicator.alert.for_duration);
            substitute(&mut indicator.alert.step);
            substitute(&mut indicator.presentation.units);
            indicator.presentation.labels.iter_mut().for_each(substitute);
            indicator.documentation.values_mut().for_each(substitute);
        }

        let layout = &mut document.layout;
        substitute(&mut layout.title);
        substitute(&mut layout.description);
        substitute(&mut layout.owner);
        for section in &mut layout.sections {
            substitute(&mut section.title);
            substitute(&mut section.description);
            section.indicators.iter_mut().for_each(substitute);
        }
    }
}

fn metadata_pattern(key: &str) -> Result<Regex, regex::Error> {
    let key = regex::escape(key);
    Regex::new(&format!(r"(\${key})(\b|_|$)|(\$\{{{key}\}})"))
}
