use tracing::{debug, instrument, warn};

use super::error::DocumentError;
use super::identifier::{canonical_bytes, document_identifier};
use super::interpolate::interpolate_metadata;
use super::model::IndicatorDocument;
use super::parse::parse_document;
use super::validate::validate_document;
use crate::patch::{Patch, PatchReport, apply_patches};

/// A submitted document after patching, parsing and validation
#[derive(Debug, Clone)]
pub struct ProcessedDocument {
    pub document: IndicatorDocument,
    /// JSON form of `document`, the bytes the registry stores
    pub canonical: Vec<u8>,
    pub identifier: String,
    pub report: PatchReport,
}

/// Run raw document bytes through the full ingestion pipeline.
///
/// Skipped patch operations never fail this call; they are listed in the
/// returned report. Validation failures come back as the complete list of
/// violations.
#[instrument(skip_all, fields(bytes = bytes.len(), patches = patches.len()))]
pub fn process_document(
    patches: &[Patch],
    bytes: &[u8],
) -> Result<ProcessedDocument, DocumentError> {
    let outcome = apply_patches(patches, bytes)?;

    let mut document = parse_document(&outcome.bytes)?;
    interpolate_metadata(&mut document);

    let errors = validate_document(&document);
    if !errors.is_empty() {
        warn!(product = %document.product.name, errors = errors.len(), "Document failed validation");
        return Err(DocumentError::Validation(errors));
    }

    let canonical = canonical_bytes(&document)?;
    let identifier = document_identifier(&document.product.name, &canonical);

    debug!(%identifier, skipped = outcome.report.skipped().count(), "Processed document");

    Ok(ProcessedDocument {
        document,
        canonical,
        identifier,
        report: outcome.report,
    })
}
