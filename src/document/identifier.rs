use sha1::{Digest, Sha1};

use super::model::IndicatorDocument;

/// Deterministic byte form of a document, used for hashing and storage
pub fn canonical_bytes(document: &IndicatorDocument) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec(document)
}

/// `<product name>-<lowercase hex sha1 of the canonical bytes>`
pub fn document_identifier(product_name: &str, canonical: &[u8]) -> String {
    let digest = Sha1::digest(canonical);
    format!("{product_name}-{}", hex::encode(digest))
}
