//! Indicator documents: typed model and the ingestion pipeline that turns
//! submitted bytes into a validated document with a content identifier

mod error;
mod identifier;
mod interpolate;
mod model;
mod parse;
mod pipeline;
mod scalar;
mod validate;

pub use error::DocumentError;
pub use identifier::{canonical_bytes, document_identifier};
pub use interpolate::interpolate_metadata;
pub use model::*;
pub use parse::parse_document;
pub use pipeline::{ProcessedDocument, process_document};
pub use scalar::render_scalar;
pub use validate::validate_document;
