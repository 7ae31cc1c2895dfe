//! Invoice field extraction module.

mod extractor;
pub mod patterns;

pub use extractor::PatternExtractor;

use crate::models::metadata::InvoiceMetadata;

/// Trait for invoice metadata extractors.
///
/// Extraction is total: every field is populated, via fallback synthesis if
/// no pattern matches, so the pipeline always has something to validate.
pub trait MetadataExtractor: Send + Sync {
    /// Extract structured invoice metadata from recognized text.
    fn extract(&self, text: &str) -> InvoiceMetadata;
}
