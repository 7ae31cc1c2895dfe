//! Data models for the document processing pipeline.

pub mod config;
pub mod document;
pub mod metadata;
pub mod recognition;

pub use config::{PipelineConfig, ProcessingConfig, StorageConfig, ValidationConfig};
pub use document::{Document, DocumentStatus};
pub use metadata::{InvoiceMetadata, LineItem};
pub use recognition::{ConfidenceLevel, RecognitionResult};
