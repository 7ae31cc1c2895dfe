//! Core library for invoice document processing.
//!
//! This crate provides:
//! - Document lifecycle state machine (uploaded, processing, validated, failed)
//! - Pluggable text recognition engines and a simulated engine for development
//! - Pattern-based invoice field extraction (number, date, amount, line items)
//! - Staged validation with hard errors and advisory warnings
//! - Document and content stores (in-memory and filesystem backed)
//! - A pipeline orchestrator tying the stages together

pub mod error;
pub mod extract;
pub mod models;
pub mod pipeline;
pub mod recognition;
pub mod store;
pub mod validate;

pub use error::{PipelineError, RecognitionError, Result, StorageError};
pub use extract::{MetadataExtractor, PatternExtractor};
pub use models::config::{PipelineConfig, ProcessingConfig, StorageConfig, ValidationConfig};
pub use models::document::{Document, DocumentStatus};
pub use models::metadata::{InvoiceMetadata, LineItem};
pub use models::recognition::{ConfidenceLevel, RecognitionResult};
pub use pipeline::DocumentPipeline;
pub use recognition::{RecognitionEngine, SimulatedEngine};
pub use store::{
    ContentStore, DocumentStore, FsContentStore, InMemoryContentStore, InMemoryDocumentStore,
};
pub use validate::{ValidationVerdict, Validator};
