//! Document processing orchestration.
//!
//! `DocumentPipeline` drives a document through upload, recognition, field
//! extraction and validation against pluggable stores and engines. Faults
//! raised after a document has entered `Processing` are absorbed: the
//! document is forced into `Failed` with the fault recorded, so no record is
//! ever stranded mid-flight by a crash in a collaborator.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::{Result, StorageError};
use crate::extract::MetadataExtractor;
use crate::models::config::PipelineConfig;
use crate::models::document::{Document, DocumentStatus};
use crate::recognition::RecognitionEngine;
use crate::store::{ContentStore, DocumentStore};
use crate::validate::Validator;

pub struct DocumentPipeline {
    documents: Arc<dyn DocumentStore>,
    contents: Arc<dyn ContentStore>,
    recognizer: Arc<dyn RecognitionEngine>,
    extractor: Box<dyn MetadataExtractor>,
    validator: Validator,
    config: PipelineConfig,
}

impl DocumentPipeline {
    pub fn new(
        documents: Arc<dyn DocumentStore>,
        contents: Arc<dyn ContentStore>,
        recognizer: Arc<dyn RecognitionEngine>,
        extractor: Box<dyn MetadataExtractor>,
        config: PipelineConfig,
    ) -> Self {
        let validator = Validator::new(config.validation.clone());
        Self {
            documents,
            contents,
            recognizer,
            extractor,
            validator,
            config,
        }
    }

    /// Accept raw file content and create an `Uploaded` document record.
    pub fn upload(&self, bytes: &[u8], filename: &str) -> Result<Document> {
        info!(
            "starting document upload: filename={}, size={}",
            filename,
            bytes.len()
        );

        if bytes.is_empty() {
            return Err(StorageError::EmptyContent.into());
        }
        let max = self.config.processing.max_file_size;
        if bytes.len() as u64 > max {
            return Err(StorageError::TooLarge {
                size: bytes.len() as u64,
                max,
            }
            .into());
        }

        let content_ref = self.contents.store(bytes, filename)?;
        let document = self.documents.save(Document::new(filename, content_ref))?;

        info!("document uploaded: id={}", document.id);
        Ok(document)
    }

    /// Run one processing attempt: recognition, extraction, validation.
    ///
    /// The document must be in a state that permits processing; otherwise
    /// the transition error propagates and the record is untouched. Once the
    /// document is `Processing`, any fault is recorded on the document and
    /// the document lands in `Failed` instead of the error escaping.
    pub fn process(&self, id: &str) -> Result<Document> {
        info!("starting processing for document: {}", id);

        let mut document = self.documents.load(id)?;
        document.transition_to(DocumentStatus::Processing, None)?;
        let document = self.documents.save(document)?;

        match self.run_attempt(document) {
            Ok(document) => {
                info!(
                    "document processing completed: id={}, status={}",
                    id, document.status
                );
                Ok(document)
            }
            Err(fault) => {
                warn!("document processing failed: id={}, error={}", id, fault);
                self.record_failure(id, &fault.to_string())
            }
        }
    }

    fn run_attempt(&self, mut document: Document) -> Result<Document> {
        let content = self.contents.read(&document.content_ref)?;

        let recognition = self.recognizer.recognize(&content, &document.filename)?;
        let text = recognition.text.clone();
        document.recognition = Some(recognition);

        if text.trim().is_empty() {
            document.transition_to(
                DocumentStatus::Failed,
                Some("recognition failed to extract text"),
            )?;
            return self.documents.save(document);
        }

        document.metadata = Some(self.extractor.extract(&text));

        let verdict = self.validator.validate(&document);
        for warning in &verdict.warnings {
            warn!("document {}: {}", document.id, warning);
        }
        if verdict.is_valid() {
            document.transition_to(DocumentStatus::Validated, None)?;
        } else {
            document.transition_to(DocumentStatus::Failed, Some(&verdict.errors.join(", ")))?;
        }
        self.documents.save(document)
    }

    /// Force a document into `Failed` after a mid-attempt fault. Bypasses
    /// the transition table so recovery cannot itself be rejected.
    fn record_failure(&self, id: &str, reason: &str) -> Result<Document> {
        let mut document = self.documents.load(id)?;
        document.force_failed(reason);
        self.documents.save(document)
    }

    /// Manually move a document to a new status, subject to the transition
    /// table. Moving a terminal document back to `Uploaded` resets it for
    /// another attempt. The reason, if given, is recorded when entering
    /// `Failed`.
    pub fn update_status(
        &self,
        id: &str,
        status: DocumentStatus,
        reason: Option<&str>,
    ) -> Result<Document> {
        info!("updating document status: id={}, status={}", id, status);

        let mut document = self.documents.load(id)?;
        let reason = reason.or((status == DocumentStatus::Failed).then_some("manual status update"));
        document.transition_to(status, reason)?;

        if status == DocumentStatus::Uploaded && self.config.processing.clear_errors_on_reset {
            document.errors.clear();
        }

        self.documents.save(document)
    }

    pub fn get(&self, id: &str) -> Result<Document> {
        debug!("retrieving document: {}", id);
        self.documents.load(id)
    }

    pub fn list(&self, status: Option<DocumentStatus>) -> Result<Vec<Document>> {
        self.documents.list(status)
    }

    /// Delete a document record and its stored content. A content-store
    /// failure is logged and does not block deletion of the record.
    pub fn delete(&self, id: &str) -> Result<()> {
        info!("deleting document: {}", id);

        let document = self.documents.load(id)?;
        if let Err(e) = self.contents.delete(&document.content_ref) {
            warn!(
                "failed to delete content {}: {}",
                document.content_ref, e
            );
        }
        self.documents.delete(id)
    }

    /// Documents sitting in `Processing` with no update for longer than
    /// `older_than`. These indicate a processor that died mid-attempt.
    pub fn stuck_in_processing(&self, older_than: chrono::Duration) -> Result<Vec<Document>> {
        let cutoff = chrono::Utc::now() - older_than;
        let mut stuck = self.documents.list(Some(DocumentStatus::Processing))?;
        stuck.retain(|d| d.updated_at < cutoff);
        Ok(stuck)
    }

    /// Size of the stored content for a document, 0 when the blob is gone.
    pub fn content_size(&self, document: &Document) -> u64 {
        self.contents.size(&document.content_ref)
    }
}

impl std::fmt::Debug for DocumentPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentPipeline")
            .field("recognizer", &self.recognizer.name())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{PipelineError, RecognitionError};
    use crate::extract::PatternExtractor;
    use crate::models::recognition::RecognitionResult;
    use crate::recognition::SimulatedEngine;
    use crate::store::{InMemoryContentStore, InMemoryDocumentStore};
    use pretty_assertions::assert_eq;

    const GOOD_TEXT: &str = "INVOICE\nInvoice #: INV-2024-001\nDate: 2024-07-10\nTotal: $1,250.00\nSoftware License";

    fn pipeline_with(engine: SimulatedEngine) -> DocumentPipeline {
        DocumentPipeline::new(
            Arc::new(InMemoryDocumentStore::new()),
            Arc::new(InMemoryContentStore::new()),
            Arc::new(engine),
            Box::new(PatternExtractor::new()),
            PipelineConfig::default(),
        )
    }

    struct FailingEngine;

    impl RecognitionEngine for FailingEngine {
        fn recognize(&self, _: &[u8], _: &str) -> Result<RecognitionResult> {
            Err(RecognitionError::Engine("model unavailable".to_string()).into())
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    #[test]
    fn test_upload_rejects_empty_and_oversized_files() {
        let pipeline = pipeline_with(SimulatedEngine::new());

        assert!(matches!(
            pipeline.upload(&[], "empty.pdf"),
            Err(PipelineError::Storage(StorageError::EmptyContent))
        ));

        let oversized = vec![0u8; 52_428_801];
        assert!(matches!(
            pipeline.upload(&oversized, "big.pdf"),
            Err(PipelineError::Storage(StorageError::TooLarge { .. }))
        ));
    }

    #[test]
    fn test_happy_path_ends_validated() {
        let engine = SimulatedEngine::new()
            .with_text(GOOD_TEXT)
            .with_confidence(0.95);
        let pipeline = pipeline_with(engine);

        let doc = pipeline.upload(b"pdf bytes", "invoice.pdf").unwrap();
        assert_eq!(doc.status, DocumentStatus::Uploaded);

        let doc = pipeline.process(&doc.id).unwrap();
        assert_eq!(doc.status, DocumentStatus::Validated);
        assert!(doc.errors.is_empty());
        assert!(doc.processed_at.is_some());

        let metadata = doc.metadata.unwrap();
        assert_eq!(metadata.invoice_number.as_deref(), Some("INV-2024-001"));
    }

    #[test]
    fn test_low_confidence_ends_failed_with_recorded_error() {
        let engine = SimulatedEngine::new()
            .with_text(GOOD_TEXT)
            .with_confidence(0.10);
        let pipeline = pipeline_with(engine);

        let doc = pipeline.upload(b"pdf bytes", "invoice.pdf").unwrap();
        let doc = pipeline.process(&doc.id).unwrap();

        assert_eq!(doc.status, DocumentStatus::Failed);
        assert!(doc.errors.iter().any(|e| e.contains("too low")));
        assert!(doc.processed_at.is_some());
    }

    #[test]
    fn test_empty_recognized_text_fails_without_extraction() {
        let engine = SimulatedEngine::new().with_text("   ").with_confidence(0.9);
        let pipeline = pipeline_with(engine);

        let doc = pipeline.upload(b"pdf bytes", "blank.pdf").unwrap();
        let doc = pipeline.process(&doc.id).unwrap();

        assert_eq!(doc.status, DocumentStatus::Failed);
        assert!(doc
            .errors
            .iter()
            .any(|e| e.contains("recognition failed to extract text")));
        assert!(doc.metadata.is_none());
    }

    #[test]
    fn test_engine_fault_is_absorbed_into_failed_status() {
        let pipeline = DocumentPipeline::new(
            Arc::new(InMemoryDocumentStore::new()),
            Arc::new(InMemoryContentStore::new()),
            Arc::new(FailingEngine),
            Box::new(PatternExtractor::new()),
            PipelineConfig::default(),
        );

        let doc = pipeline.upload(b"pdf bytes", "invoice.pdf").unwrap();
        let doc = pipeline.process(&doc.id).unwrap();

        assert_eq!(doc.status, DocumentStatus::Failed);
        assert!(doc.errors.iter().any(|e| e.contains("model unavailable")));
    }

    #[test]
    fn test_process_rejects_already_processed_document() {
        let engine = SimulatedEngine::new()
            .with_text(GOOD_TEXT)
            .with_confidence(0.95);
        let pipeline = pipeline_with(engine);

        let doc = pipeline.upload(b"pdf bytes", "invoice.pdf").unwrap();
        pipeline.process(&doc.id).unwrap();

        assert!(matches!(
            pipeline.process(&doc.id),
            Err(PipelineError::InvalidTransition {
                from: DocumentStatus::Validated,
                to: DocumentStatus::Processing,
            })
        ));
    }

    #[test]
    fn test_reset_allows_reprocessing_and_keeps_error_history() {
        let engine = SimulatedEngine::new()
            .with_text(GOOD_TEXT)
            .with_confidence(0.10);
        let pipeline = pipeline_with(engine);

        let doc = pipeline.upload(b"pdf bytes", "invoice.pdf").unwrap();
        let doc = pipeline.process(&doc.id).unwrap();
        assert_eq!(doc.status, DocumentStatus::Failed);
        let first_errors = doc.errors.len();
        assert!(first_errors > 0);

        let doc = pipeline
            .update_status(&doc.id, DocumentStatus::Uploaded, None)
            .unwrap();
        assert_eq!(doc.status, DocumentStatus::Uploaded);
        assert!(doc.processed_at.is_none());
        assert_eq!(doc.errors.len(), first_errors);

        let doc = pipeline.process(&doc.id).unwrap();
        assert_eq!(doc.status, DocumentStatus::Failed);
        assert!(doc.errors.len() > first_errors);
    }

    #[test]
    fn test_reset_clears_errors_when_configured() {
        let engine = SimulatedEngine::new()
            .with_text(GOOD_TEXT)
            .with_confidence(0.10);
        let mut config = PipelineConfig::default();
        config.processing.clear_errors_on_reset = true;
        let pipeline = DocumentPipeline::new(
            Arc::new(InMemoryDocumentStore::new()),
            Arc::new(InMemoryContentStore::new()),
            Arc::new(engine),
            Box::new(PatternExtractor::new()),
            config,
        );

        let doc = pipeline.upload(b"pdf bytes", "invoice.pdf").unwrap();
        let doc = pipeline.process(&doc.id).unwrap();
        assert_eq!(doc.status, DocumentStatus::Failed);
        assert!(!doc.errors.is_empty());

        let doc = pipeline
            .update_status(&doc.id, DocumentStatus::Uploaded, None)
            .unwrap();
        assert_eq!(doc.status, DocumentStatus::Uploaded);
        assert!(doc.errors.is_empty());
        assert!(doc.processed_at.is_none());
    }

    #[test]
    fn test_delete_removes_record_and_content() {
        let pipeline = pipeline_with(SimulatedEngine::new());

        let doc = pipeline.upload(b"pdf bytes", "invoice.pdf").unwrap();
        pipeline.delete(&doc.id).unwrap();

        assert!(matches!(
            pipeline.get(&doc.id),
            Err(PipelineError::NotFound(_))
        ));
        assert_eq!(pipeline.contents.size(&doc.content_ref), 0);
    }

    #[test]
    fn test_stuck_sweep_finds_stale_processing_documents() {
        let pipeline = pipeline_with(SimulatedEngine::new());

        let doc = pipeline.upload(b"pdf bytes", "invoice.pdf").unwrap();
        let doc = pipeline
            .update_status(&doc.id, DocumentStatus::Processing, None)
            .unwrap();

        // Fresh Processing documents are not stuck.
        assert!(pipeline
            .stuck_in_processing(chrono::Duration::minutes(30))
            .unwrap()
            .is_empty());

        // With a zero threshold the same document shows up.
        std::thread::sleep(std::time::Duration::from_millis(5));
        let stuck = pipeline
            .stuck_in_processing(chrono::Duration::zero())
            .unwrap();
        assert_eq!(stuck.len(), 1);
        assert_eq!(stuck[0].id, doc.id);
    }
}
