//! In-memory store implementations for tests and single-process use.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::Utc;
use uuid::Uuid;

use super::{ContentStore, DocumentStore};
use crate::error::{PipelineError, Result, StorageError};
use crate::models::document::{Document, DocumentStatus};

/// Mutexed map of document records.
#[derive(Debug, Default)]
pub struct InMemoryDocumentStore {
    documents: Mutex<HashMap<String, Document>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DocumentStore for InMemoryDocumentStore {
    fn load(&self, id: &str) -> Result<Document> {
        let documents = self.documents.lock().unwrap();
        documents
            .get(id)
            .cloned()
            .ok_or_else(|| PipelineError::NotFound(id.to_string()))
    }

    fn save(&self, mut document: Document) -> Result<Document> {
        let mut documents = self.documents.lock().unwrap();

        if document.id.is_empty() {
            document.id = Uuid::new_v4().to_string();
        } else if let Some(existing) = documents.get(&document.id) {
            // Compare-and-swap: status changes must still be legal against
            // the state currently persisted, not the state the caller read.
            // An in-progress record may not be claimed again: a second
            // processor writing Processing over Processing lost the race.
            let illegal_change = existing.status != document.status
                && !existing.status.can_transition_to(document.status);
            let reclaim = existing.status == document.status && document.status.is_in_progress();
            if illegal_change || reclaim {
                return Err(PipelineError::InvalidTransition {
                    from: existing.status,
                    to: document.status,
                });
            }
        }

        document.updated_at = Utc::now();
        documents.insert(document.id.clone(), document.clone());
        Ok(document)
    }

    fn delete(&self, id: &str) -> Result<()> {
        let mut documents = self.documents.lock().unwrap();
        documents
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| PipelineError::NotFound(id.to_string()))
    }

    fn list(&self, status: Option<DocumentStatus>) -> Result<Vec<Document>> {
        let documents = self.documents.lock().unwrap();
        let mut result: Vec<Document> = documents
            .values()
            .filter(|d| status.is_none_or(|s| d.status == s))
            .cloned()
            .collect();
        result.sort_by(|a, b| a.uploaded_at.cmp(&b.uploaded_at));
        Ok(result)
    }
}

/// Mutexed map of raw content blobs.
#[derive(Debug, Default)]
pub struct InMemoryContentStore {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
}

impl InMemoryContentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ContentStore for InMemoryContentStore {
    fn store(&self, bytes: &[u8], suggested_name: &str) -> Result<String> {
        if bytes.is_empty() {
            return Err(StorageError::EmptyContent.into());
        }

        let content_ref = format!(
            "{}-{}",
            Uuid::new_v4(),
            super::sanitize_filename(suggested_name)
        );
        let mut blobs = self.blobs.lock().unwrap();
        blobs.insert(content_ref.clone(), bytes.to_vec());
        Ok(content_ref)
    }

    fn read(&self, content_ref: &str) -> Result<Vec<u8>> {
        let blobs = self.blobs.lock().unwrap();
        blobs
            .get(content_ref)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(content_ref.to_string()).into())
    }

    fn delete(&self, content_ref: &str) -> Result<()> {
        let mut blobs = self.blobs.lock().unwrap();
        blobs
            .remove(content_ref)
            .map(|_| ())
            .ok_or_else(|| StorageError::NotFound(content_ref.to_string()).into())
    }

    fn size(&self, content_ref: &str) -> u64 {
        let blobs = self.blobs.lock().unwrap();
        blobs.get(content_ref).map(|b| b.len() as u64).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_assigns_id_once() {
        let store = InMemoryDocumentStore::new();
        let saved = store.save(Document::new("a.pdf", "ref-1")).unwrap();
        assert!(!saved.id.is_empty());

        let resaved = store.save(saved.clone()).unwrap();
        assert_eq!(resaved.id, saved.id);
    }

    #[test]
    fn test_load_missing_is_not_found() {
        let store = InMemoryDocumentStore::new();
        assert!(matches!(
            store.load("missing"),
            Err(PipelineError::NotFound(_))
        ));
    }

    #[test]
    fn test_save_rejects_illegal_status_change() {
        let store = InMemoryDocumentStore::new();
        let doc = store.save(Document::new("a.pdf", "ref-1")).unwrap();

        // First processor wins the Uploaded -> Processing race.
        let mut first = doc.clone();
        first.transition_to(DocumentStatus::Processing, None).unwrap();
        store.save(first).unwrap();

        // Second processor read the same Uploaded snapshot; its save must
        // now fail against the persisted Processing state.
        let mut second = doc;
        second.transition_to(DocumentStatus::Processing, None).unwrap();
        let err = store.save(second).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::InvalidTransition {
                from: DocumentStatus::Processing,
                to: DocumentStatus::Processing,
            }
        ));
    }

    #[test]
    fn test_list_filters_by_status() {
        let store = InMemoryDocumentStore::new();
        let a = store.save(Document::new("a.pdf", "ref-a")).unwrap();
        store.save(Document::new("b.pdf", "ref-b")).unwrap();

        let mut processing = a;
        processing
            .transition_to(DocumentStatus::Processing, None)
            .unwrap();
        store.save(processing).unwrap();

        let uploaded = store.list(Some(DocumentStatus::Uploaded)).unwrap();
        assert_eq!(uploaded.len(), 1);
        assert_eq!(uploaded[0].filename, "b.pdf");
        assert_eq!(store.list(None).unwrap().len(), 2);
    }

    #[test]
    fn test_content_store_round_trip() {
        let store = InMemoryContentStore::new();
        let content_ref = store.store(b"invoice bytes", "a.pdf").unwrap();

        assert_eq!(store.read(&content_ref).unwrap(), b"invoice bytes");
        assert_eq!(store.size(&content_ref), 13);

        store.delete(&content_ref).unwrap();
        assert_eq!(store.size(&content_ref), 0);
        assert!(store.read(&content_ref).is_err());
    }

    #[test]
    fn test_content_store_rejects_empty() {
        let store = InMemoryContentStore::new();
        assert!(matches!(
            store.store(b"", "a.pdf"),
            Err(PipelineError::Storage(StorageError::EmptyContent))
        ));
    }
}
