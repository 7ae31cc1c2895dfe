//! Persistence and binary storage collaborator contracts.

mod fs;
mod memory;

pub use fs::FsContentStore;
pub use memory::{InMemoryContentStore, InMemoryDocumentStore};

use crate::error::Result;
use crate::models::document::{Document, DocumentStatus};

/// Persistence layer for document records.
///
/// `save` must apply status changes atomically: the implementation compares
/// the incoming status with the persisted one under its own synchronization
/// and rejects pairs the transition table forbids with `InvalidTransition`.
/// Writing `Processing` over an already-`Processing` record is also
/// rejected: two concurrent processors may both read `Uploaded`, but only
/// the first save claims the document. A blind read-modify-write overwrite
/// would let both proceed; this compare-and-swap is the single concurrency
/// guard in the system.
pub trait DocumentStore: Send + Sync {
    /// Load a document by id. Fails with `NotFound` if absent.
    fn load(&self, id: &str) -> Result<Document>;

    /// Persist a document, assigning an id on first save. Returns the stored
    /// record.
    fn save(&self, document: Document) -> Result<Document>;

    /// Delete a document record. Fails with `NotFound` if absent.
    fn delete(&self, id: &str) -> Result<()>;

    /// List documents, optionally filtered by status.
    fn list(&self, status: Option<DocumentStatus>) -> Result<Vec<Document>>;
}

/// Binary storage for raw file content.
pub trait ContentStore: Send + Sync {
    /// Store bytes and return an opaque content reference. Empty content is
    /// rejected.
    fn store(&self, bytes: &[u8], suggested_name: &str) -> Result<String>;

    /// Read stored bytes. Fails with `Storage(NotFound)` if absent.
    fn read(&self, content_ref: &str) -> Result<Vec<u8>>;

    /// Delete stored content.
    fn delete(&self, content_ref: &str) -> Result<()>;

    /// Size of stored content in bytes, or 0 when missing.
    fn size(&self, content_ref: &str) -> u64;
}

/// Replace filesystem-hostile characters and collapse parent-dir sequences.
pub(crate) fn sanitize_filename(filename: &str) -> String {
    if filename.is_empty() {
        return "unnamed".to_string();
    }
    filename
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect::<String>()
        .replace("..", "_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("invoice (1).pdf"), "invoice__1_.pdf");
        assert_eq!(sanitize_filename(""), "unnamed");

        let traversal = sanitize_filename("../../etc/passwd");
        assert!(!traversal.contains('/'));
        assert!(!traversal.contains(".."));
    }
}
