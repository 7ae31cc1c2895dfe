//! Document record and status state machine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};
use crate::models::metadata::InvoiceMetadata;
use crate::models::recognition::RecognitionResult;

/// Lifecycle status of a document.
///
/// `Validated` and `Failed` are terminal for a processing attempt; an
/// administrative reset may return either to `Uploaded`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    /// Uploaded and waiting for processing.
    Uploaded,
    /// Currently being processed.
    Processing,
    /// Processed and validated successfully.
    Validated,
    /// Processing failed.
    Failed,
}

impl DocumentStatus {
    /// Whether the transition table permits moving from `self` to `to`.
    pub fn can_transition_to(self, to: DocumentStatus) -> bool {
        use DocumentStatus::*;
        match self {
            Uploaded => matches!(to, Processing | Failed),
            Processing => matches!(to, Validated | Failed),
            Validated | Failed => to == Uploaded,
        }
    }

    /// Whether this status ends a processing attempt.
    pub fn is_terminal(self) -> bool {
        matches!(self, DocumentStatus::Validated | DocumentStatus::Failed)
    }

    /// Whether a processing attempt is underway.
    pub fn is_in_progress(self) -> bool {
        self == DocumentStatus::Processing
    }

    /// Whether the document is eligible for a processing attempt.
    pub fn can_be_processed(self) -> bool {
        self == DocumentStatus::Uploaded
    }

    /// Human-readable description.
    pub fn description(self) -> &'static str {
        match self {
            DocumentStatus::Uploaded => "Document uploaded and waiting for processing",
            DocumentStatus::Processing => "Document is being processed",
            DocumentStatus::Validated => "Document processed and validated successfully",
            DocumentStatus::Failed => "Document processing failed",
        }
    }
}

impl std::fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            DocumentStatus::Uploaded => "uploaded",
            DocumentStatus::Processing => "processing",
            DocumentStatus::Validated => "validated",
            DocumentStatus::Failed => "failed",
        };
        write!(f, "{}", name)
    }
}

/// A document moving through the processing pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Opaque unique id, assigned by the persistence layer on first save.
    pub id: String,

    /// Original (sanitized) filename.
    pub filename: String,

    /// Reference to the stored binary content.
    pub content_ref: String,

    /// Current lifecycle status.
    pub status: DocumentStatus,

    /// When the document was uploaded.
    pub uploaded_at: DateTime<Utc>,

    /// When the document reached a terminal status. Set if and only if the
    /// status is terminal.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processed_at: Option<DateTime<Utc>>,

    /// Recognition result from the latest processing attempt.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recognition: Option<RecognitionResult>,

    /// Structured metadata extracted from the recognition result.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<InvoiceMetadata>,

    /// Accumulated error messages. Append-only within a processing attempt;
    /// retries keep appending so the audit trail survives resets.
    #[serde(default)]
    pub errors: Vec<String>,

    /// Record creation timestamp.
    pub created_at: DateTime<Utc>,

    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Document {
    /// Create a new document in `Uploaded` state. The id is assigned by the
    /// document store on first save.
    pub fn new(filename: impl Into<String>, content_ref: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: String::new(),
            filename: filename.into(),
            content_ref: content_ref.into(),
            status: DocumentStatus::Uploaded,
            uploaded_at: now,
            processed_at: None,
            recognition: None,
            metadata: None,
            errors: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a status transition.
    ///
    /// Fails with [`PipelineError::InvalidTransition`] if the transition
    /// table does not permit the change; nothing is mutated in that case.
    /// Entering a terminal status stamps `processed_at`; entering a
    /// non-terminal status clears it. An optional reason is appended to the
    /// error list when entering `Failed`.
    pub fn transition_to(&mut self, to: DocumentStatus, reason: Option<&str>) -> Result<()> {
        if !self.status.can_transition_to(to) {
            return Err(PipelineError::InvalidTransition {
                from: self.status,
                to,
            });
        }

        self.status = to;
        self.updated_at = Utc::now();
        self.processed_at = to.is_terminal().then(Utc::now);

        if to == DocumentStatus::Failed {
            if let Some(reason) = reason {
                self.add_error(reason);
            }
        }

        Ok(())
    }

    /// Force the document into `Failed`, bypassing the transition table.
    ///
    /// Crash recovery uses this to mark a document whose processing attempt
    /// died partway; the regular `transition_to` guard must not be able to
    /// reject it.
    pub fn force_failed(&mut self, reason: impl Into<String>) {
        self.status = DocumentStatus::Failed;
        let now = Utc::now();
        self.updated_at = now;
        self.processed_at = Some(now);
        self.add_error(reason);
    }

    /// Append an error message.
    pub fn add_error(&mut self, error: impl Into<String>) {
        self.errors.push(error.into());
    }

    /// Whether any errors have been recorded.
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Whether the document reached a terminal status.
    pub fn is_processed(&self) -> bool {
        self.status.is_terminal()
    }
}
