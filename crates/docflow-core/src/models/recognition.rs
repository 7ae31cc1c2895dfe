//! Text recognition result types.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Output of the external text recognition capability.
///
/// Immutable once attached to a document for a processing attempt; a
/// re-processing attempt replaces it wholesale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecognitionResult {
    /// Full recognized text.
    pub text: String,

    /// Overall recognition confidence (0.0 - 1.0).
    pub confidence: f64,

    /// Detected language tag (e.g. "en-US"). Empty when detection failed.
    #[serde(default)]
    pub language: String,

    /// Identifier of the engine that produced this result.
    pub engine: String,

    /// Processing duration in milliseconds.
    pub processing_time_ms: u64,

    /// Free-form structural signals (e.g. "has_invoice_number").
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub signals: HashMap<String, Value>,

    /// When recognition completed.
    pub recognized_at: DateTime<Utc>,
}

/// Confidence tier of a recognition result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceLevel {
    /// At least 80%.
    High,
    /// 60% to 79%.
    Medium,
    /// Below 60%.
    Low,
}

impl RecognitionResult {
    /// Create a result with the given text, confidence and language.
    pub fn new(text: impl Into<String>, confidence: f64, language: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            confidence,
            language: language.into(),
            engine: String::new(),
            processing_time_ms: 0,
            signals: HashMap::new(),
            recognized_at: Utc::now(),
        }
    }

    /// Attach a structural signal.
    pub fn add_signal(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.signals.insert(key.into(), value.into());
    }

    pub fn is_high_confidence(&self) -> bool {
        self.confidence >= 0.8
    }

    pub fn is_medium_confidence(&self) -> bool {
        self.confidence >= 0.6 && self.confidence < 0.8
    }

    pub fn is_low_confidence(&self) -> bool {
        self.confidence < 0.6
    }

    /// Confidence tier for display purposes.
    pub fn confidence_level(&self) -> ConfidenceLevel {
        if self.confidence >= 0.8 {
            ConfidenceLevel::High
        } else if self.confidence >= 0.6 {
            ConfidenceLevel::Medium
        } else {
            ConfidenceLevel::Low
        }
    }

    /// Confidence formatted as a percentage.
    pub fn confidence_percentage(&self) -> String {
        format!("{:.1}%", self.confidence * 100.0)
    }
}
