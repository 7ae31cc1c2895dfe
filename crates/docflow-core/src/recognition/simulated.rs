//! Simulated recognition engine for development and testing.

use lazy_static::lazy_static;
use rand::Rng;
use regex::Regex;
use serde_json::json;
use tracing::{debug, info};

use super::RecognitionEngine;
use crate::error::{RecognitionError, Result};
use crate::models::recognition::RecognitionResult;

const ENGINE_NAME: &str = "simulated-ocr/2.1";

/// Canned invoice texts returned by the simulated engine. Each one exercises
/// a different labeling style the extractor has patterns for.
const SAMPLE_INVOICE_TEXTS: [&str; 4] = [
    "INVOICE\nCompany: ACME Corporation\nInvoice #: INV-2024-001\nDate: 2024-07-10\nAmount: $1,250.00\nDescription: Software License\nQuantity: 1\nUnit Price: $1,250.00",
    "INVOICE\nCompany: Tech Solutions Ltd\nNumber: INV-2024-045\nDate: 07/10/2024\nTotal Amount: $2,850.50\nConsulting Services\n15 hours x $190.03",
    "INVOICE\nCompany Name: Digital Innovations\nInvoice: 000123456\nIssue Date: 2024-07-10\nAmount: $4,750.25\nProduct: Software Development\nQty: 1 unit\nUnit Price: $4,750.25",
    "INVOICE\nBill To: Enterprise Holdings\nInvoice Number: 2024-INV-789\nIssue Date: July 10, 2024\nTotal Due: $3,199.99\nCloud Services - Monthly Subscription\n1 month @ $3,199.99",
];

lazy_static! {
    static ref SIGNAL_INVOICE_NUMBER: Regex =
        Regex::new(r"(?i)invoice[ \t]*#?[ \t]*:?[ \t]*[A-Za-z0-9-]+").unwrap();
    static ref SIGNAL_AMOUNT: Regex =
        Regex::new(r"(?i)(amount|total)[ \t]*:?[ \t]*\$[0-9,.]").unwrap();
    static ref SIGNAL_DATE: Regex = Regex::new(r"(?i)date[ \t]*:?[ \t]*[0-9/-]+").unwrap();
}

/// Engine that fabricates plausible recognition output instead of running a
/// real model. Confidence is drawn from [0.75, 0.98) and the text is picked
/// from a fixed sample set unless pinned through the builder methods.
#[derive(Debug, Default)]
pub struct SimulatedEngine {
    fixed_text: Option<String>,
    fixed_confidence: Option<f64>,
}

impl SimulatedEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pin the recognized text instead of sampling one.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.fixed_text = Some(text.into());
        self
    }

    /// Pin the confidence score instead of drawing one.
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.fixed_confidence = Some(confidence);
        self
    }

    fn signals(text: &str) -> Vec<(&'static str, serde_json::Value)> {
        vec![
            ("has_invoice_number", json!(SIGNAL_INVOICE_NUMBER.is_match(text))),
            ("has_amount", json!(SIGNAL_AMOUNT.is_match(text))),
            ("has_date", json!(SIGNAL_DATE.is_match(text))),
            ("word_count", json!(text.split_whitespace().count())),
            ("line_count", json!(text.lines().count())),
            ("character_count", json!(text.len())),
        ]
    }
}

impl RecognitionEngine for SimulatedEngine {
    fn recognize(&self, content: &[u8], filename: &str) -> Result<RecognitionResult> {
        if content.is_empty() {
            return Err(RecognitionError::EmptyContent.into());
        }
        info!("starting recognition for file: {}", filename);

        let mut rng = rand::thread_rng();

        let text = match &self.fixed_text {
            Some(text) => text.clone(),
            None => SAMPLE_INVOICE_TEXTS[rng.gen_range(0..SAMPLE_INVOICE_TEXTS.len())].to_string(),
        };
        let confidence = self
            .fixed_confidence
            .unwrap_or_else(|| rng.gen_range(0.75..0.98));

        let mut result = RecognitionResult::new(text, confidence, "en-US");
        result.engine = ENGINE_NAME.to_string();
        result.processing_time_ms = rng.gen_range(800..3000);
        for (key, value) in Self::signals(&result.text) {
            result.add_signal(key, value);
        }

        debug!(
            "recognition completed for file: {} with confidence: {:.2}",
            filename, confidence
        );
        Ok(result)
    }

    fn name(&self) -> &str {
        ENGINE_NAME
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_content_is_rejected() {
        let engine = SimulatedEngine::new();
        assert!(matches!(
            engine.recognize(&[], "empty.pdf"),
            Err(PipelineError::Recognition(RecognitionError::EmptyContent))
        ));
    }

    #[test]
    fn test_sampled_result_is_within_engine_bounds() {
        let engine = SimulatedEngine::new();
        let result = engine.recognize(b"fake pdf bytes", "invoice.pdf").unwrap();

        assert!(result.confidence >= 0.75 && result.confidence < 0.98);
        assert_eq!(result.language, "en-US");
        assert_eq!(result.engine, ENGINE_NAME);
        assert!(result.processing_time_ms >= 800 && result.processing_time_ms < 3000);
        assert!(SAMPLE_INVOICE_TEXTS.contains(&result.text.as_str()));
    }

    #[test]
    fn test_pinned_text_and_confidence() {
        let engine = SimulatedEngine::new()
            .with_text("Invoice #: INV-9\nTotal: $10.00")
            .with_confidence(0.91);
        let result = engine.recognize(b"x", "a.pdf").unwrap();

        assert_eq!(result.text, "Invoice #: INV-9\nTotal: $10.00");
        assert_eq!(result.confidence, 0.91);
    }

    #[test]
    fn test_signals_describe_the_text() {
        let engine = SimulatedEngine::new().with_text("Invoice #: INV-1\nTotal: $5.00");
        let result = engine.recognize(b"x", "a.pdf").unwrap();

        assert_eq!(result.signals["has_invoice_number"], json!(true));
        assert_eq!(result.signals["line_count"], json!(2));
        assert_eq!(result.signals["character_count"], json!(29));
    }
}
