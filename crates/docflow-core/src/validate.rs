//! Document validation.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::extract::patterns::INVOICE_NUMBER_SHAPE;
use crate::models::config::ValidationConfig;
use crate::models::document::Document;
use crate::models::metadata::InvoiceMetadata;
use crate::models::recognition::RecognitionResult;

/// Classified outcome of validating a document.
///
/// Errors block validity; warnings are advisory. Entries are appended in
/// stage order (basic properties, recognition quality, metadata, consistency)
/// and field order within a stage, and callers may rely on that ordering.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationVerdict {
    /// Blocking problems.
    pub errors: Vec<String>,

    /// Advisory findings.
    pub warnings: Vec<String>,
}

impl ValidationVerdict {
    /// A verdict with no findings.
    pub fn valid() -> Self {
        Self::default()
    }

    /// A verdict carrying a single error.
    pub fn invalid(error: impl Into<String>) -> Self {
        Self {
            errors: vec![error.into()],
            warnings: Vec::new(),
        }
    }

    pub fn add_error(&mut self, error: impl Into<String>) {
        self.errors.push(error.into());
    }

    pub fn add_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    /// True iff no errors were recorded. Warnings never block validity.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Document validator with configured thresholds.
#[derive(Debug, Clone)]
pub struct Validator {
    config: ValidationConfig,
}

impl Validator {
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    /// Validate a document against its recognition result and extracted
    /// metadata. Pure: never mutates the document.
    pub fn validate(&self, document: &Document) -> ValidationVerdict {
        let mut verdict = ValidationVerdict::valid();

        self.validate_basic_properties(document, &mut verdict);

        match &document.recognition {
            Some(recognition) => self.validate_recognition(recognition, &mut verdict),
            None => verdict.add_error("Recognition result is missing"),
        }

        match &document.metadata {
            Some(metadata) => self.validate_metadata(metadata, &mut verdict),
            None => verdict.add_error("Extracted metadata is missing"),
        }

        if let (Some(recognition), Some(metadata)) = (&document.recognition, &document.metadata) {
            self.validate_consistency(recognition, metadata, &mut verdict);
        }

        debug!(
            "validation completed: valid={}, errors={}, warnings={}",
            verdict.is_valid(),
            verdict.errors.len(),
            verdict.warnings.len()
        );

        verdict
    }

    fn validate_basic_properties(&self, document: &Document, verdict: &mut ValidationVerdict) {
        if document.filename.trim().is_empty() {
            verdict.add_error("Filename is required");
        }

        if document.content_ref.trim().is_empty() {
            verdict.add_error("File reference is missing");
        }
    }

    fn validate_recognition(&self, recognition: &RecognitionResult, verdict: &mut ValidationVerdict) {
        if recognition.confidence < self.config.min_confidence {
            if recognition.confidence < self.config.confidence_floor {
                verdict.add_error(format!(
                    "Recognition confidence too low: {:.2}% (minimum: {:.0}%)",
                    recognition.confidence * 100.0,
                    self.config.min_confidence * 100.0
                ));
            } else {
                verdict.add_warning(format!(
                    "Recognition confidence is below recommended threshold: {:.2}% (recommended: {:.0}%)",
                    recognition.confidence * 100.0,
                    self.config.min_confidence * 100.0
                ));
            }
        }

        if recognition.text.trim().is_empty() {
            verdict.add_error("Recognized text is empty");
        } else if recognition.text.len() < self.config.short_text_threshold {
            verdict.add_warning("Recognized text is very short, may indicate poor quality scan");
        }

        if recognition.language.trim().is_empty() {
            verdict.add_warning("Language detection failed");
        }
    }

    fn validate_metadata(&self, metadata: &InvoiceMetadata, verdict: &mut ValidationVerdict) {
        match metadata.invoice_number.as_deref() {
            None => verdict.add_error("Invoice number is required"),
            Some(number) if number.trim().is_empty() => {
                verdict.add_error("Invoice number is required")
            }
            Some(number) if !INVOICE_NUMBER_SHAPE.is_match(number) => {
                verdict.add_error("Invoice number contains invalid characters")
            }
            Some(_) => {}
        }

        match metadata.invoice_date {
            None => verdict.add_error("Invoice date is required"),
            Some(date) => {
                let years = self.config.date_window_years;
                let today = chrono::Utc::now().date_naive();
                let min_date = today - chrono::Months::new(12 * years);
                let max_date = today + chrono::Months::new(12 * years);

                if date < min_date {
                    verdict.add_warning(format!(
                        "Invoice date is more than {} year(s) old",
                        years
                    ));
                } else if date > max_date {
                    // Future dates beyond tolerance are never merely suspicious
                    verdict.add_error(format!(
                        "Invoice date cannot be more than {} year(s) in the future",
                        years
                    ));
                }
            }
        }

        match metadata.total_amount {
            None => verdict.add_error("Total amount is required"),
            Some(amount) => {
                if amount < self.config.min_amount {
                    verdict.add_error(format!(
                        "Total amount must be greater than {}",
                        self.config.min_amount
                    ));
                } else if amount > self.config.max_amount {
                    verdict.add_error(format!(
                        "Total amount exceeds maximum allowed: {}",
                        self.config.max_amount
                    ));
                }
            }
        }

        if metadata.line_items.is_empty() {
            verdict.add_warning("No line items found");
        } else {
            self.validate_line_items(metadata, verdict);
        }
    }

    fn validate_line_items(&self, metadata: &InvoiceMetadata, verdict: &mut ValidationVerdict) {
        for (index, item) in metadata.line_items.iter().enumerate() {
            let prefix = format!("Item {}: ", index + 1);

            if item.description.trim().is_empty() {
                verdict.add_error(format!("{}Description is required", prefix));
            }

            if item.quantity <= Decimal::ZERO {
                verdict.add_error(format!("{}Quantity must be greater than zero", prefix));
            }

            if item.unit_price <= Decimal::ZERO {
                verdict.add_error(format!("{}Unit price must be greater than zero", prefix));
            }
        }
    }

    fn validate_consistency(
        &self,
        recognition: &RecognitionResult,
        metadata: &InvoiceMetadata,
        verdict: &mut ValidationVerdict,
    ) {
        // Advisory only: extraction may legitimately diverge from the raw
        // text formatting.
        let text = recognition.text.to_lowercase();

        if let Some(number) = &metadata.invoice_number {
            if !text.contains(&number.to_lowercase()) {
                verdict.add_warning("Invoice number not found in recognized text");
            }
        }

        if let Some(amount) = metadata.total_amount {
            if !text.contains(&amount.to_string()) {
                verdict.add_warning("Total amount not clearly visible in recognized text");
            }
        }
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new(ValidationConfig::default())
    }
}
