//! Structured invoice metadata extracted from recognized text.

use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Structured invoice fields derived from a recognition result.
///
/// The extractor always populates every field, but records produced by other
/// paths may be partial; the validator treats `None` as a missing field.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InvoiceMetadata {
    /// Invoice number token.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invoice_number: Option<String>,

    /// Invoice date.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invoice_date: Option<NaiveDate>,

    /// Total amount (2 fraction digits).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_amount: Option<Decimal>,

    /// Ordered line items.
    #[serde(default)]
    pub line_items: Vec<LineItem>,

    /// Free-form additional fields (extraction method, document type, ...).
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub additional_fields: HashMap<String, Value>,
}

impl InvoiceMetadata {
    pub fn add_item(&mut self, item: LineItem) {
        self.line_items.push(item);
    }

    pub fn add_field(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.additional_fields.insert(key.into(), value.into());
    }

    pub fn item_count(&self) -> usize {
        self.line_items.len()
    }

    /// Sum of line item totals.
    pub fn items_total(&self) -> Decimal {
        self.line_items.iter().map(|i| i.total).sum()
    }

    /// Whether `total_amount` equals the sum of line item totals.
    ///
    /// This is a consistency check only; mismatches surface as validation
    /// signals, not constraint violations.
    pub fn is_total_consistent(&self) -> bool {
        self.total_amount
            .map(|total| total == self.items_total())
            .unwrap_or(false)
    }
}

/// A single invoice line item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// Product/service description.
    pub description: String,

    /// Quantity (expected > 0).
    pub quantity: Decimal,

    /// Unit price (expected > 0).
    pub unit_price: Decimal,

    /// Line total. Kept equal to `quantity * unit_price` by the setters, but
    /// not enforced at the type level for deserialized records.
    pub total: Decimal,
}

impl LineItem {
    /// Create a line item with the total computed from quantity and price.
    pub fn new(description: impl Into<String>, quantity: Decimal, unit_price: Decimal) -> Self {
        Self {
            description: description.into(),
            quantity,
            unit_price,
            total: quantity * unit_price,
        }
    }

    /// Update the quantity, recomputing the total.
    pub fn set_quantity(&mut self, quantity: Decimal) {
        self.quantity = quantity;
        self.total = self.quantity * self.unit_price;
    }

    /// Update the unit price, recomputing the total.
    pub fn set_unit_price(&mut self, unit_price: Decimal) {
        self.unit_price = unit_price;
        self.total = self.quantity * self.unit_price;
    }

    /// Whether the stored total equals `quantity * unit_price`.
    pub fn is_total_consistent(&self) -> bool {
        self.total == self.quantity * self.unit_price
    }
}
