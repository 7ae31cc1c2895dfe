//! Configuration structures for the processing pipeline.

use std::path::PathBuf;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Main configuration for the docflow pipeline.
///
/// Passed explicitly into the validator and orchestrator so components stay
/// independently testable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Validation thresholds.
    pub validation: ValidationConfig,

    /// Processing limits and retry behavior.
    pub processing: ProcessingConfig,

    /// Binary content storage configuration.
    pub storage: StorageConfig,
}

/// Validation thresholds and ranges.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Recommended minimum recognition confidence. Results below it draw a
    /// warning unless they also fall under `confidence_floor`.
    pub min_confidence: f64,

    /// Absolute confidence floor. Results below it are errors.
    pub confidence_floor: f64,

    /// Minimum accepted total amount.
    pub min_amount: Decimal,

    /// Maximum accepted total amount.
    pub max_amount: Decimal,

    /// Accepted invoice date window, in years around today. Older dates warn;
    /// dates further in the future are errors.
    pub date_window_years: u32,

    /// Recognized text shorter than this draws a poor-scan warning.
    pub short_text_threshold: usize,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            min_confidence: 0.70,
            confidence_floor: 0.50,
            min_amount: Decimal::new(1, 2),
            max_amount: Decimal::new(100_000_00, 2),
            date_window_years: 1,
            short_text_threshold: 10,
        }
    }
}

/// Processing limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Maximum accepted upload size in bytes.
    pub max_file_size: u64,

    /// Whether an administrative reset to `Uploaded` clears accumulated
    /// errors. Off by default: each failure appends, preserving the audit
    /// trail across retries.
    pub clear_errors_on_reset: bool,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            max_file_size: 52_428_800,
            clear_errors_on_reset: false,
        }
    }
}

/// Binary content storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory for stored uploads.
    pub upload_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            upload_dir: PathBuf::from("uploads"),
        }
    }
}

impl PipelineConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))?;
        std::fs::write(path, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_documented_thresholds() {
        let config = ValidationConfig::default();
        assert_eq!(config.min_confidence, 0.70);
        assert_eq!(config.confidence_floor, 0.50);
        assert_eq!(config.min_amount.to_string(), "0.01");
        assert_eq!(config.max_amount.to_string(), "100000.00");
        assert_eq!(config.date_window_years, 1);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: PipelineConfig =
            serde_json::from_str(r#"{"validation": {"min_confidence": 0.9}}"#).unwrap();
        assert_eq!(config.validation.min_confidence, 0.9);
        assert_eq!(config.validation.confidence_floor, 0.50);
        assert_eq!(config.processing.max_file_size, 52_428_800);
    }

    #[test]
    fn test_config_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = PipelineConfig::default();
        config.processing.clear_errors_on_reset = true;
        config.save(&path).unwrap();

        let loaded = PipelineConfig::from_file(&path).unwrap();
        assert!(loaded.processing.clear_errors_on_reset);
        assert_eq!(loaded.validation.min_confidence, 0.70);
    }
}
