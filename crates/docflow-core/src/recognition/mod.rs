//! Text recognition engine contract and built-in engines.

mod simulated;

pub use simulated::SimulatedEngine;

use crate::error::Result;
use crate::models::recognition::RecognitionResult;

/// Turns raw file content into recognized text with a confidence score.
///
/// Engines fail with `RecognitionError::EmptyContent` on empty input and
/// `RecognitionError::Engine` on internal faults. A low-quality result
/// (low confidence, empty text) is not an error at this layer; the caller
/// decides how to react.
pub trait RecognitionEngine: Send + Sync {
    fn recognize(&self, content: &[u8], filename: &str) -> Result<RecognitionResult>;

    /// Stable identifier for the engine, recorded on every result.
    fn name(&self) -> &str;
}
