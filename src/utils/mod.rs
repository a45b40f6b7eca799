//! Utility modules
//!
//! - Error types and result types
//! - JSON render reports

pub mod error;
pub mod report;

// Re-export commonly used items
pub use error::{ConversionError, ConversionResult};
pub use report::{reports_to_json, LossRecord, RenderReport};
