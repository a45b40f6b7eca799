//! Error handling for mdlatex conversions
//!
//! This module provides a unified error type and result type for the file
//! driver and the CLI. Rendering itself never fails; structural problems are
//! reported as warnings.

use std::fmt;
use std::path::{Path, PathBuf};

/// Conversion error type
#[derive(Debug, Clone)]
pub enum ConversionError {
    /// Reading or writing a file failed
    Io { path: PathBuf, message: String },
    /// Invalid input
    InvalidInput { message: String },
    /// The external document build could not be started
    Build { command: String, message: String },
    /// Render report could not be serialized
    Report { message: String },
}

impl ConversionError {
    pub fn io(path: &Path, err: std::io::Error) -> Self {
        ConversionError::Io {
            path: path.to_path_buf(),
            message: err.to_string(),
        }
    }
}

impl fmt::Display for ConversionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConversionError::Io { path, message } => {
                write!(f, "IO error on {}: {}", path.display(), message)
            }
            ConversionError::InvalidInput { message } => {
                write!(f, "Invalid input: {}", message)
            }
            ConversionError::Build { command, message } => {
                write!(f, "Build command '{}' failed to start: {}", command, message)
            }
            ConversionError::Report { message } => {
                write!(f, "Report error: {}", message)
            }
        }
    }
}

impl std::error::Error for ConversionError {}

impl From<serde_json::Error> for ConversionError {
    fn from(err: serde_json::Error) -> Self {
        ConversionError::Report {
            message: err.to_string(),
        }
    }
}

/// Result type for conversion operations
pub type ConversionResult<T> = Result<T, ConversionError>;
