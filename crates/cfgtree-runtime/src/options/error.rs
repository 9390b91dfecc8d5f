//! Options error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading or validating [`EngineOptions`](super::EngineOptions).
#[derive(Error, Debug)]
pub enum OptionsError {
    /// An explicitly requested options file does not exist.
    #[error("Options file not found: {0}")]
    FileNotFound(PathBuf),

    /// The file extension is unknown or its format feature is disabled.
    #[error("Unsupported or disabled options file format: .{0}")]
    UnsupportedFormat(String),

    /// Merged sources could not be extracted into the schema.
    #[error("Failed to extract options: {0}")]
    Extract(String),

    /// Extracted options are semantically invalid.
    #[error("Invalid options: {message}")]
    Validation { message: String },
}

impl OptionsError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}

impl From<figment::Error> for OptionsError {
    fn from(err: figment::Error) -> Self {
        Self::Extract(err.to_string())
    }
}

/// Result type for options operations.
pub type OptionsResult<T> = Result<T, OptionsError>;
