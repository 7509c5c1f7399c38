//! Errors raised while loading, saving, or validating model files.

use std::path::PathBuf;

/// Errors for plan, track, and report files.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("I/O error at {path}: {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Parse error in {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Invalid {what}: {message}")]
    ValidationError { what: &'static str, message: String },
}

impl ModelError {
    pub(crate) fn invalid(what: &'static str, message: impl Into<String>) -> Self {
        Self::ValidationError {
            what,
            message: message.into(),
        }
    }
}
