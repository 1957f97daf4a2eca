use std::path::PathBuf;
use thiserror::Error;

/// The main error type for marshalkit operations.
#[derive(Debug, Error)]
pub enum MarshalError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to copy {source_path} to {dest_path}: {source}")]
    Transfer {
        source_path: String,
        dest_path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },

    #[error("Unsupported: {0}")]
    Unsupported(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("Parquet error for {uri}: {message}")]
    Parquet { uri: String, message: String },

    #[error("Failed to parse literal JSON from {path}: {source}")]
    LiteralJsonParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write literal JSON to {path}: {source}")]
    LiteralJsonWrite {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl MarshalError {
    pub(crate) fn type_mismatch(expected: impl Into<String>, found: impl Into<String>) -> Self {
        MarshalError::TypeMismatch {
            expected: expected.into(),
            found: found.into(),
        }
    }
}
