//! Error types for the outer shell of the application.
//!
//! Trace reconstruction itself never fails: missing data shows up as absent
//! fields in the output. These errors cover reading event dumps and writing
//! trace documents. We use `thiserror` for library-style errors and `anyhow`
//! for propagation in main.rs and commands.

use thiserror::Error;

/// Errors that can occur while parsing an event dump
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Invalid event dump format: {0}")]
    InvalidFormat(String),

    #[error("Failed to read event dump: {0}")]
    IoError(#[from] std::io::Error),
}

/// Errors that can occur during file output
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Failed to write file: {0}")]
    WriteFailed(#[from] std::io::Error),

    #[error("Failed to serialize JSON: {0}")]
    SerializationFailed(#[from] serde_json::Error),

    #[error("Invalid output path: {0}")]
    InvalidPath(String),
}
