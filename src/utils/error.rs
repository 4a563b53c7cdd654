//! Error types for the entire application.
//!
//! We use `thiserror` for library-style errors with custom types,
//! and `anyhow` for application-level error propagation in main.rs and commands.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while reading a capture file
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("JSON deserialization failed: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid capture format: {0}")]
    InvalidFormat(String),
}

/// A single event that is missing data or carries invalid data.
///
/// Malformed events are skipped and counted, never fatal.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid field {field}: {reason}")]
    InvalidField { field: String, reason: String },
}

/// Why a request could not be attached to the tree
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OrphanReason {
    /// A parser or script initiator referenced URLs never seen as nodes
    #[error("Initiator references untracked resource(s): {}", .urls.join(", "))]
    OrphanedInitiator { urls: Vec<String> },

    /// `Other` initiator with no structural link
    #[error("Initiator carries no structural link")]
    AmbiguousInitiator,
}

/// Contract violations that abort the whole reconstruction
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("Capture contains no valid request events")]
    EmptyCapture,

    #[error("Request {request_id} claims to be a second root navigation of {url}")]
    DuplicateRoot { request_id: String, url: String },
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
