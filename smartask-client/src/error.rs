//! Error types for smartask-client

use crate::correlation::transport::TransportError;
use std::collections::BTreeMap;
use thiserror::Error;

/// Field name -> message, as shown inline next to form fields
pub type FieldErrors = BTreeMap<String, String>;

/// Main error type for the client library
#[derive(Debug, Error)]
pub enum ClientError {
    /// Request never produced an HTTP response
    #[error("Network error: {0}")]
    Network(String),

    /// Backend answered 404
    #[error("Not found: {0}")]
    NotFound(String),

    /// Backend answered with another non-success status
    #[error("API error {0}: {1}")]
    Api(u16, String),

    /// Response body could not be decoded
    #[error("Parse error: {0}")]
    Parse(String),

    /// User input rejected before any request was made
    #[error("Validation failed: {}", summarize(.0))]
    Validation(FieldErrors),

    /// Broadcast subscription failure
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Operation not allowed in the current listener/view state
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// smartask-common error
    #[error("Common error: {0}")]
    Common(#[from] smartask_common::Error),
}

/// Convenience Result type using ClientError
pub type Result<T> = std::result::Result<T, ClientError>;

fn summarize(errors: &FieldErrors) -> String {
    errors
        .iter()
        .map(|(field, message)| format!("{}: {}", field, message))
        .collect::<Vec<_>>()
        .join("; ")
}
