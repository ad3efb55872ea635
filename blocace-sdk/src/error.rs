//! Error types for the Blocace client.

use blocace_core::{CoreError, CryptoError, DocumentError, SchemaError};
use thiserror::Error;

/// Blocace client error.
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The configured base URL is unusable.
    #[error("invalid base URL: {0}")]
    InvalidUrl(String),

    /// The node returned a non-success status.
    #[error("node returned {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body.
        body: String,
    },

    /// The requested resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The node's response was well-formed JSON but semantically unusable.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Local signing or verification material was rejected.
    #[error(transparent)]
    Core(#[from] CoreError),
}

impl From<url::ParseError> for ClientError {
    fn from(e: url::ParseError) -> Self {
        ClientError::InvalidUrl(e.to_string())
    }
}

impl From<CryptoError> for ClientError {
    fn from(e: CryptoError) -> Self {
        ClientError::Core(e.into())
    }
}

impl From<DocumentError> for ClientError {
    fn from(e: DocumentError) -> Self {
        ClientError::Core(e.into())
    }
}

impl From<SchemaError> for ClientError {
    fn from(e: SchemaError) -> Self {
        ClientError::Core(e.into())
    }
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;
