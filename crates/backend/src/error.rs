//! Error type for calls against the managed backend.

use thiserror::Error;

/// Errors that can occur when talking to the table store or its auth API.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Transport-level failure (connect, TLS, timeout).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend returned an error payload.
    #[error("backend error: {status} - {message}")]
    Api { status: u16, message: String },

    /// The caller's token or key was rejected.
    #[error("backend rejected credentials: {0}")]
    Unauthorized(String),

    /// A unique-key insert or upsert collided with an existing row.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The requested row does not exist (or row-level policy hides it).
    #[error("not found: {0}")]
    NotFound(String),

    /// The response body could not be decoded into the expected shape.
    #[error("parse error: {0}")]
    Parse(String),
}

impl BackendError {
    /// Classify a non-success HTTP response into an error variant.
    #[must_use]
    pub fn from_status(status: u16, message: String) -> Self {
        match status {
            401 | 403 => Self::Unauthorized(message),
            404 => Self::NotFound(message),
            409 => Self::Conflict(message),
            _ => Self::Api { status, message },
        }
    }
}
