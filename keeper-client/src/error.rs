//! Remote authority error types.

use thiserror::Error;

/// Result type for remote authority operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors that can occur talking to the remote authority.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Transport failure: timeout, DNS, connection refused, TLS.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The authority answered with a non-success status.
    #[error("API request failed with status {status}: {body}")]
    Api { status: u16, body: String },

    /// The authority already holds a record for this identity or domain.
    #[error("duplicate entry: {0}")]
    Duplicate(String),

    /// The response body did not have the expected shape.
    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl ClientError {
    /// Returns true if this error signals a uniqueness conflict.
    pub fn is_duplicate_entry(&self) -> bool {
        match self {
            ClientError::Duplicate(_) => true,
            ClientError::Api { status, body } => {
                *status == 409 || body.to_ascii_lowercase().contains("duplicate entry")
            }
            _ => false,
        }
    }

    /// Returns true if the call failed because it ran out of time.
    pub fn is_timeout(&self) -> bool {
        matches!(self, ClientError::Http(e) if e.is_timeout())
    }
}
