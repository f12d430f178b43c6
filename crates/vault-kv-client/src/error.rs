//! Error types for the KV client.

use thiserror::Error;

/// Errors returned by [`crate::VaultClient`].
#[derive(Error, Debug)]
pub enum VaultError {
    /// Transport-level failure (connect, TLS, timeout)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Server answered with a non-success status
    #[error("{method} {url} failed with status={status}. {message}")]
    Api {
        method: String,
        url: String,
        status: u16,
        message: String,
    },

    /// No token available for an authenticated call
    #[error("No Vault token available, please log in")]
    MissingToken,

    /// Request could not be built
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Response was missing expected fields
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl VaultError {
    /// HTTP status for API errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            VaultError::Api { status, .. } => Some(*status),
            VaultError::Http(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// True when the server reported 404.
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

/// Result type alias using VaultError.
pub type VaultResult<T> = Result<T, VaultError>;
