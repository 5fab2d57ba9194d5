//! Error types for the stream client.

use audit_stream_reconciler::Error as RemoteError;
use thiserror::Error;

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while talking to the stream service.
#[derive(Error, Debug)]
pub enum Error {
    /// The service has no such resource.
    #[error("{resource} not found")]
    NotFound { resource: String },

    /// The service answered with a non-success status.
    #[error("API returned {status}: {body}")]
    Status { status: u16, body: String },

    /// Configuration error.
    #[error("configuration error: {reason}")]
    ConfigError { reason: String },

    /// HTTP error from reqwest.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// URL parse error.
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Core error.
    #[error("core error: {0}")]
    Core(#[from] audit_stream_core::Error),
}

impl Error {
    /// Create a not found error.
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    /// Create a status error.
    pub fn status(status: u16, body: impl Into<String>) -> Self {
        Self::Status {
            status,
            body: body.into(),
        }
    }

    /// Create a config error.
    pub fn config_error(reason: impl Into<String>) -> Self {
        Self::ConfigError {
            reason: reason.into(),
        }
    }

    /// Check if this error is retryable.
    ///
    /// Only transport failures and server errors qualify.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(e) => e.is_timeout() || e.is_connect(),
            Self::Status { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Convert into the reconciler's remote error taxonomy.
    #[must_use]
    pub fn into_remote(self, operation: &str) -> RemoteError {
        match self {
            Self::NotFound { resource } => RemoteError::remote_not_found(operation, resource),
            Self::Status { status, body } => RemoteError::remote_status(operation, status, body),
            other => RemoteError::remote_failure(operation, other.to_string()),
        }
    }
}
