//! Error types for the reconciler crate.

use std::fmt;

/// Result type alias for reconciler operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Reconciler error types.
///
/// Only [`Error::RemoteNotFound`] is ever absorbed by this crate, and only on
/// read, where it becomes [`crate::ReadOutcome::Absent`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The declaration is missing something the user must supply.
    InvalidConfiguration { reason: String },
    /// A durable identity string could not be decoded.
    MalformedIdentity { id: String, reason: String },
    /// The remote service reports that the stream does not exist.
    RemoteNotFound { operation: String, resource: String },
    /// Any other remote failure, carried verbatim.
    RemoteFailure {
        operation: String,
        status: Option<u16>,
        reason: String,
    },
    /// A lifecycle phase change that is not allowed.
    InvalidTransition { from: String, to: String },
    /// Persisted state could not be loaded or stored.
    State { reason: String },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidConfiguration { reason } => {
                write!(f, "invalid configuration: {reason}")
            }
            Self::MalformedIdentity { id, reason } => {
                write!(f, "malformed stream identity '{id}': {reason}")
            }
            Self::RemoteNotFound {
                operation,
                resource,
            } => {
                write!(f, "{operation}: '{resource}' not found")
            }
            Self::RemoteFailure {
                operation,
                status: Some(status),
                reason,
            } => {
                write!(f, "{operation} failed with status {status}: {reason}")
            }
            Self::RemoteFailure {
                operation,
                status: None,
                reason,
            } => {
                write!(f, "{operation} failed: {reason}")
            }
            Self::InvalidTransition { from, to } => {
                write!(f, "invalid lifecycle transition from '{from}' to '{to}'")
            }
            Self::State { reason } => {
                write!(f, "state error: {reason}")
            }
        }
    }
}

impl std::error::Error for Error {}

impl From<audit_stream_core::Error> for Error {
    fn from(err: audit_stream_core::Error) -> Self {
        Self::State {
            reason: err.to_string(),
        }
    }
}

impl Error {
    /// Create an invalid configuration error.
    pub fn invalid_configuration(reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            reason: reason.into(),
        }
    }

    /// Create a malformed identity error.
    pub fn malformed_identity(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedIdentity {
            id: id.into(),
            reason: reason.into(),
        }
    }

    /// Create a remote not-found error.
    pub fn remote_not_found(operation: impl Into<String>, resource: impl Into<String>) -> Self {
        Self::RemoteNotFound {
            operation: operation.into(),
            resource: resource.into(),
        }
    }

    /// Create a remote failure without an HTTP-style status.
    pub fn remote_failure(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::RemoteFailure {
            operation: operation.into(),
            status: None,
            reason: reason.into(),
        }
    }

    /// Create a remote failure that carries a response status.
    pub fn remote_status(
        operation: impl Into<String>,
        status: u16,
        reason: impl Into<String>,
    ) -> Self {
        Self::RemoteFailure {
            operation: operation.into(),
            status: Some(status),
            reason: reason.into(),
        }
    }

    /// Create an invalid transition error.
    pub fn invalid_transition(from: impl fmt::Display, to: impl fmt::Display) -> Self {
        Self::InvalidTransition {
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    /// Whether the remote reported the resource as missing.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::RemoteNotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::invalid_configuration("at least one vendor config required");
        assert!(err.to_string().contains("at least one vendor config required"));
    }

    #[test]
    fn test_remote_failure_display_includes_status() {
        let err = Error::remote_status("update_stream", 422, "validation failed");
        let message = err.to_string();
        assert!(message.contains("update_stream"));
        assert!(message.contains("422"));
        assert!(message.contains("validation failed"));
    }

    #[test]
    fn test_only_not_found_is_not_found() {
        assert!(Error::remote_not_found("get_stream", "acme:1").is_not_found());
        assert!(!Error::remote_failure("get_stream", "timeout").is_not_found());
        assert!(!Error::malformed_identity("x", "no separator").is_not_found());
    }
}
