//! Durable two-part identity for a stream: `<scope>:<stream_id>`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Separator between the scope and the numeric stream id.
pub const SEPARATOR: char = ':';

/// Composite key of a stream resource.
///
/// Serialized as its composed string form so a stored identity is always the
/// same text the user would pass to `import`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StreamIdentity {
    scope: String,
    stream_id: i64,
}

impl StreamIdentity {
    /// Build an identity from its parts.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedIdentity`] if the scope is empty or contains
    /// the separator, or if the stream id is not positive.
    pub fn new(scope: impl Into<String>, stream_id: i64) -> Result<Self> {
        let scope = scope.into();
        validate_scope(&scope).map_err(|reason| {
            Error::malformed_identity(format!("{scope}{SEPARATOR}{stream_id}"), reason)
        })?;
        if stream_id <= 0 {
            return Err(Error::malformed_identity(
                format!("{scope}{SEPARATOR}{stream_id}"),
                "stream_id must be a positive integer",
            ));
        }
        Ok(Self { scope, stream_id })
    }

    /// Parse a composed identity string.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedIdentity`] if the separator is missing or
    /// repeated, the scope is empty, or the id is not a positive base-10 integer.
    pub fn decompose(id: &str) -> Result<Self> {
        let parts: Vec<&str> = id.split(SEPARATOR).collect();
        let (scope, raw_id) = match parts.as_slice() {
            [scope, raw_id] => (*scope, *raw_id),
            [_] => {
                return Err(Error::malformed_identity(
                    id,
                    format!("expected <scope>{SEPARATOR}<stream_id>, separator missing"),
                ));
            }
            _ => {
                return Err(Error::malformed_identity(
                    id,
                    format!("separator '{SEPARATOR}' appears more than once"),
                ));
            }
        };

        if raw_id.is_empty() || !raw_id.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::malformed_identity(
                id,
                format!("invalid stream_id {raw_id:?}: not a base-10 integer"),
            ));
        }
        let stream_id = raw_id.parse::<i64>().map_err(|e| {
            Error::malformed_identity(id, format!("invalid stream_id {raw_id:?}: {e}"))
        })?;

        Self::new(scope, stream_id).map_err(|err| match err {
            Error::MalformedIdentity { reason, .. } => Error::malformed_identity(id, reason),
            other => other,
        })
    }

    /// Render the identity as `<scope>:<stream_id>`.
    #[must_use]
    pub fn compose(&self) -> String {
        format!("{}{SEPARATOR}{}", self.scope, self.stream_id)
    }

    /// The parent scope.
    #[must_use]
    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// The remote-assigned stream id.
    #[must_use]
    pub const fn stream_id(&self) -> i64 {
        self.stream_id
    }
}

/// Compose a durable identity string from its parts.
///
/// # Errors
///
/// Fails under the same conditions as [`StreamIdentity::new`].
pub fn compose(scope: &str, stream_id: i64) -> Result<String> {
    StreamIdentity::new(scope, stream_id).map(|identity| identity.compose())
}

/// Split a durable identity string into `(scope, stream_id)`.
///
/// # Errors
///
/// Fails under the same conditions as [`StreamIdentity::decompose`].
pub fn decompose(id: &str) -> Result<(String, i64)> {
    StreamIdentity::decompose(id).map(|identity| (identity.scope, identity.stream_id))
}

/// Check that a scope can be embedded in an identity.
///
/// # Errors
///
/// Returns a human-readable reason when the scope is empty or contains
/// the separator.
pub fn validate_scope(scope: &str) -> std::result::Result<(), String> {
    if scope.is_empty() {
        return Err("scope must not be empty".to_string());
    }
    if scope.contains(SEPARATOR) {
        return Err(format!("scope must not contain '{SEPARATOR}'"));
    }
    Ok(())
}

impl fmt::Display for StreamIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{SEPARATOR}{}", self.scope, self.stream_id)
    }
}

impl FromStr for StreamIdentity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::decompose(s)
    }
}

impl TryFrom<String> for StreamIdentity {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::decompose(&value)
    }
}

impl From<StreamIdentity> for String {
    fn from(identity: StreamIdentity) -> Self {
        identity.compose()
    }
}
