//! Desired state for a single audit log stream.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::identity::validate_scope;
use crate::vendor::BlobDestination;

/// Value of `enabled` when a declaration leaves it out.
pub const DEFAULT_ENABLED: bool = true;

/// Declared configuration of one stream.
///
/// Each vendor variant has its own optional block. At least one block must be
/// populated; [`StreamDeclaration::validate`] enforces that so new variants
/// only add a field here and a case in the check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StreamDeclaration {
    /// Parent scope. Changing it forces the stream to be replaced.
    pub scope: String,
    /// Whether the stream delivers events. Defaults to [`DEFAULT_ENABLED`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    /// Blob storage destination.
    #[serde(default, alias = "vendor_config", skip_serializing_if = "Option::is_none")]
    pub blob_destination: Option<BlobDestination>,
}

impl StreamDeclaration {
    /// Create a declaration for a scope with no vendor block.
    pub fn new(scope: impl Into<String>) -> Self {
        Self {
            scope: scope.into(),
            enabled: None,
            blob_destination: None,
        }
    }

    /// Set `enabled` explicitly.
    #[must_use]
    pub const fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = Some(enabled);
        self
    }

    /// Attach a blob storage destination.
    #[must_use]
    pub fn with_blob_destination(mut self, destination: BlobDestination) -> Self {
        self.blob_destination = Some(destination);
        self
    }

    /// `enabled` with the default applied.
    #[must_use]
    pub fn effective_enabled(&self) -> bool {
        self.enabled.unwrap_or(DEFAULT_ENABLED)
    }

    /// Whether any vendor block is populated.
    #[must_use]
    pub const fn has_vendor_config(&self) -> bool {
        self.blob_destination.is_some()
    }

    /// Check the declaration before anything is sent to the remote.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] when the scope is unusable, no
    /// vendor block is present, or a populated block has empty fields.
    pub fn validate(&self) -> Result<()> {
        validate_scope(&self.scope)
            .map_err(|reason| Error::invalid_configuration(format!("scope: {reason}")))?;

        if !self.has_vendor_config() {
            return Err(Error::invalid_configuration(
                "at least one vendor config required (blob_destination)",
            ));
        }

        if let Some(ref destination) = self.blob_destination {
            destination.validate()?;
        }

        Ok(())
    }
}
