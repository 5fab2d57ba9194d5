//! Vendor-specific delivery configuration.
//!
//! The remote accepts these fields on write and never returns them on read.

use audit_stream_core::Sensitive;
use serde::{Deserialize, Serialize};

use crate::declaration::StreamDeclaration;
use crate::error::{Error, Result};

/// Remote stream type label for blob storage destinations.
pub const BLOB_STREAM_TYPE: &str = "Azure Blob Storage";

/// Blob storage container that receives exported events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BlobDestination {
    /// Container name.
    pub container: String,
    /// Id of the public key the access URL was encrypted with.
    pub key_id: String,
    /// Encrypted container access URL.
    pub encrypted_access_url: Sensitive,
}

impl BlobDestination {
    /// Create a blob destination.
    pub fn new(
        container: impl Into<String>,
        key_id: impl Into<String>,
        encrypted_access_url: impl Into<Sensitive>,
    ) -> Self {
        Self {
            container: container.into(),
            key_id: key_id.into(),
            encrypted_access_url: encrypted_access_url.into(),
        }
    }

    /// All three fields are required together and must be non-empty.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] naming the first empty field.
    pub fn validate(&self) -> Result<()> {
        let empty = [
            ("container", self.container.is_empty()),
            ("key_id", self.key_id.is_empty()),
            ("encrypted_access_url", self.encrypted_access_url.is_empty()),
        ]
        .into_iter()
        .find_map(|(field, is_empty)| is_empty.then_some(field));

        match empty {
            Some(field) => Err(Error::invalid_configuration(format!(
                "blob_destination.{field} must not be empty"
            ))),
            None => Ok(()),
        }
    }
}

/// Delivery configuration, one case per vendor.
///
/// Stored adjacently tagged (`kind` + `config`) so adding a case never
/// changes how an existing case is encoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "config", rename_all = "snake_case")]
pub enum VendorConfig {
    /// Blob storage destination.
    BlobDestination(BlobDestination),
}

impl VendorConfig {
    /// Stable discriminant used in stored state.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::BlobDestination(_) => "blob_destination",
        }
    }

    /// Stream type label the remote expects on write.
    #[must_use]
    pub const fn stream_type(&self) -> &'static str {
        match self {
            Self::BlobDestination(_) => BLOB_STREAM_TYPE,
        }
    }

    /// Short description with no secret material, for logs and plans.
    #[must_use]
    pub fn summary(&self) -> String {
        match self {
            Self::BlobDestination(dest) => {
                format!("{} container={} key_id={}", self.kind(), dest.container, dest.key_id)
            }
        }
    }

    /// Validate the populated case.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] if the case has empty fields.
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::BlobDestination(dest) => dest.validate(),
        }
    }
}

/// Everything sent on a create or update call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamConfig {
    /// Whether the stream should deliver events.
    pub enabled: bool,
    /// Destination payload.
    pub vendor: VendorConfig,
}

/// Build the write payload from a declaration.
///
/// Returns `None` when no vendor block is populated. Whether that is an
/// error is decided by the caller.
#[must_use]
pub fn build(declaration: &StreamDeclaration, enabled: bool) -> Option<StreamConfig> {
    declaration
        .blob_destination
        .clone()
        .map(VendorConfig::BlobDestination)
        .map(|vendor| StreamConfig { enabled, vendor })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_without_block_is_none() {
        assert!(build(&StreamDeclaration::new("acme"), true).is_none());
    }

    #[test]
    fn test_build_carries_enabled_and_fields() {
        let declaration = StreamDeclaration::new("acme")
            .with_blob_destination(BlobDestination::new("c1", "k1", "s1"));

        let config = build(&declaration, false);
        assert_eq!(
            config,
            Some(StreamConfig {
                enabled: false,
                vendor: VendorConfig::BlobDestination(BlobDestination::new("c1", "k1", "s1")),
            })
        );
    }

    #[test]
    fn test_stored_encoding_is_tagged() -> std::result::Result<(), serde_json::Error> {
        let config = VendorConfig::BlobDestination(BlobDestination::new("c1", "k1", "s1"));
        let value = serde_json::to_value(&config)?;
        assert_eq!(
            value,
            serde_json::json!({
                "kind": "blob_destination",
                "config": {
                    "container": "c1",
                    "key_id": "k1",
                    "encrypted_access_url": "s1"
                }
            })
        );
        Ok(())
    }

    #[test]
    fn test_summary_and_debug_hide_secret() {
        let config = VendorConfig::BlobDestination(BlobDestination::new("c1", "k1", "s3cr3t"));
        assert!(!config.summary().contains("s3cr3t"));
        assert!(!format!("{config:?}").contains("s3cr3t"));
        assert!(config.summary().contains("c1"));
    }

    #[test]
    fn test_validate_names_empty_field() {
        let result = BlobDestination::new("c1", "", "s1").validate();
        assert!(matches!(
            result,
            Err(Error::InvalidConfiguration { ref reason }) if reason.contains("key_id")
        ));
    }
}
