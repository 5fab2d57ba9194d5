//! Request and response bodies of the stream service.

use audit_stream_reconciler::{ObservedStreamState, SigningKey, StreamConfig, VendorConfig};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Body of a create or update call.
#[derive(Debug, Serialize)]
pub struct StreamRequest<'a> {
    pub enabled: bool,
    pub stream_type: &'a str,
    pub vendor_specific: VendorSpecific<'a>,
}

/// Vendor payload, shaped per stream type.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum VendorSpecific<'a> {
    AzureBlob {
        key_id: &'a str,
        encrypted_sas_url: &'a str,
        container: &'a str,
    },
}

impl<'a> From<&'a StreamConfig> for StreamRequest<'a> {
    fn from(config: &'a StreamConfig) -> Self {
        let vendor_specific = match &config.vendor {
            VendorConfig::BlobDestination(dest) => VendorSpecific::AzureBlob {
                key_id: &dest.key_id,
                encrypted_sas_url: dest.encrypted_access_url.expose(),
                container: &dest.container,
            },
        };
        Self {
            enabled: config.enabled,
            stream_type: config.vendor.stream_type(),
            vendor_specific,
        }
    }
}

/// A stream as the service reports it.
///
/// Vendor fields are not part of this shape; anything extra in the body is
/// ignored.
#[derive(Debug, Deserialize)]
pub struct StreamResponse {
    pub id: i64,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub stream_type: Option<String>,
    #[serde(default)]
    pub stream_details: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub paused_at: Option<DateTime<Utc>>,
}

impl From<StreamResponse> for ObservedStreamState {
    fn from(response: StreamResponse) -> Self {
        Self {
            stream_id: response.id,
            enabled: response.enabled,
            summary: response.stream_details.unwrap_or_default(),
            stream_type: response.stream_type,
            created_at: response.created_at,
            updated_at: response.updated_at,
            paused_at: response.paused_at,
        }
    }
}

/// Signing key as the service reports it.
#[derive(Debug, Deserialize)]
pub struct KeyResponse {
    pub key_id: String,
    pub key: String,
}

impl From<KeyResponse> for SigningKey {
    fn from(response: KeyResponse) -> Self {
        Self {
            key_id: response.key_id,
            key: response.key,
        }
    }
}
