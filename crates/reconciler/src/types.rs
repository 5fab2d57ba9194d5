//! Core types for observed, carried, and reconciled stream state.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::identity::StreamIdentity;
use crate::vendor::VendorConfig;

/// What the remote reports for a stream.
///
/// There are no vendor config fields here: the remote never returns them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservedStreamState {
    /// Remote-assigned id.
    pub stream_id: i64,
    /// Whether the stream is delivering.
    pub enabled: bool,
    /// Human-readable description of the destination.
    #[serde(default)]
    pub summary: String,
    /// Remote stream type label, when reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream_type: Option<String>,
    /// Creation time, when reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// Last update time, when reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    /// Time the stream was paused, when reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paused_at: Option<DateTime<Utc>>,
}

impl ObservedStreamState {
    /// Create an observation with only the required fields.
    pub fn new(stream_id: i64, enabled: bool, summary: impl Into<String>) -> Self {
        Self {
            stream_id,
            enabled,
            summary: summary.into(),
            stream_type: None,
            created_at: None,
            updated_at: None,
            paused_at: None,
        }
    }
}

/// Fields the remote cannot confirm, held on trust from the last write.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarriedFields {
    /// Vendor config as last successfully written, or `None` after import.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor_config: Option<VendorConfig>,
}

impl CarriedFields {
    /// Carry the given vendor config.
    #[must_use]
    pub const fn new(vendor_config: Option<VendorConfig>) -> Self {
        Self { vendor_config }
    }
}

/// Stored source of truth for one stream after a read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciledState {
    /// Durable identity.
    pub identity: StreamIdentity,
    /// Remote-observed fields.
    pub observed: ObservedStreamState,
    /// Trust-carried fields.
    #[serde(default)]
    pub carried: CarriedFields,
}

impl ReconciledState {
    /// Merge an observation with carried fields.
    #[must_use]
    pub const fn reconcile(
        identity: StreamIdentity,
        observed: ObservedStreamState,
        carried: CarriedFields,
    ) -> Self {
        Self {
            identity,
            observed,
            carried,
        }
    }

    /// Parent scope.
    #[must_use]
    pub fn scope(&self) -> &str {
        self.identity.scope()
    }

    /// Remote-assigned stream id.
    #[must_use]
    pub const fn stream_id(&self) -> i64 {
        self.identity.stream_id()
    }

    /// Observed enabled flag.
    #[must_use]
    pub const fn enabled(&self) -> bool {
        self.observed.enabled
    }

    /// Observed summary.
    #[must_use]
    pub fn summary(&self) -> &str {
        &self.observed.summary
    }

    /// Carried vendor config.
    #[must_use]
    pub const fn vendor_config(&self) -> Option<&VendorConfig> {
        self.carried.vendor_config.as_ref()
    }
}

/// Outcome of reading a stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    /// The stream exists.
    Present(ReconciledState),
    /// The remote no longer has it; callers should forget the identity.
    Absent,
}

impl ReadOutcome {
    /// The reconciled state if present.
    #[must_use]
    pub fn into_state(self) -> Option<ReconciledState> {
        match self {
            Self::Present(state) => Some(state),
            Self::Absent => None,
        }
    }
}

/// Public key used to encrypt vendor secrets before they are declared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SigningKey {
    /// Key id to put in `key_id`.
    pub key_id: String,
    /// Public key material.
    pub key: String,
}

/// Lifecycle phase of one managed stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamPhase {
    /// No identity is held.
    Absent,
    /// Create call in flight.
    Creating,
    /// Identity held and last read succeeded.
    Present,
    /// Update call in flight.
    Updating,
    /// Delete call in flight.
    Deleting,
}

impl StreamPhase {
    /// Whether moving to `next` is allowed.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Absent, Self::Creating | Self::Present)
                | (Self::Creating, Self::Present | Self::Absent)
                | (Self::Present, Self::Updating | Self::Deleting | Self::Absent)
                | (Self::Updating, Self::Present | Self::Absent)
                | (Self::Deleting, Self::Absent | Self::Present)
        )
    }
}

impl fmt::Display for StreamPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Absent => "absent",
            Self::Creating => "creating",
            Self::Present => "present",
            Self::Updating => "updating",
            Self::Deleting => "deleting",
        };
        f.write_str(name)
    }
}

/// Whole-resource change needed to converge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamAction {
    /// Nothing to do.
    NoOp,
    /// No stream is held; create one.
    Create { scope: String },
    /// Replace the vendor config and enabled flag in place.
    Update {
        identity: StreamIdentity,
        enabled_from: bool,
        enabled_to: bool,
        vendor_changed: bool,
    },
    /// Scope changed: delete then create.
    Replace {
        identity: StreamIdentity,
        new_scope: String,
    },
}

impl StreamAction {
    /// Whether applying this action would touch the remote.
    #[must_use]
    pub const fn is_change(&self) -> bool {
        !matches!(self, Self::NoOp)
    }

    /// Get a description of the action. Never includes secrets.
    #[must_use]
    pub fn description(&self) -> String {
        match self {
            Self::NoOp => "no changes".to_string(),
            Self::Create { scope } => format!("create stream in scope {scope}"),
            Self::Update {
                identity,
                enabled_from,
                enabled_to,
                vendor_changed,
            } => {
                let mut parts = Vec::new();
                if enabled_from != enabled_to {
                    parts.push(format!("enabled {enabled_from} -> {enabled_to}"));
                }
                if *vendor_changed {
                    parts.push("vendor config replaced".to_string());
                }
                format!("update stream {identity} ({})", parts.join(", "))
            }
            Self::Replace {
                identity,
                new_scope,
            } => {
                format!("replace stream {identity} (scope -> {new_scope})")
            }
        }
    }
}
