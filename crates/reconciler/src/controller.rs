//! Lifecycle controller for a single audit log stream.
//!
//! The remote accepts vendor config on write and never returns it on read.
//! Every read therefore splits the result into what the remote confirmed
//! ([`ObservedStreamState`]) and what we carry on trust ([`CarriedFields`]).

use std::sync::Arc;

use audit_stream_core::GenericResultExt;
use tracing::{debug, info, warn};

use crate::api::StreamApi;
use crate::declaration::StreamDeclaration;
use crate::error::{Error, Result};
use crate::identity::{validate_scope, StreamIdentity};
use crate::types::{CarriedFields, ReadOutcome, ReconciledState, SigningKey};
use crate::vendor::{self, StreamConfig, VendorConfig};

/// Drives create/read/update/delete against an injected [`StreamApi`].
///
/// Holds no state of its own beyond the client handle, so one controller can
/// serve any number of streams concurrently. It never retries.
#[derive(Clone)]
pub struct StreamController {
    api: Arc<dyn StreamApi>,
}

impl StreamController {
    /// Create a controller over a remote client.
    pub fn new(api: Arc<dyn StreamApi>) -> Self {
        Self { api }
    }

    /// Create a stream and return its durable identity.
    ///
    /// No identity is produced if the remote call fails.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidConfiguration`] without any remote call when the
    /// declaration has no vendor config or is otherwise invalid; the remote
    /// error when the create call fails.
    pub async fn create(&self, declaration: &StreamDeclaration) -> Result<StreamIdentity> {
        let config = write_config(declaration)?;
        let scope = declaration.scope.as_str();

        info!(scope, vendor = %config.vendor.summary(), "Creating audit log stream");

        let stream_id = self
            .api
            .create_stream(scope, &config)
            .await
            .tap_err(|e| warn!(scope, error = %e, "Stream create failed"))?;

        let identity = StreamIdentity::new(scope, stream_id).map_err(|e| {
            Error::remote_failure("create_stream", format!("remote returned unusable id: {e}"))
        })?;

        info!(identity = %identity, "Audit log stream created");
        Ok(identity)
    }

    /// Read a stream and reconcile it with the carried vendor config.
    ///
    /// The vendor config in the result is exactly `carried`; nothing in the
    /// remote response can change it.
    ///
    /// # Errors
    ///
    /// Remote failures other than not-found propagate unchanged.
    pub async fn read(
        &self,
        identity: &StreamIdentity,
        carried: Option<VendorConfig>,
    ) -> Result<ReadOutcome> {
        debug!(identity = %identity, "Reading audit log stream");

        match self
            .api
            .get_stream(identity.scope(), identity.stream_id())
            .await
        {
            Ok(observed) if observed.stream_id != identity.stream_id() => {
                Err(Error::remote_failure(
                    "get_stream",
                    format!(
                        "remote returned stream {} for identity {identity}",
                        observed.stream_id
                    ),
                ))
            }
            Ok(observed) => Ok(ReadOutcome::Present(ReconciledState::reconcile(
                identity.clone(),
                observed,
                CarriedFields::new(carried),
            ))),
            Err(e) if e.is_not_found() => {
                warn!(
                    identity = %identity,
                    "Audit log stream no longer exists remotely, forgetting it"
                );
                Ok(ReadOutcome::Absent)
            }
            Err(e) => Err(e),
        }
    }

    /// Read a stream given its composed identity string.
    ///
    /// # Errors
    ///
    /// [`Error::MalformedIdentity`] for a corrupt identity, otherwise as
    /// [`StreamController::read`].
    pub async fn read_id(&self, id: &str, carried: Option<VendorConfig>) -> Result<ReadOutcome> {
        let identity = StreamIdentity::decompose(id)?;
        self.read(&identity, carried).await
    }

    /// Replace the whole config of a stream, then read it back.
    ///
    /// The returned state carries the config that was just written.
    ///
    /// # Errors
    ///
    /// As [`StreamController::write`], then remote errors from the follow-up
    /// read. A stream that disappears between the two calls is reported as
    /// [`Error::RemoteNotFound`].
    pub async fn update(
        &self,
        identity: &StreamIdentity,
        declaration: &StreamDeclaration,
    ) -> Result<ReconciledState> {
        let written = self.write(identity, declaration).await?;
        self.read_back(identity, written.vendor).await
    }

    /// Replace the whole config of a stream without reading it back.
    ///
    /// Returns the config the remote accepted, so a caller can keep it even
    /// if a later read fails.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidConfiguration`] without any remote call when the
    /// declaration has no vendor config or names a different scope than
    /// `identity`; the remote error when the update call fails.
    pub async fn write(
        &self,
        identity: &StreamIdentity,
        declaration: &StreamDeclaration,
    ) -> Result<StreamConfig> {
        let config = write_config(declaration)?;
        if declaration.scope != identity.scope() {
            return Err(Error::invalid_configuration(format!(
                "scope cannot change in place ({} -> {}); replace the stream instead",
                identity.scope(),
                declaration.scope
            )));
        }

        info!(
            identity = %identity,
            enabled = config.enabled,
            vendor = %config.vendor.summary(),
            "Updating audit log stream"
        );

        self.api
            .update_stream(identity.scope(), identity.stream_id(), &config)
            .await
            .tap_err(|e| warn!(identity = %identity, error = %e, "Stream update failed"))?;

        Ok(config)
    }

    /// Read a stream that was just written, carrying `written`.
    ///
    /// # Errors
    ///
    /// [`Error::RemoteNotFound`] if the stream is gone; other remote errors
    /// unchanged.
    pub async fn read_back(
        &self,
        identity: &StreamIdentity,
        written: VendorConfig,
    ) -> Result<ReconciledState> {
        match self.read(identity, Some(written)).await? {
            ReadOutcome::Present(state) => Ok(state),
            ReadOutcome::Absent => Err(Error::remote_not_found(
                "get_stream",
                identity.compose(),
            )),
        }
    }

    /// Delete a stream. Whatever the remote reports is surfaced as-is.
    ///
    /// # Errors
    ///
    /// Any remote error, including not-found.
    pub async fn delete(&self, identity: &StreamIdentity) -> Result<()> {
        info!(identity = %identity, "Deleting audit log stream");
        self.api
            .delete_stream(identity.scope(), identity.stream_id())
            .await
    }

    /// Look up the public key used to encrypt vendor secrets.
    ///
    /// Always fetched; nothing is cached or reconciled.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidConfiguration`] for an empty scope; remote errors.
    pub async fn signing_key(&self, scope: &str) -> Result<SigningKey> {
        validate_scope(scope)
            .map_err(|reason| Error::invalid_configuration(format!("scope: {reason}")))?;
        debug!(scope, "Fetching stream signing key");
        self.api.get_signing_key(scope).await
    }
}

/// Validate a declaration and build its write payload, defaulting `enabled`.
fn write_config(declaration: &StreamDeclaration) -> Result<StreamConfig> {
    declaration.validate()?;
    vendor::build(declaration, declaration.effective_enabled())
        .ok_or_else(|| Error::invalid_configuration("at least one vendor config required"))
}
