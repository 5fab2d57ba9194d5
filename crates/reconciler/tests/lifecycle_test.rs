//! End-to-end lifecycle tests for audit log stream reconciliation.
//!
//! These tests drive the controller and the managed resource against the
//! in-memory stream service, which, like the real one, never returns vendor
//! config on read.

#![forbid(clippy::unwrap_used)]
#![forbid(clippy::expect_used)]
#![forbid(clippy::panic)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use audit_stream_reconciler::{
    BlobDestination, Error, InMemoryStreamApi, ObservedStreamState, ReadOutcome, ReconciledState,
    SigningKey, StreamApi, StreamConfig, StreamController, StreamDeclaration, StreamResource,
    VendorConfig,
};

fn blob(container: &str, key_id: &str, url: &str) -> BlobDestination {
    BlobDestination::new(container, key_id, url)
}

/// Test that vendor config written on create survives a read.
///
/// # GIVEN
/// A stream created with `{c1, k1, s1}`
///
/// # WHEN
/// It is read back; the remote response has no vendor fields
///
/// # THEN
/// The reconciled state still holds `{c1, k1, s1}`
#[tokio::test]
async fn test_vendor_config_persists_across_read() -> Result<(), Box<dyn std::error::Error>> {
    // GIVEN
    let api = InMemoryStreamApi::new_arc();
    let controller = StreamController::new(api.clone());
    let declaration = StreamDeclaration::new("acme").with_blob_destination(blob("c1", "k1", "s1"));
    let identity = controller.create(&declaration).await?;
    let written = VendorConfig::BlobDestination(blob("c1", "k1", "s1"));

    // WHEN
    let outcome = controller.read(&identity, Some(written.clone())).await?;

    // THEN
    let state = outcome.into_state().ok_or("stream should be present")?;
    assert_eq!(state.vendor_config(), Some(&written));
    assert_eq!(state.scope(), "acme");
    assert_eq!(state.stream_id(), identity.stream_id());
    Ok(())
}

/// Test that omitting `enabled` reconciles the same as `enabled = true`.
///
/// # GIVEN
/// Two declarations differing only in whether `enabled = true` is spelled out
///
/// # WHEN
/// Each is applied to its own resource
///
/// # THEN
/// Both reconciled states report enabled with the same carried config
#[tokio::test]
async fn test_default_enabled_matches_explicit_true() -> Result<(), Box<dyn std::error::Error>> {
    // GIVEN
    let implicit = StreamDeclaration::new("acme").with_blob_destination(blob("c1", "k1", "s1"));
    let explicit = implicit.clone().with_enabled(true);

    // WHEN
    let mut first = StreamResource::new(StreamController::new(InMemoryStreamApi::new_arc()), None);
    let mut second = StreamResource::new(StreamController::new(InMemoryStreamApi::new_arc()), None);
    first.apply(&implicit).await?;
    second.apply(&explicit).await?;

    // THEN
    let a = first.state().ok_or("first missing")?;
    let b = second.state().ok_or("second missing")?;
    assert!(a.enabled());
    assert_eq!(a.enabled(), b.enabled());
    assert_eq!(a.carried, b.carried);
    assert!(!first.plan(&explicit)?.is_change());
    assert!(!second.plan(&implicit)?.is_change());
    Ok(())
}

/// Test that disabling a stream changes only `enabled`.
///
/// # GIVEN
/// An enabled stream
///
/// # WHEN
/// It is updated with `enabled = false` and the same destination
///
/// # THEN
/// Scope, stream id, and carried config are unchanged; enabled is false
#[tokio::test]
async fn test_update_flips_only_enabled() -> Result<(), Box<dyn std::error::Error>> {
    // GIVEN
    let api = InMemoryStreamApi::new_arc();
    let controller = StreamController::new(api.clone());
    let declaration = StreamDeclaration::new("acme")
        .with_enabled(true)
        .with_blob_destination(blob("c1", "k1", "s1"));
    let identity = controller.create(&declaration).await?;
    let before = controller
        .read(
            &identity,
            Some(VendorConfig::BlobDestination(blob("c1", "k1", "s1"))),
        )
        .await?
        .into_state()
        .ok_or("stream should be present")?;

    // WHEN
    let after = controller
        .update(&identity, &declaration.clone().with_enabled(false))
        .await?;

    // THEN
    assert!(before.enabled());
    assert!(!after.enabled());
    assert_eq!(after.identity, before.identity);
    assert_eq!(after.carried, before.carried);
    assert_eq!(
        api.stored_config("acme", identity.stream_id())
            .await
            .map(|c| c.enabled),
        Some(false)
    );
    Ok(())
}

/// Test that a stream deleted out-of-band reads as absent.
///
/// # GIVEN
/// A created stream that is then removed directly on the remote
///
/// # WHEN
/// The controller reads it
///
/// # THEN
/// The outcome is `Absent`, not an error
#[tokio::test]
async fn test_not_found_read_yields_absence() -> Result<(), Box<dyn std::error::Error>> {
    // GIVEN
    let api = InMemoryStreamApi::new_arc();
    let controller = StreamController::new(api.clone());
    let identity = controller
        .create(&StreamDeclaration::new("acme").with_blob_destination(blob("c1", "k1", "s1")))
        .await?;
    api.remove_out_of_band("acme", identity.stream_id()).await;

    // WHEN
    let outcome = controller.read(&identity, None).await;

    // THEN
    assert!(matches!(outcome, Ok(ReadOutcome::Absent)));
    Ok(())
}

/// Test that a declaration without a vendor block never reaches the remote.
///
/// # GIVEN
/// An existing stream and a declaration with no vendor block
///
/// # WHEN
/// Create and update are attempted with that declaration
///
/// # THEN
/// Both fail with `InvalidConfiguration` and no remote call is made
#[tokio::test]
async fn test_missing_variant_rejected() -> Result<(), Box<dyn std::error::Error>> {
    // GIVEN
    let api = InMemoryStreamApi::new_arc();
    let controller = StreamController::new(api.clone());
    let identity = controller
        .create(&StreamDeclaration::new("acme").with_blob_destination(blob("c1", "k1", "s1")))
        .await?;
    let calls = api.call_count();
    let bare = StreamDeclaration::new("acme");

    // WHEN
    let created = controller.create(&bare).await;
    let updated = controller.update(&identity, &bare).await;

    // THEN
    assert!(matches!(created, Err(Error::InvalidConfiguration { .. })));
    assert!(matches!(updated, Err(Error::InvalidConfiguration { .. })));
    assert_eq!(api.call_count(), calls);
    Ok(())
}

/// Test the full managed lifecycle with drift in the middle.
///
/// # GIVEN
/// A managed stream
///
/// # WHEN
/// It is deleted out-of-band, refreshed, and applied again
///
/// # THEN
/// It is forgotten on refresh and recreated with a new id on apply
#[tokio::test]
async fn test_drift_forget_and_recreate() -> Result<(), Box<dyn std::error::Error>> {
    // GIVEN
    let api = InMemoryStreamApi::new_arc();
    let mut resource = StreamResource::new(StreamController::new(api.clone()), None);
    let declaration = StreamDeclaration::new("acme").with_blob_destination(blob("c1", "k1", "s1"));
    resource.apply(&declaration).await?;
    let first_id = resource
        .state()
        .map(ReconciledState::stream_id)
        .ok_or("no state after apply")?;

    // WHEN
    api.remove_out_of_band("acme", first_id).await;
    let still_there = resource.refresh().await?;
    resource.apply(&declaration).await?;

    // THEN
    assert!(!still_there);
    let second_id = resource
        .state()
        .map(ReconciledState::stream_id)
        .ok_or("no state after recreate")?;
    assert_ne!(first_id, second_id);
    assert_eq!(api.len().await, 1);
    Ok(())
}

/// Test that distinct streams can be reconciled concurrently.
///
/// # GIVEN
/// One controller shared by several tasks
///
/// # WHEN
/// Each task creates and reads its own stream
///
/// # THEN
/// Every task gets a distinct identity and its own carried config back
#[tokio::test]
async fn test_concurrent_instances_share_nothing() -> Result<(), Box<dyn std::error::Error>> {
    let api = InMemoryStreamApi::new_arc();
    let controller = StreamController::new(api.clone());

    let handles: Vec<_> = ["a", "b", "c", "d"]
        .into_iter()
        .map(|container| {
            let controller = controller.clone();
            tokio::spawn(async move {
                let destination = blob(container, "k1", "s1");
                let declaration =
                    StreamDeclaration::new("acme").with_blob_destination(destination.clone());
                let identity = controller.create(&declaration).await?;
                let state = controller
                    .read(&identity, Some(VendorConfig::BlobDestination(destination)))
                    .await?
                    .into_state();
                Ok::<_, Error>((identity, state))
            })
        })
        .collect();

    let mut ids = Vec::new();
    for handle in handles {
        let (identity, state) = handle.await??;
        let state = state.ok_or("stream should be present")?;
        assert_eq!(state.identity, identity);
        ids.push(identity.stream_id());
    }

    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 4);
    assert_eq!(api.len().await, 4);
    Ok(())
}

/// Test that the controller works over an explicit trait object.
#[tokio::test]
async fn test_controller_accepts_trait_object() -> Result<(), Box<dyn std::error::Error>> {
    let api: Arc<dyn audit_stream_reconciler::StreamApi> = Arc::new(InMemoryStreamApi::new());
    let controller = StreamController::new(api);
    let key = controller.signing_key("acme").await?;
    assert!(!key.key.is_empty());
    Ok(())
}

/// Stream service whose reads start failing once any update has landed.
struct ReadsFailAfterUpdate {
    inner: InMemoryStreamApi,
    updated: AtomicBool,
}

#[async_trait]
impl StreamApi for ReadsFailAfterUpdate {
    async fn create_stream(
        &self,
        scope: &str,
        config: &StreamConfig,
    ) -> audit_stream_reconciler::Result<i64> {
        self.inner.create_stream(scope, config).await
    }

    async fn get_stream(
        &self,
        scope: &str,
        stream_id: i64,
    ) -> audit_stream_reconciler::Result<ObservedStreamState> {
        if self.updated.load(Ordering::SeqCst) {
            return Err(Error::remote_status("get_stream", 503, "service unavailable"));
        }
        self.inner.get_stream(scope, stream_id).await
    }

    async fn update_stream(
        &self,
        scope: &str,
        stream_id: i64,
        config: &StreamConfig,
    ) -> audit_stream_reconciler::Result<()> {
        self.inner.update_stream(scope, stream_id, config).await?;
        self.updated.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn delete_stream(
        &self,
        scope: &str,
        stream_id: i64,
    ) -> audit_stream_reconciler::Result<()> {
        self.inner.delete_stream(scope, stream_id).await
    }

    async fn get_signing_key(&self, scope: &str) -> audit_stream_reconciler::Result<SigningKey> {
        self.inner.get_signing_key(scope).await
    }
}

/// Test that a rotated secret is kept when the read after the update fails.
///
/// # GIVEN
/// A stream applied with `{c1, k1, s1}` on a service whose reads fail once
/// an update has been accepted
///
/// # WHEN
/// `{c1, k1, s2}` is applied
///
/// # THEN
/// Apply reports the read failure, the remote holds `s2`, and the stored
/// state carries `s2` as well
#[tokio::test]
async fn test_rotated_secret_survives_failed_read_back() -> Result<(), Box<dyn std::error::Error>> {
    // GIVEN
    let api = Arc::new(ReadsFailAfterUpdate {
        inner: InMemoryStreamApi::new(),
        updated: AtomicBool::new(false),
    });
    let mut resource = StreamResource::new(StreamController::new(api.clone()), None);
    resource
        .apply(&StreamDeclaration::new("acme").with_blob_destination(blob("c1", "k1", "s1")))
        .await?;
    let stream_id = resource.state().map_or(0, ReconciledState::stream_id);

    // WHEN
    let rotated = StreamDeclaration::new("acme").with_blob_destination(blob("c1", "k1", "s2"));
    let result = resource.apply(&rotated).await;

    // THEN
    assert!(result.is_err());
    let written = VendorConfig::BlobDestination(blob("c1", "k1", "s2"));
    let remote = api.inner.stored_config("acme", stream_id).await;
    assert_eq!(remote.map(|config| config.vendor), Some(written.clone()));
    assert_eq!(
        resource.state().and_then(ReconciledState::vendor_config),
        Some(&written)
    );
    Ok(())
}
