//! Remote stream service contract and in-process implementations.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::{Error, Result};
use crate::types::{ObservedStreamState, SigningKey};
use crate::vendor::StreamConfig;

/// Operations the remote audit log stream service exposes.
///
/// Implementations report a missing stream as [`Error::RemoteNotFound`] and
/// every other failure as [`Error::RemoteFailure`].
#[async_trait]
pub trait StreamApi: Send + Sync {
    /// Create a stream and return its assigned id.
    async fn create_stream(&self, scope: &str, config: &StreamConfig) -> Result<i64>;

    /// Fetch the observable state of a stream.
    async fn get_stream(&self, scope: &str, stream_id: i64) -> Result<ObservedStreamState>;

    /// Replace the whole config of a stream.
    async fn update_stream(&self, scope: &str, stream_id: i64, config: &StreamConfig)
    -> Result<()>;

    /// Delete a stream.
    async fn delete_stream(&self, scope: &str, stream_id: i64) -> Result<()>;

    /// Fetch the public key used to encrypt vendor secrets.
    async fn get_signing_key(&self, scope: &str) -> Result<SigningKey>;
}

#[derive(Debug, Clone)]
struct StoredStream {
    config: StreamConfig,
}

/// In-memory stream service for testing.
///
/// Behaves like the real remote: it keeps the full config it was given but
/// only reports observable fields on read.
#[derive(Default)]
pub struct InMemoryStreamApi {
    streams: RwLock<HashMap<(String, i64), StoredStream>>,
    next_id: AtomicI64,
    calls: AtomicUsize,
    failure: RwLock<Option<String>>,
    read_failure: RwLock<Option<String>>,
}

impl InMemoryStreamApi {
    /// Create a new empty service.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new empty service wrapped in an Arc.
    pub fn new_arc() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Number of remote calls made so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Make every subsequent call fail with the given reason.
    pub async fn fail_with(&self, reason: impl Into<String>) {
        *self.failure.write().await = Some(reason.into());
    }

    /// Make every subsequent `get_stream` fail; writes still succeed.
    pub async fn fail_reads_with(&self, reason: impl Into<String>) {
        *self.read_failure.write().await = Some(reason.into());
    }

    /// Stop injecting failures.
    pub async fn clear_failure(&self) {
        *self.failure.write().await = None;
        *self.read_failure.write().await = None;
    }

    /// Delete a stream behind the controller's back.
    pub async fn remove_out_of_band(&self, scope: &str, stream_id: i64) -> bool {
        self.streams
            .write()
            .await
            .remove(&(scope.to_string(), stream_id))
            .is_some()
    }

    /// The config the service holds for a stream, as the remote would see it.
    pub async fn stored_config(&self, scope: &str, stream_id: i64) -> Option<StreamConfig> {
        self.streams
            .read()
            .await
            .get(&(scope.to_string(), stream_id))
            .map(|s| s.config.clone())
    }

    /// Number of streams held.
    pub async fn len(&self) -> usize {
        self.streams.read().await.len()
    }

    /// Whether no streams are held.
    pub async fn is_empty(&self) -> bool {
        self.streams.read().await.is_empty()
    }

    async fn begin(&self, operation: &str) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.failure.read().await.as_ref() {
            Some(reason) => Err(Error::remote_status(operation, 500, reason.clone())),
            None => Ok(()),
        }
    }
}

fn key(scope: &str, stream_id: i64) -> (String, i64) {
    (scope.to_string(), stream_id)
}

#[async_trait]
impl StreamApi for InMemoryStreamApi {
    async fn create_stream(&self, scope: &str, config: &StreamConfig) -> Result<i64> {
        self.begin("create_stream").await?;
        let stream_id = self.next_id.fetch_add(1, Ordering::SeqCst).saturating_add(1);
        self.streams.write().await.insert(
            key(scope, stream_id),
            StoredStream {
                config: config.clone(),
            },
        );
        Ok(stream_id)
    }

    async fn get_stream(&self, scope: &str, stream_id: i64) -> Result<ObservedStreamState> {
        self.begin("get_stream").await?;
        if let Some(reason) = self.read_failure.read().await.as_ref() {
            return Err(Error::remote_status("get_stream", 503, reason.clone()));
        }
        let streams = self.streams.read().await;
        let stored = streams.get(&key(scope, stream_id)).ok_or_else(|| {
            Error::remote_not_found("get_stream", format!("{scope}:{stream_id}"))
        })?;

        let mut observed = ObservedStreamState::new(
            stream_id,
            stored.config.enabled,
            stored.config.vendor.summary(),
        );
        observed.stream_type = Some(stored.config.vendor.stream_type().to_string());
        Ok(observed)
    }

    async fn update_stream(
        &self,
        scope: &str,
        stream_id: i64,
        config: &StreamConfig,
    ) -> Result<()> {
        self.begin("update_stream").await?;
        let mut streams = self.streams.write().await;
        let stored = streams.get_mut(&key(scope, stream_id)).ok_or_else(|| {
            Error::remote_not_found("update_stream", format!("{scope}:{stream_id}"))
        })?;
        stored.config = config.clone();
        Ok(())
    }

    async fn delete_stream(&self, scope: &str, stream_id: i64) -> Result<()> {
        self.begin("delete_stream").await?;
        self.streams
            .write()
            .await
            .remove(&key(scope, stream_id))
            .map(|_| ())
            .ok_or_else(|| Error::remote_not_found("delete_stream", format!("{scope}:{stream_id}")))
    }

    async fn get_signing_key(&self, scope: &str) -> Result<SigningKey> {
        self.begin("get_signing_key").await?;
        Ok(SigningKey {
            key_id: format!("{scope}-key-1"),
            key: format!("in-memory-public-key-for-{scope}"),
        })
    }
}

/// A wrapper that adds tracing to a stream service.
///
/// Logs only scope, stream id, and the vendor summary; never the secret.
pub struct TracingStreamApi<S: StreamApi> {
    inner: S,
}

impl<S: StreamApi> TracingStreamApi<S> {
    /// Create a new tracing stream service.
    pub const fn new(inner: S) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<S: StreamApi> StreamApi for TracingStreamApi<S> {
    async fn create_stream(&self, scope: &str, config: &StreamConfig) -> Result<i64> {
        tracing::debug!(
            scope,
            enabled = config.enabled,
            vendor = %config.vendor.summary(),
            "Creating stream"
        );
        let result = self.inner.create_stream(scope, config).await;
        if let Ok(stream_id) = result {
            tracing::trace!(scope, stream_id, "Stream created");
        }
        result
    }

    async fn get_stream(&self, scope: &str, stream_id: i64) -> Result<ObservedStreamState> {
        tracing::debug!(scope, stream_id, "Fetching stream");
        self.inner.get_stream(scope, stream_id).await
    }

    async fn update_stream(
        &self,
        scope: &str,
        stream_id: i64,
        config: &StreamConfig,
    ) -> Result<()> {
        tracing::debug!(
            scope,
            stream_id,
            enabled = config.enabled,
            vendor = %config.vendor.summary(),
            "Updating stream"
        );
        self.inner.update_stream(scope, stream_id, config).await
    }

    async fn delete_stream(&self, scope: &str, stream_id: i64) -> Result<()> {
        tracing::debug!(scope, stream_id, "Deleting stream");
        self.inner.delete_stream(scope, stream_id).await
    }

    async fn get_signing_key(&self, scope: &str) -> Result<SigningKey> {
        tracing::debug!(scope, "Fetching stream signing key");
        self.inner.get_signing_key(scope).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vendor::{BlobDestination, VendorConfig};

    fn config(enabled: bool) -> StreamConfig {
        StreamConfig {
            enabled,
            vendor: VendorConfig::BlobDestination(BlobDestination::new("c1", "k1", "s1")),
        }
    }

    #[tokio::test]
    async fn test_create_assigns_increasing_ids() -> Result<()> {
        let api = InMemoryStreamApi::new();
        let first = api.create_stream("acme", &config(true)).await?;
        let second = api.create_stream("acme", &config(true)).await?;
        assert_eq!(first, 1);
        assert_eq!(second, 2);
        assert_eq!(api.len().await, 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_get_reports_observable_fields_only() -> Result<()> {
        let api = InMemoryStreamApi::new();
        let id = api.create_stream("acme", &config(false)).await?;
        let observed = api.get_stream("acme", id).await?;
        assert_eq!(observed.stream_id, id);
        assert!(!observed.enabled);
        assert!(!observed.summary.contains("s1"));
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_stream_is_not_found() {
        let api = InMemoryStreamApi::new();
        let result = api.get_stream("acme", 99).await;
        assert!(result.is_err_and(|e| e.is_not_found()));
        let result = api.delete_stream("acme", 99).await;
        assert!(result.is_err_and(|e| e.is_not_found()));
    }

    #[tokio::test]
    async fn test_injected_failure_counts_call() {
        let api = InMemoryStreamApi::new();
        api.fail_with("upstream unavailable").await;
        let result = api.create_stream("acme", &config(true)).await;
        assert!(matches!(result, Err(Error::RemoteFailure { .. })));
        assert_eq!(api.call_count(), 1);
        assert!(api.is_empty().await);
    }

    #[tokio::test]
    async fn test_tracing_wrapper_delegates() -> Result<()> {
        let api = TracingStreamApi::new(InMemoryStreamApi::new());
        let id = api.create_stream("acme", &config(true)).await?;
        assert!(api.get_stream("acme", id).await?.enabled);
        api.delete_stream("acme", id).await?;
        assert!(api.get_stream("acme", id).await.is_err_and(|e| e.is_not_found()));
        Ok(())
    }
}
