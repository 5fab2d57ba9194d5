//! HTTP client for the audit log stream service.
//!
//! Implements [`StreamApi`] so it can be injected into a
//! `StreamController`. Reads are retried with backoff; writes are sent once.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use audit_stream_reconciler::{
    ObservedStreamState, Result as RemoteResult, SigningKey, StreamApi, StreamConfig,
};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, info};
use url::Url;

use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::wire::{KeyResponse, StreamRequest, StreamResponse};

const ACCEPT: &str = "application/vnd.github+json";
const API_VERSION_HEADER: &str = "X-GitHub-Api-Version";
const API_VERSION: &str = "2022-11-28";

/// Client for the remote stream service.
#[derive(Debug, Clone)]
pub struct StreamClient {
    /// Configuration for the client.
    config: Arc<ClientConfig>,
    /// Resolved API base URL.
    base_url: Url,
    /// HTTP client.
    http_client: reqwest::Client,
}

impl StreamClient {
    /// Create a new StreamClient with default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new() -> Result<Self> {
        Self::with_config(ClientConfig::default())
    }

    /// Create a new StreamClient with custom configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is unusable or the HTTP client
    /// cannot be built.
    pub fn with_config(config: ClientConfig) -> Result<Self> {
        let base_url = config.resolved_base_url()?;
        if base_url.cannot_be_a_base() {
            return Err(Error::config_error(format!(
                "base URL {base_url} cannot carry a path"
            )));
        }

        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| Error::config_error(e.to_string()))?;

        Ok(Self {
            config: Arc::new(config),
            base_url,
            http_client,
        })
    }

    /// Create a new StreamClient for a base URL.
    ///
    /// # Errors
    ///
    /// As [`StreamClient::with_config`].
    pub fn with_url(base_url: Url) -> Result<Self> {
        Self::with_config(ClientConfig::with_base_url(base_url))
    }

    /// Create a stream and return the id the service assigned.
    ///
    /// # Errors
    ///
    /// Returns an error on any transport failure or non-success status.
    pub async fn create(&self, scope: &str, config: &StreamConfig) -> Result<i64> {
        let url = self.streams_url(scope)?;
        let response = self
            .send(
                self.request(Method::POST, url).json(&StreamRequest::from(config)),
                scope,
            )
            .await?;
        let created: StreamResponse = decode(response).await?;
        Ok(created.id)
    }

    /// Fetch a stream.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] on 404; other errors after the retry budget.
    pub async fn get(&self, scope: &str, stream_id: i64) -> Result<ObservedStreamState> {
        let url = self.stream_url(scope, stream_id)?;
        let resource = format!("{scope}:{stream_id}");
        let response: StreamResponse = self.get_with_retry(url, &resource).await?;
        Ok(response.into())
    }

    /// Replace a stream's config.
    ///
    /// # Errors
    ///
    /// Returns an error on any transport failure or non-success status.
    pub async fn update(&self, scope: &str, stream_id: i64, config: &StreamConfig) -> Result<()> {
        let url = self.stream_url(scope, stream_id)?;
        let resource = format!("{scope}:{stream_id}");
        self.send(
            self.request(Method::PUT, url).json(&StreamRequest::from(config)),
            &resource,
        )
        .await?;
        Ok(())
    }

    /// Delete a stream.
    ///
    /// # Errors
    ///
    /// Returns an error on any transport failure or non-success status.
    pub async fn delete(&self, scope: &str, stream_id: i64) -> Result<()> {
        let url = self.stream_url(scope, stream_id)?;
        let resource = format!("{scope}:{stream_id}");
        self.send(self.request(Method::DELETE, url), &resource)
            .await?;
        Ok(())
    }

    /// Fetch the public key for encrypting vendor secrets.
    ///
    /// # Errors
    ///
    /// Returns an error after the retry budget is spent.
    pub async fn signing_key(&self, scope: &str) -> Result<SigningKey> {
        let url = self.scope_url(scope, &["audit-log", "stream-key"])?;
        let response: KeyResponse = self.get_with_retry(url, scope).await?;
        Ok(response.into())
    }

    /// Build `<base>/enterprises/<scope>/<tail...>` with each segment encoded.
    fn scope_url(&self, scope: &str, tail: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| Error::config_error("base URL cannot carry a path"))?
            .pop_if_empty()
            .push("enterprises")
            .push(scope)
            .extend(tail);
        Ok(url)
    }

    fn streams_url(&self, scope: &str) -> Result<Url> {
        self.scope_url(scope, &["audit-log", "streams"])
    }

    fn stream_url(&self, scope: &str, stream_id: i64) -> Result<Url> {
        let id = stream_id.to_string();
        self.scope_url(scope, &["audit-log", "streams", id.as_str()])
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self
            .http_client
            .request(method, url)
            .header(reqwest::header::ACCEPT, ACCEPT)
            .header(API_VERSION_HEADER, API_VERSION);

        match self.config.token {
            Some(ref token) => builder.bearer_auth(token.expose()),
            None => builder,
        }
    }

    /// Send once and map the status.
    async fn send(&self, builder: RequestBuilder, resource: &str) -> Result<Response> {
        let start = Instant::now();
        let response = builder.send().await?;
        let status = response.status();

        debug!(
            status = status.as_u16(),
            duration_ms = start.elapsed().as_millis(),
            "Stream API response"
        );

        if status.is_success() {
            return Ok(response);
        }

        if status == StatusCode::NOT_FOUND {
            return Err(Error::not_found(resource));
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|e| format!("<unreadable body: {e}>"));
        Err(Error::status(status.as_u16(), body))
    }

    /// GET with exponential backoff on retryable errors.
    ///
    /// - Retry 1: wait `retry_base_delay`
    /// - Retry 2: wait 2x
    /// - Retry n: wait 2^(n-1)x
    async fn get_with_retry<T: DeserializeOwned>(&self, url: Url, resource: &str) -> Result<T> {
        let max_retries = self.config.max_retries;
        let mut attempt = 0u32;

        loop {
            let result = match self.send(self.request(Method::GET, url.clone()), resource).await {
                Ok(response) => decode(response).await,
                Err(e) => Err(e),
            };

            match result {
                Ok(value) => return Ok(value),
                Err(e) if attempt < max_retries && e.is_retryable() => {
                    let delay = backoff(self.config.retry_base_delay, attempt);
                    attempt = attempt.saturating_add(1);
                    info!(
                        attempt,
                        max_retries,
                        delay_ms = delay.as_millis(),
                        error = %e,
                        "Retrying stream API read"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Read a response body and parse it as JSON.
async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    let body = response.bytes().await?;
    Ok(serde_json::from_slice(&body)?)
}

fn backoff(base: Duration, attempt: u32) -> Duration {
    let factor = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
    base.saturating_mul(factor)
}

#[async_trait]
impl StreamApi for StreamClient {
    async fn create_stream(&self, scope: &str, config: &StreamConfig) -> RemoteResult<i64> {
        self.create(scope, config)
            .await
            .map_err(|e| e.into_remote("create_stream"))
    }

    async fn get_stream(&self, scope: &str, stream_id: i64) -> RemoteResult<ObservedStreamState> {
        self.get(scope, stream_id)
            .await
            .map_err(|e| e.into_remote("get_stream"))
    }

    async fn update_stream(
        &self,
        scope: &str,
        stream_id: i64,
        config: &StreamConfig,
    ) -> RemoteResult<()> {
        self.update(scope, stream_id, config)
            .await
            .map_err(|e| e.into_remote("update_stream"))
    }

    async fn delete_stream(&self, scope: &str, stream_id: i64) -> RemoteResult<()> {
        self.delete(scope, stream_id)
            .await
            .map_err(|e| e.into_remote("delete_stream"))
    }

    async fn get_signing_key(&self, scope: &str) -> RemoteResult<SigningKey> {
        self.signing_key(scope)
            .await
            .map_err(|e| e.into_remote("get_signing_key"))
    }
}
