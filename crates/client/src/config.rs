//! Configuration for the stream client.

use std::path::Path;
use std::time::Duration;

use audit_stream_core::Sensitive;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Error, Result};

/// API base URL used when none is configured.
pub const DEFAULT_BASE_URL: &str = "https://api.github.com/";

/// Environment variable holding the API base URL.
pub const ENV_API_URL: &str = "AUDIT_STREAM_API_URL";
/// Environment variable holding the bearer token.
pub const ENV_TOKEN: &str = "AUDIT_STREAM_TOKEN";
/// Environment variable holding the request timeout in seconds.
pub const ENV_TIMEOUT_SECS: &str = "AUDIT_STREAM_TIMEOUT_SECS";
/// Environment variable holding the read retry budget.
pub const ENV_MAX_RETRIES: &str = "AUDIT_STREAM_MAX_RETRIES";

/// Configuration for the `StreamClient`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// API base URL; [`DEFAULT_BASE_URL`] when unset.
    #[serde(default)]
    pub base_url: Option<Url>,

    /// Bearer token.
    #[serde(default)]
    pub token: Option<Sensitive>,

    /// Timeout for requests.
    #[serde(with = "duration_secs", default = "default_timeout")]
    pub timeout: Duration,

    /// Maximum retries for idempotent reads. Writes are never retried.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Delay before the first read retry; doubles each attempt.
    #[serde(with = "duration_millis", default = "default_retry_base_delay")]
    pub retry_base_delay: Duration,

    /// User-Agent header value.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            token: None,
            timeout: default_timeout(),
            max_retries: default_max_retries(),
            retry_base_delay: default_retry_base_delay(),
            user_agent: default_user_agent(),
        }
    }
}

impl ClientConfig {
    /// Create a config pointing at the given base URL.
    pub fn with_base_url(base_url: Url) -> Self {
        Self {
            base_url: Some(base_url),
            ..Default::default()
        }
    }

    /// Set the bearer token.
    #[must_use]
    pub fn token(mut self, token: impl Into<Sensitive>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Set the timeout.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the read retry budget.
    #[must_use]
    pub const fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the base retry delay.
    #[must_use]
    pub const fn retry_base_delay(mut self, delay: Duration) -> Self {
        self.retry_base_delay = delay;
        self
    }

    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set but cannot be parsed.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup(ENV_API_URL) {
            config.base_url = Some(
                url.parse()
                    .map_err(|e| Error::config_error(format!("{ENV_API_URL}: {e}")))?,
            );
        }

        if let Some(token) = lookup(ENV_TOKEN).filter(|t| !t.is_empty()) {
            config.token = Some(Sensitive::new(token));
        }

        if let Some(secs) = lookup(ENV_TIMEOUT_SECS) {
            let secs = secs
                .parse::<u64>()
                .map_err(|e| Error::config_error(format!("{ENV_TIMEOUT_SECS}: {e}")))?;
            config.timeout = Duration::from_secs(secs);
        }

        if let Some(retries) = lookup(ENV_MAX_RETRIES) {
            config.max_retries = retries
                .parse()
                .map_err(|e| Error::config_error(format!("{ENV_MAX_RETRIES}: {e}")))?;
        }

        Ok(config)
    }

    /// The base URL to use, falling back to [`DEFAULT_BASE_URL`].
    ///
    /// # Errors
    ///
    /// Returns an error only if the built-in default fails to parse.
    pub fn resolved_base_url(&self) -> Result<Url> {
        match self.base_url {
            Some(ref url) => Ok(url.clone()),
            None => Ok(Url::parse(DEFAULT_BASE_URL)?),
        }
    }

    /// Load configuration from a TOML or JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        Ok(audit_stream_core::files::load_document(path)?)
    }
}

const fn default_timeout() -> Duration {
    Duration::from_secs(30)
}

const fn default_max_retries() -> u32 {
    2
}

const fn default_retry_base_delay() -> Duration {
    Duration::from_millis(500)
}

fn default_user_agent() -> String {
    format!("audit-stream/{}", env!("CARGO_PKG_VERSION"))
}

/// Serialization helper for Duration as seconds.
mod duration_secs {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

/// Serialization helper for Duration as milliseconds.
mod duration_millis {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        u64::try_from(duration.as_millis())
            .unwrap_or(u64::MAX)
            .serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
