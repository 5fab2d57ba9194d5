#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

//! # audit-stream-client
//!
//! HTTP transport for the remote audit log stream service.
//!
//! [`StreamClient`] implements [`audit_stream_reconciler::StreamApi`], so it
//! plugs straight into a `StreamController`.
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use audit_stream_client::{ClientConfig, StreamClient};
//! use audit_stream_reconciler::{StreamController, TracingStreamApi};
//!
//! let client = StreamClient::with_config(ClientConfig::from_env()?)?;
//! let controller = StreamController::new(Arc::new(TracingStreamApi::new(client)));
//! let key = controller.signing_key("acme").await?;
//! println!("{}", key.key_id);
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod wire;

pub use client::StreamClient;
pub use config::ClientConfig;
pub use error::{Error, Result};
