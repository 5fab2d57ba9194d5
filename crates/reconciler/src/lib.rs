//! Reconciliation controller for audit log export streams.
//!
//! The remote service accepts a superset of fields on write (including an
//! encrypted vendor secret) but only reports a subset back on read. This
//! crate keeps the two apart:
//!
//! - **Observed fields** ([`ObservedStreamState`]): refreshed on every read
//! - **Carried fields** ([`CarriedFields`]): the vendor config as last
//!   written, never refreshed from the remote
//!
//! # Components
//!
//! - [`identity`] - the `<scope>:<stream_id>` durable key
//! - [`vendor`] - the vendor config sum type and its builder
//! - [`StreamController`] - create/read/update/delete against a [`StreamApi`]
//! - [`StreamResource`] - plan/apply/refresh/destroy/import for one stream
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use audit_stream_reconciler::{
//!     BlobDestination, InMemoryStreamApi, StreamController, StreamDeclaration, StreamResource,
//! };
//!
//! #[tokio::main]
//! async fn main() -> audit_stream_reconciler::Result<()> {
//!     let controller = StreamController::new(Arc::new(InMemoryStreamApi::new()));
//!     let mut resource = StreamResource::new(controller, None);
//!
//!     let declaration = StreamDeclaration::new("acme")
//!         .with_blob_destination(BlobDestination::new("audit", "key-1", "ZW5jcnlwdGVk"));
//!
//!     resource.apply(&declaration).await?;
//!     resource.refresh().await?;
//!     Ok(())
//! }
//! ```

#![forbid(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![forbid(clippy::panic)]

pub mod api;
pub mod controller;
pub mod declaration;
pub mod error;
pub mod identity;
pub mod resource;
pub mod types;
pub mod vendor;

// Re-export main types
pub use api::{InMemoryStreamApi, StreamApi, TracingStreamApi};
pub use controller::StreamController;
pub use declaration::{StreamDeclaration, DEFAULT_ENABLED};
pub use error::{Error, Result};
pub use identity::{compose, decompose, StreamIdentity};
pub use resource::StreamResource;
pub use types::{
    CarriedFields, ObservedStreamState, ReadOutcome, ReconciledState, SigningKey, StreamAction,
    StreamPhase,
};
pub use vendor::{BlobDestination, StreamConfig, VendorConfig};
