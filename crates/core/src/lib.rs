#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

//! # audit-stream-core
//!
//! Shared building blocks for the audit-stream workspace:
//!
//! - [`Error`] / [`Result`] for file and parse failures
//! - [`Sensitive`] for values that must never reach logs or plans
//! - [`files`] helpers for loading TOML/JSON documents and writing state atomically

pub mod error;
pub mod files;
pub mod result;
pub mod sensitive;

pub use error::Error;
pub use result::{GenericResultExt, Result};
pub use sensitive::Sensitive;
