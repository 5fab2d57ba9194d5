#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

//! # audit-stream
//!
//! Command-line front end that keeps one audit log export stream in sync
//! with a declaration file, recording the trusted vendor config in a local
//! state file.

pub mod cli;
pub mod commands;
pub mod state;

pub use audit_stream_client;
pub use audit_stream_reconciler;
