//! CLI command definitions using clap.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Default location of the stream state file.
pub const DEFAULT_STATE_FILE: &str = "audit-stream.state.json";

/// Default location of the stream declaration.
pub const DEFAULT_CONFIG_FILE: &str = "audit-stream.toml";

/// audit-stream - keep an audit log export stream in sync with its declaration
#[derive(Parser, Debug)]
#[command(name = "audit-stream")]
#[command(version)]
#[command(about = "Reconcile a declared audit log export stream against the remote service")]
#[command(
    long_about = "audit-stream creates, updates and deletes an audit log export stream so that it matches a TOML or JSON declaration. The vendor secret is never readable remotely, so the last written value is kept in a local state file."
)]
pub struct Cli {
    #[command(flatten)]
    pub files: FileArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// File locations shared by every command.
#[derive(Args, Debug, Clone)]
pub struct FileArgs {
    /// Stream declaration (TOML or JSON)
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// State file holding the last reconciled stream
    #[arg(short, long, global = true, default_value = DEFAULT_STATE_FILE)]
    pub state: PathBuf,

    /// Client configuration file; environment variables are used when absent
    #[arg(long, global = true)]
    pub client_config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show what apply would do
    Plan,

    /// Create, update or replace the stream to match the declaration
    Apply,

    /// Re-read the stream and forget it if it was deleted remotely
    Refresh,

    /// Delete the stream
    Destroy,

    /// Adopt an existing stream by its `<scope>:<stream_id>` identity
    Import {
        /// Stream identity, e.g. `acme:42`
        id: String,
    },

    /// Print the public key used to encrypt vendor secrets
    SigningKey {
        /// Enterprise scope
        scope: String,
    },
}
