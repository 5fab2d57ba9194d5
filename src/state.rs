//! Local persistence of the reconciled stream.
//!
//! The file is the trusted record of the vendor config, secret included,
//! since the remote never returns it.

use std::path::Path;

use anyhow::{Context, Result};
use audit_stream_core::files;
use audit_stream_reconciler::ReconciledState;
use tracing::debug;

/// Load the held stream, if any.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load(path: &Path) -> Result<Option<ReconciledState>> {
    files::read_json_if_exists(path)
        .with_context(|| format!("Failed to load state from {}", path.display()))
}

/// Persist the held stream, or remove the file when nothing is held.
///
/// # Errors
///
/// Returns an error if the file cannot be written or removed.
pub fn save(path: &Path, state: Option<&ReconciledState>) -> Result<()> {
    match state {
        Some(state) => {
            debug!(path = %path.display(), identity = %state.identity, "Writing state");
            files::write_json_atomic(path, state)
                .with_context(|| format!("Failed to write state to {}", path.display()))
        }
        None => {
            debug!(path = %path.display(), "Removing state");
            files::remove_if_exists(path)
                .with_context(|| format!("Failed to remove state at {}", path.display()))
        }
    }
}
