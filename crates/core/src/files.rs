//! Loading declaration/config documents and persisting state files.

use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::error::Error;
use crate::result::Result;

/// Load a TOML or JSON document, picking the parser from the file extension.
///
/// # Errors
///
/// Returns an error if the file cannot be read, has an unknown extension,
/// or does not parse into `T`.
pub fn load_document<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    let content =
        fs::read_to_string(path).map_err(|e| Error::file_read_failed(path, e.to_string()))?;

    debug!(path = %path.display(), format = %extension, "Loading document");

    match extension.as_str() {
        "toml" => toml::from_str(&content).map_err(|e| Error::toml_parse_failed(e.to_string())),
        "json" => {
            serde_json::from_str(&content).map_err(|e| Error::json_parse_failed(e.to_string()))
        }
        _ => Err(Error::UnsupportedFormat { extension }),
    }
}

/// Read a JSON file, returning `None` when it does not exist.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn read_json_if_exists<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    match fs::read_to_string(path) {
        Ok(content) => serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| Error::json_parse_failed(format!("{}: {e}", path.display()))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(Error::file_read_failed(path, e.to_string())),
    }
}

/// Write `value` as pretty JSON via a sibling temp file and rename.
///
/// # Errors
///
/// Returns an error if serialization, the temp write, or the rename fails.
pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let body =
        serde_json::to_string_pretty(value).map_err(|e| Error::json_parse_failed(e.to_string()))?;

    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, body).map_err(|e| Error::file_write_failed(&tmp, e.to_string()))?;
    fs::rename(&tmp, path).map_err(|e| Error::file_write_failed(path, e.to_string()))?;

    debug!(path = %path.display(), "State written");
    Ok(())
}

/// Remove a file, treating an already-missing file as success.
///
/// # Errors
///
/// Returns an error for any removal failure other than not-found.
pub fn remove_if_exists(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(Error::file_remove_failed(path, e.to_string())),
    }
}
