//! JSON documents on disk: tolerant reads and atomic whole-file writes.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

use crate::error::LocalStateError;

/// Read a JSON document. A missing file is `Ok(None)`.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, LocalStateError> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(LocalStateError::io(path, e)),
    };

    serde_json::from_str(&content)
        .map(Some)
        .map_err(|e| LocalStateError::json(path, e))
}

/// Replace the document at `path`, creating its parent directory if needed.
///
/// The new content goes to a temp file in the same directory which is then
/// renamed over the target, so readers see either the old or the new record.
pub fn write_json_atomic<T: Serialize + ?Sized>(
    path: &Path,
    value: &T,
) -> Result<(), LocalStateError> {
    let dir = path
        .parent()
        .ok_or_else(|| LocalStateError::io(path, std::io::ErrorKind::InvalidInput.into()))?;
    std::fs::create_dir_all(dir).map_err(|e| LocalStateError::io(dir, e))?;

    let mut content = serde_json::to_vec_pretty(value).map_err(|e| LocalStateError::json(path, e))?;
    content.push(b'\n');

    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| LocalStateError::io(dir, e))?;
    tmp.write_all(&content)
        .and_then(|_| tmp.as_file().sync_all())
        .map_err(|e| LocalStateError::io(tmp.path(), e))?;
    tmp.persist(path)
        .map_err(|e| LocalStateError::io(path, e.error))?;

    tracing::debug!("Wrote {:?}", path);
    Ok(())
}

/// Delete the document; deleting a missing file is not an error.
pub fn remove(path: &Path) -> Result<(), LocalStateError> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(LocalStateError::io(path, e)),
    }
}
