//! Bounded per-directory deployment log, newest entry first.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::scalar_text;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::LocalStateError;
use crate::project::rollout_dir;
use crate::state_file;

/// Entries kept per directory
pub const MAX_HISTORY: usize = 50;
const HISTORY_FILE: &str = "deployments.json";

pub const STATUS_SUCCESS: &str = "success";

/// One log entry. Older logs stored `files` and a formatted `size` string,
/// and numeric ids; those still load, with the byte total left at zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentRecord {
    #[serde(deserialize_with = "scalar_text")]
    pub id: String,
    #[serde(deserialize_with = "scalar_text")]
    pub version: String,
    pub status: String,
    pub url: String,
    pub deployed_at: DateTime<Utc>,
    #[serde(alias = "files")]
    pub file_count: usize,
    #[serde(default)]
    pub total_size_bytes: u64,
}

impl DeploymentRecord {
    pub fn is_success(&self) -> bool {
        self.status == STATUS_SUCCESS
    }
}

/// Insert `record` at the head and drop whatever falls past `MAX_HISTORY`.
pub fn push_newest(records: &mut Vec<DeploymentRecord>, record: DeploymentRecord) {
    records.insert(0, record);
    records.truncate(MAX_HISTORY);
}

/// `directory -> [DeploymentRecord]`, newest first.
///
/// Implementors provide whole-log reads and writes; `append` and `read` are
/// defined on top of them.
pub trait HistoryStore {
    fn load(&self, dir: &Path) -> Result<Vec<DeploymentRecord>, LocalStateError>;

    fn store(&self, dir: &Path, records: &[DeploymentRecord]) -> Result<(), LocalStateError>;

    /// Push `record` onto the log. A log that no longer parses is replaced by
    /// a fresh one and its parse error is handed back for reporting.
    fn append(
        &self,
        dir: &Path,
        record: DeploymentRecord,
    ) -> Result<Option<LocalStateError>, LocalStateError> {
        let (mut records, discarded) = match self.load(dir) {
            Ok(records) => (records, None),
            Err(e @ LocalStateError::Json { .. }) => {
                tracing::warn!("Starting a new deployment log: {}", e);
                (Vec::new(), Some(e))
            }
            Err(e) => return Err(e),
        };
        push_newest(&mut records, record);
        self.store(dir, &records)?;
        Ok(discarded)
    }

    /// Number of recorded deployments
    fn total(&self, dir: &Path) -> Result<usize, LocalStateError> {
        Ok(self.load(dir)?.len())
    }

    /// At most `limit` records, newest first. A directory without a log has none.
    fn read(&self, dir: &Path, limit: usize) -> Result<Vec<DeploymentRecord>, LocalStateError> {
        let mut records = self.load(dir)?;
        records.truncate(limit);
        Ok(records)
    }
}

pub fn history_path(dir: &Path) -> PathBuf {
    rollout_dir(dir).join(HISTORY_FILE)
}

/// Keeps the log in `<dir>/.rollout/deployments.json`
#[derive(Debug, Clone, Copy, Default)]
pub struct FileHistoryStore;

impl HistoryStore for FileHistoryStore {
    fn load(&self, dir: &Path) -> Result<Vec<DeploymentRecord>, LocalStateError> {
        Ok(state_file::read_json(&history_path(dir))?.unwrap_or_default())
    }

    fn store(&self, dir: &Path, records: &[DeploymentRecord]) -> Result<(), LocalStateError> {
        state_file::write_json_atomic(&history_path(dir), records)
    }
}

#[derive(Debug, Default)]
pub struct MemoryHistoryStore {
    logs: Mutex<HashMap<PathBuf, Vec<DeploymentRecord>>>,
}

impl MemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<PathBuf, Vec<DeploymentRecord>>> {
        self.logs.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl HistoryStore for MemoryHistoryStore {
    fn load(&self, dir: &Path) -> Result<Vec<DeploymentRecord>, LocalStateError> {
        Ok(self.lock().get(dir).cloned().unwrap_or_default())
    }

    fn store(&self, dir: &Path, records: &[DeploymentRecord]) -> Result<(), LocalStateError> {
        self.lock().insert(dir.to_path_buf(), records.to_vec());
        Ok(())
    }
}
