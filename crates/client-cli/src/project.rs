use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::{Project, RemoteId};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::LocalStateError;
use crate::state_file;

/// Hidden directory holding per-folder state
pub const ROLLOUT_DIR: &str = ".rollout";
const LINK_FILE: &str = "config.json";

/// Binds a working directory to the remote project it deploys to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectLink {
    /// Authoritative identity of the linked project
    pub project_id: RemoteId,
    pub project_slug: String,
    pub name: String,
    /// When this directory was last deployed successfully
    #[serde(rename = "lastDeployment")]
    pub last_deployment: DateTime<Utc>,
}

impl ProjectLink {
    pub fn from_project(project: &Project, deployed_at: DateTime<Utc>) -> Self {
        Self {
            project_id: project.id.clone(),
            project_slug: project.slug.clone(),
            name: project.name.clone(),
            last_deployment: deployed_at,
        }
    }
}

/// `directory -> ProjectLink`
pub trait LinkStore {
    fn read(&self, dir: &Path) -> Result<Option<ProjectLink>, LocalStateError>;

    /// Replace the whole record for `dir`
    fn write(&self, dir: &Path, link: &ProjectLink) -> Result<(), LocalStateError>;
}

/// Get the `.rollout` directory for a working directory
pub fn rollout_dir(dir: &Path) -> PathBuf {
    dir.join(ROLLOUT_DIR)
}

/// Get the link file path for a working directory
pub fn link_path(dir: &Path) -> PathBuf {
    rollout_dir(dir).join(LINK_FILE)
}

/// Keeps the link in `<dir>/.rollout/config.json`
#[derive(Debug, Clone, Copy, Default)]
pub struct FileLinkStore;

impl LinkStore for FileLinkStore {
    fn read(&self, dir: &Path) -> Result<Option<ProjectLink>, LocalStateError> {
        state_file::read_json(&link_path(dir))
    }

    fn write(&self, dir: &Path, link: &ProjectLink) -> Result<(), LocalStateError> {
        state_file::write_json_atomic(&link_path(dir), link)?;
        tracing::debug!("Linked {:?} to project {} ({})", dir, link.project_slug, link.project_id);
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryLinkStore {
    links: Mutex<HashMap<PathBuf, ProjectLink>>,
}

impl MemoryLinkStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_link(dir: impl Into<PathBuf>, link: ProjectLink) -> Self {
        let store = Self::default();
        store.lock().insert(dir.into(), link);
        store
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<PathBuf, ProjectLink>> {
        self.links.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl LinkStore for MemoryLinkStore {
    fn read(&self, dir: &Path) -> Result<Option<ProjectLink>, LocalStateError> {
        Ok(self.lock().get(dir).cloned())
    }

    fn write(&self, dir: &Path, link: &ProjectLink) -> Result<(), LocalStateError> {
        self.lock().insert(dir.to_path_buf(), link.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn link(id: &str, slug: &str) -> ProjectLink {
        ProjectLink {
            project_id: RemoteId::from(id),
            project_slug: slug.to_string(),
            name: slug.to_uppercase(),
            last_deployment: Utc::now(),
        }
    }

    #[test]
    fn test_file_store_round_trip() {
        let dir = tempdir().unwrap();
        let store = FileLinkStore;

        assert_eq!(store.read(dir.path()).unwrap(), None);

        let original = link("12", "demo");
        store.write(dir.path(), &original).unwrap();
        assert!(dir.path().join(".rollout").is_dir());
        assert_eq!(store.read(dir.path()).unwrap(), Some(original));
    }

    #[test]
    fn test_write_replaces_whole_record() {
        let dir = tempdir().unwrap();
        let store = FileLinkStore;

        store.write(dir.path(), &link("1", "first")).unwrap();
        let second = link("2", "second");
        store.write(dir.path(), &second).unwrap();

        assert_eq!(store.read(dir.path()).unwrap(), Some(second));
    }

    #[test]
    fn test_link_file_uses_camel_case_keys() {
        let dir = tempdir().unwrap();
        FileLinkStore.write(dir.path(), &link("7", "demo")).unwrap();

        let raw = std::fs::read_to_string(link_path(dir.path())).unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(json["projectId"], "7");
        assert_eq!(json["projectSlug"], "demo");
        assert!(json["lastDeployment"].is_string());
    }

    #[test]
    fn test_reads_numeric_project_ids() {
        let dir = tempdir().unwrap();
        std::fs::create_dir_all(rollout_dir(dir.path())).unwrap();
        std::fs::write(
            link_path(dir.path()),
            r#"{"projectId": 31, "projectSlug": "demo", "name": "demo", "lastDeployment": "2024-05-01T10:00:00.000Z"}"#,
        )
        .unwrap();

        let read = FileLinkStore.read(dir.path()).unwrap().unwrap();
        assert_eq!(read.project_id, RemoteId::from(31u64));
    }

    #[test]
    fn test_memory_store_is_keyed_by_directory() {
        let store = MemoryLinkStore::with_link("/tmp/a", link("1", "a"));
        assert!(store.read(Path::new("/tmp/a")).unwrap().is_some());
        assert!(store.read(Path::new("/tmp/b")).unwrap().is_none());
    }
}
