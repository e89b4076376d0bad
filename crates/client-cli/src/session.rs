//! The global login session.
//!
//! One token per user account, kept in `~/.rollout/config.json`. A missing,
//! unreadable or malformed document, or an empty token, all mean "logged out".

use directories::BaseDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{LocalStateError, Result, RolloutError};
use crate::state_file;

const SESSION_DIR: &str = ".rollout";
const SESSION_FILE: &str = "config.json";

/// Credential carried by the API client
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    token: Option<String>,
}

impl Session {
    pub fn new(token: impl Into<String>) -> Self {
        let token = token.into();
        Self {
            token: (!token.trim().is_empty()).then_some(token),
        }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct SessionFile {
    token: String,
}

#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `~/.rollout/config.json`
    pub fn default_location() -> Result<Self> {
        let dirs = BaseDirs::new()
            .ok_or_else(|| RolloutError::precondition("Could not determine home directory"))?;
        Ok(Self::new(
            dirs.home_dir().join(SESSION_DIR).join(SESSION_FILE),
        ))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Session {
        match state_file::read_json::<SessionFile>(&self.path) {
            Ok(Some(file)) => Session::new(file.token),
            Ok(None) => Session::anonymous(),
            Err(e) => {
                tracing::debug!("Ignoring unreadable session: {}", e);
                Session::anonymous()
            }
        }
    }

    pub fn save(&self, token: &str) -> std::result::Result<(), LocalStateError> {
        state_file::write_json_atomic(
            &self.path,
            &SessionFile {
                token: token.to_string(),
            },
        )
    }

    pub fn clear(&self) -> std::result::Result<(), LocalStateError> {
        state_file::remove(&self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_is_anonymous() {
        let dir = tempdir().unwrap();
        let store = SessionStore::new(dir.path().join(".rollout/config.json"));
        assert!(!store.load().is_authenticated());
    }

    #[test]
    fn test_save_load_clear() {
        let dir = tempdir().unwrap();
        let store = SessionStore::new(dir.path().join(".rollout/config.json"));

        store.save("secret-token").unwrap();
        assert_eq!(store.load().token(), Some("secret-token"));

        store.clear().unwrap();
        assert_eq!(store.load(), Session::anonymous());
        // Clearing twice is fine
        store.clear().unwrap();
    }

    #[test]
    fn test_corrupt_or_partial_documents_are_anonymous() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let store = SessionStore::new(&path);

        for content in ["{\"tok", "{}", "{\"token\": 17}", "{\"token\": \"  \"}", "[]"] {
            std::fs::write(&path, content).unwrap();
            assert!(!store.load().is_authenticated(), "content: {content}");
        }
    }

    #[test]
    fn test_blank_token_is_not_a_session() {
        assert!(!Session::new("").is_authenticated());
        assert!(Session::new("abc").is_authenticated());
    }
}
