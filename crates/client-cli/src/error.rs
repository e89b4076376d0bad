//! Error taxonomy for the rollout client.
//!
//! Fatal errors (`Precondition`, `Remote`, `Http`, `Io`) end the command with
//! exit status 1. `LocalStateError` is the non-fatal kind: after a successful
//! upload it is reported as a warning and never changes the outcome.

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, RolloutError>;

#[derive(Debug, Error)]
pub enum RolloutError {
    /// Not logged in, missing/empty folder, invalid project name
    #[error("{0}")]
    Precondition(String),

    /// Non-2xx response from the hosting service
    #[error("{message}")]
    Remote { status: Option<u16>, message: String },

    #[error("Network error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    LocalState(#[from] LocalStateError),
}

impl RolloutError {
    pub fn precondition(message: impl Into<String>) -> Self {
        Self::Precondition(message.into())
    }

    pub fn remote(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Remote {
            status,
            message: message.into(),
        }
    }

    pub fn is_precondition(&self) -> bool {
        matches!(self, Self::Precondition(_))
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Remote { status, .. } => *status,
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Failure reading or writing one of the JSON documents kept on disk.
#[derive(Debug, Error)]
pub enum LocalStateError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The link would land on the login session file (deploying `~`)
    #[error("{} holds the login session, project link not saved", path.display())]
    SessionFile { path: PathBuf },
}

impl LocalStateError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::Json {
            path: path.into(),
            source,
        }
    }

    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::Io { path, .. } | Self::Json { path, .. } | Self::SessionFile { path } => path,
        }
    }
}
