//! rollout: deploy static site folders to the rollout hosting platform.

pub mod api;
pub mod auth;
pub mod collect;
pub mod commands;
pub mod config;
pub mod deploy;
pub mod error;
pub mod history;
pub mod output;
pub mod project;
pub mod resolver;
pub mod session;
pub mod state_file;

#[cfg(test)]
mod testing;

pub use error::{LocalStateError, Result, RolloutError};
