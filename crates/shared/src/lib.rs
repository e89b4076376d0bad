//! Types shared between the rollout CLI and anything speaking the hosting API.

pub mod messages;

pub use messages::*;
