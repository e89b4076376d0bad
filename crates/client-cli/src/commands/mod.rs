//! Terminal front-ends for the non-auth subcommands.

pub mod deploy;
pub mod domain;
pub mod history;
pub mod list;
pub mod status;

use anyhow::Result;
use shared::Project;

use crate::api::{ApiClient, Remote, NOT_LOGGED_IN};

pub(crate) fn require_login(api: &ApiClient) -> Result<()> {
    if !api.is_authenticated() {
        anyhow::bail!(NOT_LOGGED_IN);
    }
    Ok(())
}

/// Look a project up by slug; missing projects are an error
pub(crate) async fn project_by_slug(api: &ApiClient, slug: &str) -> Result<Project> {
    api.find_project(slug)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Project not found: {}", slug))
}
