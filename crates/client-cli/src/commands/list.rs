use anyhow::{Context, Result};

use crate::api::{ApiClient, Remote};
use crate::output::{format_timestamp, gray};

pub async fn run(api: &ApiClient, verbose: bool) -> Result<()> {
    super::require_login(api)?;

    println!("\x1b[34mFetching projects...\x1b[0m");
    let projects = api
        .list_projects()
        .await
        .context("Failed to fetch projects")?;

    if projects.is_empty() {
        println!("\x1b[33mNo projects found. Create one with: rollout deploy\x1b[0m");
        return Ok(());
    }

    println!("\x1b[32m\nFound {} project(s):\n\x1b[0m", projects.len());
    for (index, project) in projects.iter().enumerate() {
        println!("\x1b[1m{}. {}\x1b[0m", index + 1, project.name);
        gray(&format!("   URL: {}", api.project_url(&project.slug)));
        gray(&format!("   Status: {}", project.status));

        if verbose {
            if let Some(created) = &project.created_at {
                gray(&format!("   Created: {}", format_timestamp(created)));
            }
            if let Some(description) = project.description.as_deref().filter(|d| !d.is_empty()) {
                gray(&format!("   Description: {}", description));
            }
        }
        println!();
    }

    Ok(())
}
