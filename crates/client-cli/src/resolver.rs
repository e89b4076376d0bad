//! Picks the remote project a directory deploys to.
//!
//! Precedence: the directory's link, then a project whose slug matches the
//! requested name, then a newly created project. A link whose project no
//! longer exists remotely falls through to the name lookup.

use shared::Project;
use std::path::Path;

use crate::api::Remote;
use crate::error::{Result, RolloutError};
use crate::project::ProjectLink;

pub const INVALID_NAME: &str =
    "Project name can only contain lowercase letters, numbers, and hyphens";

/// How the project was found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Linked,
    FoundByName,
    Created,
}

#[derive(Debug, Clone)]
pub struct ResolvedProject {
    pub project: Project,
    pub resolution: Resolution,
}

/// `^[a-z0-9-]+$`
pub fn validate_project_name(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-');
    if valid {
        Ok(())
    } else {
        Err(RolloutError::precondition(INVALID_NAME))
    }
}

/// Resolve the project for `dir`. Writes no local state.
pub async fn resolve_project<R: Remote + ?Sized>(
    remote: &R,
    dir: &Path,
    link: Option<&ProjectLink>,
    name: Option<&str>,
) -> Result<ResolvedProject> {
    if let Some(name) = name {
        validate_project_name(name)?;
    }

    // Fetched at most once and shared by both lookups
    let mut listed: Option<Vec<Project>> = None;

    if let Some(link) = link {
        let mut projects = remote.list_projects().await?;
        if let Some(idx) = projects.iter().position(|p| p.id == link.project_id) {
            let project = projects.swap_remove(idx);
            tracing::info!("Using existing linked project: {}", project.name);
            return Ok(ResolvedProject {
                project,
                resolution: Resolution::Linked,
            });
        }
        tracing::warn!(
            "Linked project {} ({}) no longer exists",
            link.project_slug,
            link.project_id
        );
        listed = Some(projects);
    }

    if let Some(name) = name {
        let projects = match listed {
            Some(projects) => projects,
            None => remote.list_projects().await?,
        };
        if let Some(project) = projects.into_iter().find(|p| p.slug == name) {
            tracing::info!("Using existing project with slug {}", name);
            return Ok(ResolvedProject {
                project,
                resolution: Resolution::FoundByName,
            });
        }
    }

    let description = format!("Deployed from {}", dir.display());
    let project = remote.create_project(name, &description).await?;
    tracing::info!("Created project {} ({})", project.name, project.id);
    Ok(ResolvedProject {
        project,
        resolution: Resolution::Created,
    })
}
