use anyhow::{Context, Result};
use shared::Deployment;

use crate::api::{ApiClient, Remote};
use crate::output::{format_bytes, format_timestamp, gray};

fn print_deployment(deployment: &Deployment) {
    gray(&format!("Status: {}", deployment.status));
    gray(&format!("Files: {}", deployment.file_count));
    gray(&format!("Size: {}", format_bytes(deployment.total_size)));
    if let Some(at) = &deployment.deployed_at {
        gray(&format!("Deployed: {}", format_timestamp(at)));
    }
    if let Some(hash) = &deployment.commit_hash {
        gray(&format!("Commit: {}", hash));
    }
    if let Some(branch) = &deployment.branch {
        gray(&format!("Branch: {}", branch));
    }
}

pub async fn run(api: &ApiClient, project_slug: &str, deployment_id: Option<&str>) -> Result<()> {
    super::require_login(api)?;
    println!("\x1b[34mChecking status for project {}...\x1b[0m", project_slug);

    let project = super::project_by_slug(api, project_slug)
        .await
        .context("Failed to check status")?;

    println!("\x1b[32m\nProject: {}\x1b[0m", project.name);
    gray(&format!("URL: {}", api.project_url(&project.slug)));
    gray(&format!("Status: {}", project.status));

    match deployment_id {
        Some(id) => {
            let deployment = api
                .get_deployment_status(&project.id, id)
                .await
                .context("Failed to check status")?;
            println!("\x1b[32m\nDeployment {}:\x1b[0m", deployment.version);
            print_deployment(&deployment);
        }
        None => match project.latest_deployment.first() {
            Some(deployment) => {
                println!("\x1b[32m\nLatest Deployment:\x1b[0m");
                gray(&format!("Version: {}", deployment.version));
                print_deployment(deployment);
            }
            None => {
                println!("\x1b[33m\nNo deployments found.\x1b[0m");
                gray("Deploy your first site with: rollout deploy");
            }
        },
    }

    Ok(())
}
