use anyhow::{Context, Result};
use std::path::Path;

use crate::api::ApiClient;
use crate::deploy::{DeployOptions, Deployer};
use crate::history::FileHistoryStore;
use crate::output::{format_bytes, gray, warning};
use crate::project::FileLinkStore;
use crate::resolver::Resolution;

pub async fn run(api: &ApiClient, folder: &Path, options: DeployOptions) -> Result<()> {
    let dir = std::path::absolute(folder)
        .with_context(|| format!("Invalid folder: {}", folder.display()))?;

    match &options.project {
        Some(name) => println!("\x1b[34mDeploying {} to {}...\x1b[0m", dir.display(), name),
        None => {
            gray("No project name provided, server will generate one automatically");
            println!("\x1b[34mDeploying {}...\x1b[0m", dir.display());
        }
    }

    let deployer = Deployer::new(api, &FileLinkStore, &FileHistoryStore)
        .with_session_file(api.session_store().path());
    let outcome = deployer
        .deploy(&dir, &options)
        .await
        .context("Deployment failed")?;

    match outcome.resolution {
        Resolution::Linked => gray(&format!("Using existing project: {}", outcome.project.name)),
        Resolution::FoundByName => gray(&format!("Using project: {}", outcome.project.name)),
        Resolution::Created => println!("\x1b[32m✓ Project created: {}\x1b[0m", outcome.project.name),
    }
    println!(
        "\x1b[32m✓ Uploaded {} files ({})\x1b[0m",
        outcome.record.file_count,
        format_bytes(outcome.record.total_size_bytes)
    );

    for e in &outcome.warnings {
        warning(&format!("Could not save local tracking information ({})", e));
    }

    println!();
    println!("\x1b[1;32m✓ Deployment completed successfully!\x1b[0m");
    gray(&format!("Project URL: {}", outcome.project_url));
    if let Some(url) = &outcome.deployment_url {
        gray(&format!("Deployment URL: {}", url));
    }

    match (options.domain, outcome.domain) {
        (Some(domain), Some(Ok(added))) => {
            println!("\x1b[32m✓ Domain added: {}\x1b[0m", domain);
            if let Some(token) = &added.verification_token {
                super::domain::print_verification(token);
            }
            Ok(())
        }
        // The site is live; only the domain step failed
        (Some(domain), Some(Err(e))) => {
            Err(anyhow::Error::new(e).context(format!("Failed to add domain {}", domain)))
        }
        _ => Ok(()),
    }
}
