use anyhow::{Context, Result};
use std::path::Path;

use crate::api::ApiClient;
use crate::history::{FileHistoryStore, HistoryStore};
use crate::output::{format_bytes, format_local, format_timestamp, gray};
use crate::project::{rollout_dir, FileLinkStore, LinkStore};

/// Deployments recorded locally for `dir`
pub fn local(dir: &Path, limit: usize) -> Result<()> {
    if !rollout_dir(dir).is_dir() {
        println!("\x1b[33mNo .rollout directory found.\x1b[0m");
        gray("Deploy a project first to create local tracking.");
        return Ok(());
    }

    let total = FileHistoryStore
        .total(dir)
        .context("Failed to get deployment history")?;
    if total == 0 {
        println!("\x1b[33mNo deployment history found.\x1b[0m");
        gray("Deploy a project first to create local tracking.");
        return Ok(());
    }

    println!(
        "\x1b[34m📜 Deployment History ({} total)\n\x1b[0m",
        total
    );
    let records = FileHistoryStore
        .read(dir, limit)
        .context("Failed to get deployment history")?;
    for (index, record) in records.iter().enumerate() {
        let mark = if record.is_success() {
            "\x1b[32m✓\x1b[90m"
        } else {
            "\x1b[31m✗\x1b[90m"
        };
        println!("\x1b[1m{}. {}\x1b[0m", index + 1, record.version);
        gray(&format!("   Status: {} {}", mark, record.status));
        gray(&format!(
            "   Date: {}",
            format_local(record.deployed_at.with_timezone(&chrono::Local))
        ));
        gray(&format!("   Files: {}", record.file_count));
        gray(&format!("   Size: {}", format_bytes(record.total_size_bytes)));
        gray(&format!("   URL: {}", record.url));
        println!();
    }

    if total > limit {
        gray(&format!("... and {} more deployments", total - limit));
        gray(&format!("Use --limit {} to see all deployments", total));
    }
    Ok(())
}

/// Deployments the service knows about for the project `dir` is linked to
pub async fn remote(api: &ApiClient, dir: &Path, limit: usize) -> Result<()> {
    super::require_login(api)?;

    let link = FileLinkStore
        .read(dir)
        .context("Failed to read project link")?
        .ok_or_else(|| {
            anyhow::anyhow!("This folder is not linked to a project. Deploy it first: rollout deploy")
        })?;

    println!(
        "\x1b[34mFetching deployments for {}...\x1b[0m",
        link.project_slug
    );
    let deployments = api
        .list_deployments(&link.project_id, limit)
        .await
        .context("Failed to get deployment history")?;

    if deployments.is_empty() {
        println!("\x1b[33mNo deployments found.\x1b[0m");
        return Ok(());
    }

    println!();
    for (index, deployment) in deployments.iter().enumerate() {
        println!("\x1b[1m{}. {}\x1b[0m", index + 1, deployment.version);
        gray(&format!("   Status: {}", deployment.status));
        if let Some(at) = &deployment.deployed_at {
            gray(&format!("   Date: {}", format_timestamp(at)));
        }
        gray(&format!("   Files: {}", deployment.file_count));
        gray(&format!("   Size: {}", format_bytes(deployment.total_size)));
        println!();
    }
    Ok(())
}
