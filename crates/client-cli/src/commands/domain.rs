use anyhow::{Context, Result};

use crate::api::{ApiClient, Remote};
use crate::output::gray;

/// DNS record the service checks before serving a custom domain
pub(crate) fn print_verification(token: &str) {
    println!("\x1b[33m\n⚠️  Domain verification required:\x1b[0m");
    gray("Add this TXT record to your domain DNS:");
    println!("\x1b[1mName: _rollout-verification\x1b[0m");
    println!("\x1b[1mValue: {}\x1b[0m", token);
}

pub async fn add(api: &ApiClient, project_slug: &str, domain: &str) -> Result<()> {
    super::require_login(api)?;
    println!("\x1b[34mAdding domain {} to project {}...\x1b[0m", domain, project_slug);
    add_to_project(api, project_slug, domain)
        .await
        .context("Failed to add domain")
}

async fn add_to_project(api: &ApiClient, project_slug: &str, domain: &str) -> Result<()> {
    let project = super::project_by_slug(api, project_slug).await?;
    let added = api.add_domain(&project.id, domain).await?;

    println!("\x1b[32m✓ Domain added successfully!\x1b[0m");
    gray(&format!("Domain: {}", domain));
    gray(&format!("Project: {}", project.name));
    if let Some(token) = &added.verification_token {
        print_verification(token);
    }
    Ok(())
}

pub async fn remove(api: &ApiClient, project_slug: &str, domain: &str) -> Result<()> {
    super::require_login(api)?;
    println!(
        "\x1b[34mRemoving domain {} from project {}...\x1b[0m",
        domain, project_slug
    );
    remove_from_project(api, project_slug, domain)
        .await
        .context("Failed to remove domain")
}

async fn remove_from_project(api: &ApiClient, project_slug: &str, domain: &str) -> Result<()> {
    let project = super::project_by_slug(api, project_slug).await?;
    let domains = api.list_domains(&project.id).await?;
    let target = domains
        .iter()
        .find(|d| d.domain == domain)
        .ok_or_else(|| anyhow::anyhow!("Domain not found: {}", domain))?;

    api.remove_domain(&project.id, &target.id).await?;
    println!("\x1b[32m✓ Domain removed successfully!\x1b[0m");
    Ok(())
}

pub async fn list(api: &ApiClient, project_slug: &str) -> Result<()> {
    super::require_login(api)?;
    println!("\x1b[34mFetching domains for project {}...\x1b[0m", project_slug);

    let project = super::project_by_slug(api, project_slug)
        .await
        .context("Failed to fetch domains")?;
    let domains = api
        .list_domains(&project.id)
        .await
        .context("Failed to fetch domains")?;

    println!("\x1b[32m\nDomains for {}:\n\x1b[0m", project.name);
    if domains.is_empty() {
        println!("\x1b[33mNo custom domains configured.\x1b[0m");
        gray(&format!("Default domain: {}", api.project_url(&project.slug)));
        return Ok(());
    }

    for (index, domain) in domains.iter().enumerate() {
        println!("\x1b[1m{}. {}\x1b[0m", index + 1, domain.domain);
        let verified = if domain.is_verified() {
            "Verified"
        } else {
            "Pending verification"
        };
        gray(&format!("   Status: {}", verified));
        gray(&format!(
            "   SSL: {}",
            if domain.ssl_enabled { "Enabled" } else { "Disabled" }
        ));
        println!();
    }
    Ok(())
}
