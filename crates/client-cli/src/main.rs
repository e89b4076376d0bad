use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rollout::api::ApiClient;
use rollout::commands;
use rollout::config::{Config, Settings};
use rollout::deploy::DeployOptions;
use rollout::session::SessionStore;

const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (", env!("ROLLOUT_BUILD"), ")");

#[derive(Parser)]
#[command(name = "rollout")]
#[command(about = "A CLI for deploying static sites to rollout.sh")]
#[command(version = VERSION)]
struct Cli {
    /// API base URL (overrides ROLLOUT_API_URL and settings.toml)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Platform domain projects are served under (overrides ROLLOUT_DOMAIN)
    #[arg(long, global = true)]
    platform_domain: Option<String>,

    /// Debug logging on stderr
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Login to your Rollout account
    Login {
        /// Email address
        #[arg(short, long)]
        email: Option<String>,
        /// Password
        #[arg(short, long)]
        password: Option<String>,
    },
    /// Register a new Rollout account
    Register {
        /// Full name
        #[arg(short, long)]
        name: Option<String>,
        /// Email address
        #[arg(short, long)]
        email: Option<String>,
        /// Password
        #[arg(short, long)]
        password: Option<String>,
    },
    /// Logout from your Rollout account
    Logout,
    /// Show current login status
    Whoami,
    /// Deploy a static site to Rollout
    Deploy {
        /// Folder to deploy
        #[arg(default_value = ".")]
        folder: PathBuf,
        /// Project name (optional, generated by the server when omitted)
        #[arg(short, long)]
        project: Option<String>,
        /// Custom domain to attach after deploying
        #[arg(short, long)]
        domain: Option<String>,
        /// Git commit hash
        #[arg(long)]
        commit: Option<String>,
        /// Git branch name
        #[arg(long)]
        branch: Option<String>,
    },
    /// List your projects
    List {
        /// Show detailed information
        #[arg(short, long)]
        verbose: bool,
    },
    /// Manage custom domains for your projects
    Domain {
        #[command(subcommand)]
        action: DomainAction,
    },
    /// Check deployment status
    Status {
        /// Project name
        project: String,
        /// Specific deployment ID
        #[arg(short, long)]
        deployment: Option<String>,
    },
    /// Show deployment history for the current folder
    History {
        /// Limit number of deployments to show
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
        /// Ask the server instead of the local log
        #[arg(long)]
        remote: bool,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum DomainAction {
    /// Add a custom domain to a project
    Add { project: String, domain: String },
    /// Remove a custom domain from a project
    Remove { project: String, domain: String },
    /// List domains for a project
    List { project: String },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Set a configuration value
    Set {
        /// Configuration key (api_url, domain)
        key: String,
        /// Configuration value
        value: String,
    },
    /// Get a configuration value
    Get {
        /// Configuration key
        key: String,
    },
    /// Show all configuration
    Show,
    /// Get the config file path
    Path,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Initialize tracing
    let default_filter = if cli.debug { "rollout=debug" } else { "rollout=warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = run(cli).await {
        eprintln!("\x1b[31m✗ {:#}\x1b[0m", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let (api_url, platform_domain) = (cli.api_url, cli.platform_domain);
    let connect = move || -> Result<(ApiClient, SessionStore)> {
        let config = Config::load().unwrap_or_else(|e| {
            tracing::warn!("Ignoring unreadable settings file: {}", e);
            Config::default()
        });
        let settings = Settings::resolve(&config, api_url, platform_domain);
        let store = SessionStore::default_location()?;
        let api = ApiClient::new(settings, store.clone())?;
        tracing::debug!("Using API at {}", api.settings().api_url);
        Ok((api, store))
    };

    match cli.command {
        Commands::Config { action } => handle_config_command(action),
        Commands::Login { email, password } => {
            let (mut api, _) = connect()?;
            rollout::auth::login(&mut api, email, password).await
        }
        Commands::Register {
            name,
            email,
            password,
        } => {
            let (mut api, _) = connect()?;
            rollout::auth::register(&mut api, name, email, password).await
        }
        Commands::Logout => {
            let (mut api, _) = connect()?;
            rollout::auth::logout(&mut api).await
        }
        Commands::Whoami => {
            let (api, store) = connect()?;
            rollout::auth::whoami(&api, &store);
            Ok(())
        }
        Commands::Deploy {
            folder,
            project,
            domain,
            commit,
            branch,
        } => {
            let (api, _) = connect()?;
            let options = DeployOptions {
                project,
                commit,
                branch,
                domain,
            };
            commands::deploy::run(&api, &folder, options).await
        }
        Commands::List { verbose } => {
            let (api, _) = connect()?;
            commands::list::run(&api, verbose).await
        }
        Commands::Domain { action } => {
            let (api, _) = connect()?;
            match action {
                DomainAction::Add { project, domain } => {
                    commands::domain::add(&api, &project, &domain).await
                }
                DomainAction::Remove { project, domain } => {
                    commands::domain::remove(&api, &project, &domain).await
                }
                DomainAction::List { project } => commands::domain::list(&api, &project).await,
            }
        }
        Commands::Status {
            project,
            deployment,
        } => {
            let (api, _) = connect()?;
            commands::status::run(&api, &project, deployment.as_deref()).await
        }
        Commands::History { limit, remote } => {
            let dir = std::env::current_dir()?;
            if remote {
                let (api, _) = connect()?;
                commands::history::remote(&api, &dir, limit).await
            } else {
                commands::history::local(&dir, limit)
            }
        }
    }
}

fn handle_config_command(action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Set { key, value } => {
            let mut config = Config::load().unwrap_or_default();
            match key.as_str() {
                "api_url" => config.api.url = Some(value),
                "domain" => config.api.domain = Some(value),
                _ => anyhow::bail!("Unknown config key: {}. Valid keys: api_url, domain", key),
            }
            config.save()?;
            println!("Configuration saved");
        }
        ConfigAction::Get { key } => {
            let config = Config::load()?;
            let value = match key.as_str() {
                "api_url" => config.api.url.unwrap_or_default(),
                "domain" => config.api.domain.unwrap_or_default(),
                _ => anyhow::bail!("Unknown config key: {}", key),
            };
            println!("{}", value);
        }
        ConfigAction::Show => {
            let config = Config::load()?;
            let effective = Settings::resolve(&config, None, None);
            println!("api_url: {}", effective.api_url);
            println!("domain: {}", effective.domain);
        }
        ConfigAction::Path => {
            let path = Config::config_path()?;
            println!("{}", path.display());
        }
    }
    Ok(())
}
