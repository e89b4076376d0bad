use anyhow::Result;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_API_URL: &str = "https://app.rollout.sh/api";
pub const DEFAULT_DOMAIN: &str = "rollout.sh";

pub const API_URL_ENV: &str = "ROLLOUT_API_URL";
pub const DOMAIN_ENV: &str = "ROLLOUT_DOMAIN";

/// Optional `settings.toml` in the platform config directory
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    pub url: Option<String>,
    pub domain: Option<String>,
}

impl Config {
    pub fn config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("sh", "rollout", "rollout")
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

        Ok(proj_dirs.config_dir().join("settings.toml"))
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

/// Where the API lives and which domain projects are served under.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub api_url: String,
    pub domain: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            domain: DEFAULT_DOMAIN.to_string(),
        }
    }
}

impl Settings {
    /// Resolve settings: flags, then environment, then config file, then defaults.
    pub fn resolve(config: &Config, api_url: Option<String>, domain: Option<String>) -> Self {
        Self::resolve_with(config, api_url, domain, |key| std::env::var(key).ok())
    }

    pub fn resolve_with(
        config: &Config,
        api_url: Option<String>,
        domain: Option<String>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Self {
        let non_empty = |v: Option<String>| v.filter(|s| !s.trim().is_empty());

        let api_url = non_empty(api_url)
            .or_else(|| non_empty(env(API_URL_ENV)))
            .or_else(|| non_empty(config.api.url.clone()))
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let domain = non_empty(domain)
            .or_else(|| non_empty(env(DOMAIN_ENV)))
            .or_else(|| non_empty(config.api.domain.clone()))
            .unwrap_or_else(|| DEFAULT_DOMAIN.to_string());

        Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            domain,
        }
    }

    /// Public URL a project is served at
    pub fn project_url(&self, slug: &str) -> String {
        // Local development domains have no certificates
        let scheme = if self.domain.contains("local.") || self.domain.contains(".test") {
            "http"
        } else {
            "https"
        };
        format!("{}://{}.{}", scheme, slug, self.domain)
    }
}
