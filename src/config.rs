//! Connection settings.
//!
//! Resolution order, later wins: `config.json` in the user's config
//! directory, the `AZURE_DEVOPS_ORG_URL` / `AZURE_DEVOPS_PAT` environment
//! variables, then command-line flags.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

const APP_NAME: &str = "backlog-import";
const CONFIG_FILE: &str = "config.json";

pub const URL_ENV: &str = "AZURE_DEVOPS_ORG_URL";
pub const TOKEN_ENV: &str = "AZURE_DEVOPS_PAT";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Organization URL, e.g. `https://dev.azure.com/acme`.
    #[serde(default)]
    pub organization_url: Option<String>,
    /// Personal access token with work item read/write scope.
    #[serde(default)]
    pub personal_access_token: Option<String>,
}

impl AppConfig {
    /// Load the config file (if any) and apply environment overrides.
    pub fn load() -> Result<Self> {
        let config = Self::load_from(&config_path()?)?;
        Ok(config.with_env(|name| std::env::var(name).ok()))
    }

    /// Read a config file. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let config = serde_json::from_str(&content).context("Failed to parse config file")?;

        Ok(config)
    }

    /// Override settings from environment variables found by `var`.
    pub fn with_env(self, var: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |name| var(name).filter(|v: &String| !v.trim().is_empty());
        Self {
            organization_url: non_empty(URL_ENV).or(self.organization_url),
            personal_access_token: non_empty(TOKEN_ENV).or(self.personal_access_token),
        }
    }

    /// Override settings given on the command line.
    pub fn with_overrides(self, url: Option<String>, token: Option<String>) -> Self {
        Self {
            organization_url: url.or(self.organization_url),
            personal_access_token: token.or(self.personal_access_token),
        }
    }

    /// Merge command-line values into the file at `path` and save it.
    ///
    /// Environment variables are never written to the file.
    pub fn update_file(path: &Path, url: Option<String>, token: Option<String>) -> Result<Self> {
        let config = Self::load_from(path)?.with_overrides(url, token);
        config.save_to(path)?;
        Ok(config)
    }

    pub fn organization_url(&self) -> Result<&str> {
        self.organization_url.as_deref().ok_or_else(|| {
            anyhow::anyhow!(
                "No organization URL configured. \
                 Set {} or run `backlog-import configure --url <URL>`",
                URL_ENV
            )
        })
    }

    /// Save the configuration to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let content = serde_json::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(path, content).context("Failed to write config file")?;

        Ok(())
    }
}

pub fn config_path() -> Result<PathBuf> {
    let dirs = directories::ProjectDirs::from("", "", APP_NAME)
        .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
    Ok(dirs.config_dir().join(CONFIG_FILE))
}
