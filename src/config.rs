//! Updater configuration.
//!
//! A small TOML file carries everything the orchestrator needs to know
//! about its host: which repositories to resolve releases from, where the
//! panel lives, where to keep staged state, and which systemd unit to
//! bounce after an apply. A missing file is not an error; every field has
//! a platform default, so a stock install runs with no config at all.
//!
//! The GitHub token is never required in the file; `GITHUB_TOKEN` in the
//! environment wins over the file either way, so operators can keep the
//! secret out of on-disk config.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::utils::platform::{default_app_dir, default_state_dir, user_config_dir};

/// Environment variable overriding the config file location.
pub const CONFIG_PATH_ENV: &str = "CLAWDECK_UPDATE_CONFIG";

/// Configuration for the update orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdaterConfig {
    /// Repository the bot's releases are published under.
    pub bot_release_repo: String,
    /// Repository the panel's releases are published under.
    pub panel_release_repo: String,
    /// GitHub token for the release API; `GITHUB_TOKEN` takes precedence.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub github_token: Option<String>,
    /// The panel's live installation directory.
    pub app_dir: PathBuf,
    /// Directory for staged tarballs, markers, locks and apply logs.
    pub state_dir: PathBuf,
    /// Systemd unit restarted by the apply procedure.
    pub service_name: String,
}

impl Default for UpdaterConfig {
    fn default() -> Self {
        Self {
            bot_release_repo: "openclaw/openclaw".to_string(),
            panel_release_repo: "clawdeck/clawdeck".to_string(),
            github_token: None,
            app_dir: default_app_dir(),
            state_dir: default_state_dir(),
            service_name: "clawdeck.service".to_string(),
        }
    }
}

impl UpdaterConfig {
    /// Default config file location.
    ///
    /// `CLAWDECK_UPDATE_CONFIG` wins; otherwise `update.toml` inside the
    /// state dir, falling back to the per-user config dir when the system
    /// file does not exist.
    #[must_use]
    pub fn default_path() -> PathBuf {
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            return PathBuf::from(path);
        }
        let system = default_state_dir().join("update.toml");
        if system.exists() {
            return system;
        }
        let user = user_config_dir().join("update.toml");
        if user.exists() { user } else { system }
    }

    /// Load from the default location, falling back to defaults when the
    /// file does not exist.
    pub async fn load() -> Result<Self> {
        Self::load_with_optional(None).await
    }

    /// Load from `path` when given, else from the default location.
    pub async fn load_with_optional(path: Option<PathBuf>) -> Result<Self> {
        let path = path.unwrap_or_else(Self::default_path);
        if path.exists() {
            Self::load_from(&path).await
        } else {
            Ok(Self::default())
        }
    }

    /// Load and parse a specific config file.
    pub async fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read updater config from {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse updater config from {}", path.display()))
    }

    /// The release API token to use, environment winning over the file.
    #[must_use]
    pub fn resolve_token(&self) -> Option<String> {
        std::env::var("GITHUB_TOKEN")
            .ok()
            .filter(|t| !t.is_empty())
            .or_else(|| self.github_token.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_cover_every_field() {
        let config = UpdaterConfig::default();
        assert_eq!(config.bot_release_repo, "openclaw/openclaw");
        assert_eq!(config.panel_release_repo, "clawdeck/clawdeck");
        assert_eq!(config.service_name, "clawdeck.service");
        assert!(config.github_token.is_none());
    }

    #[tokio::test]
    async fn partial_files_inherit_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("update.toml");
        tokio::fs::write(
            &path,
            "panel_release_repo = \"example/panel\"\nservice_name = \"panel.service\"\n",
        )
        .await
        .unwrap();

        let config = UpdaterConfig::load_from(&path).await.unwrap();
        assert_eq!(config.panel_release_repo, "example/panel");
        assert_eq!(config.service_name, "panel.service");
        // Unspecified fields keep their defaults.
        assert_eq!(config.bot_release_repo, "openclaw/openclaw");
    }

    #[tokio::test]
    async fn missing_file_loads_defaults() {
        let config = UpdaterConfig::load_with_optional(Some(PathBuf::from(
            "/definitely/not/a/real/config.toml",
        )))
        .await
        .unwrap();
        assert_eq!(config.panel_release_repo, "clawdeck/clawdeck");
    }

    #[tokio::test]
    async fn malformed_toml_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("update.toml");
        tokio::fs::write(&path, "not [ valid toml").await.unwrap();
        assert!(UpdaterConfig::load_from(&path).await.is_err());
    }
}
