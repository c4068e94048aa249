use anyhow::Result;
use clap::{Parser, ValueEnum};
use serde_json::Value;

use crate::bot::BotUpdateDriver;
use crate::config::UpdaterConfig;
use crate::panel::PanelStager;
use crate::process::SystemRunner;
use crate::release::ReleaseClient;
use crate::version::normalize_repo;

/// Which installation to check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CheckTarget {
    /// The openclaw gateway runtime.
    Bot,
    /// This panel installation.
    Panel,
    /// Both.
    All,
}

/// Report update availability for the bot and/or the panel.
///
/// Checks are read-only and degrade recoverable failures (a dead status
/// probe, an unreachable release API) to a `warning` field instead of
/// failing, so this command only errors when the bot CLI itself is
/// missing while a bot check was requested.
#[derive(Parser, Debug)]
pub struct CheckCommand {
    /// Target to check.
    #[arg(value_enum, default_value = "all")]
    pub target: CheckTarget,
}

impl CheckCommand {
    pub async fn execute(&self, config: &UpdaterConfig) -> Result<()> {
        let mut report = serde_json::Map::new();

        if matches!(self.target, CheckTarget::Bot | CheckTarget::All) {
            let repo = normalize_repo(&config.bot_release_repo, "openclaw/openclaw")?;
            let driver = BotUpdateDriver::new(SystemRunner, repo);
            let status = driver.check().await?;
            report.insert("bot".to_string(), serde_json::to_value(&status)?);
        }

        if matches!(self.target, CheckTarget::Panel | CheckTarget::All) {
            let repo = normalize_repo(&config.panel_release_repo, "clawdeck/clawdeck")?;
            let client = ReleaseClient::new(config.resolve_token())?;
            let stager = PanelStager::new(client, repo, &config.app_dir, &config.state_dir);
            let status = stager.check().await;
            report.insert("panel".to_string(), serde_json::to_value(&status)?);
        }

        println!("{}", serde_json::to_string_pretty(&Value::Object(report))?);
        Ok(())
    }
}
