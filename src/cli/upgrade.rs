use anyhow::Result;
use clap::Parser;

use crate::bot::{BotAction, BotUpdateDriver};
use crate::config::UpdaterConfig;
use crate::lock::{LockTarget, UpdateLock};
use crate::process::SystemRunner;
use crate::version::normalize_repo;

/// Upgrade the bot via `openclaw update`, then run its post-change health
/// checks. Package reinstalls can take minutes; the command waits.
#[derive(Parser, Debug)]
pub struct UpgradeCommand {
    /// Version to upgrade to (latest when omitted).
    #[arg(value_name = "TAG")]
    pub tag: Option<String>,
}

impl UpgradeCommand {
    pub async fn execute(&self, config: &UpdaterConfig) -> Result<()> {
        let repo = normalize_repo(&config.bot_release_repo, "openclaw/openclaw")?;
        let _lock = UpdateLock::acquire(&config.state_dir, LockTarget::Bot).await?;

        let driver = BotUpdateDriver::new(SystemRunner, repo);
        let result = driver.mutate(BotAction::Upgrade, self.tag.as_deref().unwrap_or("")).await;
        super::emit(&result)
    }
}
