use anyhow::Result;
use clap::Parser;

use crate::bot::{BotAction, BotUpdateDriver};
use crate::config::UpdaterConfig;
use crate::lock::{LockTarget, UpdateLock};
use crate::process::SystemRunner;
use crate::version::normalize_repo;

/// Roll the bot back to an explicit version via `openclaw update --tag`.
///
/// The tag is accepted as optional here so the validation lives in one
/// place: the driver rejects an empty tag before invoking anything, and
/// the structured failure is printed like any other result.
#[derive(Parser, Debug)]
pub struct RollbackCommand {
    /// Version to roll back to. Required for the rollback to proceed.
    #[arg(value_name = "TAG")]
    pub tag: Option<String>,
}

impl RollbackCommand {
    pub async fn execute(&self, config: &UpdaterConfig) -> Result<()> {
        let repo = normalize_repo(&config.bot_release_repo, "openclaw/openclaw")?;
        let _lock = UpdateLock::acquire(&config.state_dir, LockTarget::Bot).await?;

        let driver = BotUpdateDriver::new(SystemRunner, repo);
        let result = driver.mutate(BotAction::Rollback, self.tag.as_deref().unwrap_or("")).await;
        super::emit(&result)
    }
}
