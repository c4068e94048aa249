use anyhow::Result;
use clap::Parser;

use crate::config::UpdaterConfig;
use crate::lock::{LockTarget, UpdateLock};
use crate::panel::PanelStager;
use crate::release::ReleaseClient;
use crate::version::normalize_repo;

/// Download a panel release into the state directory and record it as the
/// staged update. Never restarts anything; run `apply` afterwards.
#[derive(Parser, Debug)]
pub struct StageCommand {
    /// Release tag to stage (latest when omitted).
    #[arg(value_name = "TAG")]
    pub tag: Option<String>,
}

impl StageCommand {
    pub async fn execute(&self, config: &UpdaterConfig) -> Result<()> {
        let repo = normalize_repo(&config.panel_release_repo, "clawdeck/clawdeck")?;
        let _lock = UpdateLock::acquire(&config.state_dir, LockTarget::Panel).await?;

        let client = ReleaseClient::new(config.resolve_token())?;
        let stager = PanelStager::new(client, repo, &config.app_dir, &config.state_dir);
        let result = stager.stage(self.tag.as_deref()).await;
        super::emit(&result)
    }
}
