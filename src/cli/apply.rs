use anyhow::Result;
use clap::Parser;

use crate::config::UpdaterConfig;
use crate::lock::{LockTarget, UpdateLock};
use crate::panel::{PanelApplier, PanelStager};
use crate::release::ReleaseClient;
use crate::version::normalize_repo;

/// Apply the staged panel release: replace the live installation and
/// restart the panel's service unit. Linux only.
///
/// The heavy lifting happens in a detached background job; this command
/// returns as soon as the job is launched, and the service restart will
/// sever any connection to the old process shortly after.
#[derive(Parser, Debug)]
pub struct ApplyCommand {
    /// Release tag to apply; auto-stages it when nothing usable is staged.
    #[arg(value_name = "TAG")]
    pub tag: Option<String>,
}

impl ApplyCommand {
    pub async fn execute(&self, config: &UpdaterConfig) -> Result<()> {
        let repo = normalize_repo(&config.panel_release_repo, "clawdeck/clawdeck")?;
        let _lock = UpdateLock::acquire(&config.state_dir, LockTarget::Panel).await?;

        let client = ReleaseClient::new(config.resolve_token())?;
        let stager = PanelStager::new(client, repo, &config.app_dir, &config.state_dir);
        let applier = PanelApplier::new(stager, &config.service_name);
        let result = applier.apply(self.tag.as_deref()).await;
        super::emit(&result)
    }
}
