//! Checking for and staging panel releases.
//!
//! Staging downloads a candidate release into the state directory and
//! records it in the pending-update marker. It never restarts anything;
//! the returned result carries `requires_restart: true` so the UI knows a
//! separate apply step is still needed.

use std::path::PathBuf;
use tracing::{info, warn};

use crate::core::{MutationResult, Result, UpdateStatus};
use crate::release::{ReleaseClient, ReleaseRef};
use crate::version::{normalize_tag, strip_leading_v};

use super::state::{self, PendingUpdate};

/// Make a tag safe to embed in a filename.
///
/// Anything outside `[0-9A-Za-z._-]` is replaced so a hostile or merely
/// odd tag cannot escape the state directory.
fn sanitize_tag(tag: &str) -> String {
    tag.chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') { c } else { '_' })
        .collect()
}

/// Stages panel releases into a state directory.
pub struct PanelStager {
    client: ReleaseClient,
    release_repo: String,
    app_dir: PathBuf,
    state_dir: PathBuf,
}

impl PanelStager {
    /// Create a stager for one panel installation.
    pub fn new(
        client: ReleaseClient,
        release_repo: impl Into<String>,
        app_dir: impl Into<PathBuf>,
        state_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            client,
            release_repo: release_repo.into(),
            app_dir: app_dir.into(),
            state_dir: state_dir.into(),
        }
    }

    pub(crate) fn release_repo(&self) -> &str {
        &self.release_repo
    }

    pub(crate) fn app_dir(&self) -> &std::path::Path {
        &self.app_dir
    }

    pub(crate) fn state_dir(&self) -> &std::path::Path {
        &self.state_dir
    }

    /// Check whether a newer panel release is published.
    ///
    /// Release-fetch errors are not fatal: the check degrades to
    /// `update_available: false` with a `warning`, mirroring the bot check.
    /// An unknown current version (fresh install, no markers) is treated as
    /// "assume update available" once a latest release is known.
    pub async fn check(&self) -> UpdateStatus {
        let mut status = UpdateStatus::new(self.release_repo.clone());
        status.current_tag = state::read_panel_current_version(&self.app_dir);

        match self.client.fetch_latest_release(&self.release_repo).await {
            Ok(release) => {
                status.latest_tag = normalize_tag(&release.tag);
                status.update_available = status.current_tag.is_empty()
                    || strip_leading_v(&status.latest_tag)
                        != strip_leading_v(&status.current_tag);
            }
            Err(err) => {
                warn!(target: "panel", "release check failed, degrading to warning: {err}");
                status.warning = Some(format!("release check failed: {err}"));
            }
        }
        status
    }

    /// Resolve and download a release, then persist the pending-update
    /// marker. Used by both the public stage operation and the applier's
    /// auto-stage path.
    pub(crate) async fn stage_release(&self, tag: Option<&str>) -> Result<PendingUpdate> {
        let release: ReleaseRef = match tag {
            Some(tag) if !tag.trim().is_empty() => {
                self.client.fetch_release_by_tag(&self.release_repo, tag.trim()).await?
            }
            _ => self.client.fetch_latest_release(&self.release_repo).await?,
        };

        let normalized = normalize_tag(&release.tag);
        let tarball_path =
            self.state_dir.join(format!("panel-{}.tar.gz", sanitize_tag(&normalized)));

        info!(
            target: "panel",
            "staging {normalized} from {} into {}",
            self.release_repo,
            tarball_path.display()
        );
        self.client.download_artifact(&release.tarball_url, &tarball_path).await?;

        let pending = PendingUpdate {
            tag: normalized,
            release_repo: self.release_repo.clone(),
            app_dir: self.app_dir.clone(),
            tarball_path,
            staged_at: chrono::Utc::now(),
            published_at: release.published_at,
        };
        state::write_pending_update(&self.state_dir, &pending).map_err(|err| {
            crate::core::UpdateError::Io(std::io::Error::other(err.to_string()))
        })?;
        Ok(pending)
    }

    /// Stage a panel update: download the artifact and record the marker.
    ///
    /// Never restarts anything; the result's `requires_restart` tells the
    /// UI that an apply step is still pending. Operational failures come
    /// back as a structured `ok: false` result.
    pub async fn stage(&self, tag: Option<&str>) -> MutationResult {
        let old_version = state::read_panel_current_version(&self.app_dir);
        match self.stage_release(tag).await {
            Ok(pending) => {
                let mut result = MutationResult::success(
                    "stage",
                    format!("staged {}; apply to install it", pending.tag),
                );
                result.requires_restart = true;
                result.target_version = Some(pending.tag);
                result.old_version = (!old_version.is_empty()).then_some(old_version);
                result
            }
            Err(err) => MutationResult::failure("stage", format!("staging failed: {err}")),
        }
    }
}
