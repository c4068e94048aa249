//! Driving the bot's own `openclaw` CLI: version probe, update status,
//! upgrade and rollback.
//!
//! The bot process is its own source of truth; nothing here persists state
//! between invocations. The driver trusts the CLI's exit codes and scrapes
//! its text output through [`crate::version::parse_openclaw_update_status`],
//! which is best-effort by design.
//!
//! Failure semantics follow the orchestrator-wide contract: the check
//! degrades a failed status probe to a warning, while mutations always
//! resolve to a [`MutationResult`] so the route layer has a uniform
//! success/failure shape.

use std::time::Duration;
use tracing::{debug, info, warn};

use crate::core::{MutationResult, Result, UpdateError, UpdateStatus};
use crate::process::CommandRunner;
use crate::version::{parse_openclaw_update_status, parse_version_from_text, strip_leading_v};

const OPENCLAW: &str = "openclaw";

/// Quick probes: version and status reads.
const PROBE_TIMEOUT: Duration = Duration::from_secs(30);
/// The update itself may reinstall packages; minutes, not seconds.
const UPDATE_TIMEOUT: Duration = Duration::from_secs(600);
/// Each best-effort post-check gets its own budget.
const POST_CHECK_TIMEOUT: Duration = Duration::from_secs(90);

/// Mutating action requested against the bot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotAction {
    /// Move to the latest (or a specific) version.
    Upgrade,
    /// Move back to an explicitly named version.
    Rollback,
}

impl BotAction {
    /// Wire name of the action, as the route layer spells it.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Upgrade => "upgrade",
            Self::Rollback => "rollback",
        }
    }
}

/// Orchestrates `openclaw` invocations through an injected runner.
pub struct BotUpdateDriver<R> {
    runner: R,
    release_repo: String,
}

impl<R: CommandRunner> BotUpdateDriver<R> {
    /// Create a driver bound to a runner and the bot's release repository.
    pub fn new(runner: R, release_repo: impl Into<String>) -> Self {
        Self {
            runner,
            release_repo: release_repo.into(),
        }
    }

    /// Read the bot's installed version. A missing or broken CLI is fatal
    /// here: without a version there is nothing meaningful to report.
    pub async fn current_version(&self) -> Result<String> {
        let out = self.runner.run(OPENCLAW, &["--version"], PROBE_TIMEOUT).await;
        if !out.ok {
            return Err(UpdateError::CommandFailed {
                command: format!("{OPENCLAW} --version"),
                stderr: out.error_text().to_string(),
            });
        }
        Ok(parse_version_from_text(&out.stdout))
    }

    /// Check whether a bot update is available.
    ///
    /// `openclaw update status` failing is *not* fatal: the check still
    /// reports `ok: true` with `update_available: false` and carries the
    /// probe's stderr in `warning`, so the dashboard keeps rendering.
    /// When the table does parse, a raw version mismatch is an independent
    /// update trigger even if the CLI's own keyword detection missed it.
    pub async fn check(&self) -> Result<UpdateStatus> {
        let current_tag = self.current_version().await?;
        let mut status = UpdateStatus::new(self.release_repo.clone());
        status.current_tag = current_tag.clone();

        let probe = self.runner.run(OPENCLAW, &["update", "status"], PROBE_TIMEOUT).await;
        if !probe.ok {
            warn!(
                target: "bot",
                "update status probe failed, degrading to warning: {}",
                probe.error_text()
            );
            status.warning = Some(format!("update status failed: {}", probe.error_text()));
            return Ok(status);
        }

        let parsed = parse_openclaw_update_status(&probe.stdout);
        debug!(target: "bot", "parsed update status: {parsed:?}");

        status.latest_tag = parsed.latest_tag.clone();
        status.install_method = Some(parsed.install_method);
        status.strategy = Some(parsed.strategy);
        status.update_available = parsed.update_available
            || (!parsed.latest_tag.is_empty()
                && strip_leading_v(&parsed.latest_tag) != strip_leading_v(&current_tag));
        Ok(status)
    }

    /// Upgrade or roll back the bot via `openclaw update`.
    ///
    /// Rollback without a target tag is rejected before any command runs.
    /// On success the version mutation is already done, so failures of the
    /// post-checks (`doctor`, `gateway restart`, `health`) are collected as
    /// warnings on the message instead of flipping `ok`.
    pub async fn mutate(&self, action: BotAction, tag: &str) -> MutationResult {
        let tag = tag.trim();
        if action == BotAction::Rollback && tag.is_empty() {
            return MutationResult::failure(action.as_str(), "rollback requires a target tag");
        }

        let old_version = match self.current_version().await {
            Ok(v) => Some(v),
            Err(err) => {
                debug!(target: "bot", "could not read current version before mutate: {err}");
                None
            }
        };

        let stripped = strip_leading_v(tag).to_string();
        let mut args = vec!["update", "--yes"];
        if !stripped.is_empty() {
            args.push("--tag");
            args.push(&stripped);
        }

        info!(target: "bot", "running openclaw {}", args.join(" "));
        let out = self.runner.run(OPENCLAW, &args, UPDATE_TIMEOUT).await;
        if !out.ok {
            let mut result = MutationResult::failure(
                action.as_str(),
                format!("openclaw update failed: {}", out.error_text()),
            );
            result.old_version = old_version;
            result.target_version = (!stripped.is_empty()).then(|| stripped.clone());
            return result;
        }

        // The mutation succeeded; everything from here on is best-effort.
        let new_version = match self.current_version().await {
            Ok(v) if !v.is_empty() => v,
            _ => stripped.clone(),
        };

        let mut warnings = Vec::new();
        for post in [
            vec!["doctor"],
            vec!["gateway", "restart"],
            vec!["health"],
        ] {
            let out = self.runner.run(OPENCLAW, &post, POST_CHECK_TIMEOUT).await;
            if !out.ok {
                warn!(
                    target: "bot",
                    "post-check `openclaw {}` failed: {}",
                    post.join(" "),
                    out.error_text()
                );
                warnings.push(format!("openclaw {} failed: {}", post.join(" "), out.error_text()));
            }
        }

        let mut message = format!("openclaw is now {new_version}");
        if !warnings.is_empty() {
            message.push_str("; warnings: ");
            message.push_str(&warnings.join("; "));
        }

        let mut result = MutationResult::success(action.as_str(), message);
        result.rolled_back = action == BotAction::Rollback;
        result.old_version = old_version;
        result.target_version = Some(new_version);
        result
    }
}

#[cfg(test)]
mod tests;
