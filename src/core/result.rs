//! Shared result envelopes returned to the route layer.
//!
//! Every check returns an [`UpdateStatus`] and every mutating operation
//! (bot upgrade, bot rollback, panel stage, panel apply) returns a
//! [`MutationResult`], so the caller renders success and failure identically
//! regardless of target. Both serialize in camelCase to match the panel's
//! JSON envelope conventions.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Outcome of a `check` operation for either target.
///
/// Recomputed on every call and never persisted. `warning` is non-fatal:
/// a failed status probe or an unreachable release API sets it while the
/// check itself still reports `ok: true`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatus {
    /// Whether the check itself completed.
    pub ok: bool,
    /// Version currently installed (bot convention: no leading `v`;
    /// panel convention: leading `v`). Empty when unknown.
    pub current_tag: String,
    /// Newest version the check could see. Empty when unknown.
    pub latest_tag: String,
    /// Whether an update should be offered to the operator.
    pub update_available: bool,
    /// Non-fatal degradation notice (e.g. the status command failed).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    /// How the bot is installed (`"source"` or `"global"`), when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub install_method: Option<String>,
    /// Update strategy implied by the install method
    /// (`"openclaw-update"` or `"package-manager"`), when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy: Option<String>,
    /// Repository releases are resolved against.
    pub release_repo: String,
}

impl UpdateStatus {
    /// A baseline "nothing known yet" status for the given repository.
    pub fn new(release_repo: impl Into<String>) -> Self {
        Self {
            ok: true,
            current_tag: String::new(),
            latest_tag: String::new(),
            update_available: false,
            warning: None,
            install_method: None,
            strategy: None,
            release_repo: release_repo.into(),
        }
    }
}

/// Outcome of a mutating operation.
///
/// The shape is uniform across targets so the route layer needs a single
/// rendering path. Fields that only apply to some operations (`log_path`
/// for panel apply, `reconnect_after_ms` for anything that restarts the
/// serving process) are optional.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MutationResult {
    /// Whether the mutation succeeded.
    pub ok: bool,
    /// Which operation produced this result
    /// (`"upgrade"`, `"rollback"`, `"stage"`, `"apply"`).
    pub action: String,
    /// Version the operation targeted, when resolved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_version: Option<String>,
    /// Version that was installed before the operation, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_version: Option<String>,
    /// Whether a rollback was already attempted on this code path.
    pub rolled_back: bool,
    /// Staging completed but a separate apply step is still required.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub requires_restart: bool,
    /// The serving process is about to restart itself; the caller should
    /// reconnect instead of waiting on this connection.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub requires_reconnect: bool,
    /// Suggested delay before the caller polls again, in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reconnect_after_ms: Option<u64>,
    /// Human-readable outcome, including any post-check warnings.
    pub message: String,
    /// Log file of a detached apply procedure, when one was launched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_path: Option<PathBuf>,
}

impl MutationResult {
    /// A failed mutation with no side effects recorded.
    pub fn failure(action: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            ok: false,
            action: action.into(),
            target_version: None,
            old_version: None,
            rolled_back: false,
            requires_restart: false,
            requires_reconnect: false,
            reconnect_after_ms: None,
            message: message.into(),
            log_path: None,
        }
    }

    /// A successful mutation; callers fill in target/old versions and the
    /// restart/reconnect hints that apply to their operation.
    pub fn success(action: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            ok: true,
            ..Self::failure(action, message)
        }
    }
}
