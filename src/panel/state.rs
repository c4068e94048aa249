//! Persisted marker files: the panel's on-disk update state.
//!
//! Two small JSON records carry everything the orchestrator remembers
//! across restarts:
//!
//! - [`PendingUpdate`], one per installation, is the single source of truth
//!   for "there is a staged, not-yet-applied release". Stage writes it,
//!   the apply script deletes it on success.
//! - [`VersionMarker`] lives inside the app directory and answers "what is
//!   installed now". Only a successful apply writes it.
//!
//! Both readers tolerate missing or corrupt files by returning a documented
//! default instead of failing: a marker that cannot be read is the same as
//! a marker that does not exist.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::utils::fs::atomic_write;
use crate::version::normalize_tag;

/// File name of the pending-update marker inside the state directory.
pub const PENDING_UPDATE_FILE: &str = "pending-update.json";

/// File name of the installed-version marker inside the app directory.
pub const VERSION_MARKER_FILE: &str = ".clawdeck-release.json";

/// A staged, not-yet-applied panel release.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingUpdate {
    /// Tag of the staged release (panel convention: leading `v`).
    pub tag: String,
    /// Repository the release was resolved from.
    pub release_repo: String,
    /// Live installation directory the release targets.
    pub app_dir: PathBuf,
    /// Downloaded tarball backing this marker.
    pub tarball_path: PathBuf,
    /// When the artifact was staged.
    pub staged_at: DateTime<Utc>,
    /// Publication timestamp from the release API, if reported.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_at: Option<String>,
}

/// What version the panel installation currently runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionMarker {
    /// Installed tag (always normalized with a leading `v`).
    pub tag: String,
    /// Repository the install came from.
    pub release_repo: String,
    /// When the apply script wrote this marker.
    pub applied_at: DateTime<Utc>,
}

/// Path of the pending-update marker for a state directory.
#[must_use]
pub fn pending_update_path(state_dir: &Path) -> PathBuf {
    state_dir.join(PENDING_UPDATE_FILE)
}

/// Read the pending-update marker, if one exists and parses.
///
/// Corrupt markers are logged and treated as absent.
pub fn read_pending_update(state_dir: &Path) -> Option<PendingUpdate> {
    let path = pending_update_path(state_dir);
    let content = std::fs::read_to_string(&path).ok()?;
    match serde_json::from_str(&content) {
        Ok(pending) => Some(pending),
        Err(err) => {
            warn!(
                target: "panel",
                "ignoring corrupt pending-update marker at {}: {err}",
                path.display()
            );
            None
        }
    }
}

/// Read the pending-update marker and enforce the tarball-exists invariant.
///
/// A marker whose referenced tarball is gone is "no pending update", never
/// a crash; the caller re-stages instead.
pub fn read_valid_pending_update(state_dir: &Path) -> Option<PendingUpdate> {
    let pending = read_pending_update(state_dir)?;
    if pending.tarball_path.exists() {
        Some(pending)
    } else {
        warn!(
            target: "panel",
            "pending-update marker references missing tarball {}, treating as not staged",
            pending.tarball_path.display()
        );
        None
    }
}

/// Atomically persist the pending-update marker.
pub fn write_pending_update(state_dir: &Path, pending: &PendingUpdate) -> anyhow::Result<()> {
    let path = pending_update_path(state_dir);
    let json = serde_json::to_string_pretty(pending)?;
    atomic_write(&path, json.as_bytes())?;
    debug!(target: "panel", "staged update marker written to {}", path.display());
    Ok(())
}

/// Resolve the panel's installed version for an app directory.
///
/// Reads the version marker; if that is absent or unparsable, falls back to
/// `package.json`'s `version` field normalized with a leading `v` (first-run
/// installs predate the marker). Returns the empty string when neither
/// exists; callers treat empty as "unknown, assume update available".
pub fn read_panel_current_version(app_dir: &Path) -> String {
    let marker_path = app_dir.join(VERSION_MARKER_FILE);
    if let Ok(content) = std::fs::read_to_string(&marker_path) {
        match serde_json::from_str::<VersionMarker>(&content) {
            Ok(marker) if !marker.tag.is_empty() => return normalize_tag(&marker.tag),
            Ok(_) => {}
            Err(err) => warn!(
                target: "panel",
                "ignoring corrupt version marker at {}: {err}",
                marker_path.display()
            ),
        }
    }

    let package_json = app_dir.join("package.json");
    if let Ok(content) = std::fs::read_to_string(&package_json) {
        if let Ok(payload) = serde_json::from_str::<serde_json::Value>(&content) {
            if let Some(version) = payload["version"].as_str() {
                return normalize_tag(version);
            }
        }
    }

    String::new()
}
