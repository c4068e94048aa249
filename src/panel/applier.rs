//! Applying a staged panel release.
//!
//! The apply operation is the one place the orchestrator mutates the live
//! installation, and it cannot do so inline: the process serving the
//! request is part of the installation being replaced. It therefore
//! generates a shell procedure and launches it as a detached background
//! job, then returns immediately with a reconnect hint. Everything that
//! happens after that (extraction, mirroring, dependency reinstall,
//! marker bookkeeping, the service restart) is observable only through
//! the job's log file and the next version check. That is the accepted
//! limitation of self-update-in-place, stated rather than hidden.
//!
//! The procedure itself never partially mutates the app directory: the
//! tarball is extracted into a fresh temp directory first, and the live
//! tree is only touched after extraction succeeded.

use chrono::Utc;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::core::MutationResult;
use crate::utils::fs::atomic_write;
use crate::utils::platform::is_linux;

use super::stager::PanelStager;
use super::state::{self, PendingUpdate, PENDING_UPDATE_FILE, VERSION_MARKER_FILE};

/// How long the browser should wait before polling the panel again.
const RECONNECT_AFTER_MS: u64 = 12_000;

/// Single-quote a string for safe embedding in a shell script.
fn sh_quote(text: &str) -> String {
    format!("'{}'", text.replace('\'', r"'\''"))
}

fn sh_quote_path(path: &Path) -> String {
    sh_quote(&path.to_string_lossy())
}

/// Render the apply procedure for one staged release.
///
/// Kept as a pure function of its inputs so tests can pin the generated
/// script without touching a real installation.
pub fn generate_apply_script(
    pending: &PendingUpdate,
    state_dir: &Path,
    service_name: &str,
) -> String {
    let tarball = sh_quote_path(&pending.tarball_path);
    let app_dir = sh_quote_path(&pending.app_dir);
    let pending_marker = sh_quote_path(&state_dir.join(PENDING_UPDATE_FILE));
    let version_marker = sh_quote_path(&pending.app_dir.join(VERSION_MARKER_FILE));
    let tag = sh_quote(&pending.tag);
    let repo = sh_quote(&pending.release_repo);
    let service = sh_quote(service_name);

    format!(
        r#"#!/usr/bin/env bash
set -euo pipefail

TARBALL={tarball}
APP_DIR={app_dir}
PENDING_MARKER={pending_marker}
VERSION_MARKER={version_marker}
TAG={tag}
REPO={repo}
SERVICE={service}

echo "applying $TAG to $APP_DIR"

WORK_DIR=$(mktemp -d)
trap 'rm -rf "$WORK_DIR"' EXIT

tar -xzf "$TARBALL" -C "$WORK_DIR"
SRC_DIR=$(find "$WORK_DIR" -mindepth 1 -maxdepth 1 -type d | head -n 1)
if [ -z "$SRC_DIR" ]; then
    echo "error: extraction produced no directory" >&2
    exit 1
fi

if command -v rsync >/dev/null 2>&1; then
    rsync -a --delete \
        --exclude '.git' --exclude 'node_modules' --exclude 'dist' \
        "$SRC_DIR"/ "$APP_DIR"/
else
    find "$APP_DIR" -mindepth 1 -maxdepth 1 \
        ! -name '.git' ! -name 'node_modules' ! -name 'dist' \
        -exec rm -rf {{}} +
    cp -a "$SRC_DIR"/. "$APP_DIR"/
fi

cd "$APP_DIR"
npm ci --omit=dev

APPLIED_AT=$(date -u +%Y-%m-%dT%H:%M:%SZ)
printf '{{"tag":"%s","releaseRepo":"%s","appliedAt":"%s"}}\n' \
    "$TAG" "$REPO" "$APPLIED_AT" > "$VERSION_MARKER"

rm -f "$PENDING_MARKER"

systemctl daemon-reload
systemctl restart "$SERVICE"
echo "applied $TAG"
"#
    )
}

/// Applies staged releases by launching the generated procedure detached.
pub struct PanelApplier {
    stager: PanelStager,
    service_name: String,
}

impl PanelApplier {
    /// Create an applier over a stager and the panel's systemd unit name.
    pub fn new(stager: PanelStager, service_name: impl Into<String>) -> Self {
        Self {
            stager,
            service_name: service_name.into(),
        }
    }

    /// Apply the staged panel update, auto-staging first when `tag` names a
    /// release and nothing usable is staged.
    ///
    /// Guarded to Linux: on any other platform this returns a structured
    /// failure without touching disk. On success the serving process is
    /// about to be restarted by its own child; the result says so via
    /// `requires_reconnect` and a reconnect delay hint.
    pub async fn apply(&self, tag: Option<&str>) -> MutationResult {
        if !is_linux() {
            return MutationResult::failure("apply", "apply is Linux-only");
        }

        let old_version = state::read_panel_current_version(self.stager.app_dir());

        let pending = match state::read_valid_pending_update(self.stager.state_dir()) {
            Some(pending) => pending,
            None => match tag {
                Some(tag) if !tag.trim().is_empty() => {
                    info!(target: "panel", "nothing staged; auto-staging {tag} before apply");
                    match self.stager.stage_release(Some(tag)).await {
                        Ok(pending) => pending,
                        Err(err) => {
                            return MutationResult::failure(
                                "apply",
                                format!("auto-stage failed: {err}"),
                            );
                        }
                    }
                }
                _ => {
                    return MutationResult::failure("apply", "no staged update; stage first");
                }
            },
        };

        match self.launch_detached(&pending) {
            Ok(log_path) => {
                let mut result = MutationResult::success(
                    "apply",
                    format!(
                        "applying {}; the panel service will restart itself",
                        pending.tag
                    ),
                );
                result.requires_reconnect = true;
                result.reconnect_after_ms = Some(RECONNECT_AFTER_MS);
                result.target_version = Some(pending.tag);
                result.old_version = (!old_version.is_empty()).then_some(old_version);
                result.log_path = Some(log_path);
                result
            }
            Err(err) => {
                warn!(target: "panel", "failed to launch apply procedure: {err}");
                MutationResult::failure("apply", format!("failed to launch apply: {err}"))
            }
        }
    }

    /// Write the procedure and its log file, then spawn it fire-and-forget:
    /// own process group, stdio detached, output redirected to the log.
    /// The child's PID is logged for observability but never awaited.
    fn launch_detached(&self, pending: &PendingUpdate) -> anyhow::Result<PathBuf> {
        let stamp = Utc::now().format("%Y%m%d-%H%M%S");
        let script_path = self.stager.state_dir().join(format!("apply-{stamp}.sh"));
        let log_path = self.stager.state_dir().join(format!("apply-{stamp}.log"));

        let script = generate_apply_script(pending, self.stager.state_dir(), &self.service_name);
        atomic_write(&script_path, script.as_bytes())?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&script_path, std::fs::Permissions::from_mode(0o700))?;
        }

        let log_file = std::fs::File::create(&log_path)?;
        let log_err = log_file.try_clone()?;

        let mut command = std::process::Command::new("bash");
        command
            .arg(&script_path)
            .stdin(std::process::Stdio::null())
            .stdout(log_file)
            .stderr(log_err);
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            // New process group so the systemd restart at the end of the
            // script cannot take the script down with the old service.
            command.process_group(0);
        }

        let child = command.spawn()?;
        info!(
            target: "panel",
            "apply procedure launched (pid {}), logging to {}",
            child.id(),
            log_path.display()
        );
        // Deliberately not waited on; the job outlives this process.
        drop(child);
        Ok(log_path)
    }
}
