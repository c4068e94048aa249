//! Platform probes and default install paths.
//!
//! The panel's apply procedure is Linux-only (it rewrites a live install
//! tree and bounces a systemd unit), so the defaults below only pin real
//! paths on Linux. Elsewhere they fall back to temp/current directories,
//! which keeps checks and staging testable on developer machines.

use std::path::PathBuf;

/// Compile-time check for Linux targets.
#[must_use]
pub const fn is_linux() -> bool {
    cfg!(target_os = "linux")
}

/// Directory holding staged tarballs, markers, locks and apply logs.
///
/// `/var/lib/clawdeck/update` on Linux; a per-user temp subdirectory
/// elsewhere (nothing outside Linux ever applies, but checks still need a
/// place to stage into).
#[must_use]
pub fn default_state_dir() -> PathBuf {
    if is_linux() {
        PathBuf::from("/var/lib/clawdeck/update")
    } else {
        std::env::temp_dir().join("clawdeck-update")
    }
}

/// The panel's live installation directory.
///
/// `/opt/clawdeck` on Linux; the current working directory elsewhere.
#[must_use]
pub fn default_app_dir() -> PathBuf {
    if is_linux() {
        PathBuf::from("/opt/clawdeck")
    } else {
        std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
    }
}

/// Cache/config base for non-system installs, used by the config loader.
#[must_use]
pub fn user_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("clawdeck-update")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_dir_is_fixed_on_linux() {
        if is_linux() {
            assert_eq!(default_state_dir(), PathBuf::from("/var/lib/clawdeck/update"));
            assert_eq!(default_app_dir(), PathBuf::from("/opt/clawdeck"));
        } else {
            assert!(default_state_dir().ends_with("clawdeck-update"));
        }
    }
}
