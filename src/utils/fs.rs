//! Safe filesystem primitives for marker files.
//!
//! Marker files are the orchestrator's only persistent state, and a torn
//! write would be indistinguishable from corruption on the next read. All
//! marker writes therefore go through [`atomic_write`]: write to a `.tmp`
//! sibling, sync, then rename over the target so readers see either the old
//! content or the new content, never a partial file.

use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::Path;

/// Create a directory (and parents) if it does not exist.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)
            .with_context(|| format!("Failed to create directory: {}", path.display()))?;
    } else if !path.is_dir() {
        anyhow::bail!("Path exists but is not a directory: {}", path.display());
    }
    Ok(())
}

/// Atomically write bytes using a write-then-rename strategy.
///
/// Parent directories are created as needed. The temporary file lives next
/// to the target so the final rename stays on one filesystem.
pub fn atomic_write(path: &Path, content: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }

    let temp_path = path.with_extension("tmp");
    {
        let mut file = fs::File::create(&temp_path)
            .with_context(|| format!("Failed to create temp file: {}", temp_path.display()))?;
        file.write_all(content)
            .with_context(|| format!("Failed to write to temp file: {}", temp_path.display()))?;
        file.sync_all()
            .with_context(|| format!("Failed to sync temp file: {}", temp_path.display()))?;
    }

    fs::rename(&temp_path, path).with_context(|| {
        format!("Failed to move {} into place at {}", temp_path.display(), path.display())
    })?;
    Ok(())
}
