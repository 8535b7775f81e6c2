// ============================================================================
// src/util/paths.rs – Vault path resolution and key-file placement
// ============================================================================

use anyhow::{anyhow, bail, Result};
use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};

/// Resolve a user-supplied vault path against `base` (normally `$HOME`).
/// Absolute inputs are kept as given; parent-directory hops are refused.
pub fn resolve_vault_path(base: &Path, raw: &Path) -> Result<PathBuf> {
    if raw.as_os_str().is_empty() {
        bail!("vault path must not be empty");
    }
    if raw.components().any(|c| matches!(c, Component::ParentDir)) {
        bail!("vault path must not contain '..': {}", raw.display());
    }
    let joined = base.join(raw);
    // Normalise away `.` and trailing separators so the key file lands beside
    // the mount point rather than inside it.
    let clean: PathBuf = joined.components().collect();
    if clean.parent().is_none() {
        bail!("vault path resolves to the filesystem root");
    }
    Ok(clean)
}

/// Key file for a mount point: a hidden sibling `.<name>.key.<ext>`.
pub fn key_file_for(mount_point: &Path, extension: &str) -> Result<PathBuf> {
    let name = mount_point
        .file_name()
        .ok_or_else(|| anyhow!("vault path has no final component: {}", mount_point.display()))?;
    let parent = mount_point.parent().unwrap_or_else(|| Path::new("/"));
    let mut file = OsString::from(".");
    file.push(name);
    file.push(".key.");
    file.push(extension);
    Ok(parent.join(file))
}
