// ============================================================================
// src/action/perms.rs – Change permission bits, remembering the originals
// ============================================================================

use crate::action::{ActionError, Reversible};
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tracing::info;

const MODE_MASK: u32 = 0o7777;

#[derive(Debug, Clone)]
pub struct ChangePermissions {
    target: PathBuf,
    mode: u32,
    /// Permission bits seen just before invoke; consumed by rollback.
    orig_mode: Option<u32>,
}

impl ChangePermissions {
    pub fn new(target: &Path, mode: u32) -> Self {
        Self {
            target: target.to_path_buf(),
            mode: mode & MODE_MASK,
            orig_mode: None,
        }
    }

    fn set_mode(&self, mode: u32) -> Result<(), ActionError> {
        fs::set_permissions(&self.target, fs::Permissions::from_mode(mode))
            .map_err(|e| ActionError::from_io("chmod", &self.target, e))
    }
}

impl Reversible for ChangePermissions {
    fn name(&self) -> &'static str {
        "change-permissions"
    }

    fn describe(&self) -> String {
        format!("chmod {:o} {}", self.mode, self.target.display())
    }

    fn pre_invoke(&mut self) -> Result<(), ActionError> {
        let meta = fs::metadata(&self.target)
            .map_err(|e| ActionError::from_io("stat", &self.target, e))?;
        self.orig_mode = Some(meta.permissions().mode() & MODE_MASK);
        Ok(())
    }

    fn invoke(&mut self) -> Result<(), ActionError> {
        self.set_mode(self.mode)?;
        info!(path = %self.target.display(), mode = %format!("{:o}", self.mode), "mode changed");
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), ActionError> {
        let orig = self.orig_mode.take().ok_or(ActionError::NotInvoked)?;
        self.set_mode(orig)?;
        info!(path = %self.target.display(), mode = %format!("{orig:o}"), "mode restored");
        Ok(())
    }
}
