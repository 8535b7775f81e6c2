// ============================================================================
// src/action/mount.rs – Create (and remove) a vault mount point
// ============================================================================

use crate::action::{ActionError, Reversible};
use std::fs::{self, DirBuilder};
use std::os::unix::fs::{DirBuilderExt, PermissionsExt};
use std::path::{Path, PathBuf};
use tracing::info;

/// Creates a fresh directory with an exact mode. The directory must not
/// already exist, so rollback can simply remove it.
#[derive(Debug, Clone)]
pub struct CreateMountPoint {
    target: PathBuf,
    mode: u32,
}

impl CreateMountPoint {
    pub fn new(target: &Path, mode: u32) -> Self {
        Self {
            target: target.to_path_buf(),
            mode,
        }
    }
}

impl Reversible for CreateMountPoint {
    fn name(&self) -> &'static str {
        "create-mount-point"
    }

    fn describe(&self) -> String {
        format!("create {} ({:o})", self.target.display(), self.mode)
    }

    fn invoke(&mut self) -> Result<(), ActionError> {
        DirBuilder::new()
            .mode(self.mode)
            .create(&self.target)
            .map_err(|e| ActionError::from_io("mkdir", &self.target, e))?;

        // Mode passed to mkdir is filtered by umask; pin it exactly.
        fs::set_permissions(&self.target, fs::Permissions::from_mode(self.mode))
            .map_err(|e| ActionError::from_io("chmod", &self.target, e))?;
        info!(path = %self.target.display(), "mount point created");
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), ActionError> {
        fs::remove_dir(&self.target).map_err(|e| ActionError::from_io("rmdir", &self.target, e))?;
        info!(path = %self.target.display(), "mount point removed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{Action, Outcome};

    #[test]
    fn creates_owner_only_directory() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("secrets");
        let mut action = Action::new(CreateMountPoint::new(&target, 0o700));
        action.invoke();

        assert_eq!(action.result(), Some(&Outcome::success()));
        let meta = fs::metadata(&target).unwrap();
        assert!(meta.is_dir());
        assert_eq!(meta.permissions().mode() & 0o7777, 0o700);
    }

    #[test]
    fn existing_path_is_a_precondition_failure() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("secrets");
        fs::create_dir(&target).unwrap();

        let mut action = Action::new(CreateMountPoint::new(&target, 0o700));
        action.invoke();
        assert_eq!(
            action.result(),
            Some(&Outcome::failure(ActionError::AlreadyExists(target.clone())))
        );
    }

    #[test]
    fn missing_parent_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("no/such/parent/secrets");
        let mut action = Action::new(CreateMountPoint::new(&target, 0o700));
        action.invoke();
        assert_eq!(
            action.result().and_then(Outcome::failure_detail),
            Some(&ActionError::NotFound(target.clone()))
        );
    }

    #[test]
    fn rollback_removes_and_path_can_be_recreated() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("secrets");

        let mut first = Action::new(CreateMountPoint::new(&target, 0o700));
        first.invoke();
        first.rollback();
        assert_eq!(first.rollback_result(), Some(&Outcome::success()));
        assert!(!target.exists());

        let mut second = Action::new(CreateMountPoint::new(&target, 0o700));
        second.invoke();
        assert_eq!(second.result(), Some(&Outcome::success()));
    }
}
