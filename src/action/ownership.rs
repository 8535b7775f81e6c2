// ============================================================================
// src/action/ownership.rs – Elevated chown with captured original owner/group
// ============================================================================

use crate::action::shell::{Elevation, ShellStep};
use crate::action::{ActionError, Reversible};
use nix::unistd::{Gid, Group, Uid, User};
use std::ffi::OsString;
use std::fs;
use std::os::unix::fs::MetadataExt;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnerGroup {
    pub owner: String,
    pub group: String,
}

impl OwnerGroup {
    fn chown_operand(&self) -> String {
        format!("{}:{}", self.owner, self.group)
    }
}

/// Changes owner and group of `target` through the external `chown`,
/// prefixed by the elevation tool in both directions.
#[derive(Debug, Clone)]
pub struct ChangeOwnership {
    target: PathBuf,
    wanted: OwnerGroup,
    elevation: Elevation,
    /// Names seen just before invoke; consumed by rollback.
    original: Option<OwnerGroup>,
}

impl ChangeOwnership {
    pub fn new(target: &Path, owner: &str, group: &str, elevation: Elevation) -> Self {
        Self {
            target: target.to_path_buf(),
            wanted: OwnerGroup {
                owner: owner.to_string(),
                group: group.to_string(),
            },
            elevation,
            original: None,
        }
    }

    fn chown_argv(&self, who: &OwnerGroup) -> Vec<OsString> {
        vec![
            "chown".into(),
            "--".into(),
            who.chown_operand().into(),
            self.target.clone().into_os_string(),
        ]
    }
}

/// Reject names that could be parsed as an option, split the `owner:group`
/// operand, or smuggle control characters into logs.
fn validate_name(kind: &'static str, name: &str) -> Result<(), ActionError> {
    let bad = name.is_empty()
        || name.starts_with('-')
        || name
            .chars()
            .any(|c| c == ':' || c.is_whitespace() || c.is_control());
    if bad {
        return Err(ActionError::InvalidName {
            kind,
            name: name.to_string(),
        });
    }
    Ok(())
}

/// Make sure both names resolve on this host before anything runs.
fn require_known(who: &OwnerGroup) -> Result<(), ActionError> {
    if !matches!(User::from_name(&who.owner), Ok(Some(_))) {
        return Err(ActionError::UnknownName {
            kind: "user",
            name: who.owner.clone(),
        });
    }
    if !matches!(Group::from_name(&who.group), Ok(Some(_))) {
        return Err(ActionError::UnknownName {
            kind: "group",
            name: who.group.clone(),
        });
    }
    Ok(())
}

/// Resolve the current owner and group names of `path`.
pub fn current_owner_group(path: &Path) -> Result<OwnerGroup, ActionError> {
    let meta = fs::metadata(path).map_err(|e| ActionError::from_io("stat", path, e))?;
    let owner = User::from_uid(Uid::from_raw(meta.uid()))
        .ok()
        .flatten()
        .ok_or(ActionError::UnknownIdentity {
            kind: "user",
            id: meta.uid(),
        })?;
    let group = Group::from_gid(Gid::from_raw(meta.gid()))
        .ok()
        .flatten()
        .ok_or(ActionError::UnknownIdentity {
            kind: "group",
            id: meta.gid(),
        })?;
    Ok(OwnerGroup {
        owner: owner.name,
        group: group.name,
    })
}

impl ShellStep for ChangeOwnership {
    fn elevation(&self) -> &Elevation {
        &self.elevation
    }

    fn build_invoke_command(&self) -> Vec<OsString> {
        self.chown_argv(&self.wanted)
    }

    fn build_rollback_command(&self) -> Vec<OsString> {
        // Before invoke has captured anything this is the identity chown.
        let who = self.original.as_ref().unwrap_or(&self.wanted);
        self.chown_argv(who)
    }
}

impl Reversible for ChangeOwnership {
    fn name(&self) -> &'static str {
        "change-ownership"
    }

    fn describe(&self) -> String {
        format!("chown {} {}", self.wanted.chown_operand(), self.target.display())
    }

    fn pre_invoke(&mut self) -> Result<(), ActionError> {
        validate_name("user", &self.wanted.owner)?;
        validate_name("group", &self.wanted.group)?;
        require_known(&self.wanted)?;
        self.original = Some(current_owner_group(&self.target)?);
        Ok(())
    }

    fn invoke(&mut self) -> Result<(), ActionError> {
        self.run_invoke()?;
        info!(path = %self.target.display(), owner = %self.wanted.chown_operand(), "ownership changed");
        Ok(())
    }

    fn pre_rollback(&mut self) -> Result<(), ActionError> {
        match &self.original {
            Some(orig) => {
                validate_name("user", &orig.owner)?;
                validate_name("group", &orig.group)
            }
            None => Err(ActionError::NotInvoked),
        }
    }

    fn rollback(&mut self) -> Result<(), ActionError> {
        self.run_rollback()?;
        if let Some(orig) = self.original.take() {
            info!(path = %self.target.display(), owner = %orig.chown_operand(), "ownership restored");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::error::ErrorCategory;
    use crate::action::{Action, Outcome};
    use std::os::unix::ffi::OsStrExt;

    #[test]
    fn both_commands_start_with_the_elevation_tool() {
        let mut step = ChangeOwnership::new(Path::new("/vaults/s"), "alice", "staff", Elevation::Tool("sudo".into()));
        step.original = Some(OwnerGroup {
            owner: "root".into(),
            group: "root".into(),
        });

        let fwd = step.invoke_argv();
        let back = step.rollback_argv();
        assert_eq!(fwd, ["sudo", "chown", "--", "alice:staff", "/vaults/s"]);
        assert_eq!(back, ["sudo", "chown", "--", "root:root", "/vaults/s"]);
        assert_eq!(fwd[0], back[0]);
    }

    #[test]
    fn hostile_names_are_rejected_before_running_anything() {
        let dir = tempfile::tempdir().unwrap();
        for (owner, group) in [("bob:wheel", "staff"), ("-R", "staff"), ("bob", "a b"), ("", "g")] {
            let mut action = Action::new(ChangeOwnership::new(
                dir.path(),
                owner,
                group,
                Elevation::Tool("/nonexistent/elevate".into()),
            ));
            action.invoke();
            let failure = action.result().and_then(Outcome::failure_detail).cloned();
            assert!(
                matches!(failure, Some(ActionError::InvalidName { .. })),
                "{owner}:{group} -> {failure:?}"
            );
        }
    }

    #[test]
    fn round_trip_restores_original_names() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("vault");
        fs::create_dir(&target).unwrap();
        let before = current_owner_group(&target).unwrap();

        // chown to the current owner needs no privilege.
        let mut action = Action::new(ChangeOwnership::new(
            &target,
            &before.owner,
            &before.group,
            Elevation::None,
        ));
        action.invoke();
        assert_eq!(action.result(), Some(&Outcome::success()));
        action.rollback();
        assert_eq!(action.rollback_result(), Some(&Outcome::success()));
        assert_eq!(current_owner_group(&target).unwrap(), before);
    }

    #[test]
    fn unknown_names_are_a_precondition_failure() {
        let dir = tempfile::tempdir().unwrap();
        let me = current_owner_group(dir.path()).unwrap();
        let cases = [
            ("zvault-no-such-user", me.group.as_str(), "user"),
            (me.owner.as_str(), "zvault-no-such-group", "group"),
        ];
        for (owner, group, missing) in cases {
            // The elevation tool does not exist: reaching it would be a Spawn error.
            let mut action = Action::new(ChangeOwnership::new(
                dir.path(),
                owner,
                group,
                Elevation::Tool("/nonexistent/elevate".into()),
            ));
            action.invoke();
            let err = action
                .result()
                .and_then(Outcome::failure_detail)
                .cloned()
                .unwrap();
            assert_eq!(err.category(), ErrorCategory::Precondition, "{owner}:{group} -> {err:?}");
            assert!(
                matches!(err, ActionError::UnknownName { kind, .. } if kind == missing),
                "{owner}:{group} -> {err:?}"
            );
        }
    }

    #[test]
    fn non_utf8_target_is_passed_through_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join(std::ffi::OsStr::from_bytes(b"vault\xff"));
        fs::create_dir(&target).unwrap();
        let me = current_owner_group(&target).unwrap();

        let step = ChangeOwnership::new(&target, &me.owner, &me.group, Elevation::None);
        assert_eq!(step.invoke_argv()[3].as_os_str(), target.as_os_str());

        let mut action = Action::new(step);
        action.invoke();
        assert_eq!(action.result(), Some(&Outcome::success()));
        action.rollback();
        assert_eq!(action.rollback_result(), Some(&Outcome::success()));
    }

    #[test]
    fn missing_target_fails_in_pre_invoke() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("absent");
        let mut action = Action::new(ChangeOwnership::new(&target, "root", "root", Elevation::None));
        action.invoke();
        assert_eq!(
            action.result(),
            Some(&Outcome::failure(ActionError::NotFound(target)))
        );
    }
}
