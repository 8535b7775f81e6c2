// ============================================================================
// src/action/mod.rs – Reversible units of work and their recorded outcomes
// ============================================================================
//! An [`Action`] wraps one concrete [`Step`] together with the outcome of its
//! forward attempt and the outcome of its compensating attempt. Failures never
//! escape `invoke`/`rollback`; they are folded into an [`Outcome`].

pub mod error;
pub mod keyfile;
pub mod log;
pub mod mount;
pub mod ownership;
pub mod perms;
pub mod shell;

pub use error::ActionError;
pub use keyfile::CreateEncryptedKeyFile;
pub use log::LogAction;
pub use mount::CreateMountPoint;
pub use ownership::ChangeOwnership;
pub use perms::ChangePermissions;

use tracing::{debug, warn};

/// Immutable record of a single invoke or rollback attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    ok: bool,
    failure: Option<ActionError>,
}

impl Outcome {
    pub fn success() -> Self {
        Self {
            ok: true,
            failure: None,
        }
    }

    pub fn failure(err: ActionError) -> Self {
        Self {
            ok: false,
            failure: Some(err),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.ok
    }

    pub fn failure_detail(&self) -> Option<&ActionError> {
        self.failure.as_ref()
    }
}

impl From<Result<(), ActionError>> for Outcome {
    fn from(res: Result<(), ActionError>) -> Self {
        match res {
            Ok(()) => Outcome::success(),
            Err(err) => Outcome::failure(err),
        }
    }
}

/// Capability set shared by every concrete step.
///
/// The hooks run before the mutating call so a step can capture whatever
/// ambient state it needs to restore later.
pub trait Reversible {
    fn name(&self) -> &'static str;

    /// One-line human description of what the step changes.
    fn describe(&self) -> String;

    fn pre_invoke(&mut self) -> Result<(), ActionError> {
        Ok(())
    }

    fn invoke(&mut self) -> Result<(), ActionError>;

    fn pre_rollback(&mut self) -> Result<(), ActionError> {
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), ActionError>;
}

/// Closed set of concrete steps a command can schedule.
#[derive(Debug)]
pub enum Step {
    Log(LogAction),
    ChangePermissions(ChangePermissions),
    ChangeOwnership(ChangeOwnership),
    CreateMountPoint(CreateMountPoint),
    CreateEncryptedKeyFile(CreateEncryptedKeyFile),
}

impl Step {
    fn reversible_mut(&mut self) -> &mut dyn Reversible {
        match self {
            Step::Log(a) => a,
            Step::ChangePermissions(a) => a,
            Step::ChangeOwnership(a) => a,
            Step::CreateMountPoint(a) => a,
            Step::CreateEncryptedKeyFile(a) => a,
        }
    }

    fn reversible(&self) -> &dyn Reversible {
        match self {
            Step::Log(a) => a,
            Step::ChangePermissions(a) => a,
            Step::ChangeOwnership(a) => a,
            Step::CreateMountPoint(a) => a,
            Step::CreateEncryptedKeyFile(a) => a,
        }
    }
}

macro_rules! step_from {
    ($($variant:ident => $ty:ty),* $(,)?) => {
        $(impl From<$ty> for Step {
            fn from(a: $ty) -> Self {
                Step::$variant(a)
            }
        })*
    };
}

step_from! {
    Log => LogAction,
    ChangePermissions => ChangePermissions,
    ChangeOwnership => ChangeOwnership,
    CreateMountPoint => CreateMountPoint,
    CreateEncryptedKeyFile => CreateEncryptedKeyFile,
}

/// A scheduled step plus the outcomes of its two directions.
#[derive(Debug)]
pub struct Action {
    step: Step,
    result: Option<Outcome>,
    rollback_result: Option<Outcome>,
}

impl Action {
    pub fn new(step: impl Into<Step>) -> Self {
        Self {
            step: step.into(),
            result: None,
            rollback_result: None,
        }
    }

    pub fn name(&self) -> &'static str {
        self.step.reversible().name()
    }

    pub fn describe(&self) -> String {
        self.step.reversible().describe()
    }

    pub fn result(&self) -> Option<&Outcome> {
        self.result.as_ref()
    }

    pub fn rollback_result(&self) -> Option<&Outcome> {
        self.rollback_result.as_ref()
    }

    /// True once the forward attempt has run and succeeded.
    pub fn committed(&self) -> bool {
        self.result.as_ref().is_some_and(Outcome::is_ok)
    }

    /// Run the forward step. Always leaves `result` set.
    pub fn invoke(&mut self) {
        let step = self.step.reversible_mut();
        let res = step.pre_invoke().and_then(|()| step.invoke());
        if let Err(err) = &res {
            warn!(action = step.name(), error = %err, "invoke failed");
        } else {
            debug!(action = step.name(), "invoke ok");
        }
        self.result = Some(res.into());
    }

    /// Run the compensating step. Always leaves `rollback_result` set.
    pub fn rollback(&mut self) {
        if !self.committed() {
            warn!(action = self.name(), "rollback skipped: nothing committed");
            self.rollback_result = Some(Outcome::failure(ActionError::NotInvoked));
            return;
        }
        let step = self.step.reversible_mut();
        let res = step.pre_rollback().and_then(|()| step.rollback());
        if let Err(err) = &res {
            warn!(action = step.name(), error = %err, "rollback failed");
        } else {
            debug!(action = step.name(), "rollback ok");
        }
        self.rollback_result = Some(res.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;

    #[test]
    fn outcomes_compare_by_value() {
        assert_eq!(Outcome::success(), Outcome::success());
        assert_eq!(
            Outcome::failure(ActionError::NotInvoked),
            Outcome::failure(ActionError::NotInvoked)
        );
        assert_ne!(Outcome::success(), Outcome::failure(ActionError::NotInvoked));
    }

    #[test]
    fn fresh_action_has_no_outcomes() {
        let action = Action::new(LogAction::new("hello"));
        assert!(action.result().is_none());
        assert!(action.rollback_result().is_none());
        assert!(!action.committed());
    }

    #[test]
    fn rollback_without_invoke_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("vault");
        let mut action = Action::new(CreateMountPoint::new(&target, 0o700));
        action.rollback();
        assert_eq!(
            action.rollback_result(),
            Some(&Outcome::failure(ActionError::NotInvoked))
        );
        assert!(action.result().is_none());
    }

    #[test]
    fn failed_invoke_is_captured_not_raised() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        let mut action = Action::new(ChangePermissions::new(&missing, 0o600));
        action.invoke();
        let outcome = action.result().unwrap();
        assert!(!outcome.is_ok());
        assert_eq!(
            outcome.failure_detail(),
            Some(&ActionError::NotFound(missing.clone()))
        );

        action.rollback();
        assert_eq!(
            action.rollback_result().and_then(Outcome::failure_detail),
            Some(&ActionError::NotInvoked)
        );
    }

    #[test]
    fn rollback_failure_lands_on_rollback_result() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("vault");
        let mut action = Action::new(CreateMountPoint::new(&target, 0o700));
        action.invoke();
        assert!(action.committed());

        // A non-empty directory cannot be removed by the compensating step.
        fs::write(target.join("stray"), b"x").unwrap();
        action.rollback();

        assert!(action.committed());
        let rb = action.rollback_result().unwrap();
        assert!(!rb.is_ok());
        assert!(target.exists());
        assert_eq!(
            fs::metadata(&target).unwrap().permissions().mode() & 0o777,
            0o700
        );
    }
}
