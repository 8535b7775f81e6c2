// ============================================================================
// src/action/log.rs – Placeholder step that only records a message
// ============================================================================

use crate::action::{ActionError, Reversible};
use tracing::info;

/// Stands in for steps that are not wired to the storage subsystem yet
/// (dataset creation, lock, unlock, destroy). Always succeeds.
#[derive(Debug, Clone)]
pub struct LogAction {
    message: String,
}

impl LogAction {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Reversible for LogAction {
    fn name(&self) -> &'static str {
        "log"
    }

    fn describe(&self) -> String {
        self.message.clone()
    }

    fn invoke(&mut self) -> Result<(), ActionError> {
        info!(message = %self.message, "pending step");
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), ActionError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{Action, Outcome};

    #[test]
    fn always_succeeds_both_ways() {
        let mut action = Action::new(LogAction::new("lock /vaults/secrets"));
        action.invoke();
        assert_eq!(action.result(), Some(&Outcome::success()));
        action.rollback();
        assert_eq!(action.rollback_result(), Some(&Outcome::success()));
        assert_eq!(action.describe(), "lock /vaults/secrets");
    }
}
