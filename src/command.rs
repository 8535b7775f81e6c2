// ============================================================================
// src/command.rs – Fail-fast, self-unwinding sequence of actions
// ============================================================================
//! A [`Command`] runs its actions in insertion order and stops at the first
//! failure. Every action that committed before that point is rolled back in
//! strict reverse order. A failed rollback is recorded and reported; it does
//! not trigger any further compensation.

use crate::action::{Action, ActionError, Outcome};
use crate::util::audit::AuditTrail;
use std::fmt;
use tracing::{error, info, warn};

/// User-facing operation a command implements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    Create,
    Destroy,
    Lock,
    Unlock,
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CommandKind::Create => "create",
            CommandKind::Destroy => "destroy",
            CommandKind::Lock => "lock",
            CommandKind::Unlock => "unlock",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandState {
    Ready,
    Executing,
    Completed,
    /// A forward step failed and the unwind has run. This includes a failure
    /// at the first step, where there was nothing to undo and
    /// [`Report::unwound`] is empty.
    RolledBack,
}

#[derive(Debug)]
pub struct Command {
    kind: CommandKind,
    actions: Vec<Action>,
    state: CommandState,
    /// Indices of rolled-back actions, in the order they were unwound.
    unwound: Vec<usize>,
    audit: AuditTrail,
}

impl Command {
    pub fn new(kind: CommandKind) -> Self {
        Self {
            kind,
            actions: Vec::new(),
            state: CommandState::Ready,
            unwound: Vec::new(),
            audit: AuditTrail::disabled(),
        }
    }

    pub fn with_audit(mut self, audit: AuditTrail) -> Self {
        self.audit = audit;
        self
    }

    pub fn add_action(&mut self, action: Action) {
        self.actions.push(action);
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    /// Run the command once. Later calls do nothing and return the final state.
    pub fn execute(&mut self) -> CommandState {
        if self.state != CommandState::Ready {
            warn!(command = %self.kind, state = ?self.state, "command already executed");
            return self.state;
        }
        self.state = CommandState::Executing;
        info!(command = %self.kind, steps = self.actions.len(), "executing");

        // ------------------------------------------------------------------
        // Forward pass: stop at the first failure.
        // ------------------------------------------------------------------
        let mut failed_at = None;
        for (idx, action) in self.actions.iter_mut().enumerate() {
            action.invoke();
            self.audit.record(
                if action.committed() { "ACTION_OK" } else { "ACTION_FAIL" },
                &audit_detail(self.kind, idx, action, action.result()),
            );
            if !action.committed() {
                failed_at = Some(idx);
                break;
            }
        }

        let Some(failed) = failed_at else {
            info!(command = %self.kind, "completed");
            self.state = CommandState::Completed;
            return self.state;
        };

        // ------------------------------------------------------------------
        // Unwind: reverse order, committed actions only, no cascading.
        // ------------------------------------------------------------------
        error!(command = %self.kind, step = failed, "step failed; rolling back");
        for idx in (0..failed).rev() {
            let action = &mut self.actions[idx];
            if !action.committed() {
                continue;
            }
            action.rollback();
            let ok = action.rollback_result().is_some_and(Outcome::is_ok);
            self.audit.record(
                if ok { "ROLLBACK_OK" } else { "ROLLBACK_FAIL" },
                &audit_detail(self.kind, idx, action, action.rollback_result()),
            );
            self.unwound.push(idx);
        }

        self.state = CommandState::RolledBack;
        self.state
    }

    pub fn report(&self) -> Report {
        let steps = self
            .actions
            .iter()
            .enumerate()
            .map(|(index, a)| StepReport {
                index,
                name: a.name(),
                description: a.describe(),
                result: a.result().cloned(),
                rollback: a.rollback_result().cloned(),
            })
            .collect();
        Report {
            kind: self.kind,
            state: self.state,
            steps,
            unwound: self.unwound.clone(),
        }
    }
}

fn audit_detail(kind: CommandKind, idx: usize, action: &Action, outcome: Option<&Outcome>) -> String {
    let mut detail = format!("{kind} #{idx} {}: {}", action.name(), action.describe());
    if let Some(err) = outcome.and_then(Outcome::failure_detail) {
        detail.push_str(&format!(" ({err})"));
    }
    detail
}

#[derive(Debug, Clone)]
pub struct StepReport {
    pub index: usize,
    pub name: &'static str,
    pub description: String,
    pub result: Option<Outcome>,
    pub rollback: Option<Outcome>,
}

/// Snapshot of a command after `execute`, for display and exit codes.
#[derive(Debug, Clone)]
pub struct Report {
    pub kind: CommandKind,
    pub state: CommandState,
    pub steps: Vec<StepReport>,
    pub unwound: Vec<usize>,
}

impl Report {
    /// The forward step that stopped the command, if any.
    pub fn failed_step(&self) -> Option<(&StepReport, &ActionError)> {
        self.steps.iter().find_map(|s| {
            s.result
                .as_ref()
                .and_then(Outcome::failure_detail)
                .map(|e| (s, e))
        })
    }

    /// Compensating steps that themselves failed (residual state).
    pub fn rollback_failures(&self) -> Vec<(&StepReport, &ActionError)> {
        self.steps
            .iter()
            .filter_map(|s| {
                s.rollback
                    .as_ref()
                    .and_then(Outcome::failure_detail)
                    .map(|e| (s, e))
            })
            .collect()
    }

    /// True when the failure happened before any step committed.
    pub fn nothing_to_undo(&self) -> bool {
        self.state == CommandState::RolledBack && self.unwound.is_empty()
    }

    /// 0 completed, 1 failed but fully unwound, 2 residual state remains.
    pub fn exit_code(&self) -> u8 {
        match self.state {
            CommandState::Completed => 0,
            _ if !self.rollback_failures().is_empty() => 2,
            _ => 1,
        }
    }
}
