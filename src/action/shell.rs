// ============================================================================
// src/action/shell.rs – Process-invoking steps and privilege elevation
// ============================================================================
//! A [`ShellStep`] builds argument vectors for its forward and inverse
//! commands. Elevation is part of the step's construction: when set, the
//! elevation tool is prepended to *both* vectors, so a privileged change is
//! always undone with the same privilege.

use crate::action::ActionError;
use crate::cmd::Cmd;
use std::ffi::OsString;
use tracing::{debug, info};

/// How a process-invoking step gains privilege.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Elevation {
    None,
    /// Re-execute through the given tool (e.g. `sudo`, `doas`, `pkexec`).
    Tool(String),
}

impl Elevation {
    /// Prefix `argv` with the elevation tool when one is configured.
    pub fn wrap(&self, mut argv: Vec<OsString>) -> Vec<OsString> {
        if let Elevation::Tool(tool) = self {
            argv.insert(0, OsString::from(tool));
        }
        argv
    }
}

pub trait ShellStep {
    fn elevation(&self) -> &Elevation;

    /// Unelevated argv of the forward command. Paths go in as raw
    /// `OsString`s, never through a lossy UTF-8 conversion.
    fn build_invoke_command(&self) -> Vec<OsString>;

    /// Unelevated argv of the inverse command.
    fn build_rollback_command(&self) -> Vec<OsString>;

    fn invoke_argv(&self) -> Vec<OsString> {
        self.elevation().wrap(self.build_invoke_command())
    }

    fn rollback_argv(&self) -> Vec<OsString> {
        self.elevation().wrap(self.build_rollback_command())
    }

    fn run_invoke(&self) -> Result<(), ActionError> {
        run_argv(&self.invoke_argv(), None).map(|_| ())
    }

    fn run_rollback(&self) -> Result<(), ActionError> {
        run_argv(&self.rollback_argv(), None).map(|_| ())
    }
}

/// Spawn `argv` without a shell. A non-zero exit becomes
/// [`ActionError::ProcessFailed`]; stdout is returned on success.
pub fn run_argv(argv: &[OsString], stdin: Option<&[u8]>) -> Result<Vec<u8>, ActionError> {
    let (program, args) = argv.split_first().ok_or_else(|| ActionError::Spawn {
        program: String::new(),
        message: "empty command line".to_string(),
    })?;
    let shown = program.to_string_lossy().into_owned();

    info!(command = %render(argv), "running");
    let out = Cmd::new(program)
        .run(args, stdin)
        .map_err(|e| ActionError::Spawn {
            program: shown.clone(),
            message: format!("{e:#}"),
        })?;

    if out.status != 0 {
        debug!(program = %shown, status = out.status, "command failed");
        return Err(ActionError::ProcessFailed {
            program: shown,
            status: out.status,
            stderr: out.stderr.trim().to_string(),
        });
    }
    Ok(out.stdout)
}

/// Quote one token for a POSIX shell. Tokens made only of safe characters
/// are returned unchanged.
pub fn shell_quote(token: &str) -> String {
    let safe = !token.is_empty()
        && token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./:=@%+,".contains(c));
    if safe {
        return token.to_string();
    }
    format!("'{}'", token.replace('\'', r"'\''"))
}

/// Render an argv as a single shell-safe line (for logs and reports).
/// Bytes that are not UTF-8 show up as U+FFFD here only.
pub fn render(argv: &[OsString]) -> String {
    argv.iter()
        .map(|t| shell_quote(&t.to_string_lossy()))
        .collect::<Vec<_>>()
        .join(" ")
}
