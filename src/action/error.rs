// ============================================================================
// src/action/error.rs – Typed failure taxonomy for action invoke/rollback
// ============================================================================

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Broad classes of failure, used for reporting and exit-code decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Precondition,
    Permission,
    ExternalTool,
    Encryption,
}

impl ErrorCategory {
    pub fn label(self) -> &'static str {
        match self {
            ErrorCategory::Precondition => "precondition",
            ErrorCategory::Permission => "permission",
            ErrorCategory::ExternalTool => "external tool",
            ErrorCategory::Encryption => "encryption",
        }
    }
}

/// Failure detail carried inside an [`Outcome`](super::Outcome).
///
/// Everything is owned and comparable so outcomes can be compared by value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    #[error("{} already exists", .0.display())]
    AlreadyExists(PathBuf),

    #[error("{} does not exist", .0.display())]
    NotFound(PathBuf),

    #[error("no {kind} entry for id {id}")]
    UnknownIdentity { kind: &'static str, id: u32 },

    #[error("no {kind} named {name:?}")]
    UnknownName { kind: &'static str, name: String },

    #[error("invalid {kind} name {name:?}")]
    InvalidName { kind: &'static str, name: String },

    #[error("permission denied: {op} {}", path.display())]
    PermissionDenied { op: &'static str, path: PathBuf },

    #[error("{op} {} failed: {message}", path.display())]
    Io {
        op: &'static str,
        path: PathBuf,
        message: String,
    },

    #[error("could not run {program}: {message}")]
    Spawn { program: String, message: String },

    #[error("{program} exited with status {status}: {stderr}")]
    ProcessFailed {
        program: String,
        status: i32,
        stderr: String,
    },

    #[error("encryption for recipient {recipient} failed: {reason}")]
    Encryption { recipient: String, reason: String },

    #[error("rollback requested before a successful invoke")]
    NotInvoked,
}

impl ActionError {
    /// Translate an I/O error on `path`, lifting the kinds we report distinctly.
    pub fn from_io(op: &'static str, path: &Path, err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::AlreadyExists => ActionError::AlreadyExists(path.to_path_buf()),
            io::ErrorKind::NotFound => ActionError::NotFound(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => ActionError::PermissionDenied {
                op,
                path: path.to_path_buf(),
            },
            _ => ActionError::Io {
                op,
                path: path.to_path_buf(),
                message: err.to_string(),
            },
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            ActionError::AlreadyExists(_)
            | ActionError::NotFound(_)
            | ActionError::UnknownIdentity { .. }
            | ActionError::UnknownName { .. }
            | ActionError::InvalidName { .. }
            | ActionError::NotInvoked => ErrorCategory::Precondition,
            ActionError::PermissionDenied { .. } => ErrorCategory::Permission,
            ActionError::Io { .. }
            | ActionError::Spawn { .. }
            | ActionError::ProcessFailed { .. } => ErrorCategory::ExternalTool,
            ActionError::Encryption { .. } => ErrorCategory::Encryption,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_kinds_map_to_precondition_and_permission() {
        let p = Path::new("/vaults/secrets");
        let exists = ActionError::from_io("mkdir", p, io::Error::from(io::ErrorKind::AlreadyExists));
        assert_eq!(exists, ActionError::AlreadyExists(p.to_path_buf()));
        assert_eq!(exists.category(), ErrorCategory::Precondition);

        let denied =
            ActionError::from_io("chmod", p, io::Error::from(io::ErrorKind::PermissionDenied));
        assert_eq!(denied.category(), ErrorCategory::Permission);

        let other = ActionError::from_io("rmdir", p, io::Error::other("directory not empty"));
        assert_eq!(other.category(), ErrorCategory::ExternalTool);
    }
}
