// ============================================================================
// src/gpg.rs – Public-key encryption backend (gpg as an external process)
// ============================================================================

use crate::action::shell::run_argv;
use crate::action::ActionError;
use crate::config::GpgCfg;
use std::ffi::OsString;
use std::fmt;
use std::path::PathBuf;

/// Encrypts a secret for a recipient key. Any non-success is an error.
pub trait Encryptor: fmt::Debug {
    fn encrypt(&self, secret: &[u8], recipient: &str) -> Result<Vec<u8>, ActionError>;

    /// File extension for the payload this backend emits.
    fn extension(&self) -> &'static str {
        "gpg"
    }
}

#[derive(Debug, Clone)]
pub struct GpgEncryptor {
    binary: String,
    homedir: Option<PathBuf>,
    armor: bool,
}

impl GpgEncryptor {
    pub fn from_config(cfg: &GpgCfg) -> Self {
        Self {
            binary: cfg.binary.clone(),
            homedir: cfg.homedir.clone(),
            armor: cfg.armor,
        }
    }

    fn argv(&self, recipient: &str) -> Vec<OsString> {
        let mut argv: Vec<OsString> = vec![
            self.binary.clone().into(),
            "--batch".into(),
            "--yes".into(),
            "--quiet".into(),
            "--trust-model".into(),
            "always".into(),
        ];
        if let Some(home) = &self.homedir {
            argv.push("--homedir".into());
            argv.push(home.clone().into_os_string());
        }
        if self.armor {
            argv.push("--armor".into());
        }
        argv.extend(
            ["--recipient", recipient, "--encrypt", "--output", "-"]
                .into_iter()
                .map(OsString::from),
        );
        argv
    }
}

impl Encryptor for GpgEncryptor {
    fn encrypt(&self, secret: &[u8], recipient: &str) -> Result<Vec<u8>, ActionError> {
        if recipient.is_empty() || recipient.starts_with('-') {
            return Err(ActionError::Encryption {
                recipient: recipient.to_string(),
                reason: "not a key identifier".to_string(),
            });
        }
        let out = run_argv(&self.argv(recipient), Some(secret)).map_err(|e| match e {
            ActionError::ProcessFailed { stderr, status, .. } => ActionError::Encryption {
                recipient: recipient.to_string(),
                reason: if stderr.is_empty() {
                    format!("gpg exited with status {status}")
                } else {
                    stderr
                },
            },
            other => other,
        })?;
        if out.is_empty() {
            return Err(ActionError::Encryption {
                recipient: recipient.to_string(),
                reason: "gpg produced no output".to_string(),
            });
        }
        Ok(out)
    }

    fn extension(&self) -> &'static str {
        if self.armor {
            "asc"
        } else {
            "gpg"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(binary: &str) -> GpgEncryptor {
        GpgEncryptor::from_config(&GpgCfg {
            binary: binary.to_string(),
            ..GpgCfg::default()
        })
    }

    #[test]
    fn argv_keeps_recipient_as_a_single_token() {
        let gpg = GpgEncryptor {
            binary: "gpg".into(),
            homedir: Some(PathBuf::from("/home/a/.gnupg")),
            armor: true,
        };
        let argv = gpg.argv("ABCD1234 --decrypt");
        let idx = argv.iter().position(|a| a == "--recipient").unwrap();
        assert_eq!(argv[idx + 1], "ABCD1234 --decrypt");
        assert!(argv.iter().any(|a| a == "--armor"));
        assert_eq!(argv.last().and_then(|a| a.to_str()), Some("-"));
        assert_eq!(gpg.extension(), "asc");
    }

    #[test]
    fn option_like_recipient_is_refused() {
        let gpg = plain("/nonexistent/gpg");
        let err = gpg.encrypt(b"secret", "--list-keys").unwrap_err();
        assert!(matches!(err, ActionError::Encryption { .. }));
    }

    #[test]
    fn failing_backend_reports_encryption_error() {
        // `false` stands in for a gpg that rejects the recipient.
        let gpg = plain("false");
        let err = gpg.encrypt(b"secret", "ABCD1234").unwrap_err();
        assert_eq!(
            err,
            ActionError::Encryption {
                recipient: "ABCD1234".into(),
                reason: "gpg exited with status 1".into(),
            }
        );
    }
}
