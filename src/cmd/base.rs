// ============================================================================
// src/cmd/base.rs – External command runner (no shell, argv only)
// ============================================================================

use anyhow::{Context, Result};
use std::ffi::{OsStr, OsString};
use std::io::{self, Write};
use std::process::{Command, Stdio};

/// Safe wrapper for external process execution.
/// Arguments are handed to the program as a vector; nothing passes through a
/// shell. The call blocks until the child exits.
#[derive(Debug)]
pub struct Cmd {
    pub program: OsString,
}

#[derive(Debug)]
pub struct OutputData {
    pub stdout: Vec<u8>,
    pub stderr: String,
    pub status: i32,
}

impl Cmd {
    pub fn new<S: Into<OsString>>(program: S) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Run command with arguments, returning `OutputData`
    pub fn run<S: AsRef<OsStr>>(&self, args: &[S], input: Option<&[u8]>) -> Result<OutputData> {
        let mut cmd = Command::new(&self.program);
        cmd.args(args)
            .stdin(if input.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = cmd
            .spawn()
            .with_context(|| format!("spawn {}", self.program.to_string_lossy()))?;

        if let Some(bytes) = input {
            // Dropping the handle at the end of this block closes the pipe.
            if let Some(mut stdin) = child.stdin.take() {
                match stdin.write_all(bytes) {
                    // Child exited without reading; its status says why.
                    Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {}
                    other => other.context("writing stdin")?,
                }
            }
        }

        let output = child.wait_with_output().context("collect output")?;
        Ok(OutputData {
            stdout: output.stdout,
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            status: output.status.code().unwrap_or(-1),
        })
    }
}
