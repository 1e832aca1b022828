// ── Local host probes ──
//
// Everything that asks the local OS a question: listening sockets, the
// outbound address, the default route. External tools run through
// `CommandRunner` so tests can substitute canned output.

pub mod network;
pub mod ports;

use std::io::ErrorKind;
use std::process::Command;

use tracing::trace;

use crate::error::CoreError;

/// Runs a local program to completion and returns its stdout.
pub trait CommandRunner {
    /// A missing executable must map to [`CoreError::ToolNotFound`] so
    /// callers can fall back to an alternative tool.
    fn run(&self, program: &str, args: &[&str]) -> Result<String, CoreError>;
}

/// Spawns real child processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, program: &str, args: &[&str]) -> Result<String, CoreError> {
        trace!(program, ?args, "running local command");
        let output = Command::new(program).args(args).output().map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                CoreError::ToolNotFound {
                    program: program.into(),
                }
            } else {
                CoreError::ToolFailed {
                    program: program.into(),
                    reason: e.to_string(),
                }
            }
        })?;

        if !output.status.success() {
            return Err(CoreError::ToolFailed {
                program: program.into(),
                reason: format!(
                    "{}: {}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
