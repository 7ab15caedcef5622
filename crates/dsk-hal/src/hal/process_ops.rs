//! Process execution helpers.
//!
//! External commands are considered "world-touching" and must go through the HAL so we can
//! test workflows without spawning real processes.

use crate::{HalError, HalResult};
use std::process::{ExitStatus, Output};
use std::time::Duration;

/// Process execution trait (external command runner).
pub trait ProcessOps {
    /// Run `program` with captured stdout/stderr, bounded by `timeout` when one is given.
    ///
    /// `None` waits for the child however long it takes. A non-zero exit is not an error
    /// here; callers inspect `Output::status`.
    fn command_output(
        &self,
        program: &str,
        args: &[&str],
        timeout: Option<Duration>,
    ) -> HalResult<Output>;

    /// Run `program` in the foreground with inherited stdio and wait for it.
    ///
    /// Used for long-running tools that own their progress display.
    fn command_foreground(&self, program: &str, args: &[&str]) -> HalResult<ExitStatus>;
}

/// Turn a captured output with a non-zero exit into [`HalError::CommandFailed`].
pub fn ensure_success(program: &str, output: Output) -> HalResult<Output> {
    if output.status.success() {
        return Ok(output);
    }
    Err(HalError::CommandFailed {
        program: program.to_string(),
        code: output.status.code(),
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
    })
}
