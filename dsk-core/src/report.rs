//! Captured external tool runs, the building block of every structured result.

use crate::errors::RepairError;
use dsk_hal::{HalResult, SystemHal};
use serde::Serialize;
use std::process::Output;
use std::time::Duration;

/// Timeout for quick probes (lsblk, blkid, dmesg, smartctl).
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(30);
/// Timeout for mount attempts (ntfs-3g may replay a journal).
pub const MOUNT_TIMEOUT: Duration = Duration::from_secs(2 * 60);

/// One external invocation, successful or not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolRun {
    pub command: String,
    /// Exit code; absent when the tool could not be launched or was killed.
    pub rc: Option<i32>,
    pub out: String,
    pub err: String,
}

impl ToolRun {
    pub fn from_output(program: &str, args: &[&str], result: HalResult<Output>) -> Self {
        let command = render_command(program, args);
        match result {
            Ok(output) => Self {
                command,
                rc: output.status.code(),
                out: String::from_utf8_lossy(&output.stdout).trim().to_string(),
                err: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            },
            Err(err) => Self {
                command,
                rc: None,
                out: String::new(),
                err: RepairError::invocation(program, err).to_string(),
            },
        }
    }

    pub fn succeeded(&self) -> bool {
        self.rc == Some(0)
    }

    /// stdout and stderr joined, as an operator would see them in a terminal.
    pub fn combined(&self) -> String {
        match (self.out.is_empty(), self.err.is_empty()) {
            (false, false) => format!("{}\n{}", self.out, self.err),
            (false, true) => self.out.clone(),
            _ => self.err.clone(),
        }
    }
}

/// Run `program` with captured output and never fail: launch errors land in the record.
pub fn run_tool(hal: &dyn SystemHal, program: &str, args: &[&str], timeout: Duration) -> ToolRun {
    ToolRun::from_output(program, args, hal.command_output(program, args, Some(timeout)))
}

/// Like [`run_tool`], but waits for the child with no time limit.
///
/// Repair tools go through here; a write pass is never killed partway.
pub fn run_to_completion(hal: &dyn SystemHal, program: &str, args: &[&str]) -> ToolRun {
    ToolRun::from_output(program, args, hal.command_output(program, args, None))
}

fn render_command(program: &str, args: &[&str]) -> String {
    std::iter::once(program)
        .chain(args.iter().copied())
        .collect::<Vec<_>>()
        .join(" ")
}
