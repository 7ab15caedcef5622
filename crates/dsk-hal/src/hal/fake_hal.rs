//! Fake HAL implementation for testing.
//!
//! This implementation records all operations without executing them and answers
//! commands from a per-program script, allowing CI-safe tests of the repair and
//! imaging workflows without root privileges or real disks.

use super::{HostOps, ProcessOps};
use crate::{HalError, HalResult};
use std::collections::{HashMap, HashSet, VecDeque};
use std::os::unix::process::ExitStatusExt;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Output};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Operation records for testing and verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Command {
        program: String,
        args: Vec<String>,
        /// `None` when the caller waits for the child without a limit.
        timeout_secs: Option<u64>,
    },
    Foreground {
        program: String,
        args: Vec<String>,
    },
    CreateDir {
        path: PathBuf,
    },
}

impl Operation {
    pub fn program(&self) -> Option<&str> {
        match self {
            Operation::Command { program, .. } | Operation::Foreground { program, .. } => {
                Some(program)
            }
            Operation::CreateDir { .. } => None,
        }
    }
}

/// Scripted answer for one command invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FakeResponse {
    Exit {
        code: i32,
        stdout: String,
        stderr: String,
    },
    /// Behave as if the executable could not be launched.
    NotFound,
}

impl FakeResponse {
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self::exit(0, stdout, "")
    }

    pub fn fail(code: i32, stderr: impl Into<String>) -> Self {
        Self::exit(code, "", stderr)
    }

    pub fn exit(code: i32, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        FakeResponse::Exit {
            code,
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }
}

/// Shared state for FakeHal operations.
#[derive(Debug, Default)]
struct FakeHalState {
    /// All operations that were recorded
    operations: Vec<Operation>,
    /// One-shot responses, consumed in order per program
    scripted: HashMap<String, VecDeque<FakeResponse>>,
    /// Response used once the script for a program runs dry
    fallback: HashMap<String, FakeResponse>,
    installed: HashSet<String>,
    existing: HashSet<PathBuf>,
    block_devices: HashSet<PathBuf>,
    root: bool,
}

/// Fake HAL implementation that records operations without executing them.
///
/// Unscripted commands succeed with empty output.
#[derive(Debug, Clone, Default)]
pub struct FakeHal {
    state: Arc<Mutex<FakeHalState>>,
}

impl FakeHal {
    pub fn new() -> Self {
        Self::default()
    }

    /// A fake host where the process runs as root.
    pub fn as_root() -> Self {
        let hal = Self::new();
        hal.set_root(true);
        hal
    }

    pub fn set_root(&self, root: bool) {
        self.state.lock().unwrap().root = root;
    }

    /// Make `program` resolvable through [`HostOps::which`].
    pub fn install(&self, program: &str) {
        self.state
            .lock()
            .unwrap()
            .installed
            .insert(program.to_string());
    }

    pub fn add_path(&self, path: impl Into<PathBuf>) {
        self.state.lock().unwrap().existing.insert(path.into());
    }

    pub fn add_block_device(&self, path: impl Into<PathBuf>) {
        let path = path.into();
        let mut state = self.state.lock().unwrap();
        state.existing.insert(path.clone());
        state.block_devices.insert(path);
    }

    /// Queue a one-shot response for the next call to `program`.
    pub fn script(&self, program: &str, response: FakeResponse) {
        self.state
            .lock()
            .unwrap()
            .scripted
            .entry(program.to_string())
            .or_default()
            .push_back(response);
    }

    /// Answer every unscripted call to `program` with `response`.
    pub fn respond(&self, program: &str, response: FakeResponse) {
        self.state
            .lock()
            .unwrap()
            .fallback
            .insert(program.to_string(), response);
    }

    /// Get all recorded operations.
    pub fn operations(&self) -> Vec<Operation> {
        self.state.lock().unwrap().operations.clone()
    }

    /// Get the number of operations recorded.
    pub fn operation_count(&self) -> usize {
        self.state.lock().unwrap().operations.len()
    }

    /// Check if a specific operation was recorded.
    pub fn has_operation(&self, check: impl Fn(&Operation) -> bool) -> bool {
        self.state.lock().unwrap().operations.iter().any(check)
    }

    /// Argument lists of every recorded invocation of `program`, in call order.
    pub fn invocations(&self, program: &str) -> Vec<Vec<String>> {
        self.state
            .lock()
            .unwrap()
            .operations
            .iter()
            .filter_map(|op| match op {
                Operation::Command {
                    program: p, args, ..
                }
                | Operation::Foreground { program: p, args } if p == program => {
                    Some(args.clone())
                }
                _ => None,
            })
            .collect()
    }

    pub fn was_invoked(&self, program: &str) -> bool {
        self.has_operation(|op| op.program() == Some(program))
    }

    /// Clear all recorded operations (scripts and host facts are kept).
    pub fn clear(&self) {
        self.state.lock().unwrap().operations.clear();
    }

    fn record_operation(&self, op: Operation) {
        self.state.lock().unwrap().operations.push(op);
    }

    fn next_response(&self, program: &str) -> FakeResponse {
        let mut state = self.state.lock().unwrap();
        if let Some(resp) = state
            .scripted
            .get_mut(program)
            .and_then(|queue| queue.pop_front())
        {
            return resp;
        }
        state
            .fallback
            .get(program)
            .cloned()
            .unwrap_or_else(|| FakeResponse::ok(""))
    }
}

fn exit_status(code: i32) -> ExitStatus {
    ExitStatus::from_raw(code << 8)
}

impl ProcessOps for FakeHal {
    fn command_output(
        &self,
        program: &str,
        args: &[&str],
        timeout: Option<Duration>,
    ) -> HalResult<Output> {
        log::info!("FAKE HAL: {} {}", program, args.join(" "));
        self.record_operation(Operation::Command {
            program: program.to_string(),
            args: args.iter().map(|s| s.to_string()).collect(),
            timeout_secs: timeout.map(|t| t.as_secs()),
        });

        match self.next_response(program) {
            FakeResponse::Exit {
                code,
                stdout,
                stderr,
            } => Ok(Output {
                status: exit_status(code),
                stdout: stdout.into_bytes(),
                stderr: stderr.into_bytes(),
            }),
            FakeResponse::NotFound => Err(HalError::CommandNotFound(program.to_string())),
        }
    }

    fn command_foreground(&self, program: &str, args: &[&str]) -> HalResult<ExitStatus> {
        log::info!("FAKE HAL (foreground): {} {}", program, args.join(" "));
        self.record_operation(Operation::Foreground {
            program: program.to_string(),
            args: args.iter().map(|s| s.to_string()).collect(),
        });

        match self.next_response(program) {
            FakeResponse::Exit { code, .. } => Ok(exit_status(code)),
            FakeResponse::NotFound => Err(HalError::CommandNotFound(program.to_string())),
        }
    }
}

impl HostOps for FakeHal {
    fn is_root(&self) -> bool {
        self.state.lock().unwrap().root
    }

    fn which(&self, program: &str) -> Option<PathBuf> {
        let state = self.state.lock().unwrap();
        state
            .installed
            .contains(program)
            .then(|| PathBuf::from("/usr/sbin").join(program))
    }

    fn path_exists(&self, path: &Path) -> bool {
        self.state.lock().unwrap().existing.contains(path)
    }

    fn is_block_device(&self, path: &Path) -> bool {
        self.state.lock().unwrap().block_devices.contains(path)
    }

    fn create_dir_all(&self, path: &Path) -> HalResult<()> {
        self.record_operation(Operation::CreateDir {
            path: path.to_path_buf(),
        });
        self.add_path(path);
        Ok(())
    }
}
