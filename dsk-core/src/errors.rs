use dsk_hal::HalError;
use thiserror::Error;

/// Result type alias for dsk-repair operations
pub type Result<T> = anyhow::Result<T>;

/// Process exit code used when an operation needs root and we are not root.
pub const EXIT_PRIVILEGE_REQUIRED: u8 = 2;

#[derive(Error, Debug)]
pub enum RepairError {
    #[error("{tool} not installed")]
    ToolMissing { tool: String },

    #[error("{tool} failed: {reason}")]
    ToolInvocation { tool: String, reason: String },

    #[error("unexpected {tool} output: {reason}")]
    Parse { tool: String, reason: String },

    #[error("Invalid partition/device: {0}")]
    InvalidTarget(String),

    #[error("Root required for this operation. Please re-run with sudo.")]
    PrivilegeRequired,
}

impl RepairError {
    pub fn tool_missing(tool: &str) -> Self {
        RepairError::ToolMissing {
            tool: tool.to_string(),
        }
    }

    /// Wrap a HAL failure from running `tool`.
    pub fn invocation(tool: &str, err: HalError) -> Self {
        let reason = match err {
            HalError::CommandFailed { code, stderr, .. } if stderr.is_empty() => {
                format!("exit={:?}", code)
            }
            HalError::CommandFailed { stderr, .. } => stderr,
            other => other.to_string(),
        };
        RepairError::ToolInvocation {
            tool: tool.to_string(),
            reason,
        }
    }

    pub fn exit_code(&self) -> u8 {
        match self {
            RepairError::PrivilegeRequired => EXIT_PRIVILEGE_REQUIRED,
            _ => 1,
        }
    }
}
