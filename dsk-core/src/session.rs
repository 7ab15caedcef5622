//! Everything a workflow needs, passed explicitly instead of living in globals.

use crate::config::Config;
use crate::logging::RepairLog;
use crate::ui::cancel::Interrupt;
use crate::ui::confirm::Prompter;
use crate::ui::style::Console;
use dsk_hal::SystemHal;

pub struct Session<'a> {
    pub hal: &'a dyn SystemHal,
    pub config: &'a Config,
    pub console: &'a Console,
    pub prompter: &'a dyn Prompter,
    pub log: RepairLog,
    /// Raised by the Ctrl+C handler in interactive mode.
    pub interrupt: Interrupt,
}

impl<'a> Session<'a> {
    pub fn new(
        hal: &'a dyn SystemHal,
        config: &'a Config,
        console: &'a Console,
        prompter: &'a dyn Prompter,
    ) -> Self {
        Self {
            hal,
            config,
            console,
            prompter,
            log: RepairLog::new(&config.log_path),
            interrupt: Interrupt::new(),
        }
    }

    /// Fail with [`RepairError::PrivilegeRequired`](crate::errors::RepairError) unless root.
    pub fn require_root(&self) -> Result<(), crate::errors::RepairError> {
        if self.hal.is_root() {
            return Ok(());
        }
        self.console
            .error("Root required for this operation. Please re-run with sudo.");
        Err(crate::errors::RepairError::PrivilegeRequired)
    }
}
