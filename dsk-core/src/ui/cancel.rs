//! Ctrl+C handling for the interactive menu.
//!
//! The handler only raises an [`Interrupt`] flag. The repair flow polls it between tool
//! runs and stops before the next step; the menu clears it after each action and returns
//! to the top level instead of exiting.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

static HANDLER_SET: OnceLock<()> = OnceLock::new();

pub fn install_ctrlc_handler<F>(on_cancel: F) -> anyhow::Result<()>
where
    F: Fn() + Send + Sync + 'static,
{
    if HANDLER_SET.get().is_some() {
        return Ok(());
    }

    ctrlc::set_handler(move || {
        on_cancel();
        log::info!("Cancellation requested (Ctrl+C).");
    })?;

    let _ = HANDLER_SET.set(());
    Ok(())
}

/// Shared "operator pressed Ctrl+C" flag. Clones observe the same state.
#[derive(Debug, Clone, Default)]
pub struct Interrupt(Arc<AtomicBool>);

impl Interrupt {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raise(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether an interrupt is pending; does not clear it.
    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Read and clear the flag.
    pub fn take(&self) -> bool {
        self.0.swap(false, Ordering::SeqCst)
    }
}

/// Install a Ctrl+C handler that raises `flag`.
pub fn install_interrupt_flag(flag: &Interrupt) -> anyhow::Result<()> {
    let flag = flag.clone();
    install_ctrlc_handler(move || flag.raise())
}

/// Whether `err` came from Ctrl+C, either via the handler or an interrupted terminal read.
///
/// Clears `flag`.
pub fn is_interrupt(flag: &Interrupt, err: &anyhow::Error) -> bool {
    let raised = flag.take();
    raised
        || err.chain().any(|cause| {
            cause
                .downcast_ref::<io::Error>()
                .is_some_and(|e| e.kind() == io::ErrorKind::Interrupted)
        })
}
