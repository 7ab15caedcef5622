//! Shared UI helpers for the interactive menu and one-shot CLI output.

use std::io::IsTerminal;

pub mod cancel;
pub mod confirm;
pub mod listing;
pub mod menu;
pub mod style;

pub fn ensure_interactive_terminal() -> anyhow::Result<()> {
    if std::io::stdin().is_terminal() && std::io::stdout().is_terminal() {
        return Ok(());
    }

    anyhow::bail!(
        "No TTY detected. The interactive menu requires a terminal.\n\
         Use the one-shot flags instead (see --help), e.g.: sudo dsk-repair --repair /dev/sdb1"
    );
}
