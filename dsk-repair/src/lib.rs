use anyhow::Context;
use clap::Parser;
use crossterm::style::Color;
use dsk_core::cli::{Action, Cli};
use dsk_core::config::{Config, VERSION};
use dsk_core::ui::confirm::TerminalPrompter;
use dsk_core::ui::style::Console;
use dsk_core::ui::{cancel, listing, menu};
use dsk_core::{imaging, inspect, inventory, logging, repair, Session};
use dsk_hal::LinuxHal;
use std::path::Path;
use std::process::ExitCode;

pub fn run() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    logging::init();

    let config = Config::from_env().apply_cli(&cli);
    let console = Console::new(config.color);
    let hal = LinuxHal::new();
    let prompter = TerminalPrompter;
    let session = Session::new(&hal, &config, &console, &prompter);

    log::debug!(
        "dsk-repair {} (log: {}, mount base: {})",
        VERSION,
        config.log_path.display(),
        config.mount_base.display()
    );
    execute(&session, cli.action(), cli.yes).map(ExitCode::from)
}

/// Perform one action. Structured results go to stdout as pretty JSON.
///
/// Missing root for `--repair`/`--image` maps to exit code 2; every other outcome is
/// reported in the output and exits 0.
pub fn execute(session: &Session<'_>, action: Action, yes: bool) -> anyhow::Result<u8> {
    let console = session.console;
    match action {
        Action::Version => {
            console.banner();
            console.colored(&format!("Version: {}", VERSION), Color::Cyan);
        }
        Action::List => match inventory::list_devices(session.hal) {
            Ok(disks) => listing::print_block_devices(console, &disks),
            Err(err) => console.error(&err.to_string()),
        },
        Action::Drives => match inventory::list_devices(session.hal) {
            Ok(disks) => listing::print_drives(console, &disks),
            Err(err) => console.error(&err.to_string()),
        },
        Action::Inspect(partition) => {
            let report = inspect::inspect_partition(session, &partition);
            console.summary("Result", &report);
        }
        Action::Repair(partition) => match repair::repair_flow(session, &partition, yes) {
            Ok(report) => console.json(&report),
            Err(err) => return Ok(err.exit_code()),
        },
        Action::Image {
            source,
            dest,
            mapfile,
        } => match imaging::image(session, &source, Path::new(&dest), &mapfile, yes) {
            Ok(outcome) => console.json(&outcome),
            Err(err) => return Ok(err.exit_code()),
        },
        Action::Interactive => {
            dsk_core::ui::ensure_interactive_terminal()?;
            cancel::install_interrupt_flag(&session.interrupt).context("Failed to install Ctrl+C handler")?;
            log::info!("Launching interactive menu");
            menu::run_menu(session)?;
        }
    }
    Ok(0)
}
