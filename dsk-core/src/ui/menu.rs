//! Interactive menu loop and partition picker.

use crate::cli::default_mapfile;
use crate::errors::Result;
use crate::imaging;
use crate::inspect::inspect_partition;
use crate::inventory::{self, Partition};
use crate::mount::{self, create_mountpoint, mountpoint_name, MountStage};
use crate::repair::{self, repair_flow};
use crate::session::Session;
use crate::ui::cancel;
use crate::ui::listing::{self, picker_line};
use crossterm::style::Color;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    ListDevices,
    ListDrives,
    Inspect,
    Repair,
    RepairAndMount,
    Image,
    ManualMount,
    Exit,
}

impl MenuChoice {
    pub const ALL: [MenuChoice; 8] = [
        MenuChoice::ListDevices,
        MenuChoice::ListDrives,
        MenuChoice::Inspect,
        MenuChoice::Repair,
        MenuChoice::RepairAndMount,
        MenuChoice::Image,
        MenuChoice::ManualMount,
        MenuChoice::Exit,
    ];

    pub fn label(self) -> &'static str {
        match self {
            MenuChoice::ListDevices => "List all block devices",
            MenuChoice::ListDrives => "List drives (whole disks)",
            MenuChoice::Inspect => "Inspect a partition",
            MenuChoice::Repair => "Repair a partition",
            MenuChoice::RepairAndMount => "Repair and Mount a partition",
            MenuChoice::Image => "Create disk image with ddrescue",
            MenuChoice::ManualMount => "Mount a partition manually",
            MenuChoice::Exit => "Exit",
        }
    }

    /// Message shown when a root-only entry is picked without root.
    fn root_message(self) -> Option<&'static str> {
        match self {
            MenuChoice::Repair | MenuChoice::RepairAndMount => {
                Some("Repairing requires root. Re-run with sudo.")
            }
            MenuChoice::Image => Some("Imaging requires root. Re-run with sudo."),
            MenuChoice::ManualMount => Some("Mounting requires root. Re-run with sudo."),
            _ => None,
        }
    }
}

/// What the operator typed at the partition picker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickerInput {
    Cancel,
    /// Zero-based index into the listed partitions.
    Pick(usize),
    NotANumber,
    OutOfRange,
}

/// Interpret one line of picker input for a list of `count` partitions (numbered from 1).
pub fn parse_picker_input(input: &str, count: usize) -> PickerInput {
    let input = input.trim();
    if matches!(input.to_lowercase().as_str(), "q" | "quit" | "exit") {
        return PickerInput::Cancel;
    }
    if input.is_empty() || !input.chars().all(|c| c.is_ascii_digit()) {
        return PickerInput::NotANumber;
    }
    match input.parse::<usize>() {
        Ok(n) if (1..=count).contains(&n) => PickerInput::Pick(n - 1),
        _ => PickerInput::OutOfRange,
    }
}

/// List every partition and ask for one. `None` when cancelled or nothing is listed.
pub fn choose_partition(session: &Session<'_>, prompt: &str) -> Result<Option<String>> {
    let console = session.console;
    let disks = match inventory::list_devices(session.hal) {
        Ok(disks) => disks,
        Err(err) => {
            console.error(&format!("Failed to list block devices: {}", err));
            return Ok(None);
        }
    };
    let partitions: Vec<&Partition> = inventory::partitions(&disks);

    console.info(prompt);
    for (idx, part) in partitions.iter().enumerate() {
        console.line(&picker_line(idx + 1, part));
    }
    if partitions.is_empty() {
        console.warn("No partitions available");
        return Ok(None);
    }

    loop {
        let answer = session.prompter.input("Enter number (or 'q' to cancel)")?;
        match parse_picker_input(&answer, partitions.len()) {
            PickerInput::Cancel => return Ok(None),
            PickerInput::Pick(idx) => return Ok(Some(partitions[idx].path.clone())),
            PickerInput::NotANumber => console.warn("Please enter a valid number"),
            PickerInput::OutOfRange => console.warn("Choice out of range"),
        }
    }
}

/// Startup scan: list unmounted partitions that carry a filesystem and offer repairs (root only).
pub fn detect_unmounted_partitions(session: &Session<'_>) -> Result<()> {
    let console = session.console;
    let disks = match inventory::list_devices(session.hal) {
        Ok(disks) => disks,
        Err(err) => {
            console.error(&format!("Failed to list block devices: {}", err));
            return Ok(());
        }
    };
    let unmounted: Vec<String> = inventory::unmounted_partitions(&disks)
        .into_iter()
        .map(|p| p.path.clone())
        .collect();
    if unmounted.is_empty() {
        return Ok(());
    }

    console.warn("Detected unmounted partitions:");
    for path in &unmounted {
        console.colored(&format!(" - {}", path), Color::Cyan);
    }
    if !session.hal.is_root() {
        console.warn("Not running as root. To attempt repairs now, re-run the tool with sudo.");
        return Ok(());
    }

    for path in &unmounted {
        if session
            .prompter
            .confirm(&format!("Attempt repair on {}?", path))?
        {
            let report = repair_flow(session, path, true)?;
            console.summary("Summary", &report);
            if session.interrupt.is_raised() {
                break;
            }
        }
    }
    Ok(())
}

fn list_devices(session: &Session<'_>, drives_only: bool) {
    match inventory::list_devices(session.hal) {
        Ok(disks) if drives_only => listing::print_drives(session.console, &disks),
        Ok(disks) => listing::print_block_devices(session.console, &disks),
        Err(err) => session.console.error(&err.to_string()),
    }
}

fn image_prompted(session: &Session<'_>) -> Result<()> {
    let prompter = session.prompter;
    let source = prompter.input("Source device (e.g., /dev/sdb)")?;
    let dest = prompter.input("Destination image path (e.g., /path/to/image.img)")?;
    let (source, dest) = (source.trim(), dest.trim());
    if source.is_empty() || dest.is_empty() {
        session.console.warn("Source and destination are required");
        return Ok(());
    }
    let mapfile = prompter.input("Mapfile path [press Enter to use dest + .map]")?;
    let mapfile = match mapfile.trim() {
        "" => default_mapfile(dest),
        path => PathBuf::from(path),
    };

    let outcome = imaging::image(session, source, Path::new(dest), &mapfile, false)?;
    session.console.summary("Result", &outcome);
    Ok(())
}

fn manual_mount(session: &Session<'_>) -> Result<()> {
    let Some(part) = choose_partition(session, "Choose partition to mount")? else {
        return Ok(());
    };
    let base = &session.config.mount_base;
    let answer = session.prompter.input(&format!(
        "Enter mountpoint (leave blank for auto under {})",
        base.display()
    ))?;
    let mount_point = match answer.trim() {
        "" => create_mountpoint(
            session.hal,
            base,
            Some(&mountpoint_name(&part, MountStage::Manual)),
        )?,
        path => PathBuf::from(path),
    };

    let attempt = mount::mount(session.hal, &part, &mount_point, None, None);
    if attempt.mounted {
        session
            .console
            .success(&format!("Mounted {} at {}", part, mount_point.display()));
    } else {
        session
            .console
            .error(&format!("Mount failed:\n{}", attempt.output));
        session
            .console
            .info("Tip: try option 5 to attempt repair then mount.");
    }
    Ok(())
}

/// Run one menu entry. Returns `false` when the operator chose to exit.
pub fn dispatch(session: &Session<'_>, choice: MenuChoice) -> Result<bool> {
    if let Some(message) = choice.root_message() {
        if !session.hal.is_root() {
            session.console.error(message);
            return Ok(true);
        }
    }

    match choice {
        MenuChoice::ListDevices => list_devices(session, false),
        MenuChoice::ListDrives => list_devices(session, true),
        MenuChoice::Inspect => {
            if let Some(part) = choose_partition(session, "Choose partition to inspect")? {
                inspect_partition(session, &part);
            }
        }
        MenuChoice::Repair => {
            if let Some(part) = choose_partition(session, "Choose partition to repair")? {
                let report = repair_flow(session, &part, false)?;
                session.console.summary("Summary", &report);
            }
        }
        MenuChoice::RepairAndMount => {
            if let Some(part) = choose_partition(session, "Choose partition to repair and mount")? {
                let report = repair::repair_and_mount(session, &part)?;
                session.console.summary("Summary", &report);
            }
        }
        MenuChoice::Image => image_prompted(session)?,
        MenuChoice::ManualMount => manual_mount(session)?,
        MenuChoice::Exit => {
            session.console.info("Exiting DSK Repair. Goodbye!");
            return Ok(false);
        }
    }
    Ok(true)
}

/// Banner, startup scan, then the menu until the operator exits.
///
/// Ctrl+C inside an action returns to the menu, as does any other action error. Only a
/// failing menu prompt (closed stdin, no terminal) ends the loop with an error.
pub fn run_menu(session: &Session<'_>) -> Result<()> {
    let console = session.console;
    console.banner();
    match detect_unmounted_partitions(session) {
        Ok(()) if session.interrupt.take() => {
            console.warn("Interrupted by user, returning to menu");
        }
        Ok(()) => {}
        Err(err) if cancel::is_interrupt(&session.interrupt, &err) => {
            console.warn("Interrupted by user, returning to menu");
        }
        Err(err) => return Err(err),
    }

    let items: Vec<String> = MenuChoice::ALL
        .iter()
        .enumerate()
        .map(|(idx, choice)| format!("{}) {}", idx + 1, choice.label()))
        .collect();

    loop {
        console.colored("\n=== DSK Repair Menu ===", Color::Magenta);
        let choice = match session.prompter.select("Select an option [1-8]", &items) {
            Ok(Some(idx)) => MenuChoice::ALL.get(idx).copied().unwrap_or(MenuChoice::Exit),
            Ok(None) => MenuChoice::Exit,
            Err(err) if cancel::is_interrupt(&session.interrupt, &err) => {
                console.warn("Interrupted by user, returning to menu");
                continue;
            }
            Err(err) => return Err(err),
        };

        match dispatch(session, choice) {
            Ok(true) => {}
            Ok(false) => return Ok(()),
            Err(err) if cancel::is_interrupt(&session.interrupt, &err) => {
                console.warn("Interrupted by user, returning to menu");
            }
            Err(err) => console.error(&format!("Unexpected error: {:#}", err)),
        }
        if session.interrupt.take() {
            console.warn("Interrupted by user, returning to menu");
        }
    }
}
