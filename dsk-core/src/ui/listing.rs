//! Tabular views of the block device inventory.

use crate::inventory::{self, Disk, Partition};
use crate::ui::style::{emoji, with, Console};
use crossterm::style::Color;

fn or_dash(value: Option<&str>) -> &str {
    value.unwrap_or("-")
}

fn size_or_dash(size: &str) -> &str {
    if size.is_empty() {
        "-"
    } else {
        size
    }
}

pub fn disk_line(disk: &Disk) -> String {
    format!(
        "{:<17} {:<6} SIZE:{:<10} MODEL:{}",
        disk.path,
        or_dash(Some(disk.kind.as_str()).filter(|k| !k.is_empty())),
        size_or_dash(&disk.size),
        or_dash(disk.model.as_deref())
    )
}

pub fn partition_line(part: &Partition) -> String {
    format!(
        "  - {:<15} FS:{:<8} SIZE:{:<10} MOUNT:{:<15} LABEL:{}",
        part.path,
        or_dash(part.fstype.as_deref()),
        size_or_dash(&part.size),
        or_dash(part.mountpoint.as_deref()),
        or_dash(part.label.as_deref())
    )
}

/// Picker row: `3) /dev/sdb1  FS:ext4    SIZE:14.9G     MOUNT:-`.
pub fn picker_line(index: usize, part: &Partition) -> String {
    format!(
        "{}) {}  FS:{:<6}  SIZE:{:<8}  MOUNT:{}",
        index,
        part.path,
        or_dash(part.fstype.as_deref()),
        size_or_dash(&part.size),
        or_dash(part.mountpoint.as_deref())
    )
}

/// Every device with its partitions indented underneath.
pub fn print_block_devices(console: &Console, disks: &[Disk]) {
    console.header(&with(emoji::DISK, "Block Devices"));
    for disk in disks {
        console.colored(&disk_line(disk), Color::Cyan);
        for part in &disk.partitions {
            console.colored(&partition_line(part), Color::Green);
        }
    }
}

/// Whole disks only, or a warning when there are none.
pub fn print_drives(console: &Console, disks: &[Disk]) {
    console.header(&with(emoji::DISK, "Available Drives"));
    let drives = inventory::drives(disks);
    if drives.is_empty() {
        console.warn("No block disks found");
        return;
    }
    for disk in drives {
        console.colored(
            &format!(
                "{:<17} SIZE:{:<10} MODEL:{}",
                disk.path,
                size_or_dash(&disk.size),
                or_dash(disk.model.as_deref())
            ),
            Color::Green,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::parse_lsblk_json;

    const LSBLK: &str = r#"{"blockdevices":[
        {"name":"sda","size":"931.5G","type":"disk","model":"WDC WD10",
         "children":[{"name":"sda1","fstype":"ntfs","size":"931.5G","type":"part","label":"Games"}]},
        {"name":"loop0","size":"4K","type":"loop"}
    ]}"#;

    #[test]
    fn block_listing_shows_partitions_under_their_disk() {
        let console = Console::capturing();
        print_block_devices(&console, &parse_lsblk_json(LSBLK).unwrap());

        let lines = console.lines();
        let sda = lines.iter().position(|l| l.starts_with("/dev/sda ")).unwrap();
        assert!(lines[sda].contains("MODEL:WDC WD10"));
        assert!(lines[sda + 1].starts_with("  - /dev/sda1"));
        assert!(lines[sda + 1].contains("FS:ntfs"));
        assert!(lines[sda + 1].contains("MOUNT:-"));
        assert!(lines[sda + 1].ends_with("LABEL:Games"));
        assert!(console.contains("/dev/loop0"));
    }

    #[test]
    fn drive_listing_skips_loops() {
        let console = Console::capturing();
        print_drives(&console, &parse_lsblk_json(LSBLK).unwrap());
        assert!(console.contains("/dev/sda"));
        assert!(!console.contains("/dev/loop0"));
    }

    #[test]
    fn drive_listing_warns_when_empty() {
        let console = Console::capturing();
        print_drives(&console, &[]);
        assert!(console.contains("No block disks found"));
    }

    #[test]
    fn picker_line_is_numbered() {
        let disks = parse_lsblk_json(LSBLK).unwrap();
        let line = picker_line(1, &disks[0].partitions[0]);
        assert!(line.starts_with("1) /dev/sda1  FS:ntfs"));
        assert!(line.ends_with("MOUNT:-"));
    }
}
