//! CLI argument parsing for dsk-repair
//!
//! Makes the interactive menu the default entry point when no action flag is provided.

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "dsk-repair")]
#[command(about = "DSK Repair - Intelligent Disk Repair Utility")]
#[command(long_about = "DSK Repair - Intelligent Disk Repair Utility\n\n\
    Detects, inspects and conservatively repairs Linux partitions using the\n\
    system's own tools (lsblk, blkid, e2fsck, ntfsfix, fsck.exfat, ddrescue).\n\n\
    Run without action flags to launch the interactive menu.")]
#[command(disable_version_flag = true)]
pub struct Cli {
    /// Show version
    #[arg(long)]
    pub version: bool,

    /// List block devices
    #[arg(long)]
    pub list: bool,

    /// List only drives (whole disks)
    #[arg(long)]
    pub drives: bool,

    /// Inspect a partition (e.g., /dev/sdb2)
    #[arg(long, value_name = "PART")]
    pub inspect: Option<String>,

    /// Repair a partition (requires root)
    #[arg(long, value_name = "PART")]
    pub repair: Option<String>,

    /// Create image of SRC to DEST using ddrescue (requires root)
    #[arg(long, num_args = 2, value_names = ["SRC", "DEST"])]
    pub image: Option<Vec<String>>,

    /// Mapfile for ddrescue (used with --image, defaults to DEST.map)
    #[arg(long, value_name = "PATH")]
    pub mapfile: Option<PathBuf>,

    /// Assume yes to prompts
    #[arg(long)]
    pub yes: bool,

    /// Append-only repair log (default: /var/log/dsk_repair.log)
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Directory where mount points are created (default: /mnt)
    #[arg(long, value_name = "DIR")]
    pub mount_base: Option<PathBuf>,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,
}

/// The single action a one-shot invocation performs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Version,
    List,
    Drives,
    Inspect(String),
    Repair(String),
    Image {
        source: String,
        dest: String,
        mapfile: PathBuf,
    },
    Interactive,
}

impl Cli {
    /// Resolve the requested action. Flags are checked in the same order as the help text.
    pub fn action(&self) -> Action {
        if self.version {
            return Action::Version;
        }
        if self.list {
            return Action::List;
        }
        if self.drives {
            return Action::Drives;
        }
        if let Some(part) = &self.inspect {
            return Action::Inspect(part.clone());
        }
        if let Some(part) = &self.repair {
            return Action::Repair(part.clone());
        }
        if let Some([source, dest]) = self.image.as_deref() {
            let mapfile = self
                .mapfile
                .clone()
                .unwrap_or_else(|| default_mapfile(dest));
            return Action::Image {
                source: source.clone(),
                dest: dest.clone(),
                mapfile,
            };
        }
        Action::Interactive
    }
}

/// `DEST.map`, next to the image.
pub fn default_mapfile(dest: &str) -> PathBuf {
    PathBuf::from(format!("{}.map", dest))
}
