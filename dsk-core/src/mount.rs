//! Mount controller: mount point creation and mount attempts.
//!
//! NTFS always goes through the ntfs-3g driver. Mount points are created on demand
//! and never removed.

use crate::errors::RepairError;
use crate::report::{run_tool, MOUNT_TIMEOUT};
use dsk_hal::SystemHal;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// Outcome of one mount attempt; failures are data, not errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MountAttempt {
    pub mounted: bool,
    pub mount_point: PathBuf,
    /// Combined stdout/stderr of the mount tool, or why it could not run.
    pub output: String,
}

impl MountAttempt {
    fn failed(mount_point: &Path, output: impl Into<String>) -> Self {
        Self {
            mounted: false,
            mount_point: mount_point.to_path_buf(),
            output: output.into(),
        }
    }
}

/// Mount point suffixes used by the repair flow and the menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MountStage {
    ReadOnly,
    ReadWrite,
    Final,
    Manual,
}

impl MountStage {
    fn suffix(self) -> &'static str {
        match self {
            MountStage::ReadOnly => "ro",
            MountStage::ReadWrite => "rw",
            MountStage::Final => "final",
            MountStage::Manual => "manual",
        }
    }
}

/// `dsk_<basename>_<stage>`, e.g. `dsk_sdb1_ro`.
pub fn mountpoint_name(partition: &str, stage: MountStage) -> String {
    let base = Path::new(partition)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| partition.to_string());
    format!("dsk_{}_{}", base, stage.suffix())
}

/// `<base>/<name>`, or `<base>/dskrepair_<unix-secs>` without a name. The directory is created.
pub fn create_mountpoint(
    hal: &dyn SystemHal,
    base: &Path,
    name: Option<&str>,
) -> dsk_hal::HalResult<PathBuf> {
    let name = match name.filter(|n| !n.is_empty()) {
        Some(name) => name.to_string(),
        None => {
            let secs = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or_default();
            format!("dskrepair_{}", secs)
        }
    };
    let mount_point = base.join(name);
    hal.create_dir_all(&mount_point)?;
    Ok(mount_point)
}

/// Mount `partition` at `mount_point`, creating the directory first.
///
/// `fstype == Some("ntfs")` uses `ntfs-3g` and fails with `ntfs-3g not installed` when the
/// driver is absent. Everything else uses `mount [-t type] [-o opts]`.
pub fn mount(
    hal: &dyn SystemHal,
    partition: &str,
    mount_point: &Path,
    fstype: Option<&str>,
    options: Option<&str>,
) -> MountAttempt {
    if let Err(err) = hal.create_dir_all(mount_point) {
        return MountAttempt::failed(
            mount_point,
            format!("could not create {}: {}", mount_point.display(), err),
        );
    }

    let target = mount_point.to_string_lossy().to_string();
    let (program, mut args): (&str, Vec<&str>) = match fstype {
        Some("ntfs") => {
            if hal.which("ntfs-3g").is_none() {
                return MountAttempt::failed(
                    mount_point,
                    RepairError::tool_missing("ntfs-3g").to_string(),
                );
            }
            ("ntfs-3g", Vec::new())
        }
        Some(fstype) => ("mount", vec!["-t", fstype]),
        None => ("mount", Vec::new()),
    };
    if let Some(options) = options {
        args.extend(["-o", options]);
    }
    args.extend([partition, target.as_str()]);

    log::debug!("mounting {} at {} via {}", partition, target, program);
    let run = run_tool(hal, program, &args, MOUNT_TIMEOUT);
    MountAttempt {
        mounted: run.succeeded(),
        mount_point: mount_point.to_path_buf(),
        output: run.combined(),
    }
}
