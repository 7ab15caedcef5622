//! Block device inventory built from `lsblk -J`.
//!
//! Everything here is rebuilt on each call; nothing is cached between menu actions.

use crate::errors::RepairError;
use crate::report::PROBE_TIMEOUT;
use dsk_hal::{ensure_success, SystemHal};
use serde::{Deserialize, Deserializer, Serialize};

const LSBLK_COLUMNS: &str = "NAME,FSTYPE,SIZE,TYPE,MOUNTPOINT,LABEL,UUID,MODEL";

/// A whole block device with its partitions in lsblk order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Disk {
    pub path: String,
    pub name: String,
    /// lsblk `TYPE`: `disk`, `loop`, `rom`, ...
    pub kind: String,
    pub size: String,
    pub model: Option<String>,
    pub partitions: Vec<Partition>,
}

impl Disk {
    pub fn is_drive(&self) -> bool {
        self.kind == "disk"
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Partition {
    pub path: String,
    pub name: String,
    pub fstype: Option<String>,
    pub size: String,
    /// `None` means not mounted.
    pub mountpoint: Option<String>,
    pub label: Option<String>,
    pub uuid: Option<String>,
}

impl Partition {
    pub fn is_mounted(&self) -> bool {
        self.mountpoint.is_some()
    }
}

#[derive(Debug, Deserialize)]
struct LsblkOutput {
    blockdevices: Vec<LsblkDevice>,
}

#[derive(Debug, Deserialize)]
struct LsblkDevice {
    name: String,
    #[serde(default)]
    fstype: Option<String>,
    #[serde(default, deserialize_with = "size_text")]
    size: Option<String>,
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    mountpoint: Option<String>,
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    uuid: Option<String>,
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    children: Option<Vec<LsblkDevice>>,
}

/// lsblk prints sizes as strings (`"931.5G"`), or as numbers with `--bytes` on some versions.
fn size_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Size {
        Text(String),
        Bytes(u64),
    }

    Ok(Option::<Size>::deserialize(deserializer)?.map(|size| match size {
        Size::Text(text) => text,
        Size::Bytes(bytes) => bytes.to_string(),
    }))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn dev_path(name: &str) -> String {
    if name.starts_with("/dev/") {
        name.to_string()
    } else {
        format!("/dev/{}", name)
    }
}

impl From<LsblkDevice> for Partition {
    fn from(dev: LsblkDevice) -> Self {
        Partition {
            path: dev_path(&dev.name),
            name: dev.name,
            fstype: non_empty(dev.fstype),
            size: dev.size.unwrap_or_default(),
            mountpoint: non_empty(dev.mountpoint),
            label: non_empty(dev.label),
            uuid: non_empty(dev.uuid),
        }
    }
}

impl From<LsblkDevice> for Disk {
    fn from(dev: LsblkDevice) -> Self {
        let partitions = dev
            .children
            .unwrap_or_default()
            .into_iter()
            .map(Partition::from)
            .collect();
        Disk {
            path: dev_path(&dev.name),
            name: dev.name,
            kind: dev.kind.unwrap_or_default(),
            size: dev.size.unwrap_or_default(),
            model: non_empty(dev.model),
            partitions,
        }
    }
}

/// Parse `lsblk -J` output into disks and their partitions.
pub fn parse_lsblk_json(json: &str) -> Result<Vec<Disk>, RepairError> {
    let parsed: LsblkOutput = serde_json::from_str(json).map_err(|e| RepairError::Parse {
        tool: "lsblk".to_string(),
        reason: e.to_string(),
    })?;
    Ok(parsed.blockdevices.into_iter().map(Disk::from).collect())
}

/// Enumerate block devices. Fails when lsblk is missing, exits non-zero, or prints garbage.
pub fn list_devices(hal: &dyn SystemHal) -> Result<Vec<Disk>, RepairError> {
    let args = ["-J", "-o", LSBLK_COLUMNS];
    log::debug!("running lsblk {}", args.join(" "));
    let output = hal
        .command_output("lsblk", &args, Some(PROBE_TIMEOUT))
        .and_then(|out| ensure_success("lsblk", out))
        .map_err(|e| RepairError::invocation("lsblk", e))?;
    parse_lsblk_json(&String::from_utf8_lossy(&output.stdout))
}

/// Whole disks only (lsblk type `disk`).
pub fn drives(disks: &[Disk]) -> Vec<&Disk> {
    disks.iter().filter(|d| d.is_drive()).collect()
}

/// Every partition of every device, in listing order.
pub fn partitions(disks: &[Disk]) -> Vec<&Partition> {
    disks.iter().flat_map(|d| d.partitions.iter()).collect()
}

/// Partitions carrying a filesystem that are not mounted anywhere.
pub fn unmounted_partitions(disks: &[Disk]) -> Vec<&Partition> {
    partitions(disks)
        .into_iter()
        .filter(|p| p.fstype.is_some() && !p.is_mounted())
        .collect()
}
