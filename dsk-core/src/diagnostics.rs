//! Per-partition diagnostics: identity (blkid), parent disk, kernel log, SMART health.
//!
//! Only [`identify`] reports failures. The kernel log and health probes degrade to
//! empty or partial data so they never abort a repair flow.

use crate::errors::RepairError;
use crate::report::{run_tool, ToolRun, PROBE_TIMEOUT};
use dsk_hal::{ensure_success, SystemHal};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Serialize, Serializer};
use std::path::Path;

/// Kernel log lines kept per device.
pub const KERNEL_LOG_LINES: usize = 200;

static BLKID_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(\w+)=(?:"([^"]*)"|(\S+))"#).expect("static regex")
});

static PARTITION_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(/dev/.+?)(p?\d+)$").expect("static regex"));

/// blkid key/value pairs in the order blkid printed them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceIdentity {
    fields: Vec<(String, String)>,
}

impl DeviceIdentity {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Filesystem type (`TYPE`), e.g. `ext4`, `ntfs`, `exfat`.
    pub fn fstype(&self) -> Option<&str> {
        self.get("TYPE").filter(|t| !t.is_empty())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl Serialize for DeviceIdentity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.iter())
    }
}

/// Parse `blkid` output: `/dev/sdb1: UUID="ABCD" TYPE="ext4" LABEL="My Data"`.
///
/// The `<device>:` prefix is optional. Tokens that are not `KEY=value` are skipped.
pub fn parse_blkid(output: &str) -> DeviceIdentity {
    let text = output.trim();
    let body = match text.split_once(':') {
        Some((head, rest)) if !head.contains('=') => rest,
        _ => text,
    };

    let mut fields: Vec<(String, String)> = Vec::new();
    for caps in BLKID_TOKEN.captures_iter(body) {
        let key = caps[1].to_string();
        let value = caps
            .get(2)
            .or_else(|| caps.get(3))
            .map(|m| m.as_str().trim_matches('"').to_string())
            .unwrap_or_default();
        match fields.iter_mut().find(|(k, _)| *k == key) {
            Some(existing) => existing.1 = value,
            None => fields.push((key, value)),
        }
    }
    DeviceIdentity { fields }
}

/// Run `blkid <device>` and parse the result.
pub fn identify(hal: &dyn SystemHal, device: &str) -> Result<DeviceIdentity, RepairError> {
    if !device.starts_with("/dev/") {
        return Err(RepairError::InvalidTarget(device.to_string()));
    }
    let output = hal
        .command_output("blkid", &[device], Some(PROBE_TIMEOUT))
        .and_then(|out| ensure_success("blkid", out))
        .map_err(|e| RepairError::invocation("blkid", e))?;
    Ok(parse_blkid(&String::from_utf8_lossy(&output.stdout)))
}

/// Whole-disk path for a partition: `/dev/sdb2` -> `/dev/sdb`, `/dev/nvme0n1p3` -> `/dev/nvme0n1`.
pub fn parent_disk(partition: &str) -> Option<String> {
    PARTITION_SUFFIX
        .captures(partition)
        .map(|caps| caps[1].to_string())
}

/// True only for an existing block device node under `/dev/`.
pub fn validate_device_input(hal: &dyn SystemHal, path: &str) -> bool {
    let p = Path::new(path);
    path.starts_with("/dev/") && hal.path_exists(p) && hal.is_block_device(p)
}

/// Last [`KERNEL_LOG_LINES`] dmesg lines mentioning the device's base name.
pub fn recent_kernel_log(hal: &dyn SystemHal, device: &str) -> String {
    let name = match Path::new(device).file_name() {
        Some(name) => name.to_string_lossy().to_string(),
        None => return String::new(),
    };

    let output = match hal.command_output("dmesg", &[], Some(PROBE_TIMEOUT)) {
        Ok(output) => output,
        Err(err) => {
            log::warn!("dmesg unavailable: {}", err);
            return String::new();
        }
    };

    let text = format!(
        "{}\n{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
    let lines: Vec<&str> = text.lines().filter(|l| l.contains(&name)).collect();
    let start = lines.len().saturating_sub(KERNEL_LOG_LINES);
    lines[start..].join("\n")
}

/// SMART summary for a whole disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum HealthReport {
    NotInstalled,
    Queried {
        #[serde(rename = "-H")]
        health: ToolRun,
        #[serde(rename = "-i")]
        info: ToolRun,
    },
}

/// Run `smartctl -H` and `smartctl -i` against `device`; absent smartctl is not an error.
pub fn health_check(hal: &dyn SystemHal, device: &str) -> HealthReport {
    if hal.which("smartctl").is_none() {
        log::warn!("smartctl not installed; skipping health check for {}", device);
        return HealthReport::NotInstalled;
    }
    HealthReport::Queried {
        health: run_tool(hal, "smartctl", &["-H", device], PROBE_TIMEOUT),
        info: run_tool(hal, "smartctl", &["-i", device], PROBE_TIMEOUT),
    }
}
