//! Read-only inspection of a partition and its parent disk.

use crate::diagnostics::{self, DeviceIdentity, HealthReport};
use crate::session::Session;
use crate::ui::style::{emoji, with};
use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InspectReport {
    pub partition: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blkid: Option<DeviceIdentity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kernel_log: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub health: Option<HealthReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Print blkid data, recent kernel messages and the SMART summary for `partition`.
///
/// Nothing here needs root; unavailable pieces are simply left out.
pub fn inspect_partition(session: &Session<'_>, partition: &str) -> InspectReport {
    let console = session.console;
    console.header(&with(emoji::SEARCH, &format!("Inspect: {}", partition)));

    let mut report = InspectReport {
        partition: partition.to_string(),
        ..InspectReport::default()
    };
    if !partition.starts_with("/dev/") {
        console.error("Invalid partition string");
        report.error = Some("invalid partition".to_string());
        return report;
    }

    match diagnostics::identify(session.hal, partition) {
        Ok(identity) => {
            console.json(&identity);
            report.blkid = Some(identity);
        }
        Err(err) => {
            console.json(&serde_json::json!({ "error": err.to_string() }));
            report.error = Some(err.to_string());
        }
    }

    let Some(parent) = diagnostics::parent_disk(partition) else {
        console.warn("Could not determine parent disk");
        return report;
    };

    console.info(&format!("Recent dmesg lines for {}:", parent));
    let kernel_log = diagnostics::recent_kernel_log(session.hal, &parent);
    if kernel_log.is_empty() {
        console.warn("No dmesg lines found for this device.");
    } else {
        console.line(&kernel_log);
        report.kernel_log = Some(kernel_log);
    }

    console.info(&format!("SMART summary for {}:", parent));
    let health = diagnostics::health_check(session.hal, &parent);
    console.json(&health);
    report.health = Some(health);
    report.parent = Some(parent);
    report
}
