//! Conservative repair flow.
//!
//! Read-only mount first; a repair tool only runs when that fails. Destructive passes need
//! `auto_yes` or an explicit "yes" from the operator. The one exception is the `fsck.vfat`
//! fallback for exFAT/FAT, which has no dry-run mode and is flagged in the report.
//!
//! A Ctrl+C is checked after every tool run; once raised, the flow ends with
//! [`RepairOutcome::Interrupted`] before the next repair or mount step.

use crate::diagnostics::{self, HealthReport};
use crate::errors::RepairError;
use crate::logging;
use crate::mount::{self, mountpoint_name, MountAttempt, MountStage};
use crate::report::{run_to_completion, ToolRun};
use crate::session::Session;
use crate::ui::confirm::approve;
use serde::Serialize;
use std::path::{Path, PathBuf};

pub const CHKDSK_RECOMMENDATION: &str =
    "Connect the disk to Windows and run chkdsk /f /r";
pub const UNSUPPORTED_NOTE: &str =
    "unsupported fs or unknown type; consider imaging the device with ddrescue";
pub const VFAT_FALLBACK_NOTE: &str = "used fsck.vfat fallback (no dry-run available)";

/// What the filesystem-specific repair step did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum FsRepair {
    ToolMissing { tool: String },
    /// The non-destructive check passed; no destructive pass ran.
    Clean { dry_run: ToolRun },
    /// A repair tool ran (with confirmation, or `ntfsfix` which never asks).
    Ran { run: ToolRun },
    /// `fsck.vfat` ran directly because `fsck.exfat` is missing.
    FallbackUsed { run: ToolRun, note: String },
}

/// Terminal state of a repair flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RepairOutcome {
    /// Not an existing block device under `/dev/`. Nothing ran.
    InvalidTarget { error: String },
    /// The read-only mount worked, so no repair tool was run.
    MountedReadOnly { mount: MountAttempt },
    RepairAttempted {
        ro_mount: MountAttempt,
        repair: FsRepair,
        mount: MountAttempt,
        #[serde(skip_serializing_if = "Option::is_none")]
        recommendation: Option<String>,
    },
    /// The operator refused the destructive pass; the device is left unmounted.
    Declined {
        ro_mount: MountAttempt,
        dry_run: ToolRun,
    },
    /// No repair tool for this filesystem type.
    Unsupported {
        ro_mount: MountAttempt,
        note: String,
        mount: MountAttempt,
    },
    /// Ctrl+C arrived; nothing after `after` ran.
    Interrupted { after: String },
}

/// Best-effort facts about the parent disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParentDiagnostics {
    pub disk: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kernel_log: Option<String>,
    pub health: HealthReport,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepairReport {
    pub partition: String,
    pub timestamp: String,
    pub fstype: Option<String>,
    #[serde(flatten)]
    pub outcome: RepairOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostics: Option<ParentDiagnostics>,
    /// Last-chance plain mount made by [`repair_and_mount`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_mount: Option<MountAttempt>,
}

impl RepairReport {
    /// Where the partition ended up mounted, if anywhere.
    pub fn mounted_at(&self) -> Option<&Path> {
        let from_flow = match &self.outcome {
            RepairOutcome::MountedReadOnly { mount }
            | RepairOutcome::RepairAttempted { mount, .. }
            | RepairOutcome::Unsupported { mount, .. } => Some(mount),
            RepairOutcome::InvalidTarget { .. }
            | RepairOutcome::Declined { .. }
            | RepairOutcome::Interrupted { .. } => None,
        };
        from_flow
            .into_iter()
            .chain(self.final_mount.as_ref())
            .find(|m| m.mounted)
            .map(|m| m.mount_point.as_path())
    }
}

enum Step {
    Done(FsRepair),
    Declined(ToolRun),
    /// Ctrl+C after the named command.
    Interrupted(String),
}

/// True once Ctrl+C was pressed; logs where the flow stopped.
fn stop_requested(session: &Session<'_>, partition: &str, after: &str) -> bool {
    if !session.interrupt.is_raised() {
        return false;
    }
    session
        .console
        .warn(&format!("Interrupted after {}; no further steps will run.", after));
    session
        .log
        .append(&format!("interrupted {} after {}", partition, after));
    true
}

fn ask(session: &Session<'_>, auto_yes: bool, prompt: &str) -> bool {
    match approve(session.prompter, auto_yes, prompt) {
        Ok(answer) => answer,
        Err(err) => {
            log::warn!("no answer to {:?}: {}", prompt, err);
            false
        }
    }
}

fn tool_missing(session: &Session<'_>, tool: &str) -> FsRepair {
    session
        .console
        .warn(&RepairError::tool_missing(tool).to_string());
    FsRepair::ToolMissing {
        tool: tool.to_string(),
    }
}

fn repair_ntfs(session: &Session<'_>, partition: &str) -> FsRepair {
    if session.hal.which("ntfsfix").is_none() {
        return tool_missing(session, "ntfsfix");
    }
    session.log.append(&format!("ntfsfix start {}", partition));
    FsRepair::Ran {
        run: run_to_completion(session.hal, "ntfsfix", &[partition]),
    }
}

fn repair_extfs(session: &Session<'_>, partition: &str, auto_yes: bool) -> Step {
    if session.hal.which("e2fsck").is_none() {
        return Step::Done(tool_missing(session, "e2fsck"));
    }

    session.log.append(&format!("e2fsck -n {}", partition));
    let dry_run = run_to_completion(session.hal, "e2fsck", &["-n", partition]);
    if stop_requested(session, partition, &dry_run.command) {
        return Step::Interrupted(dry_run.command);
    }
    if dry_run.out.to_lowercase().contains("clean") || dry_run.succeeded() {
        session.console.success("Filesystem appears clean");
        return Step::Done(FsRepair::Clean { dry_run });
    }

    let confirmed = ask(session, auto_yes, "Run e2fsck -f -y to attempt repairs?");
    if stop_requested(session, partition, &dry_run.command) {
        return Step::Interrupted(dry_run.command);
    }
    if !confirmed {
        session.log.append(&format!("e2fsck declined {}", partition));
        return Step::Declined(dry_run);
    }
    session.log.append(&format!("e2fsck -f -y {}", partition));
    let run = run_to_completion(session.hal, "e2fsck", &["-f", "-y", partition]);
    if stop_requested(session, partition, &run.command) {
        return Step::Interrupted(run.command);
    }
    Step::Done(FsRepair::Ran { run })
}

fn repair_exfat(session: &Session<'_>, partition: &str, auto_yes: bool) -> Step {
    if session.hal.which("fsck.exfat").is_some() {
        session.log.append(&format!("fsck.exfat -n {}", partition));
        let dry_run = run_to_completion(session.hal, "fsck.exfat", &["-n", partition]);
        if stop_requested(session, partition, &dry_run.command) {
            return Step::Interrupted(dry_run.command);
        }
        let confirmed = ask(session, auto_yes, "Run fsck.exfat to repair?");
        if stop_requested(session, partition, &dry_run.command) {
            return Step::Interrupted(dry_run.command);
        }
        if !confirmed {
            session.log.append(&format!("fsck.exfat declined {}", partition));
            return Step::Declined(dry_run);
        }
        session.log.append(&format!("fsck.exfat {}", partition));
        let run = run_to_completion(session.hal, "fsck.exfat", &[partition]);
        if stop_requested(session, partition, &run.command) {
            return Step::Interrupted(run.command);
        }
        return Step::Done(FsRepair::Ran { run });
    }

    if session.hal.which("fsck.vfat").is_some() {
        session.console.warn("fsck.exfat not found; running fsck.vfat (no dry-run)");
        session.log.append(&format!("fsck.vfat {}", partition));
        let run = run_to_completion(session.hal, "fsck.vfat", &[partition]);
        if stop_requested(session, partition, &run.command) {
            return Step::Interrupted(run.command);
        }
        return Step::Done(FsRepair::FallbackUsed {
            run,
            note: VFAT_FALLBACK_NOTE.to_string(),
        });
    }

    Step::Done(tool_missing(session, "fsck.exfat/fsck.vfat"))
}

fn mount_point(session: &Session<'_>, partition: &str, stage: MountStage) -> PathBuf {
    session
        .config
        .mount_base
        .join(mountpoint_name(partition, stage))
}

fn mount_read_write(session: &Session<'_>, partition: &str, fstype: Option<&str>) -> MountAttempt {
    let mp = mount_point(session, partition, MountStage::ReadWrite);
    // Only NTFS needs its own driver; everything else lets mount(8) probe.
    let driver = fstype.filter(|t| *t == "ntfs");
    let attempt = mount::mount(session.hal, partition, &mp, driver, None);
    if attempt.mounted {
        session
            .console
            .success(&format!("Mounted at {}", mp.display()));
    } else {
        session.console.error("Mount after repair failed.");
    }
    attempt
}

fn parent_diagnostics(session: &Session<'_>, partition: &str) -> Option<ParentDiagnostics> {
    let disk = diagnostics::parent_disk(partition)?;
    let kernel_log = Some(diagnostics::recent_kernel_log(session.hal, &disk)).filter(|l| !l.is_empty());
    let health = diagnostics::health_check(session.hal, &disk);
    Some(ParentDiagnostics {
        disk,
        kernel_log,
        health,
    })
}

/// Run the conservative repair flow against one partition.
///
/// Only [`RepairError::PrivilegeRequired`] is returned as an error, before anything runs.
pub fn repair_flow(
    session: &Session<'_>,
    partition: &str,
    auto_yes: bool,
) -> Result<RepairReport, RepairError> {
    session.require_root()?;
    session.console.header(&format!("Repair Flow: {}", partition));

    let mut report = RepairReport {
        partition: partition.to_string(),
        timestamp: logging::timestamp(),
        fstype: None,
        outcome: RepairOutcome::InvalidTarget {
            error: String::new(),
        },
        diagnostics: None,
        final_mount: None,
    };

    if !diagnostics::validate_device_input(session.hal, partition) {
        let error = RepairError::InvalidTarget(partition.to_string()).to_string();
        session.console.error(&error);
        report.outcome = RepairOutcome::InvalidTarget { error };
        return Ok(report);
    }

    report.fstype = match diagnostics::identify(session.hal, partition) {
        Ok(identity) => identity.fstype().map(str::to_string),
        Err(err) => {
            log::warn!("could not identify {}: {}", partition, err);
            None
        }
    };
    if stop_requested(session, partition, "blkid") {
        report.outcome = RepairOutcome::Interrupted {
            after: "blkid".to_string(),
        };
        return Ok(report);
    }
    let fstype = report.fstype.clone();
    session.console.info(&format!(
        "Detected filesystem: {}",
        fstype.as_deref().unwrap_or("-")
    ));

    let ro_mp = mount_point(session, partition, MountStage::ReadOnly);
    session
        .console
        .info(&format!("Attempting read-only mount at {} ...", ro_mp.display()));
    let ro_mount = mount::mount(session.hal, partition, &ro_mp, None, Some("ro"));
    if ro_mount.mounted {
        session
            .console
            .success(&format!("Mounted read-only at {}", ro_mp.display()));
        report.outcome = RepairOutcome::MountedReadOnly { mount: ro_mount };
        return Ok(report);
    }
    session.log.append(&format!(
        "mount_ro_failed {}: {}",
        partition,
        ro_mount.output.trim()
    ));
    session.console.error("Read-only mount failed.");
    if stop_requested(session, partition, "read-only mount") {
        report.outcome = RepairOutcome::Interrupted {
            after: "read-only mount".to_string(),
        };
        return Ok(report);
    }

    let outcome = match fstype.as_deref() {
        Some("ntfs") => {
            session.console.info("Running ntfsfix (conservative)...");
            let repair = repair_ntfs(session, partition);
            if stop_requested(session, partition, "ntfsfix") {
                report.outcome = RepairOutcome::Interrupted {
                    after: "ntfsfix".to_string(),
                };
                return Ok(report);
            }
            let mount = mount_read_write(session, partition, Some("ntfs"));
            let recommendation = (!mount.mounted).then(|| {
                session
                    .console
                    .warn(&format!("Recommendation: {}", CHKDSK_RECOMMENDATION));
                CHKDSK_RECOMMENDATION.to_string()
            });
            RepairOutcome::RepairAttempted {
                ro_mount,
                repair,
                mount,
                recommendation,
            }
        }
        Some(kind @ ("ext2" | "ext3" | "ext4" | "exfat" | "vfat")) => {
            let step = if kind.starts_with("ext") {
                session.console.info("Running e2fsck (conservative)...");
                repair_extfs(session, partition, auto_yes)
            } else {
                session.console.info("Running exFAT/FAT repair helper...");
                repair_exfat(session, partition, auto_yes)
            };
            match step {
                Step::Done(repair) => RepairOutcome::RepairAttempted {
                    ro_mount,
                    repair,
                    mount: mount_read_write(session, partition, fstype.as_deref()),
                    recommendation: None,
                },
                Step::Declined(dry_run) => {
                    session
                        .console
                        .warn("Destructive repair declined; partition left unmounted.");
                    RepairOutcome::Declined { ro_mount, dry_run }
                }
                Step::Interrupted(after) => {
                    report.outcome = RepairOutcome::Interrupted { after };
                    return Ok(report);
                }
            }
        }
        _ => {
            session.console.warn(
                "Unknown or unsupported filesystem type. Consider imaging with ddrescue.",
            );
            RepairOutcome::Unsupported {
                ro_mount,
                note: UNSUPPORTED_NOTE.to_string(),
                mount: mount_read_write(session, partition, fstype.as_deref()),
            }
        }
    };
    report.outcome = outcome;

    if session.interrupt.is_raised() {
        return Ok(report);
    }
    report.diagnostics = parent_diagnostics(session, partition);
    Ok(report)
}

/// Repair with pre-authorization, then make one plain mount attempt if still unmounted.
pub fn repair_and_mount(
    session: &Session<'_>,
    partition: &str,
) -> Result<RepairReport, RepairError> {
    let mut report = repair_flow(session, partition, true)?;
    if matches!(
        report.outcome,
        RepairOutcome::InvalidTarget { .. } | RepairOutcome::Interrupted { .. }
    ) {
        return Ok(report);
    }

    if let Some(mp) = report.mounted_at() {
        session
            .console
            .success(&format!("Mounted at {}", mp.display()));
        return Ok(report);
    }

    let mp = mount_point(session, partition, MountStage::Final);
    let attempt = mount::mount(session.hal, partition, &mp, None, None);
    if attempt.mounted {
        session
            .console
            .success(&format!("Mounted {} at {}", partition, mp.display()));
    } else {
        session.console.error(&format!(
            "Final mount attempt failed: {}",
            attempt.output.trim()
        ));
    }
    report.final_mount = Some(attempt);
    Ok(report)
}
