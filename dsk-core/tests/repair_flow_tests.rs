use dsk_core::config::Config;
use dsk_core::repair::{
    repair_and_mount, repair_flow, FsRepair, RepairOutcome, CHKDSK_RECOMMENDATION,
    VFAT_FALLBACK_NOTE,
};
use dsk_core::ui::cancel::Interrupt;
use dsk_core::ui::confirm::{Reply, ScriptedPrompter};
use dsk_core::ui::style::Console;
use dsk_core::{RepairError, Session};
use dsk_hal::{FakeHal, FakeResponse, HalResult, HostOps, Operation, ProcessOps};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Output};
use std::time::Duration;
use tempfile::TempDir;

const PART: &str = "/dev/sdb1";

struct Env {
    hal: FakeHal,
    config: Config,
    console: Console,
    dir: TempDir,
}

impl Env {
    /// Root host with `/dev/sdb1` present and nothing scripted.
    fn new() -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let hal = FakeHal::as_root();
        hal.add_block_device(PART);
        let config = Config {
            log_path: dir.path().join("dsk_repair.log"),
            mount_base: PathBuf::from("/mnt"),
            color: false,
        };
        Self {
            hal,
            config,
            console: Console::capturing(),
            dir,
        }
    }

    /// blkid reports `fstype` and the read-only mount fails.
    fn with_fs(fstype: &str) -> Self {
        let env = Self::new();
        env.hal.script(
            "blkid",
            FakeResponse::ok(format!("{}: UUID=\"0f1e\" TYPE=\"{}\"\n", PART, fstype)),
        );
        env.hal
            .script("mount", FakeResponse::fail(32, "mount: wrong fs type"));
        env
    }

    fn session<'a>(&'a self, prompter: &'a ScriptedPrompter) -> Session<'a> {
        Session::new(&self.hal, &self.config, &self.console, prompter)
    }

    fn repair_log(&self) -> String {
        fs::read_to_string(self.dir.path().join("dsk_repair.log")).unwrap_or_default()
    }
}

fn strings(args: &[&str]) -> Vec<String> {
    args.iter().map(|s| s.to_string()).collect()
}

#[test]
fn read_only_mount_success_never_runs_repair_tools() {
    let env = Env::new();
    env.hal.install("e2fsck");
    env.hal.script("blkid", FakeResponse::ok("/dev/sdb1: TYPE=\"ext4\""));
    let prompter = ScriptedPrompter::new([]);

    let report = repair_flow(&env.session(&prompter), PART, true).expect("report");

    assert!(matches!(report.outcome, RepairOutcome::MountedReadOnly { .. }));
    for tool in ["e2fsck", "ntfsfix", "fsck.exfat", "fsck.vfat"] {
        assert!(!env.hal.was_invoked(tool), "{} must not run", tool);
    }
    assert_eq!(
        env.hal.invocations("mount"),
        vec![strings(&["-o", "ro", PART, "/mnt/dsk_sdb1_ro"])]
    );
}

#[test]
fn invalid_target_touches_nothing() {
    let env = Env::with_fs("ext4");
    let prompter = ScriptedPrompter::new([]);

    let report = repair_flow(&env.session(&prompter), "/dev/sdz9", true).expect("report");

    match &report.outcome {
        RepairOutcome::InvalidTarget { error } => {
            assert_eq!(error, "Invalid partition/device: /dev/sdz9")
        }
        other => panic!("unexpected outcome {:?}", other),
    }
    assert_eq!(env.hal.operation_count(), 0);
    assert_eq!(report.partition, "/dev/sdz9");
}

#[test]
fn non_root_is_rejected_before_any_call() {
    let env = Env::with_fs("ext4");
    env.hal.set_root(false);
    let prompter = ScriptedPrompter::new([]);

    let err = repair_flow(&env.session(&prompter), PART, true).unwrap_err();

    assert!(matches!(err, RepairError::PrivilegeRequired));
    assert_eq!(err.exit_code(), 2);
    assert_eq!(env.hal.operation_count(), 0);
    assert!(env.repair_log().is_empty());
}

#[test]
fn ext4_clean_dry_run_skips_destructive_pass() {
    let env = Env::with_fs("ext4");
    env.hal.install("e2fsck");
    env.hal.script("e2fsck", FakeResponse::ok("/dev/sdb1: clean, 11/65536 files"));
    let prompter = ScriptedPrompter::new([]);

    let report = repair_flow(&env.session(&prompter), PART, false).expect("report");

    match &report.outcome {
        RepairOutcome::RepairAttempted { repair, mount, .. } => {
            assert!(matches!(repair, FsRepair::Clean { .. }));
            assert!(mount.mounted);
        }
        other => panic!("unexpected outcome {:?}", other),
    }
    assert_eq!(env.hal.invocations("e2fsck"), vec![strings(&["-n", PART])]);
    assert!(prompter.asked().is_empty());
}

#[test]
fn ext4_declined_keeps_dry_run_and_skips_mount() {
    let env = Env::with_fs("ext4");
    env.hal.install("e2fsck");
    env.hal
        .script("e2fsck", FakeResponse::exit(4, "Inode 12 has illegal blocks", ""));
    let prompter = ScriptedPrompter::new([Reply::No]);

    let report = repair_flow(&env.session(&prompter), PART, false).expect("report");

    match &report.outcome {
        RepairOutcome::Declined { dry_run, .. } => {
            assert_eq!(dry_run.rc, Some(4));
            assert!(dry_run.out.contains("illegal blocks"));
        }
        other => panic!("unexpected outcome {:?}", other),
    }
    assert_eq!(env.hal.invocations("e2fsck"), vec![strings(&["-n", PART])]);
    // Only the read-only attempt.
    assert_eq!(env.hal.invocations("mount").len(), 1);
    assert_eq!(prompter.asked(), vec!["Run e2fsck -f -y to attempt repairs?"]);
    assert!(report.mounted_at().is_none());

    let json = serde_json::to_value(&report).expect("json");
    assert_eq!(json["outcome"], "declined");
}

#[test]
fn ext4_confirmed_runs_force_repair_then_mounts() {
    let env = Env::with_fs("ext4");
    env.hal.install("e2fsck");
    env.hal
        .script("e2fsck", FakeResponse::exit(4, "Inode 12 has illegal blocks", ""));
    env.hal.script("e2fsck", FakeResponse::exit(1, "FILE SYSTEM WAS MODIFIED", ""));
    let prompter = ScriptedPrompter::new([Reply::Yes]);

    let report = repair_flow(&env.session(&prompter), PART, false).expect("report");

    assert_eq!(
        env.hal.invocations("e2fsck"),
        vec![strings(&["-n", PART]), strings(&["-f", "-y", PART])]
    );
    match &report.outcome {
        RepairOutcome::RepairAttempted { repair, mount, .. } => {
            match repair {
                FsRepair::Ran { run } => assert_eq!(run.rc, Some(1)),
                other => panic!("unexpected repair {:?}", other),
            }
            assert_eq!(mount.mount_point, Path::new("/mnt/dsk_sdb1_rw"));
        }
        other => panic!("unexpected outcome {:?}", other),
    }
    assert_eq!(report.mounted_at(), Some(Path::new("/mnt/dsk_sdb1_rw")));
}

#[test]
fn auto_yes_skips_the_prompt() {
    let env = Env::with_fs("ext3");
    env.hal.install("e2fsck");
    env.hal.script("e2fsck", FakeResponse::exit(4, "errors", ""));
    let prompter = ScriptedPrompter::new([]);

    repair_flow(&env.session(&prompter), PART, true).expect("report");

    assert!(prompter.asked().is_empty());
    assert_eq!(env.hal.invocations("e2fsck").len(), 2);
}

#[test]
fn ntfs_runs_ntfsfix_and_mounts_with_driver() {
    let env = Env::with_fs("ntfs");
    env.hal.install("ntfsfix");
    env.hal.install("ntfs-3g");
    let prompter = ScriptedPrompter::new([]);

    let report = repair_flow(&env.session(&prompter), PART, false).expect("report");

    assert_eq!(env.hal.invocations("ntfsfix"), vec![strings(&[PART])]);
    assert_eq!(
        env.hal.invocations("ntfs-3g"),
        vec![strings(&[PART, "/mnt/dsk_sdb1_rw"])]
    );
    // The generic tool is only used for the read-only attempt.
    assert_eq!(env.hal.invocations("mount").len(), 1);
    match &report.outcome {
        RepairOutcome::RepairAttempted { recommendation, .. } => assert!(recommendation.is_none()),
        other => panic!("unexpected outcome {:?}", other),
    }
}

#[test]
fn ntfs_without_driver_recommends_chkdsk() {
    let env = Env::with_fs("ntfs");
    env.hal.install("ntfsfix");
    let prompter = ScriptedPrompter::new([]);

    let report = repair_flow(&env.session(&prompter), PART, false).expect("report");

    match &report.outcome {
        RepairOutcome::RepairAttempted {
            mount,
            recommendation,
            ..
        } => {
            assert!(!mount.mounted);
            assert_eq!(mount.output, "ntfs-3g not installed");
            assert_eq!(recommendation.as_deref(), Some(CHKDSK_RECOMMENDATION));
        }
        other => panic!("unexpected outcome {:?}", other),
    }
    assert_eq!(env.hal.invocations("mount").len(), 1);
    assert!(env.console.contains("chkdsk /f /r"));
}

#[test]
fn exfat_prefers_dry_run_then_asks() {
    let env = Env::with_fs("exfat");
    env.hal.install("fsck.exfat");
    env.hal.install("fsck.vfat");
    let prompter = ScriptedPrompter::new([Reply::No]);

    let report = repair_flow(&env.session(&prompter), PART, false).expect("report");

    assert!(matches!(report.outcome, RepairOutcome::Declined { .. }));
    assert_eq!(env.hal.invocations("fsck.exfat"), vec![strings(&["-n", PART])]);
    assert!(!env.hal.was_invoked("fsck.vfat"));
}

#[test]
fn exfat_falls_back_to_vfat_and_says_so() {
    let env = Env::with_fs("vfat");
    env.hal.install("fsck.vfat");
    let prompter = ScriptedPrompter::new([]);

    let report = repair_flow(&env.session(&prompter), PART, false).expect("report");

    match &report.outcome {
        RepairOutcome::RepairAttempted {
            repair: FsRepair::FallbackUsed { note, .. },
            ..
        } => assert_eq!(note, VFAT_FALLBACK_NOTE),
        other => panic!("unexpected outcome {:?}", other),
    }
    assert_eq!(env.hal.invocations("fsck.vfat"), vec![strings(&[PART])]);
    assert!(prompter.asked().is_empty());

    let json = serde_json::to_value(&report).expect("json");
    assert_eq!(json["repair"]["result"], "fallback_used");
    assert!(json["repair"]["note"]
        .as_str()
        .unwrap_or_default()
        .contains("fsck.vfat"));
}

#[test]
fn exfat_without_tools_reports_missing() {
    let env = Env::with_fs("exfat");
    let prompter = ScriptedPrompter::new([]);

    let report = repair_flow(&env.session(&prompter), PART, false).expect("report");

    assert!(matches!(
        report.outcome,
        RepairOutcome::RepairAttempted {
            repair: FsRepair::ToolMissing { .. },
            ..
        }
    ));
}

#[test]
fn unknown_filesystem_type_runs_no_repair_tool() {
    let env = Env::with_fs("xfs");
    for tool in ["e2fsck", "ntfsfix", "fsck.exfat", "fsck.vfat"] {
        env.hal.install(tool);
    }
    let prompter = ScriptedPrompter::new([]);

    let report = repair_flow(&env.session(&prompter), PART, false).expect("report");

    assert!(matches!(report.outcome, RepairOutcome::Unsupported { .. }));
    for tool in ["e2fsck", "ntfsfix", "fsck.exfat", "fsck.vfat"] {
        assert!(!env.hal.was_invoked(tool));
    }
    assert!(env.console.contains("ddrescue"));
}

#[test]
fn blkid_failure_is_treated_as_unknown_type() {
    let env = Env::new();
    env.hal.script("blkid", FakeResponse::fail(2, ""));
    env.hal
        .script("mount", FakeResponse::fail(32, "mount: wrong fs type"));
    let prompter = ScriptedPrompter::new([]);

    let report = repair_flow(&env.session(&prompter), PART, false).expect("report");

    assert_eq!(report.fstype, None);
    assert!(matches!(report.outcome, RepairOutcome::Unsupported { .. }));
}

#[test]
fn parent_disk_diagnostics_are_attached() {
    let env = Env::with_fs("ext4");
    env.hal.install("e2fsck");
    env.hal.install("smartctl");
    env.hal.script(
        "dmesg",
        FakeResponse::ok("[5.1] sd 1:0:0:0: [sdb] I/O error\n[5.2] usb 2-1: reset\n"),
    );
    let prompter = ScriptedPrompter::new([]);

    let report = repair_flow(&env.session(&prompter), PART, false).expect("report");

    let diag = report.diagnostics.expect("diagnostics");
    assert_eq!(diag.disk, "/dev/sdb");
    assert_eq!(diag.kernel_log.as_deref(), Some("[5.1] sd 1:0:0:0: [sdb] I/O error"));
    assert_eq!(
        env.hal.invocations("smartctl"),
        vec![strings(&["-H", "/dev/sdb"]), strings(&["-i", "/dev/sdb"])]
    );
}

#[test]
fn destructive_capable_steps_are_logged_first() {
    let env = Env::with_fs("ext4");
    env.hal.install("e2fsck");
    env.hal.script("e2fsck", FakeResponse::exit(4, "errors", ""));
    let prompter = ScriptedPrompter::new([]);

    repair_flow(&env.session(&prompter), PART, true).expect("report");

    let log = env.repair_log();
    let messages: Vec<&str> = log.lines().map(|l| &l[20..]).collect();
    assert_eq!(
        messages,
        vec![
            "mount_ro_failed /dev/sdb1: mount: wrong fs type",
            "e2fsck -n /dev/sdb1",
            "e2fsck -f -y /dev/sdb1",
        ]
    );
}

#[test]
fn repair_and_mount_makes_a_final_attempt() {
    let env = Env::with_fs("ext4");
    env.hal.install("e2fsck");
    env.hal.script("e2fsck", FakeResponse::exit(4, "errors", ""));
    env.hal.script("mount", FakeResponse::fail(32, "rw failed"));
    env.hal.script("mount", FakeResponse::ok(""));
    let prompter = ScriptedPrompter::new([]);

    let report = repair_and_mount(&env.session(&prompter), PART).expect("report");

    assert!(prompter.asked().is_empty());
    assert_eq!(env.hal.invocations("e2fsck").len(), 2);
    let last_mount = env.hal.invocations("mount").pop().expect("mount calls");
    assert_eq!(last_mount, strings(&[PART, "/mnt/dsk_sdb1_final"]));
    assert_eq!(report.mounted_at(), Some(Path::new("/mnt/dsk_sdb1_final")));
    assert!(report.final_mount.is_some());
}

#[test]
fn repair_and_mount_skips_final_attempt_when_mounted() {
    let env = Env::with_fs("ext4");
    env.hal.install("e2fsck");
    let prompter = ScriptedPrompter::new([]);

    let report = repair_and_mount(&env.session(&prompter), PART).expect("report");

    assert!(report.final_mount.is_none());
    assert_eq!(env.hal.invocations("mount").len(), 2);
}

/// Wraps a FakeHal and raises `flag` while `program <first_arg>` runs, the way Ctrl+C in
/// the terminal reaches the handler while a child tool is in the foreground.
struct CtrlCDuring {
    inner: FakeHal,
    program: &'static str,
    first_arg: &'static str,
    flag: Interrupt,
}

impl ProcessOps for CtrlCDuring {
    fn command_output(
        &self,
        program: &str,
        args: &[&str],
        timeout: Option<Duration>,
    ) -> HalResult<Output> {
        let result = self.inner.command_output(program, args, timeout);
        if program == self.program && args.first() == Some(&self.first_arg) {
            self.flag.raise();
        }
        result
    }

    fn command_foreground(&self, program: &str, args: &[&str]) -> HalResult<ExitStatus> {
        self.inner.command_foreground(program, args)
    }
}

impl HostOps for CtrlCDuring {
    fn is_root(&self) -> bool {
        self.inner.is_root()
    }

    fn which(&self, program: &str) -> Option<PathBuf> {
        self.inner.which(program)
    }

    fn path_exists(&self, path: &Path) -> bool {
        self.inner.path_exists(path)
    }

    fn is_block_device(&self, path: &Path) -> bool {
        self.inner.is_block_device(path)
    }

    fn create_dir_all(&self, path: &Path) -> HalResult<()> {
        self.inner.create_dir_all(path)
    }
}

impl Env {
    fn ctrl_c_during(&self, program: &'static str, first_arg: &'static str) -> CtrlCDuring {
        CtrlCDuring {
            inner: self.hal.clone(),
            program,
            first_arg,
            flag: Interrupt::new(),
        }
    }
}

#[test]
fn ctrl_c_during_ext4_dry_run_stops_auto_confirmed_repair() {
    let env = Env::with_fs("ext4");
    env.hal.install("e2fsck");
    // The dry run dies from SIGINT, so it never reports "clean".
    env.hal.script("e2fsck", FakeResponse::exit(130, "", ""));
    let hal = env.ctrl_c_during("e2fsck", "-n");
    let prompter = ScriptedPrompter::new([]);
    let mut session = Session::new(&hal, &env.config, &env.console, &prompter);
    session.interrupt = hal.flag.clone();

    let report = repair_and_mount(&session, PART).expect("report");

    assert_eq!(
        report.outcome,
        RepairOutcome::Interrupted {
            after: "e2fsck -n /dev/sdb1".to_string()
        }
    );
    assert_eq!(env.hal.invocations("e2fsck"), vec![strings(&["-n", PART])]);
    // Only the read-only attempt; no rw or final mount.
    assert_eq!(env.hal.invocations("mount").len(), 1);
    assert!(report.final_mount.is_none());
    assert!(report.diagnostics.is_none());
    assert!(!env.hal.was_invoked("dmesg"));
    assert!(env
        .repair_log()
        .contains("interrupted /dev/sdb1 after e2fsck -n /dev/sdb1"));
    // The menu still sees the interrupt and reports it.
    assert!(session.interrupt.take());

    let json = serde_json::to_value(&report).expect("json");
    assert_eq!(json["outcome"], "interrupted");
}

#[test]
fn ctrl_c_during_exfat_dry_run_skips_destructive_pass() {
    let env = Env::with_fs("exfat");
    env.hal.install("fsck.exfat");
    let hal = env.ctrl_c_during("fsck.exfat", "-n");
    let prompter = ScriptedPrompter::new([]);
    let mut session = Session::new(&hal, &env.config, &env.console, &prompter);
    session.interrupt = hal.flag.clone();

    let report = repair_flow(&session, PART, true).expect("report");

    assert!(matches!(report.outcome, RepairOutcome::Interrupted { .. }));
    assert_eq!(env.hal.invocations("fsck.exfat"), vec![strings(&["-n", PART])]);
    assert!(prompter.asked().is_empty());
    assert_eq!(env.hal.invocations("mount").len(), 1);
}

#[test]
fn ctrl_c_during_ntfsfix_skips_rw_mount() {
    let env = Env::with_fs("ntfs");
    env.hal.install("ntfsfix");
    env.hal.install("ntfs-3g");
    let hal = env.ctrl_c_during("ntfsfix", PART);
    let prompter = ScriptedPrompter::new([]);
    let mut session = Session::new(&hal, &env.config, &env.console, &prompter);
    session.interrupt = hal.flag.clone();

    let report = repair_flow(&session, PART, true).expect("report");

    assert_eq!(
        report.outcome,
        RepairOutcome::Interrupted {
            after: "ntfsfix".to_string()
        }
    );
    assert!(!env.hal.was_invoked("ntfs-3g"));
}

#[test]
fn repair_tools_wait_without_timeout() {
    let env = Env::with_fs("ext4");
    env.hal.install("e2fsck");
    env.hal
        .script("e2fsck", FakeResponse::exit(4, "Inode 12 has illegal blocks", ""));
    let prompter = ScriptedPrompter::new([]);

    repair_flow(&env.session(&prompter), PART, true).expect("report");

    let timeouts = |tool: &str| -> Vec<Option<u64>> {
        env.hal
            .operations()
            .into_iter()
            .filter_map(|op| match op {
                Operation::Command {
                    program,
                    timeout_secs,
                    ..
                } if program == tool => Some(timeout_secs),
                _ => None,
            })
            .collect()
    };
    assert_eq!(timeouts("e2fsck"), vec![None, None]);
    assert_eq!(timeouts("blkid"), vec![Some(30)]);
    assert!(timeouts("mount").iter().all(|t| *t == Some(120)));
}
