//! Diagnostic logging setup and the append-only repair log.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Initialise `env_logger` for diagnostics on stderr.
///
/// Defaults to `warn` so one-shot output stays readable; `RUST_LOG` overrides.
pub fn init() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp_secs()
        .try_init();
}

/// Operator-facing audit trail: one `<timestamp> <message>` line per event.
///
/// The file is opened and closed on every write and is never read back.
/// Failures are logged and swallowed so they can never abort a repair.
#[derive(Debug, Clone)]
pub struct RepairLog {
    path: PathBuf,
}

impl RepairLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, message: &str) {
        if let Err(err) = self.try_append(message) {
            log::warn!(
                "could not write repair log {}: {}",
                self.path.display(),
                err
            );
        }
    }

    fn try_append(&self, message: &str) -> std::io::Result<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{} {}", timestamp(), message)
    }
}

/// Local time as `YYYY-mm-dd HH:MM:SS`.
pub fn timestamp() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}
