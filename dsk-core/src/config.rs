//! Runtime configuration threaded into every component.
//!
//! Precedence: CLI flags, then `DSK_REPAIR_*` environment variables, then defaults.

use std::io::IsTerminal;
use std::path::PathBuf;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

const DEFAULT_LOG_PATH: &str = "/var/log/dsk_repair.log";
const DEFAULT_MOUNT_BASE: &str = "/mnt";

pub const LOG_PATH_ENV: &str = "DSK_REPAIR_LOG_PATH";
pub const MOUNT_BASE_ENV: &str = "DSK_REPAIR_MOUNT_BASE";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Append-only repair log.
    pub log_path: PathBuf,
    /// Directory under which mount points are created.
    pub mount_base: PathBuf,
    /// Emit ANSI colors on status lines.
    pub color: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_path: PathBuf::from(DEFAULT_LOG_PATH),
            mount_base: PathBuf::from(DEFAULT_MOUNT_BASE),
            color: true,
        }
    }
}

impl Config {
    /// Defaults overlaid with the process environment.
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var_os(key).map(|v| v.to_string_lossy().to_string()))
            .with_color(std::io::stdout().is_terminal())
    }

    /// Same as [`Config::from_env`] but with an injectable variable lookup.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut cfg = Self::default();
        if let Some(path) = lookup(LOG_PATH_ENV).filter(|v| !v.is_empty()) {
            cfg.log_path = PathBuf::from(path);
        }
        if let Some(base) = lookup(MOUNT_BASE_ENV).filter(|v| !v.is_empty()) {
            cfg.mount_base = PathBuf::from(base);
        }
        // https://no-color.org: any non-empty value disables color.
        if lookup("NO_COLOR").is_some_and(|v| !v.is_empty()) {
            cfg.color = false;
        }
        cfg
    }

    /// Disable color when `enabled` is false; never re-enables it.
    pub fn with_color(mut self, enabled: bool) -> Self {
        self.color = self.color && enabled;
        self
    }

    /// Apply command-line overrides.
    pub fn apply_cli(mut self, cli: &crate::cli::Cli) -> Self {
        if let Some(path) = &cli.log_file {
            self.log_path = path.clone();
        }
        if let Some(base) = &cli.mount_base {
            self.mount_base = base.clone();
        }
        if cli.no_color {
            self.color = false;
        }
        self
    }
}
