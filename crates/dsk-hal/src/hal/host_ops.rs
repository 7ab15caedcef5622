//! Host facts (privileges, executables on PATH, device nodes).
//!
//! This is "world-touching" (reads `/dev`, `$PATH`, the process credentials) and belongs in the HAL.

use crate::HalResult;
use std::path::{Path, PathBuf};

pub trait HostOps {
    /// Whether the current process runs with an effective uid of 0.
    fn is_root(&self) -> bool;

    /// Resolve an executable on `PATH`.
    fn which(&self, program: &str) -> Option<PathBuf>;

    fn path_exists(&self, path: &Path) -> bool;

    fn is_block_device(&self, path: &Path) -> bool;

    fn create_dir_all(&self, path: &Path) -> HalResult<()>;
}
