//! HAL trait definitions and implementations.
//!
//! This module defines the core traits for system operations and provides
//! both real (LinuxHal) and fake (FakeHal) implementations.

pub mod fake_hal;
pub mod host_ops;
pub mod linux_hal;
pub mod process_ops;

pub use fake_hal::{FakeHal, FakeResponse, Operation};
pub use host_ops::HostOps;
pub use linux_hal::LinuxHal;
pub use process_ops::{ensure_success, ProcessOps};

/// Complete HAL combining all system operation traits.
pub trait SystemHal: ProcessOps + HostOps + Send + Sync {}

/// Automatically implement SystemHal for any type implementing all required traits.
impl<T> SystemHal for T where T: ProcessOps + HostOps + Send + Sync {}
