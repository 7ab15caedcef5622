//! dsk-repair core library.
//!
//! Device inventory, partition diagnostics, the conservative repair flow, imaging and the
//! interactive menu. Every external tool runs through [`dsk_hal::SystemHal`].

pub mod cli;
pub mod config;
pub mod diagnostics;
pub mod errors;
pub mod imaging;
pub mod inspect;
pub mod inventory;
pub mod logging;
pub mod mount;
pub mod repair;
pub mod report;
pub mod session;
pub mod ui;

pub use errors::{RepairError, Result};
pub use session::Session;
