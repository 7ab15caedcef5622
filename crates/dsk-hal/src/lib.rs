//! dsk-repair host abstraction layer (HAL).
//!
//! Every call that touches the machine (spawning external tools, checking for
//! root, probing paths) goes through the traits in [`hal`] so the repair and
//! imaging workflows can run against [`FakeHal`] in tests.

pub mod error;
pub mod hal;

pub use error::{HalError, HalResult};
pub use hal::*;
