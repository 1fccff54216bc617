//! netbpfload — first-stage packet-filter object bootstrap.
//!
//! Runs once per boot: works out whether this is the platform or the
//! mainline-module copy, gates on kernel capabilities, tunes sysctls,
//! creates the pin directories, loads every object file, checks the map
//! write path, and hands control to the second-stage loader.
//!
//! The binary entry point is `src/main.rs`; everything it drives lives here
//! so the stages can be exercised without a real kernel.

pub mod bootstrap;
pub mod core;
pub mod gate;
pub mod handoff;
pub mod kernel;
pub mod loader;
pub mod location;
pub mod mounts;
pub mod pin;
pub mod pipeline;
pub mod sanity;
pub mod sysctl;
pub mod variant;

pub use crate::bootstrap::logger;
pub use crate::core::{config, error};
