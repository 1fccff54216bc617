//! Kernel-facing collaborators.
//!
//! - **version** — kernel version triples.
//! - **probe** — one-shot snapshot of kernel and device facts.
//! - **bpf** — map create/write primitives.

pub mod bpf;
pub mod probe;
pub mod version;

pub use probe::{BuildType, SystemFacts};
pub use version::KernelVersion;
