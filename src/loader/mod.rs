//! Object discovery and load driver.
//!
//! For each [`Location`] in table order, every `*.o` entry of its directory
//! is handed to an [`ObjectLoader`]. Within a location every file is
//! attempted; a critical failure marks the location failed, a non-critical
//! one is only logged. The sweep stops at the first failed location.
//!
//! Enumeration order inside a directory is whatever `read_dir` yields.

mod elf;
mod helper;

pub use elf::{ElfError, is_critical};
pub use helper::ElfObjectLoader;

use std::fs;
use std::io;
use std::path::Path;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::error::BootError;
use crate::location::Location;

/// Suffix of loadable object files.
pub const OBJECT_SUFFIX: &str = ".o";

/// Result of loading one object file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded,
    /// `errno` is a positive OS error code; `critical` failures block boot.
    Failed { errno: i32, critical: bool },
}

/// Loads, verifies and pins the programs and maps of a single object file.
pub trait ObjectLoader {
    fn load(&self, path: &Path, location: &Location) -> LoadOutcome;
}

/// Per-location tally.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocationReport {
    pub attempted: usize,
    pub loaded: usize,
    pub failed: usize,
    /// errno of the last critical failure, if any.
    pub critical_errno: Option<i32>,
}

impl LocationReport {
    pub fn is_success(&self) -> bool {
        self.critical_errno.is_none()
    }
}

/// Load every object file of one location. A missing directory is an
/// empty, successful location.
pub fn load_location(loader: &dyn ObjectLoader, location: &Location) -> LocationReport {
    let mut report = LocationReport::default();

    let entries = match fs::read_dir(&location.dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!(dir = %location.dir.display(), "location absent, skipping");
            return report;
        }
        Err(e) => {
            warn!(dir = %location.dir.display(), error = %e, "cannot list location, skipping");
            return report;
        }
    };

    for entry in entries.flatten() {
        let name = entry.file_name();
        if !name.to_string_lossy().ends_with(OBJECT_SUFFIX) {
            continue;
        }
        let path = location.dir.join(&name);
        report.attempted += 1;

        match loader.load(&path, location) {
            LoadOutcome::Loaded => {
                report.loaded += 1;
                info!(path = %path.display(), "Loaded object");
            }
            LoadOutcome::Failed { errno, critical } => {
                report.failed += 1;
                if critical {
                    report.critical_errno = Some(errno);
                }
                error!(
                    path = %path.display(),
                    critical,
                    error = %io::Error::from_raw_os_error(errno),
                    "Failed to load object"
                );
            }
        }
    }

    report
}

/// Sweep every location in order. On the first failed location, log the
/// operator diagnostic, stall for `stall_for` so it stays on the console,
/// and fail with [`BootError::CriticalLoad`].
pub fn load_all(
    loader: &dyn ObjectLoader,
    locations: &[Location],
    stall: &dyn Fn(Duration),
    stall_for: Duration,
) -> Result<(), BootError> {
    for location in locations {
        let report = load_location(loader, location);
        debug!(dir = %location.dir.display(), ?report, "location done");

        if let Some(errno) = report.critical_errno {
            error!("=== CRITICAL FAILURE LOADING BPF PROGRAMS FROM {} ===", location.dir.display());
            error!("If this triggers reliably, you're probably missing kernel options or patches.");
            error!(
                "If this triggers randomly, you might be hitting some memory allocation \
                 problems or startup script race."
            );
            error!("--- DO NOT EXPECT SYSTEM TO BOOT SUCCESSFULLY ---");
            stall(stall_for);
            return Err(BootError::CriticalLoad { dir: location.dir.clone(), errno });
        }
    }
    Ok(())
}
