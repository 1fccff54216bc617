//! Production [`ObjectLoader`]: classifies the object from its ELF section
//! table, then runs the configured per-object loader executable.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, warn};

use super::elf;
use super::{LoadOutcome, ObjectLoader};
use crate::location::Location;

/// Runs `helper <object path> <pin prefix>` per object. Exit status 0 is
/// success; a non-zero status `n` is reported as errno `n`.
#[derive(Debug, Clone)]
pub struct ElfObjectLoader {
    helper: Option<PathBuf>,
}

impl ElfObjectLoader {
    pub fn new(helper: Option<PathBuf>) -> Self {
        Self { helper }
    }
}

fn os_errno(e: &std::io::Error) -> i32 {
    e.raw_os_error().unwrap_or(libc::EIO)
}

impl ObjectLoader for ElfObjectLoader {
    fn load(&self, path: &Path, location: &Location) -> LoadOutcome {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) => return LoadOutcome::Failed { errno: os_errno(&e), critical: false },
        };
        let critical = match elf::is_critical(&bytes) {
            Ok(critical) => critical,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "not a loadable object");
                return LoadOutcome::Failed { errno: libc::ENOEXEC, critical: false };
            }
        };

        let Some(helper) = &self.helper else {
            debug!(path = %path.display(), critical, "no object loader configured");
            return LoadOutcome::Failed { errno: libc::ENOSYS, critical };
        };

        match Command::new(helper).arg(path).arg(&location.prefix).status() {
            Ok(status) if status.success() => LoadOutcome::Loaded,
            Ok(status) => LoadOutcome::Failed {
                // Killed by a signal: no exit code.
                errno: status.code().filter(|c| *c > 0).unwrap_or(libc::EIO),
                critical,
            },
            Err(e) => LoadOutcome::Failed { errno: os_errno(&e), critical },
        }
    }
}
