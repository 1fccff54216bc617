//! Pin-directory manager.
//!
//! Creates `<pin root>/<prefix>` for every location plus the reserved
//! directory, mode `01777`, before any object is loaded. Creation is
//! idempotent so a rerun after a failed boot finds its own leftovers.

use std::fs::DirBuilder;
use std::io;
use std::os::unix::fs::DirBuilderExt;
use std::path::Path;

use tracing::{debug, error};

use crate::error::BootError;
use crate::location::{Location, RESERVED_PIN_DIR};

/// Full access for everyone plus the sticky bit.
pub const PIN_DIR_MODE: u32 = 0o1777;

/// Forces the process umask for its lifetime and restores the previous
/// mask on drop.
#[must_use = "the umask is restored as soon as the guard is dropped"]
pub struct UmaskGuard {
    previous: libc::mode_t,
}

impl UmaskGuard {
    pub fn set(mask: libc::mode_t) -> Self {
        // SAFETY: umask has no failure mode and touches only process state.
        let previous = unsafe { libc::umask(mask) };
        Self { previous }
    }
}

impl Drop for UmaskGuard {
    fn drop(&mut self) {
        // SAFETY: as above.
        unsafe { libc::umask(self.previous) };
    }
}

/// Ensure `<pin_root>/<prefix>` exists with [`PIN_DIR_MODE`].
/// An empty prefix is a no-op; an existing entry is success.
pub fn create_pin_dir(pin_root: &Path, prefix: &str) -> Result<(), BootError> {
    if prefix.is_empty() {
        return Ok(());
    }
    let path = pin_root.join(prefix);

    let result = {
        let _umask = UmaskGuard::set(0);
        DirBuilder::new().mode(PIN_DIR_MODE).create(&path)
    };

    match result {
        Ok(()) => {
            debug!(path = %path.display(), "created pin directory");
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Ok(()),
        Err(source) => {
            let err = BootError::PinDir { path: path.clone(), source };
            error!(
                path = %path.display(),
                errno = err.errno().unwrap_or(-libc::EIO),
                "Failed to create directory"
            );
            Err(err)
        }
    }
}

/// Create the pin directory of every location, then the reserved one.
pub fn create_all(pin_root: &Path, locations: &[Location]) -> Result<(), BootError> {
    for location in locations {
        create_pin_dir(pin_root, &location.prefix)?;
    }
    create_pin_dir(pin_root, RESERVED_PIN_DIR)
}
